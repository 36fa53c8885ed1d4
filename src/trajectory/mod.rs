//! Molecular dynamics trajectories.
//!
//! ```text
//!   trajectory text file
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │ FrameReader │  header, then one frame at a time (optionally skipping)
//!   └─────────────┘
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │   MolDyn    │  lattice, atom types, Vec<MolFrame>
//!   └─────────────┘
//! ```

pub mod error;
pub mod model;
pub mod reader;

pub use error::TrajectoryError;
pub use model::{AtomType, LoadStats, MolDyn, MolFrame, Vec3};
pub use reader::{FrameReader, Frames, TrajectoryHeader};
