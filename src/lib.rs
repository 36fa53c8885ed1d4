//! # rusty-scan
//!
//! Data conversion core for scattering instrument viewers:
//!
//! - [`data`]: loads column-oriented instrument tables and de-interleaves
//!   them into per-polarisation-channel [`data::Dataset`]s with Poisson
//!   counting errors.
//! - [`trajectory`]: streams molecular dynamics trajectories frame by frame
//!   into a [`trajectory::MolDyn`], optionally skipping frames.
//! - [`workspace`] and [`export`]: named dataset collections and CSV export
//!   for the surrounding tools.
//!
//! ```rust,no_run
//! use rusty_scan::data::{convert_instr_file, RoleConfig};
//! use rusty_scan::trajectory::MolDyn;
//! use std::path::Path;
//!
//! let dataset = convert_instr_file(Path::new("012345.dat"), &RoleConfig::default())?;
//! println!("{} channel(s)", dataset.num_channels());
//!
//! let mut mol = MolDyn::new();
//! mol.load_file(Path::new("XDATCAR"), 100)?;
//! println!("{} frame(s)", mol.frame_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod data;
pub mod export;
pub mod trajectory;
pub mod workspace;
