/// Data layer: instrument tables, column roles and channel datasets.
///
/// Architecture:
/// ```text
///  .dat / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ColumnTable (impl InstrTable)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  roles    │  scan axes, counters, monitors, channel count
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ convert   │  de-interleave rows → Dataset (one Data per channel)
///   └──────────┘
/// ```

pub mod convert;
pub mod error;
pub mod loader;
pub mod model;
pub mod roles;
pub mod table;

pub use convert::{convert_instr_file, convert_table, deinterleave};
pub use error::DataError;
pub use model::{Axis, CountSeries, Data, Dataset};
pub use roles::{ColumnRoles, Fallback, RoleConfig};
pub use table::{ColumnTable, InstrTable, PolNames};
