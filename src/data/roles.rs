//! Column role assignment: which columns are scan axes, counters and monitors.
//!
//! Roles come from the file header (via [`InstrTable`]) unless a
//! [`RoleConfig`] names them explicitly. When nothing resolves, two fixed
//! fallbacks apply (see [`Fallback`]); strict mode turns those into errors.

use log::warn;
use serde::Deserialize;

use super::error::DataError;
use super::table::InstrTable;

/// Column used as scan axis when none resolves.
pub const FALLBACK_AXIS_COL: usize = 0;
/// Column used as counter when none resolves.
pub const FALLBACK_COUNTER_COL: usize = 1;

/// Explicit role configuration overriding what the file declares.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoleConfig {
    /// Scan axis column names.
    pub scan: Vec<String>,
    /// Counter column name.
    pub counter: Option<String>,
    /// Monitor column name.
    pub monitor: Option<String>,
    /// Number of interleaved polarisation channels, overriding the file.
    pub pol_channels: Option<usize>,
    /// Fail instead of falling back to fixed columns.
    pub strict: bool,
}

/// A fallback rule that fired during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// No scan axis resolved, column 0 is used.
    ScanAxis,
    /// No counter resolved, column 1 is used.
    Counter,
}

/// Resolved column indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub scan_axes: Vec<usize>,
    pub counter_cols: Vec<usize>,
    pub monitor_cols: Vec<usize>,
    pub num_polarization_states: usize,
    /// Fallback rules that were applied, in resolution order.
    pub fallbacks: Vec<Fallback>,
}

impl ColumnRoles {
    /// Resolve roles for `table`. The table's polarisation data must already
    /// be parsed.
    pub fn resolve(table: &dyn InstrTable, config: &RoleConfig) -> Result<Self, DataError> {
        let num_cols = table.col_names().len();
        let lookup = |name: &str| table.col_index(name).filter(|&idx| idx < num_cols);

        let scan_names = if config.scan.is_empty() {
            table.scanned_vars()
        } else {
            config.scan.clone()
        };
        let mut scan_axes: Vec<usize> = scan_names.iter().filter_map(|n| lookup(n)).collect();

        let counter_name = config.counter.clone().or_else(|| table.count_var());
        let mut counter_cols: Vec<usize> = counter_name.as_deref().and_then(lookup).into_iter().collect();

        let monitor_name = config.monitor.clone().or_else(|| table.mon_var());
        let monitor_cols: Vec<usize> = monitor_name.as_deref().and_then(lookup).into_iter().collect();

        let mut fallbacks = Vec::new();
        if scan_axes.is_empty() {
            if config.strict {
                return Err(DataError::AmbiguousRoles(format!(
                    "no scan axis among {scan_names:?}"
                )));
            }
            warn!("no scan axis resolved, using column {FALLBACK_AXIS_COL}");
            scan_axes.push(FALLBACK_AXIS_COL);
            fallbacks.push(Fallback::ScanAxis);
        }
        if counter_cols.is_empty() {
            if config.strict {
                return Err(DataError::AmbiguousRoles(format!(
                    "no counter column for {counter_name:?}"
                )));
            }
            warn!("no counter resolved, using column {FALLBACK_COUNTER_COL}");
            counter_cols.push(FALLBACK_COUNTER_COL);
            fallbacks.push(Fallback::Counter);
        }

        let num_polarization_states = config
            .pol_channels
            .unwrap_or_else(|| table.num_pol_channels())
            .max(1);

        Ok(Self {
            scan_axes,
            counter_cols,
            monitor_cols,
            num_polarization_states,
            fallbacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{ColumnTable, PARAM_COUNT_VAR, PARAM_MON_VAR, PARAM_SCAN_VARS};

    fn table() -> ColumnTable {
        ColumnTable::from_rows(
            vec!["QH".into(), "CNTS".into(), "M1".into()],
            &[vec![1.0, 10.0, 100.0]],
        )
    }

    #[test]
    fn test_resolve_from_header() {
        let t = table()
            .with_param(PARAM_SCAN_VARS, "QH")
            .with_param(PARAM_COUNT_VAR, "CNTS")
            .with_param(PARAM_MON_VAR, "M1");
        let roles = ColumnRoles::resolve(&t, &RoleConfig::default()).unwrap();
        assert_eq!(roles.scan_axes, vec![0]);
        assert_eq!(roles.counter_cols, vec![1]);
        assert_eq!(roles.monitor_cols, vec![2]);
        assert_eq!(roles.num_polarization_states, 1);
        assert!(roles.fallbacks.is_empty());
    }

    #[test]
    fn test_config_overrides_header() {
        let t = table().with_param(PARAM_COUNT_VAR, "CNTS");
        let config = RoleConfig {
            scan: vec!["M1".into()],
            counter: Some("QH".into()),
            pol_channels: Some(4),
            ..RoleConfig::default()
        };
        let roles = ColumnRoles::resolve(&t, &config).unwrap();
        assert_eq!(roles.scan_axes, vec![2]);
        assert_eq!(roles.counter_cols, vec![0]);
        assert!(roles.monitor_cols.is_empty());
        assert_eq!(roles.num_polarization_states, 4);
    }

    #[test]
    fn test_fallbacks_are_reported() {
        let t = table().with_param(PARAM_SCAN_VARS, "H K");
        let roles = ColumnRoles::resolve(&t, &RoleConfig::default()).unwrap();
        assert_eq!(roles.scan_axes, vec![FALLBACK_AXIS_COL]);
        assert_eq!(roles.counter_cols, vec![FALLBACK_COUNTER_COL]);
        assert_eq!(roles.fallbacks, vec![Fallback::ScanAxis, Fallback::Counter]);
    }

    #[test]
    fn test_strict_mode_refuses_to_guess() {
        let t = table().with_param(PARAM_SCAN_VARS, "QH");
        let config = RoleConfig {
            strict: true,
            ..RoleConfig::default()
        };
        assert!(matches!(
            ColumnRoles::resolve(&t, &config),
            Err(DataError::AmbiguousRoles(_))
        ));
    }

    #[test]
    fn test_zero_pol_channels_means_one() {
        let config = RoleConfig {
            pol_channels: Some(0),
            ..RoleConfig::default()
        };
        let roles = ColumnRoles::resolve(&table(), &config).unwrap();
        assert_eq!(roles.num_polarization_states, 1);
    }
}
