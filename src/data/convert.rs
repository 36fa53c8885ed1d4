use std::path::Path;

use log::{debug, info};

use super::error::DataError;
use super::loader::load_table;
use super::model::{Data, Dataset};
use super::roles::{ColumnRoles, RoleConfig};
use super::table::{InstrTable, PolNames};

/// Every `interleave`-th element of `values`, starting at `start`.
pub fn copy_interleave(values: &[f64], interleave: usize, start: usize) -> Vec<f64> {
    values
        .iter()
        .skip(start)
        .step_by(interleave.max(1))
        .copied()
        .collect()
}

/// Inverse of [`copy_interleave`]: merge channel sub-sequences back into
/// row order.
pub fn merge_interleaved(channels: &[Vec<f64>]) -> Vec<f64> {
    let total = channels.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let k = channels.len();
    for row in 0..total {
        if let Some(&v) = channels[row % k].get(row / k) {
            merged.push(v);
        }
    }
    merged
}

/// Split the table columns into one [`Data`] per polarisation channel.
///
/// Column indices outside the table are skipped.
pub fn deinterleave(col_names: &[String], columns: &[Vec<f64>], roles: &ColumnRoles) -> Dataset {
    let numpolstates = roles.num_polarization_states.max(1);
    let column = |idx: usize| columns.get(idx).filter(|_| idx < col_names.len());

    (0..numpolstates)
        .map(|polstate| {
            let mut data = Data::new();

            for &idx in &roles.scan_axes {
                if let Some(col) = column(idx) {
                    data.add_axis(copy_interleave(col, numpolstates, polstate), col_names[idx].clone());
                }
            }

            for &idx in &roles.counter_cols {
                if let Some(col) = column(idx) {
                    data.add_poisson_counter(copy_interleave(col, numpolstates, polstate));
                }
            }

            for &idx in &roles.monitor_cols {
                if let Some(col) = column(idx) {
                    data.add_poisson_monitor(copy_interleave(col, numpolstates, polstate));
                }
            }

            data
        })
        .collect()
}

/// Convert a loaded instrument table into a [`Dataset`].
///
/// Runs the polarisation preparation step, resolves the column roles and
/// de-interleaves the channels. Fails without partial output when the table
/// has no columns.
pub fn convert_table(
    table: &mut dyn InstrTable,
    config: &RoleConfig,
) -> Result<(Dataset, ColumnRoles), DataError> {
    if table.col_names().is_empty() {
        return Err(DataError::LoadFailure("table has no columns".into()));
    }

    table.set_pol_names(PolNames::default());
    table.parse_pol_data();

    let roles = ColumnRoles::resolve(&*table, config)?;
    debug!(
        "roles: axes {:?}, counters {:?}, monitors {:?}, {} channel(s)",
        roles.scan_axes, roles.counter_cols, roles.monitor_cols, roles.num_polarization_states
    );

    let dataset = deinterleave(table.col_names(), table.columns(), &roles);
    Ok((dataset, roles))
}

/// Load an instrument data file and convert it into a [`Dataset`].
pub fn convert_instr_file(path: &Path, config: &RoleConfig) -> Result<Dataset, DataError> {
    let mut table = load_table(path)?;
    let (dataset, _) = convert_table(&mut table, config)?;
    info!(
        "converted {}: {} channel(s), {} row(s)",
        path.display(),
        dataset.num_channels(),
        table.num_rows()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::roles::{Fallback, FALLBACK_AXIS_COL};
    use crate::data::table::{
        ColumnTable, PARAM_COUNT_VAR, PARAM_MON_VAR, PARAM_POLARIZATION, PARAM_SCAN_VARS,
    };
    use proptest::prelude::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn make_roles(axes: &[usize], ctrs: &[usize], mons: &[usize], k: usize) -> ColumnRoles {
        ColumnRoles {
            scan_axes: axes.to_vec(),
            counter_cols: ctrs.to_vec(),
            monitor_cols: mons.to_vec(),
            num_polarization_states: k,
            fallbacks: Vec::new(),
        }
    }

    fn scan_table() -> ColumnTable {
        ColumnTable::new(
            names(&["QH", "CNTS", "M1"]),
            vec![
                vec![0.0, 0.0, 0.1, 0.1, 0.2],
                vec![0.0, 4.0, 9.0, 16.0, 25.0],
                vec![100.0, 100.0, 100.0, 100.0, 100.0],
            ],
        )
        .with_param(PARAM_SCAN_VARS, "QH")
        .with_param(PARAM_COUNT_VAR, "CNTS")
        .with_param(PARAM_MON_VAR, "M1")
    }

    #[test]
    fn test_copy_interleave() {
        let v = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(copy_interleave(&v, 2, 0), vec![0.0, 2.0, 4.0]);
        assert_eq!(copy_interleave(&v, 2, 1), vec![1.0, 3.0]);
        assert_eq!(copy_interleave(&v, 1, 0), v.to_vec());
        assert!(copy_interleave(&v, 3, 7).is_empty());
    }

    #[test]
    fn test_unpolarised_conversion() {
        let mut t = scan_table();
        let (ds, roles) = convert_table(&mut t, &RoleConfig::default()).unwrap();
        assert_eq!(roles.num_polarization_states, 1);
        assert_eq!(ds.num_channels(), 1);

        let data = ds.channel(0).unwrap();
        assert_eq!(data.axis(0).unwrap().name, "QH");
        let ctr = data.counter(0).unwrap();
        assert_eq!(ctr.values, vec![0.0, 4.0, 9.0, 16.0, 25.0]);
        assert_eq!(ctr.errors, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(data.monitor(0).unwrap().errors, vec![10.0; 5]);
    }

    #[test]
    fn test_polarised_conversion_splits_rows() {
        let mut t = scan_table().with_param(PARAM_POLARIZATION, "p1=1; p1=-1");
        let (ds, _) = convert_table(&mut t, &RoleConfig::default()).unwrap();
        assert_eq!(ds.num_channels(), 2);

        let up = ds.channel(0).unwrap();
        let down = ds.channel(1).unwrap();
        assert_eq!(up.counter(0).unwrap().values, vec![0.0, 9.0, 25.0]);
        assert_eq!(up.counter(0).unwrap().errors, vec![1.0, 3.0, 5.0]);
        assert_eq!(down.counter(0).unwrap().values, vec![4.0, 16.0]);
        assert_eq!(down.counter(0).unwrap().errors, vec![2.0, 4.0]);
        assert_eq!(down.axis(0).unwrap().values, vec![0.0, 0.1]);
        assert!(up.is_consistent() && down.is_consistent());
    }

    #[test]
    fn test_empty_monitor_is_not_an_error() {
        let mut t = ColumnTable::new(names(&["QH", "CNTS"]), vec![vec![1.0], vec![2.0]]);
        let (ds, roles) = convert_table(&mut t, &RoleConfig::default()).unwrap();
        assert_eq!(ds.channel(0).unwrap().num_monitors(), 0);
        assert_eq!(roles.fallbacks, vec![Fallback::ScanAxis, Fallback::Counter]);
        assert_eq!(ds.channel(0).unwrap().axis(0).unwrap().name, "QH");
        assert_eq!(ds.channel(0).unwrap().counter(0).unwrap().values, vec![2.0]);
    }

    #[test]
    fn test_no_columns_is_load_failure() {
        let mut t = ColumnTable::default();
        assert!(matches!(
            convert_table(&mut t, &RoleConfig::default()),
            Err(DataError::LoadFailure(_))
        ));
    }

    #[test]
    fn test_out_of_range_columns_are_skipped() {
        // single column: the counter fallback points past the end
        let mut t = ColumnTable::new(names(&["T"]), vec![vec![1.0, 2.0]]);
        let (ds, roles) = convert_table(&mut t, &RoleConfig::default()).unwrap();
        assert_eq!(roles.scan_axes, vec![FALLBACK_AXIS_COL]);
        let data = ds.channel(0).unwrap();
        assert_eq!(data.num_axes(), 1);
        assert_eq!(data.num_counters(), 0);

        let ds = deinterleave(t.col_names(), t.columns(), &make_roles(&[0, 7], &[3], &[9], 1));
        assert_eq!(ds.channel(0).unwrap().num_axes(), 1);
        assert_eq!(ds.channel(0).unwrap().num_counters(), 0);
    }

    proptest! {
        #[test]
        fn test_channel_count_and_lengths(rows in 0usize..60, k in 1usize..6) {
            let col: Vec<f64> = (0..rows).map(|r| r as f64).collect();
            let ds = deinterleave(&names(&["x", "y"]), &[col.clone(), col], &make_roles(&[0], &[1], &[], k));

            prop_assert_eq!(ds.num_channels(), k);
            for (p, data) in ds.channels().iter().enumerate() {
                let expected = (rows + k - 1 - p) / k;
                prop_assert_eq!(data.num_points(), expected);
                prop_assert!(data.is_consistent());
            }
        }

        #[test]
        fn test_interleave_round_trip(col in prop::collection::vec(0.0f64..1e6, 0..80), k in 1usize..7) {
            let parts: Vec<Vec<f64>> = (0..k).map(|p| copy_interleave(&col, k, p)).collect();
            prop_assert_eq!(merge_interleaved(&parts), col);
        }

        #[test]
        fn test_error_law(counts in prop::collection::vec(0u32..100_000, 1..50)) {
            let col: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
            let ds = deinterleave(&names(&["x", "y"]), &[col.clone(), col], &make_roles(&[0], &[1], &[1], 1));
            let data = ds.channel(0).unwrap();
            for series in [data.counter(0).unwrap(), data.monitor(0).unwrap()] {
                for (&y, &err) in series.values.iter().zip(&series.errors) {
                    if y == 0.0 {
                        prop_assert_eq!(err, 1.0);
                    } else {
                        prop_assert_eq!(err, y.sqrt());
                    }
                }
            }
        }
    }
}
