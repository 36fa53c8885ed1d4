use std::collections::{BTreeMap, BTreeSet};

use log::debug;

/// Header parameter listing the scanned variables.
pub const PARAM_SCAN_VARS: &str = "scan_vars";
/// Header parameter naming the detector count column.
pub const PARAM_COUNT_VAR: &str = "count_var";
/// Header parameter naming the monitor count column.
pub const PARAM_MON_VAR: &str = "mon_var";
/// Header parameter holding the `;`-separated polarisation settings.
pub const PARAM_POLARIZATION: &str = "polarization";

// ---------------------------------------------------------------------------
// PolNames – labels of the polarisation commands
// ---------------------------------------------------------------------------

/// Labels under which polarisation settings appear in a file: the two
/// polariser directions and the two cross-channel intensities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolNames {
    pub p1: String,
    pub p2: String,
    pub i11: String,
    pub i10: String,
}

impl Default for PolNames {
    fn default() -> Self {
        Self {
            p1: "p1".into(),
            p2: "p2".into(),
            i11: "i11".into(),
            i10: "i10".into(),
        }
    }
}

impl PolNames {
    fn contains(&self, label: &str) -> bool {
        [&self.p1, &self.p2, &self.i11, &self.i10]
            .iter()
            .any(|l| l.as_str() == label)
    }
}

// ---------------------------------------------------------------------------
// InstrTable – what the de-interleaver needs from a loaded file
// ---------------------------------------------------------------------------

/// A loaded, column-oriented instrument table.
///
/// Format readers produce implementations of this trait; the converter only
/// talks to this interface and never parses files itself.
pub trait InstrTable {
    /// Ordered column names.
    fn col_names(&self) -> &[String];

    /// Column-major numeric data, one `Vec` per column, all equally long.
    fn columns(&self) -> &[Vec<f64>];

    /// Names of the scanned (independent) variables, in scan order.
    fn scanned_vars(&self) -> Vec<String>;

    /// Name of the detector count variable, if the file declares one.
    fn count_var(&self) -> Option<String>;

    /// Name of the monitor variable, if the file declares one.
    fn mon_var(&self) -> Option<String>;

    /// Set the labels used to recognise polarisation settings.
    fn set_pol_names(&mut self, names: PolNames);

    /// Parse the polarisation settings using the labels set before.
    fn parse_pol_data(&mut self);

    /// Number of distinct polarisation channels; 0 for unpolarised data.
    fn num_pol_channels(&self) -> usize;

    /// Index of the column with the given name.
    fn col_index(&self, name: &str) -> Option<usize> {
        self.col_names().iter().position(|c| c == name)
    }

    fn num_rows(&self) -> usize {
        self.columns().first().map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// ColumnTable – in-memory table produced by the loaders
// ---------------------------------------------------------------------------

/// Plain in-memory [`InstrTable`] with header parameters.
#[derive(Debug, Clone, Default)]
pub struct ColumnTable {
    col_names: Vec<String>,
    columns: Vec<Vec<f64>>,
    /// Header key/value parameters of the file.
    pub params: BTreeMap<String, String>,
    pol_names: PolNames,
    pol_states: Vec<BTreeMap<String, String>>,
}

impl ColumnTable {
    /// Build a table from named columns. Columns must be equally long.
    pub fn new(col_names: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(col_names.len(), columns.len());
        Self {
            col_names,
            columns,
            ..Default::default()
        }
    }

    /// Build a table from row-major data.
    pub fn from_rows(col_names: Vec<String>, rows: &[Vec<f64>]) -> Self {
        let mut columns = vec![Vec::with_capacity(rows.len()); col_names.len()];
        for row in rows {
            for (col, &v) in columns.iter_mut().zip(row) {
                col.push(v);
            }
        }
        Self::new(col_names, columns)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The parsed polarisation settings, one map per channel.
    pub fn pol_states(&self) -> &[BTreeMap<String, String>] {
        &self.pol_states
    }
}

impl InstrTable for ColumnTable {
    fn col_names(&self) -> &[String] {
        &self.col_names
    }

    fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    fn scanned_vars(&self) -> Vec<String> {
        self.param(PARAM_SCAN_VARS)
            .map(|s| {
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|tok| !tok.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn count_var(&self) -> Option<String> {
        self.param(PARAM_COUNT_VAR).map(str::to_string)
    }

    fn mon_var(&self) -> Option<String> {
        self.param(PARAM_MON_VAR).map(str::to_string)
    }

    fn set_pol_names(&mut self, names: PolNames) {
        self.pol_names = names;
    }

    /// Settings look like `p1=1 i11=1; p1=-1 i10=1`. Tokens with unknown
    /// labels are ignored; repeated settings count once.
    fn parse_pol_data(&mut self) {
        self.pol_states.clear();
        let Some(spec) = self.param(PARAM_POLARIZATION).map(str::to_string) else {
            return;
        };

        let mut seen = BTreeSet::new();
        for setting in spec.split(';') {
            let state: BTreeMap<String, String> = setting
                .split_whitespace()
                .filter_map(|tok| tok.split_once('='))
                .filter(|(label, _)| self.pol_names.contains(label))
                .map(|(label, value)| (label.to_string(), value.to_string()))
                .collect();

            if state.is_empty() {
                continue;
            }
            if seen.insert(state.clone()) {
                self.pol_states.push(state);
            }
        }
        debug!("parsed {} polarisation channel(s)", self.pol_states.len());
    }

    fn num_pol_channels(&self) -> usize {
        self.pol_states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ColumnTable {
        ColumnTable::from_rows(
            vec!["QH".into(), "EN".into(), "CNTS".into()],
            &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
    }

    #[test]
    fn test_from_rows_is_column_major() {
        let t = table();
        assert_eq!(t.columns()[0], vec![1.0, 4.0]);
        assert_eq!(t.columns()[2], vec![3.0, 6.0]);
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.col_index("EN"), Some(1));
        assert_eq!(t.col_index("M1"), None);
    }

    #[test]
    fn test_role_params() {
        let t = table()
            .with_param(PARAM_SCAN_VARS, "QH, EN")
            .with_param(PARAM_COUNT_VAR, "CNTS")
            .with_param(PARAM_MON_VAR, "  ");
        assert_eq!(t.scanned_vars(), vec!["QH", "EN"]);
        assert_eq!(t.count_var().as_deref(), Some("CNTS"));
        assert_eq!(t.mon_var(), None);
    }

    #[test]
    fn test_parse_pol_data_counts_distinct_settings() {
        let mut t = table().with_param(
            PARAM_POLARIZATION,
            "p1=1 i11=1; p1=-1 i10=1; p1=1 i11=1; foo=3",
        );
        t.set_pol_names(PolNames::default());
        t.parse_pol_data();
        assert_eq!(t.num_pol_channels(), 2);
        assert_eq!(t.pol_states()[1].get("i10").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_unpolarised_table_has_no_channels() {
        let mut t = table();
        t.parse_pol_data();
        assert_eq!(t.num_pol_channels(), 0);
    }

    #[test]
    fn test_custom_pol_labels() {
        let mut t = table().with_param(PARAM_POLARIZATION, "px=1; px=-1");
        t.parse_pol_data();
        assert_eq!(t.num_pol_channels(), 0);

        t.set_pol_names(PolNames {
            p1: "px".into(),
            ..PolNames::default()
        });
        t.parse_pol_data();
        assert_eq!(t.num_pol_channels(), 2);
    }
}
