use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::data::{convert_instr_file, DataError, Dataset, RoleConfig};

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// Converted datasets, addressable by identifier.
#[derive(Debug, Default)]
pub struct Workspace {
    /// identifier → dataset, e.g. `sc012345` for the file `012345`.
    datasets: BTreeMap<String, Dataset>,

    /// Role configuration applied to every received file.
    pub roles: RoleConfig,

    /// Files that could not be converted, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl Workspace {
    pub fn new(roles: RoleConfig) -> Self {
        Self {
            roles,
            ..Default::default()
        }
    }

    /// Identifier under which a file's dataset is stored: `sc` followed by
    /// the file name up to its first dot.
    pub fn ident_for(path: &Path) -> String {
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = file_name.split('.').next().unwrap_or_default();
        format!("sc{base}")
    }

    /// Convert files into the workspace. Failing files are logged and
    /// recorded in `failures`; an existing identifier is kept.
    ///
    /// Returns the number of datasets added.
    pub fn receive_files<P: AsRef<Path>>(&mut self, files: &[P]) -> usize {
        let mut added = 0;
        for file in files {
            let path = file.as_ref();
            match self.receive_file(path) {
                Ok(true) => added += 1,
                Ok(false) => info!("{} already in workspace", Self::ident_for(path)),
                Err(e) => {
                    error!("File \"{}\" cannot be converted: {e}", path.display());
                    self.failures.push((path.to_path_buf(), e.to_string()));
                }
            }
        }
        added
    }

    fn receive_file(&mut self, path: &Path) -> Result<bool, DataError> {
        let ident = Self::ident_for(path);
        if self.datasets.contains_key(&ident) {
            return Ok(false);
        }
        let dataset = convert_instr_file(path, &self.roles)?;
        self.datasets.insert(ident, dataset);
        Ok(true)
    }

    /// Store a dataset under an identifier, replacing any previous one.
    pub fn insert(&mut self, ident: impl Into<String>, dataset: Dataset) -> Option<Dataset> {
        self.datasets.insert(ident.into(), dataset)
    }

    pub fn get(&self, ident: &str) -> Option<&Dataset> {
        self.datasets.get(ident)
    }

    pub fn remove(&mut self, ident: &str) -> Option<Dataset> {
        self.datasets.remove(ident)
    }

    /// Identifiers in sorted order.
    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ident_from_base_name() {
        assert_eq!(Workspace::ident_for(Path::new("/data/012345")), "sc012345");
        assert_eq!(Workspace::ident_for(Path::new("scan.dat")), "scscan");
        assert_eq!(Workspace::ident_for(Path::new("/data/scan.v2.dat")), "scscan");
    }

    #[test]
    fn test_receive_files_skips_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("042.dat");
        std::fs::write(&good, "# scan_vars: QH\nQH CNTS\n1 4\n2 9\n").unwrap();
        let empty = dir.path().join("043.dat");
        std::fs::write(&empty, "# nothing here\n").unwrap();
        let missing = dir.path().join("044.dat");

        let mut ws = Workspace::new(RoleConfig::default());
        let added = ws.receive_files(&[&good, &empty, &missing, &good]);

        assert_eq!(added, 1);
        assert_eq!(ws.idents().collect::<Vec<_>>(), vec!["sc042"]);
        assert_eq!(ws.failures.len(), 2);

        let ds = ws.get("sc042").unwrap();
        assert_eq!(ds.channel(0).unwrap().counter(0).unwrap().errors, vec![2.0, 3.0]);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut ws = Workspace::default();
        assert!(ws.insert("bg", Dataset::new()).is_none());
        assert_eq!(ws.len(), 1);
        assert!(ws.remove("bg").is_some());
        assert!(ws.is_empty());
    }
}
