use std::io::Write;
use std::path::Path;

use crate::data::{DataError, Dataset};

/// Column headers of the long-format export for `dataset`.
///
/// Series counts are taken from the first channel.
pub fn csv_headers(dataset: &Dataset) -> Vec<String> {
    let mut headers = vec!["channel".to_string()];
    if let Some(data) = dataset.channel(0) {
        headers.extend(data.axes().iter().map(|a| a.name.clone()));
        for i in 0..data.num_counters() {
            headers.push(format!("ctr{i}"));
            headers.push(format!("ctr{i}_err"));
        }
        for i in 0..data.num_monitors() {
            headers.push(format!("mon{i}"));
            headers.push(format!("mon{i}_err"));
        }
    }
    headers
}

/// Write `dataset` as CSV, one row per channel point.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), DataError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(csv_headers(dataset))?;

    for (channel, data) in dataset.channels().iter().enumerate() {
        for row in 0..data.num_points() {
            let mut record = vec![channel.to_string()];
            record.extend(data.axes().iter().map(|a| cell(&a.values, row)));
            for series in data.counters().iter().chain(data.monitors()) {
                record.push(cell(&series.values, row));
                record.push(cell(&series.errors, row));
            }
            out.write_record(&record)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `dataset` to a CSV file.
pub fn write_csv_file(dataset: &Dataset, path: &Path) -> Result<(), DataError> {
    let file = std::fs::File::create(path)?;
    write_csv(dataset, std::io::BufWriter::new(file))
}

fn cell(values: &[f64], row: usize) -> String {
    values.get(row).map(f64::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnTable, RoleConfig, convert_table};
    use crate::data::table::{PARAM_MON_VAR, PARAM_POLARIZATION, PARAM_SCAN_VARS};

    #[test]
    fn test_write_polarised_dataset() {
        let mut table = ColumnTable::from_rows(
            vec!["QH".into(), "CNTS".into(), "M1".into()],
            &[vec![1.0, 4.0, 9.0], vec![1.0, 0.0, 9.0], vec![2.0, 16.0, 9.0]],
        )
        .with_param(PARAM_SCAN_VARS, "QH")
        .with_param(PARAM_MON_VAR, "M1")
        .with_param(PARAM_POLARIZATION, "p1=1; p1=-1");
        let (dataset, _) = convert_table(&mut table, &RoleConfig::default()).unwrap();

        let mut buf = Vec::new();
        write_csv(&dataset, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "channel,QH,ctr0,ctr0_err,mon0,mon0_err");
        assert_eq!(lines[1], "0,1,4,2,9,3");
        assert_eq!(lines[2], "0,2,16,4,9,3");
        assert_eq!(lines[3], "1,1,0,1,9,3");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_empty_dataset_has_only_channel_header() {
        let mut buf = Vec::new();
        write_csv(&Dataset::new(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "channel\n");
    }
}
