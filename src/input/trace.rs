//! Code for reading hourly generation trace CSV files.
use super::input_err_msg;
use crate::id::LocationID;
use crate::trace::TraceTable;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use std::io::Read;
use std::path::Path;

/// Read a table of hourly capacity factors from a CSV file.
///
/// The header row gives the location names and each following row holds one hour.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_trace_table(file_path: &Path) -> Result<TraceTable> {
    let reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;
    read_trace_table_from_reader(reader).with_context(|| input_err_msg(file_path))
}

fn read_trace_table_from_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<TraceTable> {
    let locations: Vec<LocationID> = reader
        .headers()?
        .iter()
        .map(|name| LocationID::from(name.trim()))
        .collect();
    ensure!(!locations.is_empty(), "Trace file has no location columns");

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); locations.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        ensure!(
            record.len() == locations.len(),
            "Row {} has {} values, expected {}",
            row + 1,
            record.len(),
            locations.len()
        );

        for (column, value) in columns.iter_mut().zip(record.iter()) {
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid capacity factor '{value}' in row {}", row + 1))?;
            ensure!(
                (0.0..=1.0).contains(&value),
                "Capacity factor {value} in row {} is not between 0 and 1",
                row + 1
            );
            column.push(value);
        }
    }

    let mut map = IndexMap::with_capacity(locations.len());
    for (location, column) in locations.into_iter().zip(columns) {
        ensure!(
            map.insert(location.clone(), column).is_none(),
            "Duplicate location {location}"
        );
    }

    TraceTable::new(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn reader(contents: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(contents.as_bytes())
    }

    #[test]
    fn test_read_trace_table_from_reader() {
        let table = read_trace_table_from_reader(reader("a, b\n0.1,0.2\n0.3,0.4\n")).unwrap();
        assert_eq!(table.hours(), 2);
        assert_eq!(table.get("a").unwrap(), &[0.1, 0.3]);
        assert_eq!(table.get("b").unwrap(), &[0.2, 0.4]);
    }

    #[test]
    fn test_read_trace_table_from_reader_out_of_range() {
        assert_error!(
            read_trace_table_from_reader(reader("a\n1.5\n")),
            "Capacity factor 1.5 in row 1 is not between 0 and 1"
        );
    }

    #[test]
    fn test_read_trace_table_from_reader_not_a_number() {
        assert_error!(
            read_trace_table_from_reader(reader("a\nabc\n")),
            "Invalid capacity factor 'abc' in row 1"
        );
    }

    #[test]
    fn test_read_trace_table_from_reader_duplicate_location() {
        assert_error!(
            read_trace_table_from_reader(reader("a,a\n0.1,0.2\n")),
            "Duplicate location a"
        );
    }

    #[test]
    fn test_read_trace_table() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("solar_traces.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "north,south\n0.0,0.5\n0.25,1.0").unwrap();
        }

        let table = read_trace_table(&file_path).unwrap();
        assert_eq!(table.iter_locations().count(), 2);
        assert_eq!(table.get("south").unwrap(), &[0.5, 1.0]);
    }
}
