//! Tab-separated projection of labelled records
//!
//! One line per labelled record, `last_modified\tidentifier\tlabel`, newest
//! first, no header row.

use std::io::Write;
use crate::record::Record;
use crate::storage::RecordStore;
use crate::Result;

pub const CONTENT_TYPE: &str = "text/csv";

/// Render one export line, including the trailing newline.
///
/// Unlabelled records have no line.
pub fn csv_line(record: &Record) -> Option<String> {
    let label = record.label.as_deref()?;
    Some(format!(
        "{}\t{}\t{}\n",
        record.last_modified_string(),
        record.identifier,
        label
    ))
}

/// Stream every labelled record into `writer`, returning the line count
pub fn write_csv<W: Write>(store: &RecordStore, writer: &mut W) -> Result<usize> {
    let lines = store.for_each_labelled(|rec| {
        if let Some(line) = csv_line(rec) {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    })?;
    writer.flush()?;
    tracing::debug!("Exported {} labelled records", lines);
    Ok(lines)
}

/// Render the whole export into memory
pub fn to_csv_string(store: &RecordStore) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(store, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_csv_line() {
        let ts = record::parse_timestamp("2016-05-01 10:20:30.5").unwrap();
        let rec = Record {
            identifier: "a.jpg".to_string(),
            label: Some("cat,animal".to_string()),
            last_modified: ts,
        };
        assert_eq!(
            csv_line(&rec).unwrap(),
            "2016-05-01 10:20:30.500000\ta.jpg\tcat,animal\n"
        );

        let unlabelled = Record { label: None, ..rec };
        assert!(csv_line(&unlabelled).is_none());
    }

    #[test]
    fn test_export_after_labelling() {
        let store = RecordStore::open_in_memory().unwrap();
        store.import_batch(["a.jpg", "b.jpg", "a.jpg"]).unwrap();
        store.update_label("a.jpg", &["cat", "animal"]).unwrap();
        store.update_label("missing.jpg", &["x"]).unwrap();

        let csv = to_csv_string(&store).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1);

        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields.len(), 3);
        assert!(record::parse_timestamp(fields[0]).is_ok());
        assert_eq!(&fields[1..], &["a.jpg", "cat,animal"]);
    }

    #[test]
    fn test_export_keeps_one_line_per_record() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(store.import_batch(["a.jpg", "b\tc.jpg"]).is_err());
        store.import_batch(["a.jpg", "b.jpg"]).unwrap();

        assert!(store.update_label("a.jpg", &["cat\nfake\tinjected\trow"]).is_err());
        store.update_label("a.jpg", &["cat"]).unwrap();
        store.update_label("b.jpg", &["dog"]).unwrap();

        let csv = to_csv_string(&store).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.split('\t').count() == 3));
    }

    #[test]
    fn test_export_empty_store() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut buf = Vec::new();
        assert_eq!(write_csv(&store, &mut buf).unwrap(), 0);
        assert!(buf.is_empty());
    }
}
