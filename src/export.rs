//! CSV export of harvested records.

use crate::types::ListingRecord;
use std::io::Write;
use std::path::Path;

/// Write a header row of [`ListingRecord::COLUMNS`] followed by one row per record.
/// Absent fields become empty cells.
pub fn write_csv<W: Write>(writer: W, records: &[ListingRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ListingRecord::COLUMNS)?;
    for record in records {
        wtr.write_record(record.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `records` to `path`, creating parent directories as needed.
/// An existing file is replaced.
pub fn save_csv(path: &Path, records: &[ListingRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), records)?;
    tracing::info!("💾 Saved {} record(s) to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only_for_empty_run() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("company,title,"));
    }

    #[test]
    fn test_commas_and_newlines_are_quoted() {
        let record = ListingRecord {
            company: Some("Acme, Inc.".into()),
            full_description: Some("line one\nline two".into()),
            ..ListingRecord::default()
        };
        let mut out = Vec::new();
        write_csv(&mut out, &[record.clone()]).unwrap();

        let mut rdr = csv::Reader::from_reader(out.as_slice());
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "Acme, Inc.");
        assert_eq!(&row[1], "");
        assert_eq!(row.len(), ListingRecord::COLUMNS.len());
    }
}
