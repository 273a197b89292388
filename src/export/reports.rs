//! The three report emitters. Each writes one artifact from the complete
//! record set; the orchestrator catches and logs each one's failure
//! independently so a bad spreadsheet never blocks the JSON dump.

use crate::export::MessageRecord;

use anyhow::Context as _;
use std::collections::BTreeSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Serialize the full ordered record set to `messages.json`.
pub fn write_json(records: &[MessageRecord], channel_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = channel_dir.join("messages.json");
    let content = serde_json::to_vec_pretty(records).context("failed to serialize records")?;
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write the fixed column subset to `messages.xlsx`, one row per record in
/// record order. The two list columns join their entries with newlines.
pub fn write_xlsx(records: &[MessageRecord], channel_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = channel_dir.join("messages.xlsx");
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();

    let headers = [
        "date/time",
        "name",
        "content",
        "attachment_urls",
        "attachment_paths",
    ];
    for (column, header) in headers.iter().enumerate() {
        worksheet.write_string(0, column as u16, *header)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = (index + 1) as u32;
        let urls: Vec<&str> = record
            .attachments
            .iter()
            .map(|a| a.url.as_str())
            .collect();
        let paths: Vec<&str> = record
            .attachments
            .iter()
            .filter_map(|a| a.local_path.as_deref())
            .collect();

        worksheet.write_string(row, 0, &record.timestamp)?;
        worksheet.write_string(row, 1, &record.name)?;
        worksheet.write_string(row, 2, &record.content)?;
        worksheet.write_string(row, 3, urls.join("\n"))?;
        worksheet.write_string(row, 4, paths.join("\n"))?;
    }

    workbook
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Partition records by the 4-character year prefix of their timestamp and
/// write one human-readable `messages_<year>.txt` per distinct year. Every
/// record lands in exactly one file.
pub fn write_yearly_text(
    records: &[MessageRecord],
    channel_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let years: BTreeSet<&str> = records
        .iter()
        .filter(|record| record.timestamp.len() >= 4)
        .map(|record| &record.timestamp[..4])
        .collect();

    let mut paths = Vec::with_capacity(years.len());
    for year in years {
        let path = channel_dir.join(format!("messages_{year}.txt"));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = std::io::BufWriter::new(file);

        for record in records.iter().filter(|r| r.timestamp.starts_with(year)) {
            writeln!(writer, "Date/Time: {}", record.timestamp)?;
            writeln!(writer, "Name: {}", record.name)?;
            writeln!(writer, "Content: {}", record.content)?;
            writeln!(writer, "Attachments:")?;
            for attachment in &record.attachments {
                writeln!(writer, "    URL: {}", attachment.url)?;
                match &attachment.local_path {
                    Some(local_path) => writeln!(writer, "    Local Path: {local_path}")?,
                    None => writeln!(writer, "    Local Path: (not downloaded)")?,
                }
            }
            writeln!(writer)?;
            writeln!(writer)?;
        }

        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        paths.push(path);
    }

    Ok(paths)
}
