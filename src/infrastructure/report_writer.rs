//! Output files
//!
//! - link list: one accepted URL per line
//! - result table: CSV, one row per deduplicated record
//! - genre rejections: CSV side report, only when something was rejected
//! - missing detail dates: tab-separated diagnostic, only when non-empty

#![allow(clippy::uninlined_format_args)]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::filter::{CategoryRejection, MissingDateDiagnostic};
use crate::domain::{OutputRecord, format_day_month_year, parse_day_month_year};
use crate::infrastructure::config::OutputConfig;

pub const TABLE_HEADER: [&str; 5] = ["album_title", "main_artists", "label", "album_url", "release_date"];
pub const REJECTED_HEADER: [&str; 6] = [
    "album_title",
    "main_artists",
    "label",
    "album_url",
    "release_date",
    "genre_first",
];
pub const MISSING_DATE_HEADER: [&str; 5] = [
    "label",
    "album_url",
    "listing_release_date",
    "album_title",
    "main_artists",
];

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unexpected header in {path:?}: {found:?}")]
    UnexpectedHeader { path: PathBuf, found: Vec<String> },

    #[error("Row {row} of {path:?} is malformed: {reason}")]
    MalformedRow { path: PathBuf, row: usize, reason: String },
}

impl ReportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Everything a finished (or interrupted) run hands to the writer
#[derive(Debug, Clone, Copy)]
pub struct HarvestReport<'a> {
    pub records: &'a [OutputRecord],
    pub category_rejections: &'a [CategoryRejection],
    pub missing_dates: &'a [MissingDateDiagnostic],
}

/// Paths actually written by [`ReportWriter::write_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub links: PathBuf,
    pub table: PathBuf,
    pub rejected_by_genre: Option<PathBuf>,
    pub missing_dates: Option<PathBuf>,
}

impl WrittenFiles {
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.links.as_path(), self.table.as_path()];
        paths.extend(self.rejected_by_genre.as_deref());
        paths.extend(self.missing_dates.as_deref());
        paths
    }
}

pub struct ReportWriter {
    output: OutputConfig,
}

impl ReportWriter {
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    pub fn write_all(&self, report: &HarvestReport<'_>) -> ReportResult<WrittenFiles> {
        let dir = &self.output.output_dir;
        fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;

        let links = self.output.links_path();
        write_links(&links, report.records)?;

        let table = self.output.table_path();
        write_table(&table, report.records)?;

        let rejected_by_genre = if report.category_rejections.is_empty() {
            None
        } else {
            let path = self.output.rejected_by_genre_path();
            write_rejected_by_genre(&path, report.category_rejections)?;
            Some(path)
        };

        let missing_dates = if report.missing_dates.is_empty() {
            None
        } else {
            let path = self.output.missing_date_path();
            write_missing_dates(&path, report.missing_dates)?;
            Some(path)
        };

        info!("💾 Wrote {} records to {:?}", report.records.len(), table);
        Ok(WrittenFiles {
            links,
            table,
            rejected_by_genre,
            missing_dates,
        })
    }
}

pub fn write_links(path: &Path, records: &[OutputRecord]) -> ReportResult<()> {
    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{}", record.album_url).map_err(|e| ReportError::io(path, e))?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;
    debug!("Wrote {} links to {:?}", records.len(), path);
    Ok(())
}

pub fn write_table(path: &Path, records: &[OutputRecord]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ReportError::csv(path, e))?;
    writer.write_record(TABLE_HEADER).map_err(|e| ReportError::csv(path, e))?;
    for record in records {
        writer
            .write_record([
                record.title.as_str(),
                record.contributors.as_str(),
                record.label.as_str(),
                record.album_url.as_str(),
                format_day_month_year(record.release_date).as_str(),
            ])
            .map_err(|e| ReportError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))
}

pub fn write_rejected_by_genre(path: &Path, rows: &[CategoryRejection]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ReportError::csv(path, e))?;
    writer.write_record(REJECTED_HEADER).map_err(|e| ReportError::csv(path, e))?;
    for row in rows {
        let record = &row.record;
        writer
            .write_record([
                record.title.as_str(),
                record.contributors.as_str(),
                record.label.as_str(),
                record.album_url.as_str(),
                format_day_month_year(record.release_date).as_str(),
                row.observed_label(),
            ])
            .map_err(|e| ReportError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;
    info!("Genre rejections written to {:?} ({} rows)", path, rows.len());
    Ok(())
}

pub fn write_missing_dates(path: &Path, rows: &[MissingDateDiagnostic]) -> ReportResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| ReportError::csv(path, e))?;
    writer.write_record(MISSING_DATE_HEADER).map_err(|e| ReportError::csv(path, e))?;
    for row in rows {
        writer
            .write_record([
                row.label.as_str(),
                row.album_url.as_str(),
                format_day_month_year(row.listing_release_date).as_str(),
                row.title.as_str(),
                row.contributors.as_str(),
            ])
            .map_err(|e| ReportError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;
    info!("Albums without a detail-page date written to {:?} ({} rows)", path, rows.len());
    Ok(())
}

/// Read a result table back, in file order
pub fn read_output_table(path: &Path) -> ReportResult<Vec<OutputRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ReportError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| ReportError::csv(path, e))?;
    if headers.iter().ne(TABLE_HEADER.iter().copied()) {
        return Err(ReportError::UnexpectedHeader {
            path: path.to_path_buf(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ReportError::csv(path, e))?;
        let row_number = index + 2;
        let field = |i: usize| row.get(i).unwrap_or_default().to_string();

        let raw_date = field(4);
        let release_date = parse_day_month_year(&raw_date).map_err(|e| ReportError::MalformedRow {
            path: path.to_path_buf(),
            row: row_number,
            reason: format!("release_date '{}': {}", raw_date, e),
        })?;

        records.push(OutputRecord {
            title: field(0),
            contributors: field(1),
            label: field(2),
            album_url: field(3),
            release_date,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(title: &str, url: &str, day: u32) -> OutputRecord {
        OutputRecord {
            title: title.to_string(),
            contributors: "Jane Doe, John Roe".to_string(),
            label: "Acme".to_string(),
            album_url: url.to_string(),
            release_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
        }
    }

    fn writer_in(dir: &TempDir) -> ReportWriter {
        ReportWriter::new(OutputConfig {
            output_dir: dir.path().join("out"),
            ..Default::default()
        })
    }

    #[test]
    fn table_uses_day_month_year_dates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        write_table(&path, &[record("Suites, Vol. 1", "https://s.example/album/1", 5)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("album_title,main_artists,label,album_url,release_date"));
        assert_eq!(
            lines.next(),
            Some("\"Suites, Vol. 1\",\"Jane Doe, John Roe\",Acme,https://s.example/album/1,05.01.2026")
        );
    }

    #[test]
    fn side_reports_are_skipped_when_empty() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("A", "https://s.example/album/a", 3)];
        let report = HarvestReport {
            records: &records,
            category_rejections: &[],
            missing_dates: &[],
        };

        let written = writer_in(&dir).write_all(&report).unwrap();
        assert!(written.rejected_by_genre.is_none());
        assert!(written.missing_dates.is_none());
        assert_eq!(written.paths().len(), 2);
        assert_eq!(fs::read_to_string(&written.links).unwrap(), "https://s.example/album/a\n");
    }

    #[test]
    fn empty_run_writes_empty_link_list_and_header_only_table() {
        let dir = TempDir::new().unwrap();
        let report = HarvestReport {
            records: &[],
            category_rejections: &[],
            missing_dates: &[],
        };

        let written = writer_in(&dir).write_all(&report).unwrap();
        assert_eq!(fs::read_to_string(&written.links).unwrap(), "");
        assert!(read_output_table(&written.table).unwrap().is_empty());
    }

    #[test]
    fn writes_side_reports() {
        let dir = TempDir::new().unwrap();
        let rejections = vec![
            CategoryRejection {
                record: record("Pop Hits", "https://s.example/album/p", 7),
                observed_category: Some("Pop".to_string()),
            },
            CategoryRejection {
                record: record("Unknown", "https://s.example/album/u", 8),
                observed_category: None,
            },
        ];
        let missing = vec![MissingDateDiagnostic {
            label: "Acme".to_string(),
            album_url: "https://s.example/album/m".to_string(),
            listing_release_date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
            title: "Motets".to_string(),
            contributors: "Choir".to_string(),
        }];
        let report = HarvestReport {
            records: &[],
            category_rejections: &rejections,
            missing_dates: &missing,
        };

        let written = writer_in(&dir).write_all(&report).unwrap();

        let rejected = fs::read_to_string(written.rejected_by_genre.unwrap()).unwrap();
        let rows: Vec<&str> = rejected.lines().collect();
        assert_eq!(rows[0], "album_title,main_artists,label,album_url,release_date,genre_first");
        assert!(rows[1].ends_with(",07.01.2026,Pop"));
        assert!(rows[2].ends_with(",08.01.2026,(missing)"));

        let diagnostics = fs::read_to_string(written.missing_dates.unwrap()).unwrap();
        assert_eq!(
            diagnostics,
            "label\talbum_url\tlisting_release_date\talbum_title\tmain_artists\n\
             Acme\thttps://s.example/album/m\t09.01.2026\tMotets\tChoir\n"
        );
    }

    #[test]
    fn read_back_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        let records = vec![
            record("B \"quoted\"", "https://s.example/album/b", 2),
            record("A", "https://s.example/album/a", 1),
            record("C\nmultiline", "https://s.example/album/c", 3),
        ];
        write_table(&path, &records).unwrap();

        assert_eq!(read_output_table(&path).unwrap(), records);
    }

    #[test]
    fn read_back_rejects_foreign_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(read_output_table(&path), Err(ReportError::UnexpectedHeader { .. })));

        fs::write(&path, "album_title,main_artists,label,album_url,release_date\nT,A,L,U,2026-01-01\n").unwrap();
        assert!(matches!(
            read_output_table(&path),
            Err(ReportError::MalformedRow { row: 2, .. })
        ));
    }
}
