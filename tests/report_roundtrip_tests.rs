//! Result table written by one run can be read back as the same records
use chrono::NaiveDate;
use tempfile::TempDir;

use catalog_harvest::domain::{CategoryRejection, OutputRecord};
use catalog_harvest::infrastructure::{HarvestReport, OutputConfig, ReportError, ReportWriter, read_output_table};

fn record(title: &str, contributors: &str, url: &str, day: u32) -> OutputRecord {
    OutputRecord {
        title: title.to_string(),
        contributors: contributors.to_string(),
        label: "Acme, Ltd.".to_string(),
        album_url: url.to_string(),
        release_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
    }
}

fn writer_in(dir: &TempDir) -> ReportWriter {
    ReportWriter::new(OutputConfig {
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    })
}

#[test]
fn table_preserves_order_and_awkward_fields() {
    let records = vec![
        record("Symphony No. 9 \"Choral\"", "Orchestra A, Conductor B", "https://shop.example/album/x9", 3),
        record("Préludes; Études", "Ånna Ørsted", "https://shop.example/album/pr", 17),
        record("Plain", "Solo", "https://shop.example/album/pl", 31),
    ];
    let dir = TempDir::new().unwrap();
    let written = writer_in(&dir)
        .write_all(&HarvestReport {
            records: &records,
            category_rejections: &[],
            missing_dates: &[],
        })
        .unwrap();

    let read_back = read_output_table(&written.table).unwrap();
    assert_eq!(read_back, records);
    assert_eq!(
        read_back.iter().map(|r| r.album_url.as_str()).collect::<Vec<_>>(),
        std::fs::read_to_string(&written.links).unwrap().lines().collect::<Vec<_>>()
    );
}

#[test]
fn empty_run_still_writes_headers_only() {
    let dir = TempDir::new().unwrap();
    let written = writer_in(&dir)
        .write_all(&HarvestReport {
            records: &[],
            category_rejections: &[],
            missing_dates: &[],
        })
        .unwrap();

    assert!(read_output_table(&written.table).unwrap().is_empty());
    assert_eq!(std::fs::read_to_string(&written.links).unwrap(), "");
    assert_eq!(written.paths().len(), 2);
}

#[test]
fn side_report_written_only_when_needed() {
    let rejected = vec![CategoryRejection {
        record: record("Blue", "Sam Sax", "https://shop.example/album/blue", 9),
        observed_category: None,
    }];
    let dir = TempDir::new().unwrap();
    let written = writer_in(&dir)
        .write_all(&HarvestReport {
            records: &[],
            category_rejections: &rejected,
            missing_dates: &[],
        })
        .unwrap();

    let path = written.rejected_by_genre.unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("album_title,main_artists,label,album_url,release_date,genre_first"));
    assert!(text.contains("(missing)"));
    assert!(written.missing_dates.is_none());
}

#[test]
fn foreign_table_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other.csv");
    std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();

    assert!(matches!(read_output_table(&path), Err(ReportError::UnexpectedHeader { .. })));
}

#[test]
fn bad_date_cell_names_the_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.csv");
    std::fs::write(
        &path,
        "album_title,main_artists,label,album_url,release_date\nA,B,C,https://x/album/1,2026-01-03\n",
    )
    .unwrap();

    match read_output_table(&path) {
        Err(ReportError::MalformedRow { row, .. }) => assert_eq!(row, 2),
        other => panic!("expected malformed row, got {:?}", other),
    }
}
