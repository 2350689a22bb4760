//! Label manifest reader
//!
//! One label per line as `<Name> - <URL>`. Blank lines and `#` comments are ignored;
//! malformed lines are skipped with a warning naming the line number.

#![allow(clippy::uninlined_format_args)]

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::domain::LabelSource;

const SEPARATOR: &str = " - ";

/// Why a manifest line was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedLine {
    MissingSeparator { line: usize },
    InvalidFormat { line: usize },
}

impl SkippedLine {
    pub fn line(&self) -> usize {
        match self {
            Self::MissingSeparator { line } | Self::InvalidFormat { line } => *line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub labels: Vec<LabelSource>,
    pub skipped: Vec<SkippedLine>,
}

pub fn parse_manifest(text: &str) -> Manifest {
    let mut manifest = Manifest::default();

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, url)) = line.split_once(SEPARATOR) else {
            warn!("⚠️ Skipping line {}: missing ' - ' separator", line_number);
            manifest.skipped.push(SkippedLine::MissingSeparator { line: line_number });
            continue;
        };

        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || !url.starts_with("http") {
            warn!("⚠️ Skipping line {}: expected '<Name> - <http URL>'", line_number);
            manifest.skipped.push(SkippedLine::InvalidFormat { line: line_number });
            continue;
        }

        manifest.labels.push(LabelSource::new(name, url));
    }

    manifest
}

pub async fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read label manifest {:?}", path))?;
    let manifest = parse_manifest(&text);
    info!(
        "📋 Loaded {} labels from {:?} ({} lines skipped)",
        manifest.labels.len(),
        path,
        manifest.skipped.len()
    );
    Ok(manifest)
}
