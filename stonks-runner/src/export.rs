//! Snapshot export: one JSON file per ranked view.
//!
//! Each file is a JSON array of rows, pretty-printed with 4-space indentation
//! and written atomically (`<name>.tmp`, then rename). Decimals become plain
//! JSON numbers here; a missing P/E becomes `null`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use stonks_core::domain::EntityRecord;
use thiserror::Error;

use crate::ranking::{RankedView, RankingKey};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize {key} view: {source}")]
    Serialize {
        key: RankingKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One persisted view entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub name: String,
    pub code: String,
    pub price: f64,
    #[serde(rename = "P/E")]
    pub pe: Option<f64>,
    pub potential_profit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth: Option<f64>,
}

impl SnapshotRow {
    pub fn from_record(record: &EntityRecord, with_growth: bool) -> Self {
        Self {
            name: record.name.clone(),
            code: record.code.clone(),
            price: record.price.to_f64().unwrap_or_default(),
            pe: record.pe.to_f64(),
            potential_profit: record.potential_profit.to_f64().unwrap_or_default(),
            growth: with_growth.then_some(record.growth),
        }
    }
}

/// The rows a view persists, in rank order.
pub fn view_rows(view: &RankedView) -> Vec<SnapshotRow> {
    let with_growth = view.key.includes_growth();
    view.records
        .iter()
        .map(|r| SnapshotRow::from_record(r, with_growth))
        .collect()
}

/// Serialize a view as 4-space indented JSON.
pub fn render_view(view: &RankedView) -> Result<Vec<u8>, ExportError> {
    let rows = view_rows(view);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    rows.serialize(&mut ser)
        .map_err(|source| ExportError::Serialize {
            key: view.key,
            source,
        })?;
    Ok(buf)
}

/// Write one view to `dir/<file name>`, replacing any previous snapshot.
pub fn persist_view(dir: &Path, view: &RankedView) -> Result<PathBuf, ExportError> {
    let bytes = render_view(view)?;
    let path = dir.join(view.key.file_name());
    replace_file(&path, |file| file.write_all(&bytes))?;

    tracing::debug!(path = %path.display(), rows = view.len(), "snapshot written");
    Ok(path)
}

/// Fill `<path>.tmp`, sync it, then rename it over `path`. The temp file is
/// removed on any failure after it was created.
fn replace_file(
    path: &Path,
    fill: impl FnOnce(&mut fs::File) -> io::Result<()>,
) -> Result<(), ExportError> {
    let tmp = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).map_err(write_error(&tmp))?;
    let filled = fill(&mut file).and_then(|()| file.sync_all());
    drop(file);

    let result = match filled {
        Ok(()) => fs::rename(&tmp, path).map_err(write_error(path)),
        Err(source) => Err(ExportError::Write {
            path: tmp.clone(),
            source,
        }),
    };
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Write { path, source }
}

/// Write every view, creating `dir` if needed. Stops at the first failure;
/// snapshots already written stay on disk.
pub fn persist_views(dir: &Path, views: &[RankedView]) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(write_error(dir))?;
    views.iter().map(|view| persist_view(dir, view)).collect()
}

/// Read a snapshot back.
pub fn load_view(path: &Path) -> Result<Vec<SnapshotRow>, ExportError> {
    let content = fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ExportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank_all;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use stonks_core::domain::PeRatio;

    fn apple() -> EntityRecord {
        EntityRecord {
            name: "Apple".into(),
            code: "AAPL".into(),
            price: Decimal::from_str("1000.5").unwrap(),
            pe: PeRatio::Value(Decimal::from_str("30.25").unwrap()),
            potential_profit: Decimal::from(50),
            growth: 48.2,
        }
    }

    #[test]
    fn growth_column_only_in_growth_view() {
        let views = rank_all(&[apple()], 10);
        for view in &views {
            let json = String::from_utf8(render_view(view).unwrap()).unwrap();
            assert_eq!(
                json.contains("\"growth\""),
                view.key == RankingKey::Growth,
                "{}",
                view.key
            );
        }
    }

    #[test]
    fn rendering_uses_four_space_indent_and_keys() {
        let view = RankedView::build(RankingKey::Price, &[apple()], 10);
        let json = String::from_utf8(render_view(&view).unwrap()).unwrap();
        assert!(json.starts_with("[\n    {\n        \"name\": \"Apple\""));
        assert!(json.contains("\"P/E\": 30.25"));
        assert!(json.contains("\"price\": 1000.5"));
        assert!(json.contains("\"potential_profit\": 50.0"));
    }

    #[test]
    fn missing_pe_is_null() {
        let mut record = apple();
        record.pe = PeRatio::Missing;
        let row = SnapshotRow::from_record(&record, false);
        assert_eq!(row.pe, None);
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"P/E\":null"));
    }

    #[test]
    fn non_ascii_names_are_not_escaped() {
        let mut record = apple();
        record.name = "Nestlé".into();
        let view = RankedView::build(RankingKey::Price, &[record], 10);
        let json = String::from_utf8(render_view(&view).unwrap()).unwrap();
        assert!(json.contains("Nestlé"));
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RankingKey::Price.file_name());

        let err = replace_file(&path, |file| {
            file.write_all(b"[")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, ExportError::Write { .. }));
        assert!(!path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn persisted_view_replaces_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let view = RankedView::build(RankingKey::Price, &[apple()], 10);

        let path = persist_view(dir.path(), &view).unwrap();

        assert_eq!(load_view(&path).unwrap().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn empty_view_renders_empty_array() {
        let view = RankedView::build(RankingKey::PeRatio, &[], 10);
        assert_eq!(render_view(&view).unwrap(), b"[]");
    }
}
