use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use cheque_core::{ChequeRecord, COLUMNS};
use tracing::debug;

use crate::store::{ChequeStore, StoreError};

/// Spreadsheet-compatible table on disk, one row per cheque.
/// Rows are only ever appended; the header is written when the file is new.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Open the table at `path`, creating it (and its parent directory) with
    /// just the header row if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        if needs_header(&store.path)? {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut w = csv::Writer::from_path(&store.path)?;
            w.write_record(COLUMNS)?;
            w.flush()?;
            debug!(path = %store.path.display(), "Created cheque table");
        }
        Ok(store)
    }

}

impl ChequeStore for CsvStore {
    fn load(&self) -> Result<Vec<ChequeRecord>, StoreError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    fn append(&mut self, record: &ChequeRecord) -> Result<(), StoreError> {
        let header = needs_header(&self.path)?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if header {
            w.write_record(COLUMNS)?;
        }
        w.serialize(record)?;
        w.flush()?;
        Ok(())
    }
}

fn needs_header(path: &Path) -> Result<bool, StoreError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Render rows as a CSV table with the fixed header, even when empty.
pub fn render_csv(records: &[ChequeRecord]) -> Result<Vec<u8>, StoreError> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    w.write_record(COLUMNS)?;
    for record in records {
        w.serialize(record)?;
    }
    w.into_inner().map_err(|e| StoreError::Io(e.into_error()))
}
