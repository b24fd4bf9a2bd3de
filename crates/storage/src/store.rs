use cheque_core::ChequeRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Table of cheque records owned by some persistence backend.
/// The extraction core only ever loads the whole table or appends one row.
pub trait ChequeStore: Send {
    fn load(&self) -> Result<Vec<ChequeRecord>, StoreError>;
    fn append(&mut self, record: &ChequeRecord) -> Result<(), StoreError>;
}

impl<T: ChequeStore + ?Sized> ChequeStore for Box<T> {
    fn load(&self) -> Result<Vec<ChequeRecord>, StoreError> {
        (**self).load()
    }

    fn append(&mut self, record: &ChequeRecord) -> Result<(), StoreError> {
        (**self).append(record)
    }
}

/// Keeps rows in a `Vec`; nothing is written to disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<ChequeRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<ChequeRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ChequeRecord] {
        &self.rows
    }
}

impl ChequeStore for MemoryStore {
    fn load(&self) -> Result<Vec<ChequeRecord>, StoreError> {
        Ok(self.rows.clone())
    }

    fn append(&mut self, record: &ChequeRecord) -> Result<(), StoreError> {
        self.rows.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_appends_in_order() {
        let mut store = MemoryStore::new();
        for name in ["a.png", "b.png"] {
            store
                .append(&ChequeRecord {
                    filename: name.into(),
                    bank_name: "Unknown".into(),
                    ifsc_code: String::new(),
                    amount: None,
                    date: String::new(),
                })
                .unwrap();
        }
        let names: Vec<_> = store.load().unwrap().into_iter().map(|r| r.filename).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }
}
