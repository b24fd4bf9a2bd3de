pub mod csv_store;
pub mod ledger;
pub mod store;

pub use csv_store::{render_csv, CsvStore};
pub use ledger::{ChequeLedger, DedupKey, SubmitOutcome};
pub use store::{ChequeStore, MemoryStore, StoreError};
