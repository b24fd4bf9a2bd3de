pub mod bank;
pub mod config;
pub mod record;

pub use bank::{bank_for_prefix, IFSC_PREFIXES, KNOWN_BANKS, UNKNOWN_BANK};
pub use config::{ConfigError, DateStrategy, OcrSettings, Settings};
pub use record::{ChequeRecord, COLUMNS};
