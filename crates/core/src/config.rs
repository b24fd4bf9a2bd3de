use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the date field is pulled out of a cheque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStrategy {
    /// Search the whole page, then normalize the first hit.
    #[default]
    FullText,
    /// Search the text under the DATE anchor and normalize in one pass.
    Region,
}

impl std::fmt::Display for DateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStrategy::FullText => write!(f, "full_text"),
            DateStrategy::Region => write!(f, "region"),
        }
    }
}

impl std::str::FromStr for DateStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_text" | "full-text" => Ok(DateStrategy::FullText),
            "region" => Ok(DateStrategy::Region),
            other => Err(format!("Unknown date strategy: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language code.
    pub lang: String,
    /// Directory holding `*.traineddata`; system default when unset.
    pub data_path: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self { lang: "eng".to_string(), data_path: None, timeout_secs: 60 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store_path: PathBuf,
    pub date_strategy: DateStrategy,
    /// Images processed at once; 0 means one per available core.
    pub concurrency: usize,
    pub ocr: OcrSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("cheque_data_output.csv"),
            date_strategy: DateStrategy::default(),
            concurrency: 0,
            ocr: OcrSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency > 0 {
            return self.concurrency;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let s = Settings::from_toml(
            r#"
            store_path = "/tmp/out.csv"
            date_strategy = "region"
            concurrency = 2

            [ocr]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(s.store_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(s.date_strategy, DateStrategy::Region);
        assert_eq!(s.effective_concurrency(), 2);
        assert_eq!(s.ocr.timeout_secs, 5);
        assert_eq!(s.ocr.lang, "eng");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            Settings::from_toml("date_strategy = \"sideways\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let s = Settings::load_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn auto_concurrency_is_at_least_one() {
        assert!(Settings::default().effective_concurrency() >= 1);
    }

    #[test]
    fn date_strategy_roundtrip() {
        for s in [DateStrategy::FullText, DateStrategy::Region] {
            assert_eq!(DateStrategy::from_str(&s.to_string()).unwrap(), s);
        }
    }
}
