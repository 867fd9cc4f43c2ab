//! Configuration management for budgetcast
//!
//! This module handles loading, validation, and management of
//! budgetcast configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Rule Set Selection ====================

/// How the amount column of a ledger is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountMode {
    /// Signed whole currency units
    Integer,
    /// Signed fixed-point amounts with up to two fractional digits
    Decimal,
}

impl Default for AmountMode {
    fn default() -> Self {
        AmountMode::Integer
    }
}

impl AmountMode {
    /// Number of fractional digits an amount may carry
    pub fn scale(&self) -> u32 {
        match self {
            AmountMode::Integer => 0,
            AmountMode::Decimal => 2,
        }
    }
}

impl std::str::FromStr for AmountMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integer" | "int" => Ok(AmountMode::Integer),
            "decimal" => Ok(AmountMode::Decimal),
            _ => Err(format!("Invalid amount mode: {}", s)),
        }
    }
}

impl std::fmt::Display for AmountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountMode::Integer => write!(f, "integer"),
            AmountMode::Decimal => write!(f, "decimal"),
        }
    }
}

/// Characters a category name may be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryCharset {
    /// ASCII letters and `_`
    LettersUnderscore,
    /// ASCII letters, `_` and `&`
    LettersUnderscoreAmpersand,
}

impl Default for CategoryCharset {
    fn default() -> Self {
        CategoryCharset::LettersUnderscoreAmpersand
    }
}

impl CategoryCharset {
    /// Check a single character against the charset
    pub fn allows(&self, c: char) -> bool {
        match self {
            CategoryCharset::LettersUnderscore => c.is_ascii_alphabetic() || c == '_',
            CategoryCharset::LettersUnderscoreAmpersand => {
                c.is_ascii_alphabetic() || c == '_' || c == '&'
            }
        }
    }
}

impl std::str::FromStr for CategoryCharset {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "letters_underscore" => Ok(CategoryCharset::LettersUnderscore),
            "letters_underscore_ampersand" => Ok(CategoryCharset::LettersUnderscoreAmpersand),
            _ => Err(format!("Invalid category charset: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryCharset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryCharset::LettersUnderscore => write!(f, "letters_underscore"),
            CategoryCharset::LettersUnderscoreAmpersand => write!(f, "letters_underscore_ampersand"),
        }
    }
}

// ==================== Configuration Types ====================

/// Ledger validation rules
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationConfig {
    /// Amount grammar (integer or decimal)
    #[serde(default)]
    pub amount_mode: AmountMode,
    /// Allowed category characters
    #[serde(default)]
    pub category_charset: CategoryCharset,
}

/// Year report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default destination of the CSV report
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    /// Minimum width of numeric columns in the text report
    #[serde(default = "default_min_column_width")]
    pub min_column_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
            min_column_width: default_min_column_width(),
        }
    }
}

fn default_output_file() -> PathBuf {
    PathBuf::from("Report.csv")
}

fn default_min_column_width() -> usize {
    8
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Validation rules
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.min_column_width == 0 || self.report.min_column_width > 64 {
            return Err(ConfigError::InvalidValue {
                field: "report.min_column_width".to_string(),
                reason: "Column width must be between 1 and 64".to_string(),
            });
        }

        if self.report.output_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "report.output_file".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.validation.amount_mode, AmountMode::Integer);
        assert_eq!(
            config.validation.category_charset,
            CategoryCharset::LettersUnderscoreAmpersand
        );
        assert_eq!(config.report.output_file, PathBuf::from("Report.csv"));
        assert_eq!(config.report.min_column_width, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_default_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.validation.amount_mode, AmountMode::Integer);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.report.min_column_width, 8);
    }

    #[test]
    fn test_partial_document() {
        let yaml = "validation:\n  amount_mode: decimal\n  category_charset: letters_underscore\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.validation.amount_mode, AmountMode::Decimal);
        assert_eq!(config.validation.category_charset, CategoryCharset::LettersUnderscore);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_yaml() {
        let result = Config::from_yaml("validation: [unclosed");
        assert!(matches!(result, Err(ConfigError::InvalidYaml(_))));

        match Config::from_yaml("validation:\n  amount_mode: octal\n") {
            Err(e @ ConfigError::InvalidYaml(_)) => assert!(e.to_string().contains("octal")),
            other => panic!("expected invalid yaml, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values() {
        let result = Config::from_yaml("report:\n  min_column_width: 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = Config::from_yaml("logging:\n  level: loud\n");
        match result {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "logging.level"),
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "report:\n  output_file: out.csv").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.report.output_file, PathBuf::from("out.csv"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/definitely/not/here/budgetcast.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_amount_mode_from_str() {
        assert_eq!("integer".parse::<AmountMode>().unwrap(), AmountMode::Integer);
        assert_eq!("DECIMAL".parse::<AmountMode>().unwrap(), AmountMode::Decimal);
        assert!("float".parse::<AmountMode>().is_err());
        assert_eq!(AmountMode::Decimal.to_string(), "decimal");
        assert_eq!(AmountMode::Integer.scale(), 0);
        assert_eq!(AmountMode::Decimal.scale(), 2);
    }

    #[test]
    fn test_category_charset() {
        let strict = CategoryCharset::LettersUnderscore;
        let extended = CategoryCharset::LettersUnderscoreAmpersand;
        assert!(strict.allows('a') && strict.allows('Z') && strict.allows('_'));
        assert!(!strict.allows('&'));
        assert!(extended.allows('&'));
        assert!(!extended.allows('1'));
        assert!(!extended.allows(' '));
        assert!(!extended.allows('é'));
        assert_eq!(
            "letters_underscore".parse::<CategoryCharset>().unwrap(),
            CategoryCharset::LettersUnderscore
        );
        assert_eq!(extended.to_string(), "letters_underscore_ampersand");
    }
}
