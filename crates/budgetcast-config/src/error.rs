//! Errors raised while loading a budgetcast configuration
//!
//! YAML and IO failures keep their cause, so a bad `amount_mode` or an
//! unreadable file is reported with the offending value and where it was.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Machine-readable code for each [`ConfigError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigErrorCode {
    FileNotFound,
    InvalidYaml,
    MissingField,
    InvalidValue,
    IoError,
}

impl ConfigErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ConfigErrorCode::InvalidYaml => "INVALID_YAML",
            ConfigErrorCode::MissingField => "MISSING_FIELD",
            ConfigErrorCode::InvalidValue => "INVALID_VALUE",
            ConfigErrorCode::IoError => "IO_ERROR",
        }
    }
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position in the YAML document, 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YamlLocation {
    pub line: usize,
    pub column: usize,
}

impl From<serde_yaml::Location> for YamlLocation {
    fn from(location: serde_yaml::Location) -> Self {
        Self {
            line: location.line(),
            column: location.column(),
        }
    }
}

/// A [`ConfigError`] laid out for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigErrorDetails {
    pub code: ConfigErrorCode,
    pub message: String,
    /// Dotted config key, e.g. `report.min_column_width`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<YamlLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ConfigErrorDetails {
    fn new(error: &ConfigError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            field: None,
            location: None,
            suggestions: Vec::new(),
        }
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl std::fmt::Display for ConfigErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        match (&self.field, self.location) {
            (Some(field), Some(at)) => write!(f, " ({} at line {}, column {})", field, at.line, at.column)?,
            (Some(field), None) => write!(f, " ({})", field)?,
            (None, Some(at)) => write!(f, " (line {}, column {})", at.line, at.column)?,
            (None, None) => {}
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  hint: {}", suggestion)?;
        }
        Ok(())
    }
}

/// How a caller should treat a [`ConfigError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigErrorSeverity {
    /// Defaults can stand in
    Warning,
    Error,
}

impl std::fmt::Display for ConfigErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigErrorSeverity::Warning => write!(f, "warning"),
            ConfigErrorSeverity::Error => write!(f, "error"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid config YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("Missing config field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cannot read config file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> ConfigErrorCode {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorCode::FileNotFound,
            ConfigError::InvalidYaml(_) => ConfigErrorCode::InvalidYaml,
            ConfigError::MissingField { .. } => ConfigErrorCode::MissingField,
            ConfigError::InvalidValue { .. } => ConfigErrorCode::InvalidValue,
            ConfigError::IoError { .. } => ConfigErrorCode::IoError,
        }
    }

    pub fn severity(&self) -> ConfigErrorSeverity {
        match self {
            // The CLI runs on defaults when no config file exists
            ConfigError::FileNotFound { .. } => ConfigErrorSeverity::Warning,
            _ => ConfigErrorSeverity::Error,
        }
    }

    /// Where in the document a YAML error was detected
    pub fn location(&self) -> Option<YamlLocation> {
        match self {
            ConfigError::InvalidYaml(e) => e.location().map(YamlLocation::from),
            _ => None,
        }
    }

    pub fn to_details(&self) -> ConfigErrorDetails {
        let mut details = ConfigErrorDetails::new(self);
        details.location = self.location();

        match self {
            ConfigError::FileNotFound { path } => details
                .suggest(format!("Create {} or pass another file with --config.", path))
                .suggest("Run `budgetcast default-config` to print a starting point."),
            ConfigError::InvalidYaml(_) => details
                .suggest("amount_mode takes integer or decimal; category_charset takes letters_underscore or letters_underscore_ampersand.")
                .suggest("Run `budgetcast default-config` to print a valid template."),
            ConfigError::MissingField { field } => {
                details.field = Some(field.clone());
                details.suggest(format!("Set '{}' in the config file.", field))
            }
            ConfigError::InvalidValue { field, reason } => {
                details.field = Some(field.clone());
                details.suggest(reason.clone())
            }
            ConfigError::IoError { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => details.suggest("Check the file permissions."),
                _ => details,
            },
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
