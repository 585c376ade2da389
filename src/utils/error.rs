use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Unsupported source '{source_name}': expected an http(s) URL or a .csv/.xlsx/.xls/.json file")]
    UnsupportedSource { source_name: String },

    #[error("HTTP request to {url} returned status {status}")]
    Http { url: String, status: u16 },

    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode {location}: {message}")]
    Decode { location: String, message: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist table '{table}' to {target}: {message}")]
    Persistence {
        target: String,
        table: String,
        message: String,
    },

    #[error("Invalid dataset shape: {message}")]
    Shape { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfig { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Network,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(location: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            location: location.into(),
            message: message.to_string(),
        }
    }

    pub fn persistence(
        target: impl Into<String>,
        table: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::Persistence {
            target: target.into(),
            table: table.into(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::MissingConfig { .. } => {
                ErrorCategory::Configuration
            }
            Self::UnsupportedFormat { .. } | Self::UnsupportedSource { .. } => {
                ErrorCategory::Source
            }
            Self::Http { .. } | Self::Request { .. } => ErrorCategory::Network,
            Self::Decode { .. } | Self::Shape { .. } => ErrorCategory::Data,
            Self::Io { .. } | Self::Persistence { .. } => ErrorCategory::Storage,
        }
    }

    /// 嚴重程度決定 CLI 的退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 遠端暫時性錯誤，重跑可能成功
            Self::Http { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            Self::Request { .. } => ErrorSeverity::Medium,
            Self::Http { .. }
            | Self::Decode { .. }
            | Self::Shape { .. }
            | Self::UnsupportedFormat { .. }
            | Self::UnsupportedSource { .. }
            | Self::Config { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfig { .. } => ErrorSeverity::High,
            Self::Io { .. } | Self::Persistence { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::UnsupportedFormat { .. } => {
                "Convert the file to .csv, .xlsx, .xls or .json (extensions are case-sensitive)"
                    .to_string()
            }
            Self::UnsupportedSource { .. } => {
                "Pass an http:// or https:// URL, or a path ending in .csv, .xlsx, .xls or .json"
                    .to_string()
            }
            Self::Http { status, .. } if *status >= 500 => {
                "The server failed to respond; try again later".to_string()
            }
            Self::Http { status, .. } => {
                format!("Check the URL and any required access; the server answered {}", status)
            }
            Self::Request { .. } => {
                "Check network connectivity or raise the request timeout".to_string()
            }
            Self::Decode { .. } => {
                "Make sure the payload matches its format: a header row for CSV, a first sheet for workbooks, an array of objects for JSON".to_string()
            }
            Self::Io { path, .. } => {
                format!("Check that {} exists and is readable/writable", path.display())
            }
            Self::Persistence { target, .. } => {
                format!("Check that the database at {} is writable and not locked", target)
            }
            Self::Shape { .. } => "Every row must have one value per column".to_string(),
            Self::Config { .. } | Self::InvalidConfigValue { .. } => {
                "Fix the configuration value and run again".to_string()
            }
            Self::MissingConfig { field } => {
                format!("Provide '{}' on the command line or in the config file", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        let prefix = match self.category() {
            ErrorCategory::Configuration => "Configuration problem",
            ErrorCategory::Source => "Cannot read this source",
            ErrorCategory::Network => "Download failed",
            ErrorCategory::Data => "Data could not be parsed",
            ErrorCategory::Storage => "Could not save results",
        };
        format!("{}: {}", prefix, self)
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
