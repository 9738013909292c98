use std::fmt;

use crate::types::HvacMode;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Json(serde_json::Error),
    KeyNotFound { endpoint: String, key: String },
    Protocol { endpoint: String, rsc: Option<u32> },
    InvalidValue { key: String, value: String },
    UnknownCode { table: &'static str, code: String },
    Unsupported { action: &'static str, mode: HvacMode },
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Json(e) => write!(f, "malformed response: {e}"),
            Error::KeyNotFound { endpoint, key } => {
                write!(f, "key {key} not found in response from {endpoint}")
            }
            Error::Protocol { endpoint, rsc: Some(rsc) } => {
                write!(f, "write to {endpoint} rejected with rsc {rsc}")
            }
            Error::Protocol { endpoint, rsc: None } => {
                write!(f, "write to {endpoint} was not acknowledged")
            }
            Error::InvalidValue { key, value } => write!(f, "invalid value for {key}: {value}"),
            Error::UnknownCode { table, code } => write!(f, "unknown {table} code: {code}"),
            Error::Unsupported { action, mode } => {
                write!(f, "{action} is not supported in {} mode", mode.as_str())
            }
            Error::TemperatureOutOfRange { value, min, max } => {
                write!(f, "temperature {value} outside {min}..={max}")
            }
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
