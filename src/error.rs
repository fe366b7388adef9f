use reqwest::StatusCode;

use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Request(reqwest::Error),
    Status(StatusCode),
    Trigger(regex::Error),
    Url(url::ParseError),
    Json(serde_json::Error),
    Io(std::io::Error),
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::Trigger(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Url(e)
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

impl Error {
    pub fn config_error(msg: &str) -> Self {
        Self::Config(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Request(e) => write!(f, "Request error: {e}"),
            Error::Status(status) => write!(f, "HTTP status {status}"),
            Error::Trigger(e) => write!(f, "Trigger pattern error: {e}"),
            Error::Url(e) => write!(f, "Url error: {e}"),
            Error::Json(e) => write!(f, "Json error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
