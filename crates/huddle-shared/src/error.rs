use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Uniform error shape surfaced for every non-2xx REST response.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message} ({status_code} {url})")]
pub struct ServerError {
    pub message: String,
    pub server_error_id: String,
    pub status_code: u16,
    pub url: String,
}

/// A localisable message: an i18n id plus the English fallback.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{default_message}")]
pub struct IntlMessage {
    pub id: String,
    pub default_message: String,
}

impl IntlMessage {
    pub fn new(id: impl Into<String>, default_message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_message: default_message.into(),
        }
    }
}
