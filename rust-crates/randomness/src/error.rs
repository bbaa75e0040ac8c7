use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid range: min ({min}) must be less than max ({max})")]
    InvalidRange { min: u64, max: u64 },

    #[error("Cannot select from an empty list of items")]
    EmptyList,

    #[error("Cannot draw winners from an empty pool")]
    EmptyPool,

    #[error("Unknown oracle provider '{0}'")]
    UnknownProvider(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Malformed file: {0}")]
    FileFormat(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Wallet error: {0}")]
    Wallet(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Upstream failure, reclassified as rate limiting when the message says so.
    pub fn upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_rate_limit_message(&message) {
            Error::RateLimited(message)
        } else {
            Error::Upstream(message)
        }
    }

    pub fn contract(err: impl Display) -> Self {
        let message = err.to_string();
        if is_rate_limit_message(&message) {
            Error::RateLimited(message)
        } else {
            Error::Contract(message)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Upstream(message) | Error::Contract(message) => {
                is_rate_limit_message(message)
            }
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidRange { .. }
                | Error::EmptyList
                | Error::EmptyPool
                | Error::UnknownProvider(_)
                | Error::FileFormat(_)
        )
    }
}

pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("rate limit") || lower.contains("429")
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                Error::RateLimited(err.to_string())
            }
            _ => Error::upstream(err.to_string()),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::FileFormat(err.to_string())
    }
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Error::FileFormat(err.to_string())
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream__message_mentioning_rate_limit_becomes_rate_limited() {
        // given
        let message = "actor run failed: Rate limit reached for this token";

        // when
        let err = Error::upstream(message);

        // then
        assert!(matches!(err, Error::RateLimited(_)));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn upstream__plain_failure_stays_upstream() {
        // given
        let message = "scraper responded with 502 Bad Gateway";

        // when
        let err = Error::upstream(message);

        // then
        assert!(matches!(err, Error::Upstream(_)));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn contract__status_429_in_transport_error_is_rate_limited() {
        // given
        let message = "HTTP error 429 with body: too many requests";

        // when
        let err = Error::contract(message);

        // then
        assert!(err.is_rate_limited());
    }
}
