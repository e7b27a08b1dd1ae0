use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeError {
    /// The selected category has no trade id; the query is never sent.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    /// Error envelope returned by the trade provider, message kept verbatim.
    #[error("{0}")]
    ApiError(String),

    /// Raised before any network attempt when the request cannot fit the current budget.
    #[error("Rate Limit Error: {rule} cannot accept more requests{}", fmt_retry(.retry_after))]
    RateLimitError {
        rule: String,
        retry_after: Option<Duration>,
    },

    #[error("Network Error: {0}")]
    NetworkError(String),

    #[error("Parse Error: {0}")]
    ParseError(String),

    /// Packaged lookup data is missing an entry the query needs.
    #[error("Data Error: {0}")]
    DataError(String),

    #[error("Config Error: {0}")]
    ConfigError(String),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}

fn fmt_retry(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry in {}s", d.as_secs().max(1)),
        None => String::new(),
    }
}

impl From<reqwest::Error> for TradeError {
    fn from(err: reqwest::Error) -> Self {
        TradeError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for TradeError {
    fn from(err: serde_json::Error) -> Self {
        TradeError::ParseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TradeError::ApiError("Query is too complex.".to_string());
        assert_eq!(error.to_string(), "Query is too complex.");

        let error = TradeError::InvalidCategory("Gem".to_string());
        assert_eq!(error.to_string(), "Invalid category: Gem");
    }

    #[test]
    fn test_rate_limit_error_display() {
        let error = TradeError::RateLimitError {
            rule: "search:Ip:60s".to_string(),
            retry_after: Some(Duration::from_secs(42)),
        };
        assert_eq!(
            error.to_string(),
            "Rate Limit Error: search:Ip:60s cannot accept more requests, retry in 42s"
        );

        let error = TradeError::RateLimitError {
            rule: "fetch:Ip:4s".to_string(),
            retry_after: None,
        };
        assert_eq!(
            error.to_string(),
            "Rate Limit Error: fetch:Ip:4s cannot accept more requests"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let converted: TradeError = err.into();
        assert!(matches!(converted, TradeError::ParseError(_)));
    }
}
