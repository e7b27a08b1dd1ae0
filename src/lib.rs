//! Path of Exile trade queries: builds trade site searches out of a parsed item and the
//! user's stat filters, runs them under the site's rate limits and prices the listings.

pub mod config;
pub mod data;
pub mod errors;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod query;

pub use config::AppConfig;
pub use data::StatDatabase;
pub use errors::{Result, TradeError};
pub use fetcher::{CredentialProvider, SessionStore, TradeClient};
pub use logging::init_logging;
pub use pricing::ResultNormalizer;
pub use query::{create_trade_request, QueryBuilder};
