mod cache;
pub mod rate_limiter;
mod session;
mod trade_api;
mod transport;

pub use cache::{cache_key, derive_ttl, Cache};

pub use rate_limiter::{
    adjust_rate_limits,
    prevent_queue_creation,
    wait_for,
    QueueDemand,
    RateLimitGroup,
    RateLimitRule,
    RuleConfig,
    RuleSnapshot,
};

pub use session::{
    redact,
    AuthComplete,
    CredentialProvider,
    SessionStore,
};

pub use trade_api::{
    TradeClient,
    TradeRateLimits,
    FETCH_BATCH_SIZE,
};

pub use transport::{
    HttpMethod,
    ReqwestTransport,
    TradeTransport,
    TransportRequest,
    TransportResponse,
};
