mod builder;
pub mod stat_query;

pub use builder::{create_trade_request, QueryBuilder};
pub use stat_query::{roll_range, trade_id_to_query, InternalTradeId};
