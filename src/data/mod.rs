mod categories;
pub mod stat_data;

pub use categories::category_trade_id;
pub use stat_data::{ModifierType, StatDatabase, StatEntryData};
