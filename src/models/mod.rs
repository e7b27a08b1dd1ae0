pub mod filters;
pub mod item_type;
pub mod poe_item;
pub mod pricing;
pub mod trade_request;

pub use filters::{
    CollapseListings,
    CorruptedFilter,
    Discriminator,
    ItemFilters,
    OptionValue,
    RarityFilter,
    SearchTarget,
    StatFilter,
    StatOption,
    StatRoll,
    Toggle,
    TradeOptions,
    ValueFilter,
};

pub use item_type::{
    ItemCategory,
    ItemRarity,
    ParsedItem,
};

pub use poe_item::{
    Account,
    FetchResult,
    FetchedItem,
    ListingData,
    OnlineStatus,
    Price,
    Property,
    SearchResult,
};

pub use pricing::{
    AccountStatus,
    PriceCheck,
    PricingOptions,
    PricingResult,
};

pub use trade_request::{
    EquipmentFilters,
    FilterRange,
    NameQuery,
    OptionFilter,
    QueryFilters,
    SortOrder,
    StatEntry,
    StatGroup,
    StatGroupType,
    StatValue,
    TradeQuery,
    TradeRequest,
    TradeStatus,
};
