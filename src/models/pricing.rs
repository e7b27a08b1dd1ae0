use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Offline,
    Online,
    Afk,
}

/// One listing, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub id: String,
    pub item_level: Option<String>,
    pub stack_size: Option<u32>,
    pub corrupted: Option<bool>,
    pub quality: Option<String>,
    pub level: Option<String>,
    pub relative_date: String,
    pub price_amount: f64,
    pub price_currency: String,
    /// Divine-equivalent price, only used to order listings across currencies.
    pub normalized_price: Option<f64>,
    pub display_price: String,
    pub has_note: bool,
    pub is_mine: bool,
    pub account_name: String,
    pub account_status: AccountStatus,
    pub ign: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOptions {
    pub account_name: String,
    pub divine_exalt_ratio: Option<f64>,
}

/// Search passthrough plus the first page of normalized listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCheck {
    pub id: String,
    pub total: u32,
    pub inexact: bool,
    pub result_ids: Vec<String>,
    pub listings: Vec<PricingResult>,
}
