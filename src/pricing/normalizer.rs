use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use crate::models::poe_item::{PROPERTY_CORPSE_LEVEL, PROPERTY_LEVEL, PROPERTY_QUALITY};
use crate::models::{Account, AccountStatus, FetchResult, PricingOptions, PricingResult};

const NO_PRICE: &str = "no price";
const DIVINE: &str = "divine";
const EXALTED: &str = "exalted";

/// Turns fetched listings into display rows, cheapest first.
pub struct ResultNormalizer<'a> {
    options: &'a PricingOptions,
    now: DateTime<Utc>,
}

impl<'a> ResultNormalizer<'a> {
    pub fn new(options: &'a PricingOptions) -> Self {
        Self::at(options, Utc::now())
    }

    pub fn at(options: &'a PricingOptions, now: DateTime<Utc>) -> Self {
        Self { options, now }
    }

    pub fn normalize(&self, results: Vec<FetchResult>) -> Vec<PricingResult> {
        let mut rows: Vec<PricingResult> = results.into_iter().map(|r| self.to_pricing_result(r)).collect();
        // Stable: equal prices keep the provider's order
        rows.sort_by(compare_prices);
        rows
    }

    pub fn to_pricing_result(&self, result: FetchResult) -> PricingResult {
        let FetchResult { id, item, listing } = result;

        let (price_amount, price_currency) = match listing.price {
            Some(price) => (price.amount, price.currency),
            None => (0.0, NO_PRICE.to_string()),
        };
        let normalized_price = normalize_price(price_amount, &price_currency, self.options.divine_exalt_ratio);
        let display_price = display_price(price_amount, &price_currency, normalized_price);

        let item_level = item
            .property_value(PROPERTY_CORPSE_LEVEL)
            .map(str::to_string)
            .or_else(|| item.ilvl.map(|ilvl| ilvl.to_string()));

        PricingResult {
            id,
            item_level,
            stack_size: item.stack_size,
            corrupted: item.corrupted,
            quality: item.property_value(PROPERTY_QUALITY).map(str::to_string),
            level: item.property_value(PROPERTY_LEVEL).map(str::to_string),
            relative_date: relative_date(&listing.indexed, self.now),
            price_amount,
            price_currency,
            normalized_price,
            display_price,
            has_note: item.note.is_some(),
            is_mine: listing.account.name == self.options.account_name,
            account_status: account_status(&listing.account),
            account_name: listing.account.name,
            ign: listing.account.last_character_name,
        }
    }
}

/// Shorthand for `ResultNormalizer::at(options, now).normalize(results)`.
pub fn normalize_results(results: Vec<FetchResult>, options: &PricingOptions, now: DateTime<Utc>) -> Vec<PricingResult> {
    ResultNormalizer::at(options, now).normalize(results)
}

/// Divine-equivalent price; `None` when the currency can not be converted.
fn normalize_price(amount: f64, currency: &str, ratio: Option<f64>) -> Option<f64> {
    match currency {
        DIVINE => Some(amount),
        EXALTED => ratio.filter(|r| *r > 0.0).map(|r| amount / r),
        _ => None,
    }
}

fn display_price(amount: f64, currency: &str, normalized: Option<f64>) -> String {
    match normalized {
        Some(divine) if currency == EXALTED => format!("{:.2} divine ({} exalted)", divine, amount),
        _ => format!("{} {}", amount, currency),
    }
}

/// Converted listings first by divine price, the rest by their raw amount.
fn compare_prices(a: &PricingResult, b: &PricingResult) -> Ordering {
    let key = |r: &PricingResult| (r.normalized_price.is_none(), r.normalized_price.unwrap_or(r.price_amount));
    let (a_unconverted, a_price) = key(a);
    let (b_unconverted, b_price) = key(b);
    a_unconverted.cmp(&b_unconverted).then(a_price.total_cmp(&b_price))
}

fn account_status(account: &Account) -> AccountStatus {
    match &account.online {
        Some(online) if online.status.as_deref() == Some("afk") => AccountStatus::Afk,
        Some(_) => AccountStatus::Online,
        None => AccountStatus::Offline,
    }
}

/// Short relative form of an RFC 3339 timestamp, empty when it does not parse.
pub fn relative_date(indexed: &str, now: DateTime<Utc>) -> String {
    let Ok(then) = DateTime::parse_from_rfc3339(indexed) else {
        return String::new();
    };

    let elapsed = now.signed_duration_since(then.with_timezone(&Utc));
    let seconds = elapsed.num_seconds();
    let days = elapsed.num_days();

    if seconds < 1 {
        "now".to_string()
    } else if days >= 365 {
        format!("{} yr. ago", days / 365)
    } else if days >= 30 {
        format!("{} mo. ago", days / 30)
    } else if days == 1 {
        "1 day ago".to_string()
    } else if days > 1 {
        format!("{} days ago", days)
    } else if elapsed.num_hours() >= 1 {
        format!("{} hr. ago", elapsed.num_hours())
    } else if elapsed.num_minutes() >= 1 {
        format!("{} min. ago", elapsed.num_minutes())
    } else {
        format!("{} sec. ago", seconds)
    }
}
