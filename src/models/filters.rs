use serde::{Deserialize, Serialize};
use super::item_type::ItemCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapseListings {
    /// Let the trade site collapse listings by account.
    Api,
    /// Collapse client side, the query is left untouched.
    #[default]
    App,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOptions {
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub online_in_league: bool,
    pub currency: Option<String>,
    pub listed: Option<String>,
    #[serde(default)]
    pub collapse_listings: CollapseListings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTarget {
    pub name: Option<String>,
    pub name_trade: Option<String>,
    pub base_type: Option<String>,
    pub base_type_trade: Option<String>,
    pub category: Option<ItemCategory>,
    #[serde(default)]
    pub disabled: bool,
}

impl SearchTarget {
    /// Blank names count as unset.
    pub fn trade_name(&self) -> Option<&str> {
        non_empty(&self.name_trade).or(non_empty(&self.name))
    }

    pub fn trade_base_type(&self) -> Option<&str> {
        non_empty(&self.base_type_trade).or(non_empty(&self.base_type))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discriminator {
    pub trade: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Toggle {
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueFilter {
    pub value: f64,
    pub max: Option<f64>,
    #[serde(default)]
    pub disabled: bool,
}

impl ValueFilter {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            max: None,
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RarityFilter {
    /// Trade site rarity option, e.g. `rare`, `unique` or `nonunique`.
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorruptedFilter {
    pub value: bool,
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilters {
    #[serde(default)]
    pub trade: TradeOptions,
    #[serde(default)]
    pub search_exact: SearchTarget,
    pub search_relaxed: Option<SearchTarget>,
    pub discriminator: Option<Discriminator>,
    pub foil: Option<Toggle>,
    pub rarity: Option<RarityFilter>,
    pub item_level: Option<ValueFilter>,
    pub quality: Option<ValueFilter>,
    pub map_tier: Option<ValueFilter>,
    pub gem_level: Option<ValueFilter>,
    pub unidentified: Option<Toggle>,
    pub corrupted: Option<CorruptedFilter>,
    pub mirrored: Option<Toggle>,
}

impl ItemFilters {
    /// The relaxed search wins over the exact one unless it was switched off.
    pub fn active_search(&self) -> &SearchTarget {
        match &self.search_relaxed {
            Some(relaxed) if !relaxed.disabled => relaxed,
            _ => &self.search_exact,
        }
    }
}

/// Either a numeric or textual option, as the trade site accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatOption {
    pub value: OptionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRoll {
    pub value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub trade_invert: bool,
}

impl StatRoll {
    pub fn at_least(value: f64) -> Self {
        Self {
            value,
            min: Some(value),
            max: None,
            trade_invert: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatFilter {
    pub stat_ref: String,
    #[serde(default)]
    pub text: String,
    pub trade_id: Vec<String>,
    pub roll: Option<StatRoll>,
    pub option: Option<StatOption>,
    #[serde(default)]
    pub disabled: bool,
}

impl StatFilter {
    pub fn new(stat_ref: &str, trade_id: &[&str]) -> Self {
        Self {
            stat_ref: stat_ref.to_string(),
            text: stat_ref.to_string(),
            trade_id: trade_id.iter().map(|id| id.to_string()).collect(),
            roll: None,
            option: None,
            disabled: false,
        }
    }

    pub fn with_roll(mut self, roll: StatRoll) -> Self {
        self.roll = Some(roll);
        self
    }

    pub fn with_option(mut self, value: OptionValue) -> Self {
        self.option = Some(StatOption { value });
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn primary_id(&self) -> Option<&str> {
        self.trade_id.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_search_prefers_relaxed() {
        let mut filters = ItemFilters {
            search_exact: SearchTarget {
                base_type: Some("Sapphire Ring".to_string()),
                ..Default::default()
            },
            search_relaxed: Some(SearchTarget {
                category: Some(ItemCategory::Ring),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(filters.active_search().category, Some(ItemCategory::Ring));

        if let Some(relaxed) = filters.search_relaxed.as_mut() {
            relaxed.disabled = true;
        }
        assert_eq!(filters.active_search().trade_base_type(), Some("Sapphire Ring"));
    }

    #[test]
    fn test_stat_filter_from_ui_json() {
        let stat: StatFilter = serde_json::from_str(
            r#"{
                "statRef": "+# to maximum Life",
                "tradeId": ["explicit.stat_3299347043"],
                "roll": { "value": 80, "min": 70, "max": null, "tradeInvert": false },
                "option": null
            }"#,
        )
        .unwrap();

        assert_eq!(stat.primary_id(), Some("explicit.stat_3299347043"));
        assert_eq!(stat.roll.as_ref().and_then(|r| r.min), Some(70.0));
        assert!(!stat.disabled);
    }
}
