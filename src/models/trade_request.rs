use serde::{Deserialize, Serialize};
use super::filters::OptionValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub query: TradeQuery,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOrder {
    pub price: String,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            price: "asc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Online,
    OnlineLeague,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusFilter {
    pub option: TradeStatus,
}

/// A name or base type query, optionally pinned to one of several bases sharing the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameQuery {
    Plain(String),
    Discriminated { discriminator: String, option: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeQuery {
    pub status: StatusFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NameQuery>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub base_type: Option<NameQuery>,
    pub stats: Vec<StatGroup>,
    pub filters: QueryFilters,
}

impl TradeQuery {
    pub fn new(status: TradeStatus) -> Self {
        Self {
            status: StatusFilter { option: status },
            name: None,
            base_type: None,
            stats: vec![StatGroup::new(StatGroupType::And)],
            filters: QueryFilters::default(),
        }
    }

    /// The top-level `and` group that holds every single-id stat.
    pub fn and_group_mut(&mut self) -> &mut StatGroup {
        if self.stats.first().map(|g| g.r#type) != Some(StatGroupType::And) {
            self.stats.insert(0, StatGroup::new(StatGroupType::And));
        }
        &mut self.stats[0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatGroupType {
    And,
    If,
    Count,
    Not,
    Weight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FilterRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn min(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn exact(value: f64) -> Self {
        Self { min: Some(value), max: Some(value) }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatGroup {
    pub r#type: StatGroupType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterRange>,
    #[serde(default)]
    pub filters: Vec<StatEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl StatGroup {
    pub fn new(r#type: StatGroupType) -> Self {
        Self {
            r#type,
            value: None,
            filters: Vec::new(),
            disabled: None,
        }
    }

    pub fn with_value(mut self, value: FilterRange) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn with_entry(mut self, entry: StatEntry) -> Self {
        self.filters.push(entry);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<StatValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl StatEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
            disabled: None,
        }
    }

    pub fn with_range(mut self, range: FilterRange) -> Self {
        let value = self.value.get_or_insert_with(StatValue::default);
        value.min = range.min;
        value.max = range.max;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl StatValue {
    pub fn has_range(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionFilter {
    pub option: String,
}

impl OptionFilter {
    pub fn new(option: impl Into<String>) -> Self {
        Self { option: option.into() }
    }

    pub fn flag(value: bool) -> Self {
        Self { option: value.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSection<T> {
    pub filters: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<OptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<OptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ilvl: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<FilterRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aps: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ar: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crit: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dps: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edps: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub es: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdps: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rune_sockets: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spirit: Option<FilterRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_tier: Option<FilterRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiscFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrupted: Option<OptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gem_level: Option<FilterRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identified: Option<OptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirrored: Option<OptionFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<OptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<OptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<OptionFilter>,
}

/// Filter sections of the query. A section only appears once something is written into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_filters: Option<FilterSection<TypeFilters>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_filters: Option<FilterSection<EquipmentFilters>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_filters: Option<FilterSection<MapFilters>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misc_filters: Option<FilterSection<MiscFilters>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_filters: Option<FilterSection<TradeFilters>>,
}

impl QueryFilters {
    pub fn type_filters(&mut self) -> &mut TypeFilters {
        &mut self.type_filters.get_or_insert_with(Default::default).filters
    }

    pub fn equipment_filters(&mut self) -> &mut EquipmentFilters {
        &mut self.equipment_filters.get_or_insert_with(Default::default).filters
    }

    pub fn map_filters(&mut self) -> &mut MapFilters {
        &mut self.map_filters.get_or_insert_with(Default::default).filters
    }

    pub fn misc_filters(&mut self) -> &mut MiscFilters {
        &mut self.misc_filters.get_or_insert_with(Default::default).filters
    }

    pub fn trade_filters(&mut self) -> &mut TradeFilters {
        &mut self.trade_filters.get_or_insert_with(Default::default).filters
    }
}
