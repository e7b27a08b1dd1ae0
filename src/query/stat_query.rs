//! Translation of single user stats into trade filter entries.

use crate::data::StatDatabase;
use crate::errors::{Result, TradeError};
use crate::models::{
    EquipmentFilters, FilterRange, StatEntry, StatFilter, StatGroup, StatRoll, StatValue,
};

pub const HAS_EMPTY_MODIFIER: &str = "item.has_empty_modifier";

/// Ids whose semantic type is a flag: a 100% roll means "has the stat", not a range.
const FLAG_STAT_IDS: [&str; 2] = ["implicit.stat_1901158930", "explicit.stat_3835551335"];
const FLAG_STAT_SUFFIX: &str = "stat_1526933524";
/// Reservation efficiency is reported with the opposite sign by the trade site.
const INVERTED_STAT_SUFFIX: &str = "stat_1269219558";

/// Client-side ids that never reach the trade site as stat filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalTradeId {
    Armour,
    EvasionRating,
    EnergyShield,
    Block,
    TotalDps,
    PhysicalDps,
    ElementalDps,
    Crit,
    AttacksPerSecond,
    Spirit,
    HasEmptyModifier,
}

impl InternalTradeId {
    /// `Ok(None)` for regular trade ids, an error for an `item.` id nobody knows about.
    pub fn parse(id: &str) -> Result<Option<Self>> {
        let internal = match id {
            "item.armour" => Self::Armour,
            "item.evasion_rating" => Self::EvasionRating,
            "item.energy_shield" => Self::EnergyShield,
            "item.block" => Self::Block,
            "item.total_dps" => Self::TotalDps,
            "item.physical_dps" => Self::PhysicalDps,
            "item.elemental_dps" => Self::ElementalDps,
            "item.crit" => Self::Crit,
            "item.aps" => Self::AttacksPerSecond,
            "item.spirit" => Self::Spirit,
            HAS_EMPTY_MODIFIER => Self::HasEmptyModifier,
            other if other.starts_with("item.") => {
                return Err(TradeError::DataError(format!("Unknown internal trade id {}", other)));
            }
            _ => return Ok(None),
        };
        Ok(Some(internal))
    }

    /// The equipment filter slot this id writes into.
    pub fn equipment_slot<'a>(&self, filters: &'a mut EquipmentFilters) -> Option<&'a mut Option<FilterRange>> {
        let slot = match self {
            Self::Armour => &mut filters.ar,
            Self::EvasionRating => &mut filters.ev,
            Self::EnergyShield => &mut filters.es,
            Self::Block => &mut filters.block,
            Self::TotalDps => &mut filters.dps,
            Self::PhysicalDps => &mut filters.pdps,
            Self::ElementalDps => &mut filters.edps,
            Self::Crit => &mut filters.crit,
            Self::AttacksPerSecond => &mut filters.aps,
            Self::Spirit => &mut filters.spirit,
            Self::HasEmptyModifier => return None,
        };
        Some(slot)
    }
}

/// Min/max as the trade site expects them; inverted stats are negated and swapped.
pub fn roll_range(roll: Option<&StatRoll>) -> FilterRange {
    let Some(roll) = roll else {
        return FilterRange::default();
    };

    let sign = if roll.trade_invert { -1.0 } else { 1.0 };
    let a = roll.min.map(|min| min * sign);
    let b = roll.max.map(|max| max * sign);

    if roll.trade_invert {
        FilterRange::new(b, a)
    } else {
        FilterRange::new(a, b)
    }
}

/// Applies the per-id quirks of the trade site to a stat roll.
fn effective_roll(id: &str, roll: Option<&StatRoll>) -> Option<StatRoll> {
    let is_flag = FLAG_STAT_IDS.contains(&id) || id.ends_with(FLAG_STAT_SUFFIX);

    if is_flag {
        match roll {
            Some(r) if r.value == 100.0 => None,
            _ => roll.cloned(),
        }
    } else if id.ends_with(INVERTED_STAT_SUFFIX) {
        roll.map(|r| StatRoll {
            trade_invert: !r.trade_invert,
            ..r.clone()
        })
    } else {
        roll.cloned()
    }
}

pub fn trade_id_to_query(id: &str, stat: &StatFilter) -> StatEntry {
    let range = roll_range(effective_roll(id, stat.roll.as_ref()).as_ref());

    StatEntry {
        id: id.to_string(),
        value: Some(StatValue {
            min: range.min,
            max: range.max,
            option: stat.option.as_ref().map(|o| o.value.clone()),
            weight: None,
        }),
        disabled: Some(stat.disabled),
    }
}

pub fn pseudo_to_query(id: &str, stat: &StatFilter, stats: &StatDatabase) -> Result<StatGroup> {
    let mut group = stats.pseudo_request(id)?;
    group.value = Some(roll_range(stat.roll.as_ref()));
    group.disabled = Some(stat.disabled);
    Ok(group)
}
