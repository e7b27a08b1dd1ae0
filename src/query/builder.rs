use tracing::debug;
use crate::data::{category_trade_id, ModifierType, StatDatabase};
use crate::errors::{Result, TradeError};
use crate::models::{
    CollapseListings, EquipmentFilters, FilterRange, ItemFilters, NameQuery, OptionFilter, OptionValue, ParsedItem,
    SortOrder, StatEntry, StatFilter, StatGroup, StatGroupType, TradeQuery, TradeRequest,
    TradeStatus,
};
use super::stat_query::{pseudo_to_query, roll_range, trade_id_to_query, InternalTradeId};

const CRAFTED_MODIFIERS: [&str; 3] = [
    "# Crafted Modifiers",
    "# Crafted Prefix Modifiers",
    "# Crafted Suffix Modifiers",
];
const EMPTY_MODIFIERS: [&str; 3] = [
    "# Empty Modifiers",
    "# Empty Prefix Modifiers",
    "# Empty Suffix Modifiers",
];
const TOTAL_MODIFIERS: &str = "# Modifiers";

const CHARGE_RECOVERY: &str = "#% increased Charge Recovery";
const INCREASED_EFFECT: &str = "#% increased effect";

/// Builds trade site queries out of the price-check filter state.
pub struct QueryBuilder<'a> {
    stats: &'a StatDatabase,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(stats: &'a StatDatabase) -> Self {
        Self { stats }
    }

    pub fn build(
        &self,
        filters: &ItemFilters,
        stats: &[StatFilter],
        item: &ParsedItem,
    ) -> Result<TradeRequest> {
        let mut query = TradeQuery::new(trade_status(filters));

        self.apply_trade_filters(&mut query, filters);
        self.apply_item_filters(&mut query, filters, item)?;
        self.apply_meta_stats(&mut query, stats, item)?;
        self.apply_stats(&mut query, stats)?;

        debug!(
            groups = query.stats.len(),
            and_filters = query.stats[0].filters.len(),
            "Built trade request"
        );

        Ok(TradeRequest {
            query,
            sort: SortOrder::default(),
        })
    }

    fn apply_trade_filters(&self, query: &mut TradeQuery, filters: &ItemFilters) {
        let trade = &filters.trade;

        if let Some(currency) = &trade.currency {
            query.filters.trade_filters().price = Some(OptionFilter::new(currency.as_str()));
        }
        if trade.collapse_listings == CollapseListings::Api {
            query.filters.trade_filters().collapse = Some(OptionFilter::flag(true));
        }
        if let Some(listed) = &trade.listed {
            query.filters.trade_filters().indexed = Some(OptionFilter::new(listed.as_str()));
        }
    }

    fn apply_item_filters(
        &self,
        query: &mut TradeQuery,
        filters: &ItemFilters,
        item: &ParsedItem,
    ) -> Result<()> {
        let search = filters.active_search();

        query.name = search.trade_name().map(|name| name_to_query(name, filters));
        query.base_type = search.trade_base_type().map(|name| name_to_query(name, filters));

        if let Some(category) = search.category {
            let id = category_trade_id(category)
                .ok_or_else(|| TradeError::InvalidCategory(category.to_string()))?;
            query.filters.type_filters().category = Some(OptionFilter::new(id));
        }

        match (&filters.foil, &filters.rarity) {
            (Some(foil), _) if !foil.disabled => {
                query.filters.type_filters().rarity = Some(OptionFilter::new("uniquefoil"));
            }
            (_, Some(rarity)) => {
                query.filters.type_filters().rarity = Some(OptionFilter::new(rarity.value.as_str()));
            }
            _ => {}
        }

        if let Some(item_level) = filters.item_level.as_ref().filter(|f| !f.disabled) {
            let max = item_level.max.filter(|max| *max != 0.0);
            query.filters.type_filters().ilvl = Some(FilterRange::new(Some(item_level.value), max));
        }

        if let Some(quality) = filters.quality.as_ref().filter(|f| !f.disabled) {
            query.filters.type_filters().quality = Some(FilterRange::min(quality.value));
        }

        if let Some(map_tier) = filters.map_tier.as_ref().filter(|f| !f.disabled) {
            query.filters.map_filters().map_tier = Some(FilterRange::exact(map_tier.value));
        }

        if let Some(gem_level) = filters.gem_level.as_ref().filter(|f| !f.disabled) {
            query.filters.misc_filters().gem_level = Some(FilterRange::min(gem_level.value));
        }

        if filters.unidentified.as_ref().is_some_and(|f| !f.disabled) {
            query.filters.misc_filters().identified = Some(OptionFilter::flag(false));
        }

        if let Some(corrupted) = filters.corrupted.as_ref().filter(|c| !c.value || c.exact) {
            query.filters.misc_filters().corrupted = Some(OptionFilter::flag(corrupted.value));
        }

        match &filters.mirrored {
            Some(mirrored) if mirrored.disabled => {
                query.filters.misc_filters().mirrored = Some(OptionFilter::flag(false));
            }
            Some(_) => {}
            None if item.is_mirrorable_rarity() => {
                query.filters.misc_filters().mirrored = Some(OptionFilter::flag(false));
            }
            None => {}
        }

        Ok(())
    }

    /// Internal stats: empty affix expansion, flask charge recovery guard and equipment numbers.
    fn apply_meta_stats(
        &self,
        query: &mut TradeQuery,
        stats: &[StatFilter],
        item: &ParsedItem,
    ) -> Result<()> {
        let has_increased_effect = stats.iter().any(|s| s.stat_ref == INCREASED_EFFECT);

        for stat in stats {
            let internal = match stat.primary_id() {
                Some(id) => InternalTradeId::parse(id)?,
                None => None,
            };

            if internal == Some(InternalTradeId::HasEmptyModifier) {
                let [with_crafted, with_total] = self.empty_modifier_groups(stat)?;
                query.stats.push(with_crafted);
                query.stats.push(with_total);
            } else if item.is_flask() && stat.stat_ref == CHARGE_RECOVERY && !has_increased_effect {
                // Increased effect changes what charge recovery means, exclude it.
                let effect_id = self.stats.trade_id(INCREASED_EFFECT, ModifierType::Explicit)?;
                query.stats.push(
                    StatGroup::new(StatGroupType::Not)
                        .with_disabled(stat.disabled)
                        .with_entry(StatEntry::new(effect_id).with_disabled(stat.disabled)),
                );
            }

            if stat.disabled {
                continue;
            }

            let Some(internal) = internal else { continue };
            let slot = internal.equipment_slot(query.filters.equipment_filters());
            if let Some(slot) = slot {
                let range = roll_range(Some(stat.roll.as_ref().ok_or_else(|| {
                    TradeError::ValidationError(format!("{} has no roll", stat.stat_ref))
                })?));
                if !range.is_empty() {
                    *slot = Some(range);
                }
            }
        }

        // Nothing may have landed in the equipment section after all
        if query.filters.equipment_filters.as_ref().is_some_and(|s| s.filters == EquipmentFilters::default()) {
            query.filters.equipment_filters = None;
        }

        Ok(())
    }

    fn empty_modifier_groups(&self, stat: &StatFilter) -> Result<[StatGroup; 2]> {
        let index = match stat.option.as_ref().map(|o| &o.value) {
            Some(OptionValue::Number(n)) if (0..3).contains(n) => *n as usize,
            other => {
                return Err(TradeError::ValidationError(format!(
                    "Invalid empty modifier option {:?}", other
                )));
            }
        };

        let crafted = self.stats.trade_id(CRAFTED_MODIFIERS[index], ModifierType::Pseudo)?;
        let empty = self.stats.trade_id(EMPTY_MODIFIERS[index], ModifierType::Pseudo)?;
        let total = self.stats.trade_id(TOTAL_MODIFIERS, ModifierType::Pseudo)?;

        let group = |other: &str, other_min: f64| {
            StatGroup::new(StatGroupType::Count)
                .with_value(FilterRange::exact(1.0))
                .with_disabled(stat.disabled)
                .with_entry(
                    StatEntry::new(empty)
                        .with_range(FilterRange::exact(1.0))
                        .with_disabled(stat.disabled),
                )
                .with_entry(
                    StatEntry::new(other)
                        .with_range(FilterRange::min(other_min))
                        .with_disabled(stat.disabled),
                )
        };

        Ok([group(crafted, 1.0), group(total, 6.0)])
    }

    fn apply_stats(&self, query: &mut TradeQuery, stats: &[StatFilter]) -> Result<()> {
        for stat in stats {
            let Some(first_id) = stat.primary_id() else {
                return Err(TradeError::ValidationError(format!(
                    "{} has no trade id", stat.stat_ref
                )));
            };
            if InternalTradeId::parse(first_id)?.is_some() {
                continue;
            }

            if first_id.starts_with("pseudo.") {
                let group = pseudo_to_query(first_id, stat, self.stats)?;
                query.stats.push(group);
            } else if stat.trade_id.len() == 1 {
                query.and_group_mut().filters.push(trade_id_to_query(first_id, stat));
            } else {
                // Equivalent ids (local/global): any one of them satisfies the stat
                let mut group = StatGroup::new(StatGroupType::Count)
                    .with_value(FilterRange::min(1.0))
                    .with_disabled(stat.disabled);
                group.filters = stat.trade_id
                    .iter()
                    .map(|id| trade_id_to_query(id, stat))
                    .collect();
                query.stats.push(group);
            }
        }
        Ok(())
    }
}

/// Convenience wrapper around [`QueryBuilder::build`].
pub fn create_trade_request(
    filters: &ItemFilters,
    stats: &[StatFilter],
    item: &ParsedItem,
    data: &StatDatabase,
) -> Result<TradeRequest> {
    QueryBuilder::new(data).build(filters, stats, item)
}

fn trade_status(filters: &ItemFilters) -> TradeStatus {
    if filters.trade.offline {
        TradeStatus::Any
    } else if filters.trade.online_in_league {
        TradeStatus::OnlineLeague
    } else {
        TradeStatus::Online
    }
}

fn name_to_query(name: &str, filters: &ItemFilters) -> NameQuery {
    match &filters.discriminator {
        Some(discriminator) => NameQuery::Discriminated {
            discriminator: discriminator.trade.clone(),
            option: name.to_string(),
        },
        None => NameQuery::Plain(name.to_string()),
    }
}
