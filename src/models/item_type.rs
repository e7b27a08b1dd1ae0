use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Map,
    #[serde(rename = "Captured Beast")]
    CapturedBeast,
    #[serde(rename = "Metamorph Sample")]
    MetamorphSample,
    Helmet,
    #[serde(rename = "Body Armour")]
    BodyArmour,
    Gloves,
    Boots,
    Shield,
    Amulet,
    Belt,
    Ring,
    Flask,
    #[serde(rename = "Abyss Jewel")]
    AbyssJewel,
    Jewel,
    Quiver,
    Claw,
    Bow,
    Sceptre,
    Wand,
    #[serde(rename = "Fishing Rod")]
    FishingRod,
    Staff,
    Warstaff,
    Dagger,
    #[serde(rename = "Rune Dagger")]
    RuneDagger,
    #[serde(rename = "One Hand Axe")]
    OneHandedAxe,
    #[serde(rename = "Two Hand Axe")]
    TwoHandedAxe,
    #[serde(rename = "One Hand Mace")]
    OneHandedMace,
    #[serde(rename = "Two Hand Mace")]
    TwoHandedMace,
    #[serde(rename = "One Hand Sword")]
    OneHandedSword,
    #[serde(rename = "Two Hand Sword")]
    TwoHandedSword,
    #[serde(rename = "Cluster Jewel")]
    ClusterJewel,
    #[serde(rename = "Heist Blueprint")]
    HeistBlueprint,
    #[serde(rename = "Heist Contract")]
    HeistContract,
    #[serde(rename = "Heist Tool")]
    HeistTool,
    #[serde(rename = "Heist Brooch")]
    HeistBrooch,
    #[serde(rename = "Heist Gear")]
    HeistGear,
    #[serde(rename = "Heist Cloak")]
    HeistCloak,
    Trinket,
    Invitation,
    Gem,
    Currency,
    #[serde(rename = "Divination Card")]
    DivinationCard,
    Voidstone,
    Sentinel,
    #[serde(rename = "Memory Line")]
    MemoryLine,
    #[serde(rename = "Sanctum Relic")]
    SanctumRelic,
    Tincture,
    Charm,
    Crossbow,
    #[serde(rename = "Skill Gem")]
    SkillGem,
    #[serde(rename = "Support Gem")]
    SupportGem,
    #[serde(rename = "Meta Gem")]
    MetaGem,
    Focus,
    Waystone,
    Relic,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display follows the in-game label, same as the serde name
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(label)) => f.write_str(&label),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemRarity {
    Normal,
    Magic,
    Rare,
    Unique,
}

/// The slice of a parsed item the query builder cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedItem {
    pub category: Option<ItemCategory>,
    pub rarity: Option<ItemRarity>,
}

impl ParsedItem {
    pub fn new(category: ItemCategory, rarity: ItemRarity) -> Self {
        Self {
            category: Some(category),
            rarity: Some(rarity),
        }
    }

    pub fn is_flask(&self) -> bool {
        self.category == Some(ItemCategory::Flask)
    }

    /// Normal, magic and rare items can never be mirrored on purpose by the seller.
    pub fn is_mirrorable_rarity(&self) -> bool {
        matches!(
            self.rarity,
            Some(ItemRarity::Normal | ItemRarity::Magic | ItemRarity::Rare)
        )
    }
}
