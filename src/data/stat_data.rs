use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use crate::errors::{Result, TradeError};
use crate::models::StatGroup;

const EMBEDDED_STATS: &str = include_str!("stats.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierType {
    Pseudo,
    Explicit,
    Implicit,
    Crafted,
    Enchant,
    Fractured,
    Rune,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatEntryData {
    #[serde(rename = "ref")]
    pub stat_ref: String,
    pub ids: HashMap<ModifierType, Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatDataFile {
    stats: Vec<StatEntryData>,
    #[serde(default)]
    pseudo: HashMap<String, StatGroup>,
}

/// Stat reference → trade id lookup, plus the request templates behind pseudo stats.
#[derive(Debug, Default)]
pub struct StatDatabase {
    by_ref: HashMap<String, StatEntryData>,
    pseudo_requests: HashMap<String, StatGroup>,
}

impl StatDatabase {
    /// The stat tables packaged with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_STATS)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: StatDataFile = serde_json::from_str(content)
            .map_err(|e| TradeError::DataError(format!("Failed to parse stat data: {}", e)))?;

        let by_ref = file.stats
            .into_iter()
            .map(|entry| (entry.stat_ref.clone(), entry))
            .collect::<HashMap<_, _>>();

        debug!(stats = by_ref.len(), pseudo = file.pseudo.len(), "Stat data parsed");

        Ok(Self {
            by_ref,
            pseudo_requests: file.pseudo,
        })
    }

    // Replace the packaged tables with an exported data file
    pub async fn load_from_file(path: &str) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let database = Self::from_json(&content)?;
        info!(path, stats = database.by_ref.len(), "Loaded stat data from file");
        Ok(database)
    }

    pub fn stat_by_ref(&self, stat_ref: &str) -> Option<&StatEntryData> {
        self.by_ref.get(stat_ref)
    }

    /// First trade id of the given modifier type for a stat reference.
    pub fn trade_id(&self, stat_ref: &str, modifier: ModifierType) -> Result<&str> {
        self.stat_by_ref(stat_ref)
            .and_then(|entry| entry.ids.get(&modifier))
            .and_then(|ids| ids.first())
            .map(String::as_str)
            .ok_or_else(|| TradeError::DataError(format!(
                "No {:?} trade id for stat \"{}\"", modifier, stat_ref
            )))
    }

    /// A fresh copy of the request template for a pseudo stat id.
    pub fn pseudo_request(&self, pseudo_id: &str) -> Result<StatGroup> {
        self.pseudo_requests
            .get(pseudo_id)
            .cloned()
            .ok_or_else(|| TradeError::DataError(format!(
                "No request template for pseudo stat {}", pseudo_id
            )))
    }

    pub fn len(&self) -> usize {
        self.by_ref.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }
}
