use serde::{Deserialize, Serialize};

/// Property type codes used by the trade site for typed item properties.
pub const PROPERTY_CORPSE_LEVEL: u32 = 78;
pub const PROPERTY_QUALITY: u32 = 6;
pub const PROPERTY_LEVEL: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(default)]
    pub result: Vec<String>,
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inexact: Option<bool>,
    /// Divine:exalted ratio reported alongside the search, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

impl SearchResult {
    pub fn get_result_ids(&self) -> &[String] {
        &self.result
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub id: String,
    pub item: FetchedItem,
    pub listing: ListingData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedItem {
    pub ilvl: Option<u32>,
    pub stack_size: Option<u32>,
    pub corrupted: Option<bool>,
    pub properties: Option<Vec<Property>>,
    pub note: Option<String>,
}

impl FetchedItem {
    /// First value of the first property carrying the given type code.
    pub fn property_value(&self, code: u32) -> Option<&str> {
        self.properties
            .as_ref()?
            .iter()
            .find(|prop| prop.r#type == Some(code))?
            .values
            .first()
            .map(|(value, _)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<(String, i32)>,
    #[serde(default)]
    pub r#type: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingData {
    pub indexed: String,
    pub price: Option<Price>,
    pub account: Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub last_character_name: String,
    pub online: Option<OnlineStatus>,
    #[serde(default)]
    pub realm: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineStatus {
    pub league: Option<String>,
    pub status: Option<String>,
}
