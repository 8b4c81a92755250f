use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Product - Catalog entry from GET /product
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub type_field: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "match")]
    pub match_info: Match,
    #[serde(default)]
    pub event: Option<EventData>,
    #[serde(default)]
    pub min_order: Option<u32>,
    #[serde(default)]
    pub max_order: Option<u32>,
    #[serde(default)]
    pub venue: Option<u64>,
    #[serde(default)]
    pub event_dates: Vec<String>,
    #[serde(default)]
    pub images: ProductImages,
    #[serde(default)]
    pub seating_plan: Option<serde_json::Value>,
}

impl Product {
    pub fn is_upcoming(&self) -> bool {
        self.match_info.status == MatchStatus::Upcoming
    }

    /// Scheduled start as epoch milliseconds.
    pub fn starts_at_ms(&self) -> i64 {
        self.match_info.start.epoch * 1000
    }

    pub fn involves_team(&self, team_id: u64) -> bool {
        self.match_info.home == Some(team_id) || self.match_info.away == Some(team_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Upcoming,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub start: MatchStart,
    #[serde(default)]
    pub time_confirmed: Option<String>,
    #[serde(default)]
    pub home: Option<u64>,
    #[serde(default)]
    pub away: Option<u64>,
    #[serde(default)]
    pub competition: Option<u64>,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStart {
    #[serde(default)]
    pub tz: String,
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub utc: String,
    /// Unix seconds.
    pub epoch: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImages {
    pub main: Option<String>,
    pub thumb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub event: EventInfo,
    #[serde(default)]
    pub event_dates: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub start: MatchStart,
    pub end: MatchStart,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// ProductDetail - Full record from GET /product/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub type_field: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "match")]
    pub match_info: Match,
    #[serde(default)]
    pub event: Option<EventData>,
    #[serde(default)]
    pub min_order: Option<u32>,
    #[serde(default)]
    pub max_order: Option<u32>,
    #[serde(default)]
    pub venue: Option<u64>,
    #[serde(default)]
    pub event_dates: Vec<String>,
    #[serde(default)]
    pub images: ProductImages,

    // -- Detail specific fields --
    #[serde(default)]
    pub information: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub timetable: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub seating_plan: Vec<SeatingPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatingPlan {
    pub image: String,
    #[serde(default)]
    pub category_map: Vec<CategoryMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap {
    pub ticket_category_id: u64,
    #[serde(default)]
    pub path_ids: Vec<u64>,
}
