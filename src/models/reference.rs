use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StaticData - Snapshot of every reference collection
// ---------------------------------------------------------------------------

/// Replaced as a whole on refresh, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticData {
    pub teams: Vec<Team>,
    pub venues: Vec<Venue>,
    pub competitions: Vec<Competition>,
    pub countries: Vec<Country>,
    pub ticket_categories: Vec<TicketCategory>,
    pub delivery_methods: Vec<DeliveryMethod>,
    /// Epoch milliseconds of the sync that produced this snapshot.
    #[serde(default)]
    pub last_sync: Option<i64>,
}

impl StaticData {
    pub fn team(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn venue(&self, id: u64) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id == id)
    }

    pub fn competition(&self, id: u64) -> Option<&Competition> {
        self.competitions.iter().find(|c| c.id == id)
    }

    pub fn country(&self, id: u64) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == id)
    }

    pub fn ticket_category(&self, id: u64) -> Option<&TicketCategory> {
        self.ticket_categories.iter().find(|c| c.id == id)
    }

    pub fn delivery_method(&self, id: u64) -> Option<&DeliveryMethod> {
        self.delivery_methods.iter().find(|m| m.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub coordinates: Option<VenueCoordinates>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub images: Option<VenueImages>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueCoordinates {
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueImages {
    pub stadium: Option<String>,
    pub seating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: u64,
    /// ISO code.
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCategory {
    pub id: u64,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub venue: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub consumer_info: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub delivery_methods: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryMethod {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub requires_delivery: bool,
}
