use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "property_type", rename_all = "UPPERCASE")]
pub enum PropertyType {
    Residential,
    Condo,
}

/// Listing row. `realtor_id` is the owning user.
#[derive(Debug, Clone, FromRow)]
pub struct Home {
    pub id: i64,
    pub address: String,
    pub city: String,
    pub price: f64,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub land_size: f64,
    pub property_type: PropertyType,
    pub realtor_id: i64,
    pub listed_date: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewHome {
    pub address: String,
    pub city: String,
    pub price: f64,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub land_size: f64,
    pub property_type: PropertyType,
    /// Image URLs in display order; the first is the cover.
    pub images: Vec<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct HomeChanges {
    pub address: Option<String>,
    pub city: Option<String>,
    pub price: Option<f64>,
    pub number_of_bedrooms: Option<i32>,
    pub number_of_bathrooms: Option<i32>,
    pub land_size: Option<f64>,
    pub property_type: Option<PropertyType>,
}

#[derive(Debug, Clone, Default)]
pub struct HomeFilter {
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
}

impl HomeFilter {
    pub fn matches(&self, home: &Home) -> bool {
        self.city.as_ref().map_or(true, |c| c == &home.city)
            && self.min_price.map_or(true, |p| home.price >= p)
            && self.max_price.map_or(true, |p| home.price <= p)
            && self.property_type.map_or(true, |t| t == home.property_type)
    }
}

/// Buyer inquiry about a listing.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub message: String,
    pub home_id: i64,
    pub buyer_id: i64,
    pub realtor_id: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub message: String,
    pub home_id: i64,
    pub buyer_id: i64,
    pub realtor_id: i64,
}
