use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Home, HomeChanges, HomeFilter, Message, NewHome, PropertyType};
use crate::auth::repo_types::User;
use crate::error::AppError;

/// Query string of `GET /homes`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeQuery {
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
}

impl From<HomeQuery> for HomeFilter {
    fn from(q: HomeQuery) -> Self {
        Self {
            city: q.city,
            min_price: q.min_price,
            max_price: q.max_price,
            property_type: q.property_type,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHomeRequest {
    pub address: String,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub city: String,
    pub price: f64,
    pub land_size: f64,
    pub property_type: PropertyType,
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Deserialize)]
pub struct ImageInput {
    pub url: String,
}

impl CreateHomeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.address.trim().is_empty() || self.city.trim().is_empty() {
            return Err(AppError::BadRequest("Address and city are required".into()));
        }
        if self.number_of_bedrooms <= 0 || self.number_of_bathrooms <= 0 {
            return Err(AppError::BadRequest("Room counts must be positive".into()));
        }
        if self.price <= 0.0 || self.land_size <= 0.0 {
            return Err(AppError::BadRequest("Price and land size must be positive".into()));
        }
        if self.images.iter().any(|i| i.url.trim().is_empty()) {
            return Err(AppError::BadRequest("Image url must not be empty".into()));
        }
        Ok(())
    }
}

impl From<CreateHomeRequest> for NewHome {
    fn from(r: CreateHomeRequest) -> Self {
        Self {
            address: r.address,
            city: r.city,
            price: r.price,
            number_of_bedrooms: r.number_of_bedrooms,
            number_of_bathrooms: r.number_of_bathrooms,
            land_size: r.land_size,
            property_type: r.property_type,
            images: r.images.into_iter().map(|i| i.url).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHomeRequest {
    pub address: Option<String>,
    pub number_of_bedrooms: Option<i32>,
    pub number_of_bathrooms: Option<i32>,
    pub city: Option<String>,
    pub price: Option<f64>,
    pub land_size: Option<f64>,
    pub property_type: Option<PropertyType>,
}

impl UpdateHomeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let blank = |s: &Option<String>| s.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.address) || blank(&self.city) {
            return Err(AppError::BadRequest("Address and city must not be empty".into()));
        }
        let non_positive_int = |v: Option<i32>| v.is_some_and(|v| v <= 0);
        let non_positive = |v: Option<f64>| v.is_some_and(|v| v <= 0.0);
        if non_positive_int(self.number_of_bedrooms)
            || non_positive_int(self.number_of_bathrooms)
            || non_positive(self.price)
            || non_positive(self.land_size)
        {
            return Err(AppError::BadRequest("Numeric fields must be positive".into()));
        }
        Ok(())
    }
}

impl From<UpdateHomeRequest> for HomeChanges {
    fn from(r: UpdateHomeRequest) -> Self {
        Self {
            address: r.address,
            city: r.city,
            price: r.price,
            number_of_bedrooms: r.number_of_bedrooms,
            number_of_bathrooms: r.number_of_bathrooms,
            land_size: r.land_size,
            property_type: r.property_type,
        }
    }
}

/// Listing as shown to clients; the owner id is not exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub id: i64,
    pub address: String,
    pub city: String,
    pub price: f64,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub land_size: f64,
    pub property_type: PropertyType,
    #[serde(with = "time::serde::rfc3339")]
    pub listed_date: OffsetDateTime,
    /// Cover image, set in search results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl HomeResponse {
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

impl From<Home> for HomeResponse {
    fn from(h: Home) -> Self {
        Self {
            id: h.id,
            address: h.address,
            city: h.city,
            price: h.price,
            number_of_bedrooms: h.number_of_bedrooms,
            number_of_bathrooms: h.number_of_bathrooms,
            land_size: h.land_size,
            property_type: h.property_type,
            listed_date: h.listed_date,
            image: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RealtorContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<User> for RealtorContact {
    fn from(u: User) -> Self {
        Self {
            name: u.name,
            email: u.email,
            phone: u.phone,
        }
    }
}

/// Single listing with every image and the realtor to contact.
#[derive(Debug, Serialize)]
pub struct HomeDetailResponse {
    #[serde(flatten)]
    pub home: HomeResponse,
    pub images: Vec<String>,
    pub realtor: RealtorContact,
}

#[derive(Debug, Deserialize)]
pub struct InquireRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub message: String,
    pub buyer_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            message: m.message,
            buyer_id: m.buyer_id,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_non_positive_values() {
        let mut r = CreateHomeRequest {
            address: "2 Palm Ave".into(),
            number_of_bedrooms: 2,
            number_of_bathrooms: 1,
            city: "Abuja".into(),
            price: 50_000.0,
            land_size: 300.0,
            property_type: PropertyType::Condo,
            images: vec![ImageInput {
                url: "https://img.test/1.jpg".into(),
            }],
        };
        assert!(r.validate().is_ok());
        r.images.push(ImageInput { url: " ".into() });
        assert!(matches!(r.validate(), Err(AppError::BadRequest(_))));
        r.images.pop();
        r.price = 0.0;
        assert!(matches!(r.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn update_request_allows_partial_bodies() {
        let r: UpdateHomeRequest = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert!(r.validate().is_ok());
        let r: UpdateHomeRequest = serde_json::from_str(r#"{"city": " "}"#).unwrap();
        assert!(r.validate().is_err());
    }

    #[test]
    fn response_hides_owner() {
        let home = Home {
            id: 1,
            address: "a".into(),
            city: "c".into(),
            price: 1.0,
            number_of_bedrooms: 1,
            number_of_bathrooms: 1,
            land_size: 1.0,
            property_type: PropertyType::Residential,
            realtor_id: 77,
            listed_date: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(HomeResponse::from(home)).unwrap();
        assert!(json.get("realtorId").is_none());
        assert!(json.get("image").is_none());
        assert_eq!(json["propertyType"], "RESIDENTIAL");
        assert_eq!(json["numberOfBedrooms"], 1);
    }
}
