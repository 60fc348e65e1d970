use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo_types::{Home, HomeChanges, HomeFilter, Message, NewHome, NewMessage};
use crate::error::StoreError;

const HOME_COLUMNS: &str = "id, address, city, price, number_of_bedrooms, number_of_bathrooms, \
                            land_size, property_type, realtor_id, listed_date";

#[async_trait]
pub trait HomeStore: Send + Sync {
    async fn list(&self, filter: &HomeFilter) -> Result<Vec<Home>, StoreError>;
    async fn find(&self, id: i64) -> Result<Option<Home>, StoreError>;
    /// Owner of a listing, without loading the rest of the row.
    async fn find_realtor_id(&self, id: i64) -> Result<Option<i64>, StoreError>;
    /// Inserts the listing together with its images.
    async fn create(&self, realtor_id: i64, home: NewHome) -> Result<Home, StoreError>;
    /// All image URLs of a listing, oldest first.
    async fn images(&self, home_id: i64) -> Result<Vec<String>, StoreError>;
    /// First image of each listing that has one.
    async fn cover_images(&self, home_ids: &[i64]) -> Result<HashMap<i64, String>, StoreError>;
    async fn update(&self, id: i64, changes: HomeChanges) -> Result<Option<Home>, StoreError>;
    /// Returns whether a row was removed. Images and inquiries go with it.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;
    async fn messages_for_home(&self, home_id: i64) -> Result<Vec<Message>, StoreError>;
}

#[derive(Clone)]
pub struct PgHomeStore {
    db: PgPool,
}

impl PgHomeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HomeStore for PgHomeStore {
    async fn list(&self, filter: &HomeFilter) -> Result<Vec<Home>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {HOME_COLUMNS} FROM homes WHERE TRUE"));
        if let Some(city) = &filter.city {
            qb.push(" AND city = ").push_bind(city.clone());
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }
        if let Some(kind) = filter.property_type {
            qb.push(" AND property_type = ").push_bind(kind);
        }
        qb.push(" ORDER BY listed_date DESC");

        let homes = qb.build_query_as::<Home>().fetch_all(&self.db).await?;
        Ok(homes)
    }

    async fn find(&self, id: i64) -> Result<Option<Home>, StoreError> {
        let home = sqlx::query_as::<_, Home>(&format!("SELECT {HOME_COLUMNS} FROM homes WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(home)
    }

    async fn find_realtor_id(&self, id: i64) -> Result<Option<i64>, StoreError> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT realtor_id FROM homes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(owner)
    }

    async fn create(&self, realtor_id: i64, home: NewHome) -> Result<Home, StoreError> {
        let mut tx = self.db.begin().await?;
        let record = sqlx::query_as::<_, Home>(&format!(
            r#"
            INSERT INTO homes (address, city, price, number_of_bedrooms, number_of_bathrooms,
                               land_size, property_type, realtor_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {HOME_COLUMNS}
            "#
        ))
        .bind(&home.address)
        .bind(&home.city)
        .bind(home.price)
        .bind(home.number_of_bedrooms)
        .bind(home.number_of_bathrooms)
        .bind(home.land_size)
        .bind(home.property_type)
        .bind(realtor_id)
        .fetch_one(&mut *tx)
        .await?;

        if !home.images.is_empty() {
            sqlx::query(
                "INSERT INTO images (url, home_id) SELECT url, $2 FROM UNNEST($1::text[]) WITH ORDINALITY AS t(url, n) ORDER BY n",
            )
            .bind(home.images.as_slice())
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn images(&self, home_id: i64) -> Result<Vec<String>, StoreError> {
        let urls = sqlx::query_scalar::<_, String>(
            "SELECT url FROM images WHERE home_id = $1 ORDER BY id ASC",
        )
        .bind(home_id)
        .fetch_all(&self.db)
        .await?;
        Ok(urls)
    }

    async fn cover_images(&self, home_ids: &[i64]) -> Result<HashMap<i64, String>, StoreError> {
        if home_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT DISTINCT ON (home_id) home_id, url
              FROM images
             WHERE home_id = ANY($1)
             ORDER BY home_id, id ASC
            "#,
        )
        .bind(home_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn update(&self, id: i64, changes: HomeChanges) -> Result<Option<Home>, StoreError> {
        let home = sqlx::query_as::<_, Home>(&format!(
            r#"
            UPDATE homes SET
                address = COALESCE($2, address),
                city = COALESCE($3, city),
                price = COALESCE($4, price),
                number_of_bedrooms = COALESCE($5, number_of_bedrooms),
                number_of_bathrooms = COALESCE($6, number_of_bathrooms),
                land_size = COALESCE($7, land_size),
                property_type = COALESCE($8, property_type),
                updated_at = now()
            WHERE id = $1
            RETURNING {HOME_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.address)
        .bind(changes.city)
        .bind(changes.price)
        .bind(changes.number_of_bedrooms)
        .bind(changes.number_of_bathrooms)
        .bind(changes.land_size)
        .bind(changes.property_type)
        .fetch_optional(&self.db)
        .await?;
        Ok(home)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM homes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (message, home_id, buyer_id, realtor_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, message, home_id, buyer_id, realtor_id, created_at
            "#,
        )
        .bind(&message.message)
        .bind(message.home_id)
        .bind(message.buyer_id)
        .bind(message.realtor_id)
        .fetch_one(&self.db)
        .await?;
        Ok(message)
    }

    async fn messages_for_home(&self, home_id: i64) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, message, home_id, buyer_id, realtor_id, created_at
              FROM messages
             WHERE home_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(home_id)
        .fetch_all(&self.db)
        .await?;
        Ok(messages)
    }
}

#[derive(Default)]
struct MemoryTables {
    homes: Vec<Home>,
    /// `(home_id, url)` in insertion order.
    images: Vec<(i64, String)>,
    messages: Vec<Message>,
    next_home_id: i64,
    next_message_id: i64,
}

/// Process-local store used by tests and the fake state.
#[derive(Default)]
pub struct MemoryHomeStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryHomeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HomeStore for MemoryHomeStore {
    async fn list(&self, filter: &HomeFilter) -> Result<Vec<Home>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.homes.iter().filter(|h| filter.matches(h)).cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Home>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.homes.iter().find(|h| h.id == id).cloned())
    }

    async fn find_realtor_id(&self, id: i64) -> Result<Option<i64>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.homes.iter().find(|h| h.id == id).map(|h| h.realtor_id))
    }

    async fn create(&self, realtor_id: i64, home: NewHome) -> Result<Home, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_home_id += 1;
        let record = Home {
            id: tables.next_home_id,
            address: home.address,
            city: home.city,
            price: home.price,
            number_of_bedrooms: home.number_of_bedrooms,
            number_of_bathrooms: home.number_of_bathrooms,
            land_size: home.land_size,
            property_type: home.property_type,
            realtor_id,
            listed_date: OffsetDateTime::now_utc(),
        };
        tables.homes.push(record.clone());
        let id = record.id;
        tables.images.extend(home.images.into_iter().map(|url| (id, url)));
        Ok(record)
    }

    async fn images(&self, home_id: i64) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .images
            .iter()
            .filter(|(h, _)| *h == home_id)
            .map(|(_, url)| url.clone())
            .collect())
    }

    async fn cover_images(&self, home_ids: &[i64]) -> Result<HashMap<i64, String>, StoreError> {
        let tables = self.tables.read().await;
        let mut covers = HashMap::new();
        for (home_id, url) in &tables.images {
            if home_ids.contains(home_id) {
                covers.entry(*home_id).or_insert_with(|| url.clone());
            }
        }
        Ok(covers)
    }

    async fn update(&self, id: i64, changes: HomeChanges) -> Result<Option<Home>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(home) = tables.homes.iter_mut().find(|h| h.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.address {
            home.address = v;
        }
        if let Some(v) = changes.city {
            home.city = v;
        }
        if let Some(v) = changes.price {
            home.price = v;
        }
        if let Some(v) = changes.number_of_bedrooms {
            home.number_of_bedrooms = v;
        }
        if let Some(v) = changes.number_of_bathrooms {
            home.number_of_bathrooms = v;
        }
        if let Some(v) = changes.land_size {
            home.land_size = v;
        }
        if let Some(v) = changes.property_type {
            home.property_type = v;
        }
        Ok(Some(home.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.homes.len();
        tables.homes.retain(|h| h.id != id);
        tables.images.retain(|(h, _)| *h != id);
        tables.messages.retain(|m| m.home_id != id);
        Ok(tables.homes.len() < before)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_message_id += 1;
        let record = Message {
            id: tables.next_message_id,
            message: message.message,
            home_id: message.home_id,
            buyer_id: message.buyer_id,
            realtor_id: message.realtor_id,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.messages.push(record.clone());
        Ok(record)
    }

    async fn messages_for_home(&self, home_id: i64) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.home_id == home_id)
            .cloned()
            .collect())
    }
}
