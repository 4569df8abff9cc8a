use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Category, ItemStatus, ItemView, NewListing, ParseEnumError, Seller};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Invalid stored value: {0}")]
    InvalidData(#[from] ParseEnumError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Columns of the public item view. The true `lat`/`lng` are never selected.
const ITEM_VIEW_COLUMNS: &str = r#"
    items.id,
    items.user_id,
    users.name AS user_name,
    users.rating AS user_rating,
    users.review_count AS user_review_count,
    items.title,
    items.description,
    items.category,
    items.display_lat,
    items.display_lng,
    items.address_display,
    items.status,
    items.created_at,
    items.updated_at
"#;

/// PostgreSQL client for items, their images and seller summaries
///
/// The schema (`users`, `items`, `item_images`) is provisioned outside this
/// service.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Store a new listing with its images, in display order
    ///
    /// Both the true and the display location are written; only the display
    /// location comes back.
    pub async fn create_item(&self, listing: &NewListing) -> Result<ItemView, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO items
                (user_id, title, description, category, lat, lng, display_lat, display_lng, address_display)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(listing.owner_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.category.as_str())
        .bind(listing.location.latitude)
        .bind(listing.location.longitude)
        .bind(listing.display_location.latitude)
        .bind(listing.display_location.longitude)
        .bind(&listing.address_display)
        .fetch_one(&mut *tx)
        .await?;

        let item_id: i64 = row.try_get("id")?;

        for (order, image_path) in listing.images.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO item_images (item_id, image_path, display_order)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(item_id)
            .bind(image_path)
            .bind(order as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Created item {} for user {} with {} images",
            item_id,
            listing.owner_id,
            listing.images.len()
        );

        self.get_item(item_id)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("item {}", item_id)))
    }

    /// Fetch one item with all of its images
    pub async fn get_item(&self, item_id: i64) -> Result<Option<ItemView>, PostgresError> {
        let query = format!(
            r#"
            SELECT {ITEM_VIEW_COLUMNS}
            FROM items
            JOIN users ON items.user_id = users.id
            WHERE items.id = $1
            "#
        );

        let Some(row) = sqlx::query(&query)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let images: Vec<String> = sqlx::query(
            r#"
            SELECT image_path
            FROM item_images
            WHERE item_id = $1
            ORDER BY display_order
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| row.try_get::<String, _>("image_path"))
        .collect::<Result<_, _>>()?;

        item_view_from_row(&row, images).map(Some)
    }

    /// Fetch available items, newest first, each with its cover image only
    ///
    /// Only non-geographic predicates are applied here; distance filtering
    /// happens in the proximity filter.
    pub async fn list_available_items(
        &self,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<ItemView>, PostgresError> {
        let query = format!(
            r#"
            SELECT {ITEM_VIEW_COLUMNS},
                (SELECT image_path FROM item_images
                 WHERE item_id = items.id
                 ORDER BY display_order
                 LIMIT 1) AS image_path
            FROM items
            JOIN users ON items.user_id = users.id
            WHERE items.status = 'available'
              AND ($1::TEXT IS NULL OR items.category = $1)
            ORDER BY items.created_at DESC
            LIMIT $2
            "#
        );

        let rows = sqlx::query(&query)
            .bind(category.map(|c| c.as_str()))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = skip_broken_rows(rows.iter().map(|row| -> Result<ItemView, PostgresError> {
            let cover: Option<String> = row.try_get("image_path")?;
            item_view_from_row(row, cover.into_iter().collect())
        }));

        tracing::debug!("Fetched {} available items (category: {:?})", items.len(), category);

        Ok(items)
    }

    /// Change an item's status on behalf of its owner
    ///
    /// Coordinates are left untouched.
    pub async fn update_item_status(
        &self,
        item_id: i64,
        status: ItemStatus,
        user_id: i64,
    ) -> Result<(), PostgresError> {
        let owner: Option<i64> = sqlx::query("SELECT user_id FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.try_get("user_id"))
            .transpose()?;

        match owner {
            None => return Err(PostgresError::NotFound(format!("item {}", item_id))),
            Some(owner) if owner != user_id => {
                return Err(PostgresError::Forbidden(format!(
                    "user {} does not own item {}",
                    user_id, item_id
                )))
            }
            Some(_) => {}
        }

        sqlx::query("UPDATE items SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Item {} status set to {} by user {}", item_id, status, user_id);

        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Keep the rows that converted, logging and dropping the rest
fn skip_broken_rows<T>(rows: impl IntoIterator<Item = Result<T, PostgresError>>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping item row: {}", e);
                None
            }
        })
        .collect()
}

fn item_view_from_row(row: &PgRow, images: Vec<String>) -> Result<ItemView, PostgresError> {
    let category: String = row.try_get("category")?;
    let status: String = row.try_get("status")?;

    Ok(ItemView {
        id: row.try_get("id")?,
        seller: Seller {
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            user_rating: row.try_get::<Option<f64>, _>("user_rating")?.unwrap_or(5.0),
            user_review_count: row.try_get::<Option<i32>, _>("user_review_count")?.unwrap_or(0),
        },
        title: row.try_get("title")?,
        description: row.try_get::<Option<String>, _>("description")?.unwrap_or_default(),
        category: category.parse()?,
        display_lat: row.try_get("display_lat")?,
        display_lng: row.try_get("display_lng")?,
        address_display: row.try_get("address_display")?,
        status: status.parse()?,
        images,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
