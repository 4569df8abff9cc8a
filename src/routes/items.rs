use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{prepare_listing, rank_listings, ProximityFilter};
use crate::models::{
    CreateItemRequest, ErrorResponse, HealthResponse, ItemResponse, ListItemsQuery, ListItemsResponse,
    UpdateStatusRequest, UpdateStatusResponse, ViewerQuery,
};
use crate::routes::auth::AuthenticatedUser;
use crate::services::{PostgresClient, PostgresError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    /// Upper bound on listings fetched per query before distance filtering
    pub candidate_limit: usize,
}

/// Configure all item routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/items", web::get().to(list_items))
        .route("/items", web::post().to(create_item))
        .route("/items/{id}", web::get().to(get_item))
        .route("/items/{id}/status", web::patch().to(update_status));
}

fn error_response(status_code: u16, error: &str, message: impl Into<String>) -> HttpResponse {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    };
    match status_code {
        400 => HttpResponse::BadRequest().json(body),
        403 => HttpResponse::Forbidden().json(body),
        404 => HttpResponse::NotFound().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// List nearby items
///
/// GET /api/v1/items?category=books&lat=35.68&lng=139.76&maxDistance=3000
///
/// Without a usable `lat`/`lng` the newest items are returned unfiltered.
async fn list_items(
    state: web::Data<AppState>,
    query: web::Query<ListItemsQuery>,
) -> impl Responder {
    let category = match query.category_filter() {
        Ok(category) => category,
        Err(e) => return error_response(400, "Invalid category", e.to_string()),
    };

    let filter = ProximityFilter::new(query.viewer(), query.max_distance_m());

    let candidates = match state
        .postgres
        .list_available_items(category, state.candidate_limit)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to fetch items: {}", e);
            return error_response(500, "Failed to fetch items", e.to_string());
        }
    };

    let total = candidates.len();
    let items: Vec<ItemResponse> = rank_listings(&filter, candidates)
        .into_iter()
        .map(ItemResponse::from)
        .collect();

    tracing::info!(
        "Returning {} items (from {} candidates, viewer: {})",
        items.len(),
        total,
        filter.viewer().is_some()
    );

    HttpResponse::Ok().json(ListItemsResponse { items })
}

/// Post a new item
///
/// POST /api/v1/items
///
/// Request body:
/// ```json
/// {
///   "title": "string",
///   "description": "string",
///   "category": "electronics|furniture|clothing|books|hobby|other",
///   "lat": 35.68,
///   "lng": 139.76,
///   "address_display": "string",
///   "images": ["https://..."]
/// }
/// ```
async fn create_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateItemRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create_item request: {:?}", errors);
        return error_response(400, "Validation failed", errors.to_string());
    }

    let listing = match prepare_listing(user.user_id, req.into_inner(), &mut rand::thread_rng()) {
        Ok(listing) => listing,
        Err(e) => return error_response(400, "Invalid location", e.to_string()),
    };

    match state.postgres.create_item(&listing).await {
        Ok(item) => {
            tracing::info!("User {} posted item {}", user.user_id, item.id);
            HttpResponse::Created().json(ItemResponse::from(item))
        }
        Err(e) => {
            tracing::error!("Failed to create item for user {}: {}", user.user_id, e);
            error_response(500, "Failed to create item", e.to_string())
        }
    }
}

/// Item detail
///
/// GET /api/v1/items/{id}?lat=..&lng=..
///
/// The distance is included when a viewer position is given; the item is
/// never hidden for being far away.
async fn get_item(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ViewerQuery>,
) -> impl Responder {
    let item_id = path.into_inner();

    match state.postgres.get_item(item_id).await {
        Ok(Some(item)) => {
            let filter = ProximityFilter::new(query.viewer(), None);
            HttpResponse::Ok().json(ItemResponse::from(filter.annotate(item)))
        }
        Ok(None) => error_response(404, "Item not found", format!("item {} does not exist", item_id)),
        Err(e) => {
            tracing::error!("Failed to fetch item {}: {}", item_id, e);
            error_response(500, "Failed to fetch item", e.to_string())
        }
    }
}

/// Change an item's status
///
/// PATCH /api/v1/items/{id}/status
///
/// Request body:
/// ```json
/// { "status": "available|reserved|completed" }
/// ```
async fn update_status(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    req: web::Json<UpdateStatusRequest>,
) -> impl Responder {
    let item_id = path.into_inner();

    match state
        .postgres
        .update_item_status(item_id, req.status, user.user_id)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(UpdateStatusResponse { success: true }),
        Err(PostgresError::NotFound(message)) => error_response(404, "Item not found", message),
        Err(PostgresError::Forbidden(message)) => {
            tracing::warn!("Rejected status change: {}", message);
            error_response(403, "Not the owner of this item", message)
        }
        Err(e) => {
            tracing::error!("Failed to update item {}: {}", item_id, e);
            error_response(500, "Failed to update item", e.to_string())
        }
    }
}
