use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    CreateHomeRequest, HomeDetailResponse, HomeQuery, HomeResponse, InquireRequest,
    MessageResponse, UpdateHomeRequest,
};
use super::repo_types::NewMessage;
use crate::{
    auth::{
        extractors::CurrentUser,
        guard::{access_guard, RouteGuard},
        ownership::ensure_owner,
        roles::RouteId,
    },
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub const GROUP: &str = "homes";
pub const LIST_HOMES: RouteId = RouteId::new(GROUP, "list_homes");
pub const GET_HOME: RouteId = RouteId::new(GROUP, "get_home");
pub const CREATE_HOME: RouteId = RouteId::new(GROUP, "create_home");
pub const UPDATE_HOME: RouteId = RouteId::new(GROUP, "update_home");
pub const DELETE_HOME: RouteId = RouteId::new(GROUP, "delete_home");
pub const INQUIRE: RouteId = RouteId::new(GROUP, "inquire");
pub const HOME_MESSAGES: RouteId = RouteId::new(GROUP, "home_messages");

pub fn home_routes(state: &AppState) -> Router<AppState> {
    let guard = |route: RouteId| {
        middleware::from_fn_with_state(RouteGuard::new(state.clone(), route), access_guard)
    };

    // one `route` call per method so every handler gets its own guard
    Router::new()
        .route("/homes", get(list_homes).route_layer(guard(LIST_HOMES)))
        .route("/homes", post(create_home).route_layer(guard(CREATE_HOME)))
        .route("/homes/:id", get(get_home).route_layer(guard(GET_HOME)))
        .route("/homes/:id", put(update_home).route_layer(guard(UPDATE_HOME)))
        .route("/homes/:id", delete(delete_home).route_layer(guard(DELETE_HOME)))
        .route("/homes/:id/inquire", post(inquire).route_layer(guard(INQUIRE)))
        .route(
            "/homes/:id/messages",
            get(home_messages).route_layer(guard(HOME_MESSAGES)),
        )
}

/// Owner of the listing, or 404.
async fn listing_owner(state: &AppState, home_id: i64) -> Result<i64, AppError> {
    state
        .homes
        .find_realtor_id(home_id)
        .await?
        .ok_or(AppError::NotFound)
}

#[instrument(skip(state))]
pub async fn list_homes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HomeQuery>,
) -> Result<Json<Vec<HomeResponse>>, AppError> {
    let homes = state.homes.list(&query.into()).await?;
    if homes.is_empty() {
        return Err(AppError::NotFound);
    }
    let ids: Vec<i64> = homes.iter().map(|h| h.id).collect();
    let mut covers = state.homes.cover_images(&ids).await?;
    Ok(Json(
        homes
            .into_iter()
            .map(|h| {
                let cover = covers.remove(&h.id);
                HomeResponse::from(h).with_image(cover)
            })
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_home(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<HomeDetailResponse>, AppError> {
    let home = state.homes.find(id).await?.ok_or(AppError::NotFound)?;
    let images = state.homes.images(id).await?;
    let realtor = state
        .users
        .find_by_id(home.realtor_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("listing {id} has no realtor {}", home.realtor_id))?;
    Ok(Json(HomeDetailResponse {
        home: home.into(),
        images,
        realtor: realtor.into(),
    }))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_home(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiJson(payload): ApiJson<CreateHomeRequest>,
) -> Result<(StatusCode, Json<HomeResponse>), AppError> {
    payload.validate()?;
    let home = state.homes.create(identity.id, payload.into()).await?;
    info!(home_id = home.id, realtor_id = identity.id, "home listed");
    Ok((StatusCode::CREATED, Json(home.into())))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_home(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateHomeRequest>,
) -> Result<Json<HomeResponse>, AppError> {
    payload.validate()?;
    ensure_owner(listing_owner(&state, id).await?, &identity)?;
    let home = state
        .homes
        .update(id, payload.into())
        .await?
        .ok_or(AppError::NotFound)?;
    info!(home_id = id, realtor_id = identity.id, "home updated");
    Ok(Json(home.into()))
}

#[instrument(skip(state, identity))]
pub async fn delete_home(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    ensure_owner(listing_owner(&state, id).await?, &identity)?;
    if !state.homes.delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(home_id = id, realtor_id = identity.id, "home deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, identity, payload))]
pub async fn inquire(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<InquireRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".into()));
    }
    let realtor_id = listing_owner(&state, id).await?;
    let message = state
        .homes
        .create_message(NewMessage {
            message: payload.message,
            home_id: id,
            buyer_id: identity.id,
            realtor_id,
        })
        .await?;
    info!(home_id = id, buyer_id = identity.id, "inquiry sent");
    Ok((StatusCode::CREATED, Json(message.into())))
}

#[instrument(skip(state, identity))]
pub async fn home_messages(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    ensure_owner(listing_owner(&state, id).await?, &identity)?;
    let messages = state.homes.messages_for_home(id).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}
