use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{
            GenerateKeyRequest, MeResponse, ProductKeyResponse, SignInRequest, SignUpRequest,
            TokenResponse,
        },
        extractors::CurrentUser,
        guard::{access_guard, RouteGuard},
        roles::{Role, RouteId},
        services::{AuthService, SignUp},
    },
    error::AppError,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub const GROUP: &str = "auth";
pub const SIGN_UP: RouteId = RouteId::new(GROUP, "sign_up");
pub const SIGN_IN: RouteId = RouteId::new(GROUP, "sign_in");
pub const GENERATE_KEY: RouteId = RouteId::new(GROUP, "generate_key");
pub const ME: RouteId = RouteId::new(GROUP, "me");

pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let guard = |route: RouteId| {
        middleware::from_fn_with_state(RouteGuard::new(state.clone(), route), access_guard)
    };

    Router::new()
        .route("/auth/signup/:role", post(sign_up).route_layer(guard(SIGN_UP)))
        .route("/auth/signin", post(sign_in).route_layer(guard(SIGN_IN)))
        .route("/auth/key", post(generate_key).route_layer(guard(GENERATE_KEY)))
        .route("/auth/me", get(me).route_layer(guard(ME)))
}

#[instrument(skip(auth, payload))]
pub async fn sign_up(
    State(auth): State<AuthService>,
    ApiPath(role): ApiPath<Role>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    payload.validate()?;
    let SignUpRequest {
        name,
        phone,
        email,
        password,
        product_key,
    } = payload;

    let token = auth
        .sign_up(
            SignUp {
                email,
                password,
                name,
                phone,
            },
            role,
            product_key.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[instrument(skip(auth, payload))]
pub async fn sign_in(
    State(auth): State<AuthService>,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = auth.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(auth, identity, payload))]
pub async fn generate_key(
    State(auth): State<AuthService>,
    CurrentUser(identity): CurrentUser,
    ApiJson(payload): ApiJson<GenerateKeyRequest>,
) -> Result<Json<ProductKeyResponse>, AppError> {
    let product_key = auth.generate_signup_proof(&payload.email, payload.user_type);
    info!(admin_id = identity.id, role = %payload.user_type, "product key issued");
    Ok(Json(ProductKeyResponse { product_key }))
}

pub async fn me(CurrentUser(identity): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse::from(identity))
}
