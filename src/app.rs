use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::roles::{Role, RoleTable};
use crate::auth::{self, handlers as auth_handlers};
use crate::homes::{self, handlers as home_handlers};
use crate::state::AppState;

/// Which roles may reach which route.
pub fn route_policy() -> RoleTable {
    RoleTable::builder()
        // signup and signin are public: no entry
        .handler(auth_handlers::GENERATE_KEY, &[Role::Admin])
        .handler(auth_handlers::ME, &Role::ALL)
        // listings are managed by realtors
        .group(home_handlers::GROUP, &[Role::Realtor])
        .handler(home_handlers::LIST_HOMES, &[])
        .handler(home_handlers::GET_HOME, &[])
        .handler(home_handlers::INQUIRE, &[Role::Buyer])
        .build()
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router(&state))
                .merge(homes::router(&state))
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
