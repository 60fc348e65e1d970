use clap::Parser;
use homelist::{
    app,
    cli::{self, Cli, Command},
    config,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    if let Some(Command::Keygen { email, role }) = args.command {
        let secret = config::product_key_secret_from_env()?;
        println!("{}", cli::keygen(&secret, &email, role)?);
        return Ok(());
    }

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "homelist=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    tracing::debug!(config = ?app_state.config, "configuration loaded");
    let addr = app_state.config.addr()?;

    app::serve(app::build_app(app_state), addr).await
}
