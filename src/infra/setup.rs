use crate::{
    adapters::http::app_state::AppState,
    application::{jwt::TokenSigner, password::CredentialHasher},
    infra::{config::AppConfig, postgres_persistence},
    use_cases::auth::{AuthUseCases, RefreshTokenRepo, UserRepo},
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();
    // A missing or weak signing key stops startup here, never per request
    config.validate()?;

    let postgres_arc = Arc::new(postgres_persistence(&config).await?);

    let signer = Arc::new(TokenSigner::new(config.token_settings()));
    let hasher = Arc::new(CredentialHasher::default());

    let auth_use_cases = AuthUseCases::new(
        postgres_arc.clone() as Arc<dyn UserRepo>,
        postgres_arc.clone() as Arc<dyn RefreshTokenRepo>,
        signer,
        hasher,
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "core_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs), skipped when the file can't be created
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
