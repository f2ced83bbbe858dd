//! Binary entrypoint for the Modul Ajar API server.
use modul_api::run;
use modul_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // MODUL_CONFIG, GROQ_API_KEY and MODUL_ADDR override the defaults
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
