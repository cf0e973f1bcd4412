use anyhow::Result;
use grid_dashboard::{
    api::{self, AppState},
    collaborators::{Assistant, HttpAssistant, NewsClient},
    config::AppConfig,
    loader, observability, prometheus,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    let metrics = match &cfg.metrics {
        Some(m) if m.enabled => Some(prometheus::install_recorder()?),
        _ => None,
    };

    // The dataset is loaded once; a bad file is fatal.
    let table = loader::load_readings_with_delimiter(&cfg.dataset.path, cfg.dataset.delimiter as u8)
        .map_err(|e| anyhow::anyhow!("failed to load dataset: {e}"))?;

    let assistant = HttpAssistant::from_config(&cfg.assistant)?.map(|a| Arc::new(a) as Arc<dyn Assistant>);
    let news = NewsClient::from_config(&cfg.news)?;

    let state = AppState {
        table: Arc::new(table),
        assistant,
        news,
        report_path: cfg.report.output_path.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "dashboard listening");
    axum::serve(listener, api::router(state, metrics)).await?;

    Ok(())
}
