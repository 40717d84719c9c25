use anyhow::Context;

use stockledger_api::config::ApiConfig;
use stockledger_infra::LedgerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockledger_observability::init();

    let api_config = ApiConfig::from_env();
    let ledger_config = LedgerConfig::from_env();

    let app = stockledger_api::app::build_app(&ledger_config).context("failed to wire ledger services")?;

    let listener = tokio::net::TcpListener::bind(api_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", api_config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
