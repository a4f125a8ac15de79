#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use occupancy_tool::{
        AppConfig, LedgerMetadata, OccupancyLedger, OccupancyStore, http_api,
        load_ledger_from_json,
    };
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("occupancy_tool=info".parse()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = config.http_addr.parse()?;

    let seed = || -> Result<OccupancyLedger, Box<dyn std::error::Error>> {
        let mut ledger = match &config.seed_path {
            Some(path) => load_ledger_from_json(path)?,
            None => OccupancyLedger::new(),
        };
        if let Some(year) = config.reporting_year {
            let metadata = LedgerMetadata {
                reporting_year: year,
                ..ledger.metadata().clone()
            };
            ledger.set_metadata(metadata)?;
        }
        if let Some(calendar) = config.working_days_for(ledger.metadata().reporting_year)? {
            ledger.set_calendar(calendar);
        }
        Ok(ledger)
    };

    let state = match &config.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            let store = occupancy_tool::SqliteOccupancyStore::new(path)?;
            let ledger = match store.load_ledger()? {
                Some(ledger) => ledger,
                None => {
                    let ledger = seed()?;
                    store.save_ledger(&ledger)?;
                    ledger
                }
            };
            tracing::info!(
                path = %path.display(),
                records = ledger.records().len(),
                "ledger loaded from sqlite"
            );
            http_api::AppState::with_store(ledger, Arc::new(store))
        }
        _ => http_api::AppState::new(seed()?),
    };

    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
