use std::error::Error;

use api::AppState;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; the process environment and defaults cover it.
    let dotenv = dotenvy::dotenv();

    llm_service::telemetry::init("info", Level::DEBUG)?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => info!("no .env file; using process environment"),
        Err(e) => return Err(e.into()),
    }

    let state = AppState::from_env()?;
    api::start(state).await?;

    Ok(())
}
