use crate::{
    api,
    cli::{commands::database, telemetry},
    store::{PgStore, Store},
};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub listen: String,
    pub port: u16,
    pub database: database::Options,
}

/// Execute the server action.
///
/// The pool is created here, once, and closed here, once, after the server
/// has drained.
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be
/// provisioned, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let dsn = args.database.dsn()?;

    let store = PgStore::connect(dsn.expose_secret(), &args.database.pool_options())
        .await
        .context("Failed to connect to database")?;

    store
        .provision()
        .await
        .context("Failed to provision database schema")?;

    info!("Database ready");

    let store: Arc<dyn Store> = Arc::new(store);

    let served = api::serve(&args.listen, args.port, Arc::clone(&store)).await;

    store.close().await;
    telemetry::shutdown_tracer();

    served
}
