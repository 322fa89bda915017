use std::{env, error::Error, fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, BackendKind, SharingMode, StorageConfig, build_router, get_local_offset,
    graceful_shutdown,
};

/// The cookie secret used by the local snapshot when `SECRET` is not set.
/// The local snapshot has no log-in, so the cookie key is never used to sign anything.
const LOCAL_COOKIE_SECRET: &str = "finance-tracker-local";

/// The web server for the finance tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Where transactions are stored.
    #[arg(long, value_enum, default_value_t = BackendKind::Local)]
    backend: BackendKind,

    /// File path to the JSON snapshot used by the local backend.
    #[arg(long, default_value = "transactions.json")]
    data_path: PathBuf,

    /// File path to the SQLite database used by the live backend.
    #[arg(long, default_value = "finance.db")]
    db_path: PathBuf,

    /// Whether signed-in users share one collection (live backend only).
    #[arg(long, value_enum, default_value_t = SharingMode::Family)]
    sharing: SharingMode,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// A canonical timezone name used to work out "today", e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    if get_local_offset(&args.timezone).is_none() {
        return Err(format!("\"{}\" is not a canonical timezone name", args.timezone).into());
    }

    let secret = match (args.backend, env::var("SECRET")) {
        (_, Ok(secret)) => secret,
        (BackendKind::Live, Err(_)) => {
            return Err("The environment variable 'SECRET' must be set for the live backend".into());
        }
        (BackendKind::Local, Err(_)) => LOCAL_COOKIE_SECRET.to_owned(),
    };

    let storage = StorageConfig::new(args.backend, args.data_path, args.db_path, args.sharing);
    let state = AppState::new(&storage, &secret, &args.timezone)?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the app's own middleware.
        .on_failure(());

    router.layer(tracing_layer)
}
