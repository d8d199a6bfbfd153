use std::{fs::OpenOptions, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use family_ledger::{
    AppState, ShortMonthPolicy, build_router, graceful_shutdown, logging_middleware,
    spawn_recurring_scheduler,
};

const MAX_PROCESS_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// The REST API server for the family ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical name of the timezone that decides "today", e.g. "Asia/Seoul".
    #[arg(long, default_value = "Asia/Seoul")]
    timezone: String,

    /// How recurring rules due on the 29th to 31st are handled in shorter months.
    #[arg(long, value_enum, default_value_t = ShortMonthPolicy::Skip)]
    short_month_policy: ShortMonthPolicy,

    /// Post due recurring rules every this many minutes, up to one week.
    ///
    /// If not set, recurring rules are only posted via the process endpoint.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_PROCESS_INTERVAL_MINUTES))]
    process_interval_minutes: Option<u64>,

    /// File path to write debug logs to.
    #[arg(long, default_value = "debug.log")]
    log_path: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let state = AppState::new(conn, &args.timezone, args.short_month_policy)
        .expect("Could not initialize the app state.");

    if let Some(minutes) = args.process_interval_minutes {
        tracing::info!("Posting due recurring rules every {minutes} minutes");
        spawn_recurring_scheduler(&state, process_interval(minutes));
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn process_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

fn setup_logging(log_path: &str) {
    let stdout_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
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
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
