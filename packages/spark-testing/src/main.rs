//! Spark Mock Server
//!
//! Standalone build of the in-process mock used by the SDK's integration
//! tests. Serves the membership resource and a few people/room fixtures
//! over plain HTTP with a single accepted bearer token.

use clap::Parser;

use spark_testing::{router, MockConfig, MockState, DEFAULT_ACCESS_TOKEN, DEFAULT_PORT};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "spark-mock-server", version, about = "Spark REST mock server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "SPARK_MOCK_PORT")]
    port: u16,

    /// Bearer token clients must present
    #[arg(long, default_value = DEFAULT_ACCESS_TOKEN, env = "SPARK_MOCK_ACCESS_TOKEN")]
    access_token: String,

    /// Email of the person the token belongs to
    #[arg(long, default_value = "self@example.com", env = "SPARK_MOCK_SELF_EMAIL")]
    self_email: String,

    /// Rooms to create at startup (comma-separated titles)
    #[arg(long, value_delimiter = ',')]
    seed_rooms: Vec<String>,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spark_mock_server=info,spark_testing=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = MockConfig {
        port: args.port,
        access_token: args.access_token,
        self_email: args.self_email,
        ..MockConfig::default()
    };

    let state = MockState::new(config)?;

    for title in args.seed_rooms.iter().filter(|t| !t.trim().is_empty()) {
        match state.create_room(title) {
            Ok(room) => tracing::info!(room_id = room.id.as_str(), title = title.as_str(), "Seeded room"),
            Err(e) => tracing::warn!(title = title.as_str(), error = ?e, "Failed to seed room"),
        }
    }

    let addr = format!("0.0.0.0:{}", state.config.port);
    tracing::info!(
        self_id = state.self_id.as_str(),
        "Spark mock server starting on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await
}
