//! csvgrid session server binary
//!
//! HTTP REST API for editing uploaded CSV files.

use std::time::Duration;

use clap::Parser;
use csvgrid::api::{run_api_server, server::ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "csvgrid-server")]
#[command(version)]
#[command(about = "csvgrid session server - upload, edit and download CSV files over HTTP")]
#[command(long_about = r#"
csvgrid session server

Each uploaded CSV becomes an editing session:
  - POST   /api/v1/sessions                 - Upload CSV text (request body)
  - GET    /api/v1/sessions/:id             - Current header and rows
  - PUT    /api/v1/sessions/:id/csv         - Replace contents with new CSV
  - PUT    /api/v1/sessions/:id/cells       - Set one cell {row, col, value}
  - POST   /api/v1/sessions/:id/rows        - Append an empty row
  - DELETE /api/v1/sessions/:id/rows/:row   - Remove a row
  - POST   /api/v1/sessions/:id/edits       - Apply a batch of edits atomically
  - GET    /api/v1/sessions/:id/export      - Download as CSV (?name=file)
  - DELETE /api/v1/sessions/:id             - Discard the session

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Sessions idle longer than --session-ttl-secs are discarded, and at most
--max-sessions are kept (the least recently used one makes room).

Example usage:
  csvgrid-server                           # Start on localhost:8080
  csvgrid-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/sessions --data-binary @people.csv
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "CSVGRID_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CSVGRID_PORT")]
    port: u16,

    /// Largest accepted CSV upload, in bytes
    #[arg(long, default_value = "10485760", env = "CSVGRID_MAX_UPLOAD")]
    max_upload_bytes: usize,

    /// Live sessions kept before the least recently used one is evicted
    #[arg(long, default_value = "1000", env = "CSVGRID_MAX_SESSIONS")]
    max_sessions: usize,

    /// Seconds a session may sit idle before it is discarded
    #[arg(long, default_value = "3600", env = "CSVGRID_SESSION_TTL")]
    session_ttl_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "csvgrid=info,tower_http=info".into()),
        )
        .init();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        max_upload_bytes: args.max_upload_bytes,
        max_sessions: args.max_sessions,
        session_ttl: Duration::from_secs(args.session_ttl_secs),
    };

    run_api_server(config).await
}
