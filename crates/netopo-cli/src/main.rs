//! Netopo CLI
//!
//! Command-line entry point for:
//! - Serving the graph persistence API (`serve`)
//! - Validating graph files offline and printing their metrics (`check`)
//! - Talking to a running server (`graph ...`)

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod check;
#[cfg(feature = "client")]
mod client;
mod server;

#[derive(Parser)]
#[command(name = "netopo")]
#[command(author, version, about = "Netopo: network topology graph service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the graph persistence API over HTTP.
    Serve(ServeArgs),

    /// Validate a graph JSON file and print its derived metrics.
    Check {
        /// Graph body (same shape as `POST /api/graphs`)
        input: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Client commands against a running server.
    #[cfg(feature = "client")]
    Graph {
        /// Base URL of the graph server
        #[arg(long, default_value = "http://127.0.0.1:7878")]
        server: String,
        /// Request timeout (seconds)
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
        #[command(subcommand)]
        command: GraphCommands,
    },
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Listen address (use `127.0.0.1:0` to auto-pick a free port).
    #[arg(long, default_value = "127.0.0.1:7878")]
    listen: std::net::SocketAddr,

    /// Storage backend: `file` (JSON documents in `--data-dir`) or `memory`.
    #[arg(long, default_value = "file")]
    store: String,

    /// Directory for the file store.
    #[arg(long, default_value = "./graphs")]
    data_dir: PathBuf,

    /// Value of `Access-Control-Allow-Origin` on every response.
    #[arg(long, default_value = "*")]
    cors_origin: String,

    /// Largest accepted request body.
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    max_body_bytes: usize,

    /// If set, write a small JSON file once the server is listening.
    ///
    /// Useful for scripts/tests to learn the chosen port when `--listen ...:0`.
    #[arg(long)]
    ready_file: Option<PathBuf>,
}

#[cfg(feature = "client")]
#[derive(Subcommand, Debug)]
enum GraphCommands {
    /// List stored graphs.
    List {
        /// Only graphs of this mode (RV, SC, Cloud)
        #[arg(long)]
        game_type: Option<String>,
    },
    /// Print one graph.
    Get { id: String },
    /// Create a graph from a file, or update `--id` with it.
    Push {
        input: PathBuf,
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a graph.
    Delete { id: String },
    /// Set only the minimum consumption of a graph.
    SetMinimum { id: String, value: f64 },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve(args) => server::cmd_serve(args),
        Commands::Check { input, json } => check::cmd_check(&input, json),
        #[cfg(feature = "client")]
        Commands::Graph {
            server,
            timeout_secs,
            command,
        } => client::cmd_graph(&server, timeout_secs, command),
    }
}
