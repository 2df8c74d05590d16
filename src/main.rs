//! view-dispatch
//!
//! Serves views whose handlers are chosen per request by predicates.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http server ──▶ view route ──▶ dispatcher ──▶ handler
//!                      (timeout,       (ViewRequest)  (first match,     │
//!                       request id,                    fallback, 405)   │
//!                       tracing)                                        ▼
//!     Client Response                                          context │ response
//!     ◀─────────────────────────────────────────── templates ◀────────┘
//!
//!     Cross-cutting: config (TOML) · observability (tracing, metrics)
//!                    lifecycle (startup checks, graceful shutdown)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use view_dispatch::demo;
use view_dispatch::http::HttpServer;
use view_dispatch::lifecycle::{self, signals, Shutdown};
use view_dispatch::observability::{logging, metrics};
use view_dispatch::templates::TemplateWatcher;

#[derive(Parser)]
#[command(name = "view-dispatch")]
#[command(about = "Serve predicate-dispatched views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the config and serve its views
    Serve {
        #[arg(short, long, default_value = "config/view-dispatch.toml")]
        config: PathBuf,
    },
    /// Validate the config, views and templates without serving
    Check {
        #[arg(short, long, default_value = "config/view-dispatch.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config } => serve(config),
        Commands::Check { config } => check(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn check(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let app = lifecycle::load_application(&path, &demo::site())?;
    println!(
        "{}: ok ({} views, {} templates)",
        path.display(),
        app.config.views.len(),
        app.renderer.template_names().len()
    );
    Ok(())
}

#[tokio::main]
async fn serve(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = lifecycle::load(&path)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(config = %path.display(), "view-dispatch v0.1.0 starting");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let app = lifecycle::prepare(config, &demo::site())?;

    // Held for the lifetime of the server; dropping it stops the watch.
    let _watcher = if app.config.templates.watch {
        match TemplateWatcher::new(app.renderer.clone()) {
            Some(watcher) => Some(watcher.run()?),
            None => None,
        }
    } else {
        None
    };

    let listener = TcpListener::bind(&app.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(app.config, app.routes);
    server.run(listener, shutdown.signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
