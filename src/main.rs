//! glomers-node: a Maelstrom test node
//!
//! Speaks the Maelstrom JSON protocol over stdin/stdout:
//! - `init`: identity assignment
//! - `echo`: payload echo
//!
//! Features:
//! - One message per line, replies in processing order
//! - Malformed lines and handler failures logged to stderr, never fatal
//! - Configuration via CLI arguments or TOML file

use glomers_node::config::Config;
use glomers_node::{runtime, Dispatcher, HandlerRegistry};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging; stdout belongs to the protocol
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .init();

    // Handler set is fixed before any input is read
    let registry = HandlerRegistry::with_builtins()?;

    info!(
        handlers = ?registry.kinds(),
        reply_not_supported = config.reply_not_supported,
        max_line_size = config.max_line_size,
        "Starting glomers-node"
    );

    let mut dispatcher = Dispatcher::with_options(registry, config.dispatch_options());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(runtime::run_stdio(&mut dispatcher));

    let stats = dispatcher.stats();
    info!(
        lines = stats.lines,
        replies = stats.replies,
        decode_failures = stats.decode_failures,
        handler_failures = stats.handler_failures,
        unhandled = stats.unhandled,
        oversized_lines = stats.oversized_lines,
        "Node stopped"
    );

    if let Err(e) = result {
        error!(error = %e, "Node terminated");
        return Err(e.into());
    }
    Ok(())
}
