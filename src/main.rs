use anyhow::{Context, Result};
use kv_console::config::{Args, ConsoleConfig};
use kv_console::store::RedbStore;
use kv_console::{Interpreter, Session};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    // RUST_LOG wins; otherwise stay quiet so logs don't mix with console output.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.verbose);

    let config = ConsoleConfig::from_args(&args)?;
    let store = RedbStore::open(&config.path, config.size_hint, config.read_only)
        .with_context(|| format!("failed to open store at {}", config.path.display()))?;

    let session = Session::new(Box::new(store), Box::new(std::io::stdout()))
        .with_page_size(config.page_size);
    let mut console = Interpreter::new(session);

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        console.repl().context("console input failed")?;
    } else {
        console
            .run_script(stdin.lock())
            .context("failed to read console input")?;
    }
    Ok(())
}
