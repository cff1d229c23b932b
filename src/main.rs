// Only compile the UI module when the TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use std::env;

const DEMO_FIXTURE: &str = include_str!("../fixtures/demo.json");
const DEMO_USER_ID: i64 = 1;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 2 && args[1] == "--live" {
        run_live_mode(&args[2])?;
    } else {
        run_demo_mode()?;
    }

    Ok(())
}

fn run_demo_mode() -> Result<()> {
    use anyhow::Context;
    use fingate::FixtureBackend;

    println!("💰 Loading Fingate demo dataset...\n");

    let backend = FixtureBackend::from_json(DEMO_FIXTURE)
        .context("demo fixture is not a valid backend document")?;

    run_ui_mode(backend)
}

#[cfg(feature = "http")]
fn run_live_mode(base_url: &str) -> Result<()> {
    use fingate::HttpBackend;

    println!("🌐 Connecting to backend at {base_url}...\n");
    run_ui_mode(HttpBackend::new(base_url))
}

#[cfg(not(feature = "http"))]
fn run_live_mode(_base_url: &str) -> Result<()> {
    eprintln!("❌ Live mode not available!");
    eprintln!("   Rebuild with: cargo build --features http");
    std::process::exit(1);
}

#[cfg(feature = "tui")]
fn run_ui_mode<S: fingate::FinanceBackend>(source: S) -> Result<()> {
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(source, DEMO_USER_ID);
    app.refresh();
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode<S: fingate::FinanceBackend>(_source: S) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
