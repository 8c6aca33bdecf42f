use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clicklog::config::StorageConfig;
use clicklog::models::EventRecord;
use clicklog::storage::{EventStore, JsonLinesStore};

#[derive(Parser)]
#[command(name = "clicklog-admin")]
#[command(about = "Inspect the clicklog event log", long_about = None)]
struct Cli {
    /// Event log path (defaults to LOG_FILE or logs.json)
    #[arg(long, global = true)]
    file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every readable event
    List {
        /// Print raw JSON lines instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the number of readable events
    Count,
    /// Print the most recent events
    Tail {
        /// Number of events to show
        #[arg(default_value_t = 10)]
        n: usize,
        #[arg(long)]
        json: bool,
    },
}

fn print_events(events: &[EventRecord], json: bool) -> Result<()> {
    if json {
        for event in events {
            println!(
                "{}",
                serde_json::to_string(event).context("failed to encode event")?
            );
        }
        return Ok(());
    }

    if events.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    println!(
        "{:<22} {:<20} {:<16} {:<8} {}",
        "Timestamp", "Link", "IP", "Country", "City"
    );
    println!("{}", "-".repeat(80));
    for event in events {
        println!(
            "{:<22} {:<20} {:<16} {:<8} {}",
            event.timestamp, event.link_id, event.ip_address, event.country_code, event.city
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let path = match cli.file {
        Some(path) => path,
        None => StorageConfig::from_env().log_path,
    };

    let store = JsonLinesStore::new(&path);
    let events = store
        .read_all()
        .await
        .with_context(|| format!("failed to read event log at {}", path))?;

    match cli.command {
        Commands::List { json } => print_events(&events, json)?,
        Commands::Count => println!("{}", events.len()),
        Commands::Tail { n, json } => {
            let start = events.len().saturating_sub(n);
            print_events(&events[start..], json)?;
        }
    }

    Ok(())
}
