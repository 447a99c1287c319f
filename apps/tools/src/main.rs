use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server_api::{ensure_event, ApiContext};
use shared::domain::EventId;
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/registrations.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateEvent { event_id: String, capacity: u32 },
    ListEvents,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;
    let api = ApiContext::new(storage);

    match cli.command {
        Command::CreateEvent { event_id, capacity } => {
            let event = ensure_event(&api, &EventId::new(event_id), capacity)
                .await
                .context("failed to create event")?;
            println!("event_id={} capacity={}", event.id, event.capacity);
        }
        Command::ListEvents => {
            for event in api.store.list_events().await? {
                let registered = api.store.get_all(&event.id).await?.len();
                println!(
                    "event_id={} capacity={} registered={registered}",
                    event.id, event.capacity
                );
            }
        }
    }

    Ok(())
}
