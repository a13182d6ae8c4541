use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Operate the shelf library-management service.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API until interrupted
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved settings as JSON
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            shelf_app::bootstrap::run(settings).await
        }
        Command::Migrate => {
            shelf_telemetry::init(&settings.telemetry)?;
            migrate(&settings).await
        }
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let mut settings = settings.clone();
    // `prepare` would migrate on its own; keep the count reported here.
    settings.database.auto_migrate = false;

    let db = shelf_app::bootstrap::connect(&settings).await?;
    let registry = shelf_app::bootstrap::prepare(&settings, &db).await?;
    let applied = shelf_app::bootstrap::migrate(&registry, &db).await?;
    db.close().await;

    println!("applied {applied} migration(s)");
    Ok(())
}
