//! drive_export CLI - Export Google Docs to local files, or serve the export API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drive_export::config::DriveArgs;
use drive_export::models::ExportOutcome;
use drive_export::server;

/// Export Google Docs as PDF or DOCX into a local folder.
#[derive(Parser)]
#[command(name = "drive_export")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    drive: DriveArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the export API over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },

    /// Export a single document.
    Export {
        /// Document URL or ID.
        file: String,

        /// Requested MIME type (application/pdf exports PDF, anything else DOCX).
        #[arg(long, short = 'm')]
        mime_type: Option<String>,
    },

    /// List the children of a folder.
    List {
        /// Folder URL or ID.
        folder: String,
    },

    /// Export every document in a folder as DOCX.
    ExportFolder {
        /// Folder URL or ID.
        folder: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing env-backed options)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drive_export=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let service = cli
        .drive
        .export_service()
        .context("Failed to set up the Drive export service")?;

    match cli.command {
        Commands::Serve { host, port } => {
            server::serve(service, &host, port).await?;
        }

        Commands::Export { file, mime_type } => {
            let path = service
                .export_file(&file, mime_type.as_deref())
                .await
                .with_context(|| format!("Failed to export file: {}", file))?;
            println!("{}", path.display());
        }

        Commands::List { folder } => {
            let children = service
                .list_folder(&folder)
                .await
                .with_context(|| format!("Failed to list folder: {}", folder))?;

            if children.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44} {}", "ID", "LINK");
                println!("{}", "-".repeat(100));
                for child in children {
                    println!("{}", child);
                }
            }
        }

        Commands::ExportFolder { folder } => {
            let report = service
                .export_folder(&folder)
                .await
                .with_context(|| format!("Failed to export folder: {}", folder))?;

            for child in &report.children {
                match &child.outcome {
                    ExportOutcome::Exported(path) => {
                        println!("OK      {}\t{}", child.id, path.display())
                    }
                    ExportOutcome::Failed(reason) => println!("FAILED  {}\t{}", child.id, reason),
                }
            }
            println!("{}", report);
        }
    }

    Ok(())
}
