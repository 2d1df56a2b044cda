use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use sentiment_etl::config::EtlConfig;
use sentiment_etl::logging;
use sentiment_etl::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "sentiment_etl")]
#[command(about = "Load sentiment-labeled CSV files into SQLite and summarize them")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file; defaults apply for anything it omits
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run Extract, Transform, Load and reporting for one CSV file
    Run {
        /// Input CSV path
        #[arg(long)]
        input: Option<PathBuf>,
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Directory for the summary report
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Create the storage table if it does not exist
    InitDb {
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Extract and transform a file without storing anything
    Inspect {
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = EtlConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run { input, db, output_dir } => {
            if let Some(p) = input {
                config.input_path = p.clone();
            }
            if let Some(p) = db {
                config.db_path = p.clone();
            }
            if let Some(p) = output_dir {
                config.output_dir = p.clone();
            }
        }
        Commands::InitDb { db } => {
            if let Some(p) = db {
                config.db_path = p.clone();
            }
        }
        Commands::Inspect { input } => {
            if let Some(p) = input {
                config.input_path = p.clone();
            }
        }
    }

    logging::init_logging(&config.log_dir);
    sentiment_etl::metrics::register_all_metrics();

    match cli.command {
        Commands::Run { .. } => {
            println!("🚀 Running pipeline on {}...", config.input_path.display());
            let input = config.input_path.clone();
            let pipeline = Pipeline::from_config(config)?;
            match pipeline.run(&input) {
                Ok(result) => {
                    println!("\n📊 Pipeline Results:");
                    println!("   Rows read: {}", result.load.rows_read);
                    println!("   Duplicates dropped: {}", result.reconcile.duplicates_dropped);
                    println!("   Empty rows dropped: {}", result.reconcile.empty_dropped);
                    println!("   Rows stored: {}", result.rows_stored);
                    if let Some(err) = &result.report_error {
                        println!("\n⚠️  Rows were stored but the summary was not written: {}", err);
                    }
                    if result.load.degraded() {
                        println!("\n⚠️  Input was loaded in degraded mode ({:?})", result.load.mode);
                    }
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::InitDb { .. } => {
            let db_path = config.db_path.clone();
            let pipeline = Pipeline::from_config(config)?;
            pipeline.init_schema()?;
            println!("✅ Schema ready in {}", db_path.display());
        }
        Commands::Inspect { .. } => {
            let batch = Pipeline::prepare(&config.input_path)?;
            println!("{}", serde_json::to_string_pretty(&batch.load)?);
            println!("   Text source: {:?}", batch.text_source);
            println!(
                "   {} of {} rows would be stored ({} duplicates, {} empty)",
                batch.reconcile.kept,
                batch.reconcile.input_rows,
                batch.reconcile.duplicates_dropped,
                batch.reconcile.empty_dropped
            );
        }
    }

    Ok(())
}
