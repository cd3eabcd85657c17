use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;

use owner_resolution::{
    load_sales_csv, resolve_record, CanonicalKeyBuilder, NameContext, OwnerClassifier, PropertyRecord,
    ResolverConfig, Vocabulary,
};

#[derive(Parser)]
#[command(name = "owner-resolution")]
#[command(about = "Resolve property owner names into Person/Company entities", version)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Resolver config JSON (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one property record and write the output JSON
    Resolve {
        /// Property record JSON
        #[arg(short, long)]
        record: PathBuf,

        /// Sales history CSV; replaces the record's sales
        #[arg(short, long)]
        sales: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Print the canonical key of each name
    Key { names: Vec<String> },

    /// Print the classification of each name
    Classify {
        names: Vec<String>,

        /// Read names as grantor/grantee strings instead of owners of record
        #[arg(long)]
        sale: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ResolverConfig::from_file(path)?,
        None => ResolverConfig::default(),
    };

    match cli.command {
        Command::Resolve {
            record,
            sales,
            output,
            pretty,
        } => run_resolve(&config, record, sales, output, pretty),
        Command::Key { names } => {
            let builder = CanonicalKeyBuilder::new(Vocabulary::from_config(&config).into());
            for name in names {
                match builder.build_key(&name) {
                    Some(key) => println!("{}\t{}", name, key),
                    None => println!("{}\t-", name),
                }
            }
            Ok(())
        }
        Command::Classify { names, sale } => {
            let classifier = OwnerClassifier::from_config(&config, Vocabulary::from_config(&config).into())?;
            let context = if sale { NameContext::Sale } else { NameContext::Owner };
            for name in names {
                let payload = classifier.classify(&name, context);
                println!(
                    "{}",
                    serde_json::json!({
                        "raw": &name,
                        "signal": classifier.company_signal(&name),
                        "payload": payload,
                    })
                );
            }
            Ok(())
        }
    }
}

fn run_resolve(
    config: &ResolverConfig,
    record_path: PathBuf,
    sales_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let mut record = PropertyRecord::from_json_file(&record_path)?;
    if let Some(path) = sales_path {
        record.sales = load_sales_csv(&path)?;
        info!("Loaded {} sales from {:?}", record.sales.len(), path);
    }

    let output = resolve_record(&record, config)?;
    info!(
        parcel = %output.parcel_identifier,
        fingerprint = %output.fingerprint,
        "{}",
        output.summary.summary()
    );

    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match output_path {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("Failed to write output: {:?}", path))?;
            info!("Wrote resolution output to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "owner_resolution=debug" } else { "owner_resolution=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
