use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use docstore::Store;
use docstore::cli::{Cli, Command, parse_filter};
use docstore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn print_document(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.clone().unwrap_or(config.storage.store_dir.clone());

    info!("docstore opening {}", store_path.display());
    let mut store = Store::open(&store_path).context(format!("Failed to open store at {}", store_path.display()))?;

    match cli.command {
        Command::Collections => {
            let collections = store.collections()?;
            if collections.is_empty() {
                println!("No documents found");
            }
            for (name, count) in collections {
                println!("{} {}", name.cyan(), count.to_string().dimmed());
            }
        }
        Command::Get { collection, id } => match store.get_raw(&collection, &id)? {
            Some(value) => print_document(&value, config.output.pretty)?,
            None => println!("{} Not found: {}/{}", "✗".red(), collection, id),
        },
        Command::Query { collection, filters } => {
            let mut parsed = Vec::new();
            for arg in &filters {
                match parse_filter(arg) {
                    Some(filter) => parsed.push(filter),
                    None => eyre::bail!("Invalid filter '{}', expected field=value", arg),
                }
            }
            for value in store.list_raw(&collection, &parsed)? {
                print_document(&value, config.output.pretty)?;
            }
        }
        Command::Delete { collection, id } => {
            let mut batch = store.batch();
            batch.delete_raw(&collection, &id);
            store.commit(batch)?;
            println!("{} Deleted {}/{}", "✓".green(), collection, id);
        }
    }

    Ok(())
}
