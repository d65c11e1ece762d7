use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use profile_store::{
    map_to_json, migrate_if_needed, AttributeMap, AttributeStore, FsBackend,
};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Inspect and maintain a persisted user-profile attribute store.
#[derive(Parser)]
#[command(
    name = "profilectl",
    version,
    about = "Inspect and maintain a persisted user-profile attribute store"
)]
struct Cli {
    /// Directory holding the persisted profile
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the whole attribute map
    Show,

    /// Print the named attributes (all of them when no name is given)
    Get {
        /// Attribute names to select
        keys: Vec<String>,
    },

    /// Set attributes from key=value pairs; values are parsed as JSON,
    /// falling back to plain strings, and an empty value deletes the key
    Set {
        /// key=value pairs
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Remove the named attributes
    Remove {
        /// Attribute names to remove
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Erase the whole profile
    Reset,

    /// Import a legacy-format profile blob, if one is present
    Migrate,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match FsBackend::open(&cli.data_dir) {
        Ok(backend) => AttributeStore::new(backend),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Show => cmd_get(&store, &[], cli.output),
        Commands::Get { keys } => cmd_get(&store, &keys, cli.output),
        Commands::Set { pairs } => cmd_set(&store, &pairs, cli.output),
        Commands::Remove { keys } => cmd_remove(&store, &keys, cli.output),
        Commands::Reset => cmd_reset(&store),
        Commands::Migrate => cmd_migrate(&store),
    }
}

fn cmd_get(store: &AttributeStore<FsBackend>, keys: &[String], output: OutputFormat) {
    match store.select(keys) {
        Ok(selected) => print_map(&selected, output),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

fn cmd_set(store: &AttributeStore<FsBackend>, pairs: &[String], output: OutputFormat) {
    let mut updates = serde_json::Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            eprintln!("error: '{}' is not a key=value pair", pair);
            process::exit(1);
        };
        // JSON first (numbers, booleans, arrays, objects), then string.
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        updates.insert(key.to_string(), value);
    }
    match store.merge(&updates) {
        Ok(Some(map)) => print_map(&map, output),
        Ok(None) => {}
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

fn cmd_remove(store: &AttributeStore<FsBackend>, keys: &[String], output: OutputFormat) {
    match store.delete(keys) {
        Ok(Some(map)) => print_map(&map, output),
        Ok(None) => {
            // Matching nothing is a success, just nothing to report.
            if output == OutputFormat::Text {
                println!("no matching attributes");
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

fn cmd_reset(store: &AttributeStore<FsBackend>) {
    if let Err(err) = store.clear() {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn cmd_migrate(store: &AttributeStore<FsBackend>) {
    match migrate_if_needed(store) {
        Ok(true) => println!("migrated legacy profile"),
        Ok(false) => println!("nothing migrated"),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

fn print_map(map: &AttributeMap, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&map_to_json(map))
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            if map.is_empty() {
                println!("(empty)");
                return;
            }
            for (key, value) in map {
                println!("{} = {}", key, value.to_json());
            }
        }
    }
}
