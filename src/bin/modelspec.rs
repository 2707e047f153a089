//! modelspec CLI
//!
//! Command-line interface for generating OpenAPI documents from catalogs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use modelspec::{flatten, Catalog, CatalogError};

#[derive(Parser)]
#[command(name = "modelspec")]
#[command(about = "Generate OpenAPI documents and query parameters from model catalogs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the OpenAPI document for a catalog
    Generate {
        /// Catalog file (JSON)
        catalog: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
    },

    /// Flatten a declared struct type into query parameters
    Flatten {
        /// Catalog file (JSON)
        catalog: PathBuf,

        /// Declared type name (e.g. pets.Filter)
        #[arg(long = "type")]
        type_name: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            catalog,
            output,
            pretty,
            format,
        } => run_generate(&catalog, output, pretty, format),

        Commands::Flatten {
            catalog,
            type_name,
            json,
        } => run_flatten(&catalog, &type_name, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so they never mix with generated output.
fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn load_catalog(path: &Path) -> Result<Catalog, u8> {
    Catalog::load(path).map_err(|e: CatalogError| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_generate(
    catalog_path: &Path,
    output: Option<PathBuf>,
    pretty: bool,
    format: Format,
) -> Result<(), u8> {
    let catalog = load_catalog(catalog_path)?;

    let doc = catalog.to_api().build_document().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let rendered = match format {
        Format::Json => doc.to_json(pretty).map_err(|e| e.to_string()),
        Format::Yaml => doc.to_yaml().map_err(|e| e.to_string()),
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered.trim_end());
        }
    }

    Ok(())
}

fn run_flatten(catalog_path: &Path, type_name: &str, json_output: bool) -> Result<(), u8> {
    let catalog = load_catalog(catalog_path)?;

    let Some(def) = catalog.type_def(type_name) else {
        eprintln!("Error: unknown type \"{}\"", type_name);
        return Err(2);
    };

    let params = flatten(&def, catalog.enums()).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    if json_output {
        let entries: Vec<_> = params
            .values()
            .map(|p| {
                serde_json::json!({
                    "name": p.path,
                    "required": p.required,
                    "type": p.kind,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(entries));
    } else {
        for p in params.values() {
            let presence = if p.required { "required" } else { "optional" };
            println!("{}\t{}\t{}", p.path, presence, p.kind);
        }
    }

    Ok(())
}
