// rowsync CLI - CSV-to-store reconciliation, headless

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rowsync_import::{rows_from_csv_file, run, ImportError, ImportOptions};
use rowsync_store::{Filter, MemoryStore, Schema, Store, Value};

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILED_ROWS: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_IO: u8 = 3;

struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

fn usage_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_USAGE, message: msg.into(), hint: None }
}

fn io_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_IO, message: msg.into(), hint: None }
}

#[derive(Parser)]
#[command(name = "rowsync")]
#[command(about = "Reconcile CSV rows against a record store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV file into the store, creating or updating by uid
    #[command(after_help = "\
Examples:
  rowsync import items.csv --schema catalog.toml --store store.json --model items --uid name
  rowsync import items.csv --schema catalog.toml --store store.json --model items \\
      --uid name --default 'price=9.99' --delete-missing
  rowsync import items.csv --schema catalog.toml --store store.json --model items \\
      --uid name --scope 'category_id=1' --delete-missing --json")]
    Import {
        /// CSV file (first line = headers; dotted headers resolve associations)
        csv: PathBuf,

        /// Schema TOML file
        #[arg(long)]
        schema: PathBuf,

        /// JSON store snapshot (created if absent)
        #[arg(long)]
        store: PathBuf,

        /// Target entity
        #[arg(long)]
        model: String,

        /// Uid field (repeatable; default: id)
        #[arg(long = "uid")]
        uid: Vec<String>,

        /// Keep only these fields (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Drop these fields (repeatable)
        #[arg(long)]
        except: Vec<String>,

        /// Default value as FIELD=VALUE (repeatable; row values win)
        #[arg(long = "default", value_name = "FIELD=VALUE")]
        defaults: Vec<String>,

        /// Deletion-sweep scope clause as FIELD=VALUE (repeatable, ANDed)
        #[arg(long = "scope", value_name = "FIELD=VALUE")]
        scope: Vec<String>,

        /// Delete in-scope records absent from this import
        #[arg(long)]
        delete_missing: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Run the batch but do not write the snapshot back
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse and validate a schema TOML file
    #[command(after_help = "\
Examples:
  rowsync validate catalog.toml")]
    Validate {
        /// Schema TOML file
        schema: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Import {
            csv,
            schema,
            store,
            model,
            uid,
            only,
            except,
            defaults,
            scope,
            delete_missing,
            json,
            dry_run,
        } => cmd_import(
            &csv,
            &schema,
            &store,
            model,
            uid,
            only,
            except,
            defaults,
            scope,
            delete_missing,
            json,
            dry_run,
        ),
        Commands::Validate { schema } => cmd_validate(&schema),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn cmd_import(
    csv_path: &Path,
    schema_path: &Path,
    store_path: &Path,
    model: String,
    uid: Vec<String>,
    only: Vec<String>,
    except: Vec<String>,
    defaults: Vec<String>,
    scope: Vec<String>,
    delete_missing: bool,
    json: bool,
    dry_run: bool,
) -> Result<u8, CliError> {
    let schema = load_schema(schema_path)?;
    let model_name = model.clone();

    let mut store = if store_path.exists() {
        MemoryStore::load(schema, store_path)
            .map_err(|e| io_err(format!("cannot load {}: {e}", store_path.display())))?
    } else {
        MemoryStore::new(schema)
    };

    let mut options = ImportOptions::new(model);
    if !uid.is_empty() {
        options = options.uid(uid);
    }
    if !only.is_empty() {
        options = options.only(only);
    }
    if !except.is_empty() {
        options = options.except(except);
    }
    for pair in defaults {
        let (field, value) = split_pair(&pair)?;
        options = options.default_value(field, value);
    }
    if !scope.is_empty() {
        let filter = build_scope(store.schema(), &model_name, scope)?;
        options = options.scope(filter);
    }
    options = options.delete_missing(delete_missing);

    let rows = rows_from_csv_file(csv_path).map_err(|e| match e {
        ImportError::Io(msg) => io_err(msg),
        other => io_err(other.to_string()),
    })?;

    let batch = run(&mut store, rows, &options).map_err(|e| usage_err(e.to_string()))?;

    for outcome in batch.failed() {
        if let Some(error) = outcome.result.error() {
            eprintln!("row failed: {error}");
        }
    }

    let summary = batch.summary();
    if json {
        let out = serde_json::to_string_pretty(&summary)
            .map_err(|e| io_err(e.to_string()))?;
        println!("{out}");
    } else {
        println!(
            "{} rows: {} created, {} updated, {} failed, {} deleted",
            summary.total, summary.created, summary.updated, summary.failed, summary.deleted
        );
    }

    if !dry_run {
        store
            .save(store_path)
            .map_err(|e| io_err(format!("cannot write {}: {e}", store_path.display())))?;
    }

    Ok(if summary.failed > 0 { EXIT_FAILED_ROWS } else { EXIT_SUCCESS })
}

fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| io_err(format!("cannot read {}: {e}", path.display())))?;
    Schema::from_toml(&text).map_err(|e| usage_err(e.to_string()))
}

fn split_pair(pair: &str) -> Result<(&str, &str), CliError> {
    pair.split_once('=').ok_or_else(|| {
        CliError {
            code: EXIT_USAGE,
            message: format!("expected FIELD=VALUE, got '{pair}'"),
            hint: Some("example: --default 'price=9.99'".into()),
        }
    })
}

/// Scope values coerce through the schema so the filter compares typed
/// values, not raw strings.
fn build_scope(schema: &Schema, model: &str, pairs: Vec<String>) -> Result<Filter, CliError> {
    let mut filter = Filter::new();
    for pair in pairs {
        let (field, raw) = split_pair(&pair)?;
        let value = if field == "id" {
            raw.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| usage_err(format!("scope id must be an int, got '{raw}'")))?
        } else {
            let column = schema.column(model, field).ok_or_else(|| {
                usage_err(format!("scope field '{field}' is not a column of '{model}'"))
            })?;
            Value::parse_typed(column.kind, raw).map_err(usage_err)?
        };
        filter = filter.eq(field, value);
    }
    Ok(filter)
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(schema_path: &Path) -> Result<u8, CliError> {
    let schema = load_schema(schema_path)?;
    for (name, entity) in &schema.entities {
        println!(
            "{name}: {} column(s), {} association(s)",
            entity.columns.len(),
            entity.belongs_to.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
