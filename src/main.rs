//! vibeql - compile infix expressions with a chosen backend

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use log::info;
use std::path::PathBuf;
use vibeql::backend::{Arithmetic, Backend, SqlStandard};
use vibeql::config::RewriteConfig;
use vibeql::expression::{table, Expr};
use vibeql::registry::OperatorRegistry;
use vibeql::schema::{Table, TableSchema};
use vibeql::types::TypeName;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendKind {
    /// Render standard SQL text
    Sql,
    /// Fold the expression to a single value
    Arithmetic,
}

/// vibeql - compile typed expressions to SQL or fold them to values
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expression to compile, e.g. "amount * 2 >= 10"
    expression: String,

    /// Name of the source table
    #[arg(short, long, default_value = "t")]
    table: String,

    /// Column of the source table as name:type or name:type:null
    #[arg(short, long = "column", value_name = "NAME:TYPE[:null]")]
    columns: Vec<String>,

    /// Read the table schema from a file written by --write-schema
    #[arg(short = 'f', long, conflicts_with = "columns")]
    schema_file: Option<PathBuf>,

    /// Write the table schema to a file
    #[arg(short, long)]
    write_schema: Option<PathBuf>,

    /// Backend used to compile the expression
    #[arg(short, long, value_enum, default_value = "sql")]
    backend: BackendKind,

    /// Ceiling on rewrite passes
    #[arg(short, long, default_value = "100")]
    max_iterations: usize,

    /// Log every rewrite pass
    #[arg(long)]
    trace: bool,

    /// Print the expression tree before compiling
    #[arg(short, long)]
    explain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let schema = load_schema(&args)?;
    if let Some(path) = &args.write_schema {
        std::fs::write(path, schema.to_bytes()?)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        info!("Wrote schema to {}", path.display());
    }

    let registry = OperatorRegistry::standard().context("Failed to build operator registry")?;
    let source_table = Table::new(args.table.as_str(), schema);
    info!(
        "Source table {} ({})",
        source_table.qualified_name(),
        source_table.schema.summary()
    );
    let source = table(&source_table);
    let expr = vibeql::parse::parse(&args.expression, &registry, Some(&source))
        .context("Failed to parse expression")?;

    if args.explain {
        print!("{}", expr.explain());
    }

    let config = RewriteConfig::default()
        .with_max_iterations(args.max_iterations)
        .with_trace(args.trace);
    println!("{}", compile(args.backend, config, &expr)?);

    Ok(())
}

fn compile(kind: BackendKind, config: RewriteConfig, expr: &Expr) -> Result<String> {
    let output = match kind {
        BackendKind::Sql => {
            let mut backend = SqlStandard::with_config(config);
            backend.connect()?;
            backend.compile(expr)?
        }
        BackendKind::Arithmetic => {
            let mut backend = Arithmetic::with_config(config);
            backend.connect()?;
            backend.compile(expr)?.repr()
        }
    };
    Ok(output)
}

fn load_schema(args: &Args) -> Result<TableSchema> {
    if let Some(path) = &args.schema_file {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read schema from {}", path.display()))?;
        return Ok(TableSchema::from_bytes(&data)?);
    }

    let mut builder = TableSchema::builder();
    for spec in &args.columns {
        let (name, data_type, nullable) = parse_column(spec)?;
        builder = builder.column(name, data_type, nullable);
    }
    Ok(builder.build()?)
}

/// Parse `name:type` or `name:type:null`
fn parse_column(spec: &str) -> Result<(&str, TypeName, bool)> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (name, type_name, nullable) = match parts.as_slice() {
        [name, type_name] => (*name, *type_name, false),
        [name, type_name, "null"] => (*name, *type_name, true),
        _ => bail!("Invalid column '{}', expected name:type[:null]", spec),
    };
    let data_type = type_name
        .parse::<TypeName>()
        .with_context(|| format!("Unknown type '{}' for column '{}'", type_name, name))?;
    Ok((name, data_type, nullable))
}
