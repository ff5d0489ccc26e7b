//! redirect — generate redirection layers from a schema file
//!
//! # Usage
//!
//! ```bash
//! # Print the generated plans for every table
//! redirect plan people.schema
//!
//! # One table, as DDL
//! redirect plan people.schema --table Person --format ddl
//!
//! # Report which tables can be redirected
//! redirect check people.schema
//! ```

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use redirect_layer::config::RedirectConfigBuilder;
use redirect_layer::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "redirect")]
#[command(version)]
#[command(about = "Copy-on-write redirection layers for read-only tables", long_about = None)]
#[command(after_help = "EXAMPLES:
    redirect plan people.schema
    redirect plan people.schema --table Person --format json
    redirect check people.schema --redirected-schema shadow")]
struct Cli {
    /// Config file (defaults to <config dir>/redirect-layer/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Schema holding the shadow tables
    #[arg(long, global = true, env = "REDIRECT_SCHEMA")]
    redirected_schema: Option<String>,

    /// Schema the generated views live in
    #[arg(long, global = true, env = "REDIRECT_BASE_ALIAS")]
    base_alias: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Sql,
    Json,
    Ddl,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the redirection layer for a schema
    Plan {
        /// Schema file
        schema: PathBuf,

        /// Only this table
        #[arg(short, long)]
        table: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "sql")]
        format: OutputFormat,
    },
    /// Validate a schema and report tables that cannot be redirected
    Check {
        /// Schema file
        schema: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let builder = RedirectionSchemaBuilder::from_config(&config);

    match &cli.command {
        Commands::Plan {
            schema,
            table,
            format,
        } => {
            let schema = load_schema(schema)?;
            let layers = build_layers(
                &builder,
                &schema,
                table.as_deref(),
                &config.base_schema_alias,
            )?;
            print!("{}", render_layers(&layers, &config, *format)?);
            Ok(())
        }
        Commands::Check { schema } => {
            let schema = load_schema(schema)?;
            let (report, _) = check_report(&schema, &builder, &config.base_schema_alias);
            print!("{}", report);
            Ok(())
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<RedirectConfig> {
    let base = RedirectConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let mut builder = RedirectConfigBuilder::starting_from(base);
    if let Some(name) = &cli.redirected_schema {
        builder = builder.redirected_schema(name);
    }
    if let Some(name) = &cli.base_alias {
        builder = builder.base_schema_alias(name);
    }
    Ok(builder.build()?)
}

fn load_schema(path: &Path) -> Result<Schema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    redirect_layer::parse_schema(&text).with_context(|| format!("invalid schema {}", path.display()))
}

fn build_layers(
    builder: &RedirectionSchemaBuilder,
    schema: &Schema,
    table: Option<&str>,
    base_schema_alias: &str,
) -> RedirectResult<Vec<RedirectedTable>> {
    match table {
        Some(name) => Ok(vec![builder.build_redirection_layer(
            schema,
            name,
            base_schema_alias,
        )?]),
        None => builder.build_schema(schema, base_schema_alias),
    }
}

fn render_layers(
    layers: &[RedirectedTable],
    config: &RedirectConfig,
    format: OutputFormat,
) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(layers)?)?;
        }
        OutputFormat::Ddl => {
            writeln!(
                out,
                "{}",
                schema_ddl(layers, &config.redirected_schema, &config.base_schema_alias)
            )?;
        }
        OutputFormat::Sql => {
            for layer in layers {
                writeln!(
                    out,
                    "{} {}.{} {} {}.{}",
                    "▸".cyan(),
                    layer.schema.white().bold(),
                    layer.name.white().bold(),
                    "→".dimmed(),
                    layer.redirected_schema.yellow(),
                    layer.shadow.name.yellow()
                )?;
                let sections = [
                    ("Select", &layer.plan.select_transformation),
                    ("Insert", &layer.plan.insert_plan),
                    ("Update", &layer.plan.update_plan),
                    ("Delete", &layer.plan.delete_plan),
                ];
                for (title, text) in sections {
                    writeln!(out)?;
                    writeln!(out, "{}", format!("{}:", title).green().bold())?;
                    writeln!(out, "{}", text)?;
                }
                writeln!(out)?;
            }
        }
    }
    Ok(out)
}

/// Render the `check` report; also returns how many tables are blocked.
fn check_report(
    schema: &Schema,
    builder: &RedirectionSchemaBuilder,
    base_schema_alias: &str,
) -> (String, usize) {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {} {}",
        "Schema:".dimmed(),
        schema.name.white().bold(),
        "→".dimmed(),
        builder.redirected_schema().yellow()
    );
    let mut blocked = 0;
    for (table, result) in builder.check_schema(schema, base_schema_alias) {
        match result {
            Ok(layer) => {
                let _ = writeln!(
                    out,
                    "  {} {} (key: {}, referenced by {} key(s))",
                    "✓".green(),
                    table.name.white(),
                    layer.primary_key.join(", ").cyan(),
                    schema.referencing(&table.name).len()
                );
            }
            Err(e) => {
                blocked += 1;
                let _ = writeln!(
                    out,
                    "  {} {} {}",
                    "✗".red(),
                    table.name.white(),
                    e.to_string().dimmed()
                );
            }
        }
    }
    let _ = writeln!(out);
    if blocked == 0 {
        let _ = writeln!(
            out,
            "{} all {} table(s) can be redirected",
            "✓".green(),
            schema.tables.len()
        );
    } else {
        let _ = writeln!(
            out,
            "{} {} of {} table(s) cannot be redirected",
            "⚠".yellow(),
            blocked,
            schema.tables.len()
        );
    }
    (out, blocked)
}
