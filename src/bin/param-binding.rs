//! Parameter Binding CLI
//!
//! Command-line interface for inspecting shapes and binding requests
//! against them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use param_binding::{
    document, document_registry, greeting, load_definitions, process,
    BindingRequest, LoadError, ShapeRegistry,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "param-binding")]
#[command(about = "Bind and validate HTTP parameter objects from query or body")]
#[command(version)]
struct Cli {
    /// Log binding decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print endpoint documentation for one or all shapes
    Describe {
        /// Shape definitions file (built-in greeting shapes if not specified)
        #[arg(long, short)]
        definitions: Option<PathBuf>,

        /// Only describe this shape
        #[arg(long, short)]
        shape: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Bind a request to a shape, validate it and print the response
    Bind {
        /// Shape definitions file (built-in greeting shapes if not specified)
        #[arg(long, short)]
        definitions: Option<PathBuf>,

        /// Shape to bind
        #[arg(long, short)]
        shape: String,

        /// Raw query string (e.g. "title=MR&name=bean")
        #[arg(long, short, default_value = "")]
        query: String,

        /// Content-Type header value
        #[arg(long)]
        content_type: Option<String>,

        /// Request body
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the request body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Output status and body as a single JSON object
        #[arg(long)]
        json: bool,
    },

    /// Check a shape definitions file
    Check {
        /// Shape definitions file
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Describe {
            definitions,
            shape,
            pretty,
        } => run_describe(definitions.as_deref(), shape.as_deref(), pretty),

        Commands::Bind {
            definitions,
            shape,
            query,
            content_type,
            body,
            body_file,
            json,
        } => run_bind(BindArgs {
            definitions,
            shape,
            query,
            content_type,
            body,
            body_file,
            json_output: json,
        }),

        Commands::Check { path } => run_check(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(definitions: Option<&Path>) -> Result<ShapeRegistry, u8> {
    match definitions {
        Some(path) => load_definitions(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        }),
        None => greeting::registry().map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        }),
    }
}

fn to_json(value: &Value, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn run_describe(definitions: Option<&Path>, shape: Option<&str>, pretty: bool) -> Result<(), u8> {
    let registry = load_registry(definitions)?;

    let doc = match shape {
        Some(name) => {
            let resolved = registry.require(name).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            document(resolved)
        }
        None => document_registry(&registry),
    };

    println!("{}", to_json(&doc, pretty)?);
    Ok(())
}

struct BindArgs {
    definitions: Option<PathBuf>,
    shape: String,
    query: String,
    content_type: Option<String>,
    body: Option<String>,
    body_file: Option<PathBuf>,
    json_output: bool,
}

fn run_bind(args: BindArgs) -> Result<(), u8> {
    let BindArgs {
        definitions,
        shape,
        query,
        content_type,
        body,
        body_file,
        json_output,
    } = args;

    let registry = load_registry(definitions.as_deref())?;
    let resolved = registry.require(&shape).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let body = match (body, body_file) {
        (Some(body), _) => Some(body.into_bytes()),
        (None, Some(path)) => Some(std::fs::read(&path).map_err(|e| {
            eprintln!("Error reading {}: {}", path.display(), e);
            3u8
        })?),
        (None, None) => None,
    };

    let mut request = BindingRequest::from_query_string(&query);
    if let Some(content_type) = content_type {
        request = request.content_type(content_type);
    }
    if let Some(body) = body {
        request = request.body(body);
    }

    let response = process(resolved, &request).into_response();

    if json_output {
        let output = serde_json::json!({
            "status": response.status.as_u16(),
            "body": response.body,
        });
        println!("{}", to_json(&output, false)?);
    } else {
        println!("{}", response.status);
        if let Some(body) = &response.body {
            println!("{}", to_json(body, true)?);
        }
    }

    if response.status.is_success() {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_check(path: &Path) -> Result<(), u8> {
    let report = |e: LoadError| {
        match &e {
            LoadError::InvalidDefinitions { problems } => {
                eprintln!("Invalid definitions:");
                for problem in problems {
                    eprintln!("  {}", problem);
                }
            }
            other => eprintln!("Error: {}", other),
        }
        e.exit_code() as u8
    };

    let registry = load_definitions(path).map_err(report)?;
    for resolved in registry.iter() {
        println!("  {} ({})", resolved.name(), resolved.mode());
    }
    println!("Valid: {} shape(s)", registry.len());
    Ok(())
}
