//! JSON Endpoint CLI
//!
//! Runs endpoint declarations against simulated or CGI-delivered requests.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use json_endpoint::{
    load_config, EndpointConfig, RequestContext, RequestError, ResponseEnvelope, StatusCode,
};

#[derive(Parser)]
#[command(name = "json-endpoint")]
#[command(about = "Validate requests and render wrapped JSON responses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a simulated request and print the response body
    Check {
        /// Endpoint declaration file
        endpoint: PathBuf,

        /// Request method
        #[arg(long, short, default_value = "GET")]
        method: String,

        /// Query string (e.g., "id=5&tags[]=a")
        #[arg(long, short, default_value = "")]
        query: String,

        /// Raw request body
        #[arg(long, short)]
        body: Option<String>,

        /// Content type of the body
        #[arg(long)]
        content_type: Option<String>,

        /// Host header
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Treat the connection as HTTPS
        #[arg(long)]
        secure: bool,

        /// JSON payload the handler responds with
        #[arg(long, short, default_value = "[]")]
        data: String,

        /// Status code the handler responds with
        #[arg(long, default_value_t = 200)]
        code: u16,

        /// Print the status line before the body
        #[arg(long)]
        show_status: bool,
    },

    /// Handle one request from the CGI environment and stdin
    Cgi {
        /// Endpoint declaration file
        endpoint: PathBuf,

        /// JSON payload the handler responds with
        #[arg(long, short, default_value = "[]")]
        data: String,
    },

    /// Print the declared parameters of an endpoint
    Describe {
        /// Endpoint declaration file
        endpoint: PathBuf,
    },
}

struct CheckArgs {
    endpoint: PathBuf,
    method: String,
    query: String,
    body: Option<String>,
    content_type: Option<String>,
    host: String,
    secure: bool,
    data: String,
    code: u16,
    show_status: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            endpoint,
            method,
            query,
            body,
            content_type,
            host,
            secure,
            data,
            code,
            show_status,
        } => run_check(CheckArgs {
            endpoint,
            method,
            query,
            body,
            content_type,
            host,
            secure,
            data,
            code,
            show_status,
        }),
        Commands::Cgi { endpoint, data } => run_cgi(&endpoint, &data),
        Commands::Describe { endpoint } => run_describe(&endpoint),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout carries only the response.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_endpoint(path: &Path) -> Result<EndpointConfig, u8> {
    load_config(path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn parse_data(data: &str) -> Result<Value, u8> {
    serde_json::from_str(data).map_err(|e| {
        eprintln!("Error: invalid --data JSON: {}", e);
        2u8
    })
}

fn run_check(args: CheckArgs) -> Result<(), u8> {
    let config = load_endpoint(&args.endpoint)?;
    let data = parse_data(&args.data)?;
    let code = StatusCode::from_u16(args.code).map_err(|e| {
        eprintln!("Error: invalid --code: {}", e);
        2u8
    })?;

    let body = args.body.unwrap_or_default();
    let request = RequestContext::from_raw(
        &args.method,
        &args.query,
        args.content_type.as_deref(),
        body.as_bytes(),
    )
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?
    .secure(args.secure)
    .host(args.host);

    let api = config.api(request).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let reply = api.run(|_| ResponseEnvelope::new(code, data));

    let status = reply.envelope().code();
    let output = reply.body().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if args.show_status {
        println!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
    }
    println!("{}", output);

    if status.is_success() {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_cgi(endpoint: &Path, data: &str) -> Result<(), u8> {
    let config = load_endpoint(endpoint)?;
    let data = parse_data(data)?;

    let mut body = Vec::new();
    std::io::stdin()
        .read_to_end(&mut body)
        .map_err(|source| RequestError::ReadBody { source })
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let request = RequestContext::from_cgi(|name| std::env::var(name).ok(), &body).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let api = config.api(request).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    api.run(|_| ResponseEnvelope::ok(data))
        .write_cgi(std::io::stdout().lock())
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
}

fn run_describe(endpoint: &Path) -> Result<(), u8> {
    let config = load_endpoint(endpoint)?;
    let validator = config.validator().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let output = serde_json::to_string_pretty(&validator.describe()).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}
