use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "sitepress")]
#[command(version, about = "Handlebars page server with a form-based JSON data editor")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Site root containing site.toml, templates/, data/ and public/
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the site
    Serve {
        /// Port to serve on (overrides site.toml and SITEPRESS_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind (overrides site.toml and SITEPRESS_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Enable dev mode (permissive CORS, bind 0.0.0.0)
        #[arg(long)]
        dev: bool,

        /// Open the site in a browser once the server is up
        #[arg(long)]
        open: bool,
    },
    /// Print the flat key/value form of a JSON document
    Flatten {
        /// JSON file to read (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Rebuild a nested JSON document from flat keys
    Unflatten {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,

        /// Read an x-www-form-urlencoded body instead of a JSON object
        #[arg(long)]
        form: bool,
    },
    /// View or initialize site.toml
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default site.toml
    Init {
        /// Overwrite an existing site.toml
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_directives = if verbose {
        "sitepress=debug,tower_http=debug"
    } else {
        "sitepress=info,tower_http=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let root = match cli.root.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Serve {
            port,
            host,
            dev,
            open,
        } => {
            cmd::cmd_serve(root, host.clone(), *port, *dev, *open).await?;
        }
        Commands::Flatten { file } => cmd::cmd_flatten(file.as_deref())?,
        Commands::Unflatten { file, form } => cmd::cmd_unflatten(file.as_deref(), *form)?,
        Commands::Config { command } => cmd::cmd_config(&root, command.clone())?,
    }

    Ok(())
}
