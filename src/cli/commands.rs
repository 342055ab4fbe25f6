use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, ENV_SCAN_PACKAGE};
use crate::context::ApplicationContext;
use crate::demo::{demo_catalog, DEMO_SCAN_PACKAGE};
use crate::server::Request;

/// Command-line interface for the demo application
#[derive(Debug, Parser)]
#[command(name = "minimvc")]
#[command(about = "minimvc demo application CLI", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "MINIMVC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scan root used when no configuration file is given
    #[arg(long, global = true, env = ENV_SCAN_PACKAGE, default_value = DEMO_SCAN_PACKAGE)]
    pub scan_package: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the compiled route table
    Routes,
    /// Dispatch a single GET request and print the response
    Dispatch {
        /// Request URI, e.g. '/demo/query?username=zhangsan&name=lisi'
        uri: String,

        /// Extra request header as 'name: value' (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

impl Cli {
    /// Resolve the startup configuration from `--config` or `--scan-package`.
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AppConfig::new(self.scan_package.as_str())
                .with_overrides(|k| std::env::var(k).ok())
                .validated()?,
        };
        Ok(config)
    }
}

/// Run `cli` against the demo catalog, writing results to `out`.
pub fn run_cli(cli: &Cli, config: &AppConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let context = ApplicationContext::bootstrap(config, &demo_catalog())?;

    match &cli.command {
        Commands::Routes => {
            for route in context.routes().iter() {
                writeln!(out, "{route}")?;
            }
            for error in context.compile_errors() {
                writeln!(out, "skipped: {error}")?;
            }
        }
        Commands::Dispatch { uri, headers } => {
            let mut request = Request::get(uri);
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("invalid header '{header}', expected 'name: value'"))?;
                request = request.with_header(name.trim(), value.trim());
            }
            let response = context.dispatch(&request)?;
            writeln!(out, "{}", response.status())?;
            writeln!(out, "{}", response.body())?;
        }
    }
    Ok(())
}
