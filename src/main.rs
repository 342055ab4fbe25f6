use clap::Parser;
use minimvc::cli::{run_cli, Cli};
use minimvc::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(&LogConfig::from_env().with_settings(&config.log))?;

    let stdout = std::io::stdout();
    run_cli(&cli, &config, &mut stdout.lock())
}
