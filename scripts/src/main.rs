use clap::Parser;
use scripts::{cli::Cli, errors::ScriptError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the script's result
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = cli.load_config()?;
    let Cli { network, priv_key, command, .. } = cli;

    command.run(&config, network.as_deref(), priv_key.as_deref()).await
}
