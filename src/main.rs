use anyhow::Result;
use clap::Parser;

use deee_certify::cli::{commands, Cli};
use deee_certify::config::{config as global_config, CertifyConfig};
use deee_certify::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            CertifyConfig::load_env_file()?;
            CertifyConfig::load_from(path)?
        }
        None => global_config()?.clone(),
    };
    init_telemetry(&config.observability)?;

    tokio::runtime::Runtime::new()?.block_on(async { commands::run(cli, &config).await })
}
