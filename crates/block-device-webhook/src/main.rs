use anyhow::{anyhow, Result};
use block_device_webhook::{
    cli,
    config::{self, Config},
    tracing::setup_tracing,
    BlockDeviceWebhook,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

    // both the Kubernetes client and the HTTPS server rely on rustls
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the rustls crypto provider"))?;

    info!(
        service = config::SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        provisioner_regex = config.provisioner_regex.as_str(),
        resource = config.block_device_resource.as_str(),
        "starting"
    );

    let webhook = BlockDeviceWebhook::new_from_config(config).await?;
    webhook.run().await
}
