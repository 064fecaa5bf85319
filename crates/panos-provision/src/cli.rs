//! Command-line entry point.

use clap::Parser;
use panos_core::config::DeviceConfig;
use panos_core::Result;
use panos_xapi::XapiClient;

/// Provision a three-zone firewall configuration on a PAN-OS device.
#[derive(Parser, Debug)]
#[command(name = "panos-provision", version)]
pub struct Cli {
    /// PAN-OS device to connect to
    #[arg(long, env = "PANOS_HOSTNAME")]
    pub hostname: String,

    /// Username for the PAN-OS device
    #[arg(long, env = "PANOS_USERNAME")]
    pub username: String,

    /// Password for the PAN-OS device
    #[arg(long, env = "PANOS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Open a session and run the full provisioning sequence.
///
/// A device error anywhere in the sequence is reported as a single
/// formatted line on standard output; configuration applied before the
/// failure is left on the device.
pub async fn run(args: Cli) {
    if let Err(err) = provision_device(&args).await {
        println!("PanDeviceError: {err}");
    }
}

async fn provision_device(args: &Cli) -> Result<()> {
    let config = DeviceConfig::new(&args.hostname, &args.username, &args.password)?;
    let session = XapiClient::connect(config).await?;
    crate::provision(&session).await
}
