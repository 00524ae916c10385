//! Send one notification through the APNs binary interface
//!
//! Gateway settings come from `APNS_ENDPOINT`, `APNS_SSL_PEM`,
//! `APNS_PASSPHRASE` and `APNS_CA_PEM` (a `.env` file is honoured).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nova_apns_binary::{
    logging, AppleMobileClient, ClientParams, MobileClient, NotificationMessage, TracingProfiler,
};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "apns-push", about = "Push a localized notification to one iOS device")]
struct Args {
    /// Hex device token (spaces allowed)
    #[arg(long, env = "APNS_DEVICE_TOKEN")]
    device_token: String,

    /// Localization key of the alert
    #[arg(long)]
    loc_key: String,

    /// Localization argument, repeat for several
    #[arg(long = "loc-arg")]
    loc_args: Vec<String>,

    /// Application data as a JSON object
    #[arg(long)]
    data: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let args = Args::parse();

    let mut message =
        NotificationMessage::new(args.device_token, args.loc_key).with_arguments(args.loc_args);

    if let Some(raw) = args.data {
        match serde_json::from_str::<Value>(&raw).context("--data is not valid JSON")? {
            Value::Object(data) => message.data = data,
            _ => bail!("--data must be a JSON object"),
        }
    }

    let params = ClientParams::from_env()?;
    let client = AppleMobileClient::setup(params, Arc::new(TracingProfiler))?;

    client.push(&message).await?;

    Ok(())
}
