//! webhook-sign - Print the `X-Signature` header value for a request body.
//!
//! Reads the body from stdin exactly as it will be sent and signs it with
//! `WEBHOOK_SECRET`:
//!
//! ```text
//! printf '{"hello":"world","n":1}' | WEBHOOK_SECRET=changeme webhook-sign
//! ```

use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webhook_handle::{verify::sign, Config};

fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries the signature
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(io::stderr))
        .init();

    let config = Config::from_env();

    let mut body = Vec::new();
    io::stdin()
        .read_to_end(&mut body)
        .context("Failed to read body from stdin")?;

    let Some(signature) = sign(&config.webhook_secret, &body) else {
        bail!("WEBHOOK_SECRET is not set");
    };

    info!(body_length = body.len(), "body_signed");
    println!("{}", signature);

    Ok(())
}
