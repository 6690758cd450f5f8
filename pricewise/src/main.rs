// Only overview documentation that is not relevant to one of the more specific
// crates should go here.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! A web API that searches online shops and ranks the results by value for
//! money.
//!
//! Pricewise is split into several subcrates that work in collaboration.
//!
//! - [pricewise-integration-tests](../pricewise_integration_tests/index.html)
//! - [pricewise-ranker](../pricewise_ranker/index.html)
//! - [pricewise-serpapi](../pricewise_serpapi/index.html)
//! - [pricewise-settings](../pricewise_settings/index.html)
//! - [pricewise-web](../pricewise_web/index.html)

mod docs;
mod sentry;

use anyhow::{Context, Result};
use cadence::{BufferedUdpMetricSink, QueuingMetricSink, StatsdClient};
use pricewise_settings::{LogFormat, Settings};
use std::net::{TcpListener, UdpSocket};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt};

/// Primary entry point
#[actix_rt::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Loading settings")?;
    init_logging(&settings).context("Initializing logging")?;
    let _sentry_guard = sentry::init_sentry(&settings).context("Initializing Sentry")?;
    let metrics_client = init_metrics(&settings).context("Initializing metrics")?;

    if settings.serpapi.api_key.is_none() {
        tracing::warn!(
            r#type = "pricewise.startup.no-api-key",
            "No SerpApi key is configured. Search requests will be rejected."
        );
    }

    let listener = TcpListener::bind(settings.http.listen).context("Binding port")?;
    tracing::info!(
        r#type = "pricewise.startup.listening",
        address = %settings.http.listen,
        env = %settings.env,
        "Starting server"
    );

    pricewise_web::run(listener, metrics_client, settings)
        .context("Starting pricewise-web server")?
        .await
        .context("Running pricewise-web server")?;

    Ok(())
}

/// Set up logging for Pricewise, based on settings and the `RUST_LOG` environment variable.
fn init_logging(settings: &Settings) -> Result<()> {
    LogTracer::init()?;
    let env_filter = settings.logging.levels.to_env_filter();
    let registry = tracing_subscriber::registry().with(env_filter);

    match settings.logging.format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().pretty()))?;
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().flatten_event(true)),
            )?;
        }
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().compact()))?;
        }
    }

    Ok(())
}

/// Create a StatsD client that sends metrics over UDP to the configured sink.
///
/// Metrics are queued and sent from a background thread, so request handlers
/// never block on the network.
fn init_metrics(settings: &Settings) -> Result<StatsdClient> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Binding metrics socket")?;
    socket.set_nonblocking(true)?;

    let sink_address = (
        settings.metrics.sink_host.as_str(),
        settings.metrics.sink_port,
    );
    let udp_sink =
        BufferedUdpMetricSink::from(sink_address, socket).context("Creating metrics sink")?;
    let queuing_sink = QueuingMetricSink::with_capacity(udp_sink, settings.metrics.max_queue_size);

    Ok(StatsdClient::builder("pricewise", queuing_sink)
        .with_error_handler(|error| {
            tracing::warn!(r#type = "pricewise.metrics.error", %error, "Could not send metric");
        })
        .build())
}
