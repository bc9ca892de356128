pub mod config;
pub mod input;
pub mod logging_system;

pub use config::{Config, ConfigError, LogLevel};
pub use input::{InputError, RecordReader};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging};

use crate::client::{ErrorTrackingClient, JsonLinesClient, TrackerComponent};
use crate::forwarder::{ForwarderConfig, LogForwarder, VarsContext};
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reads records from the configured input and flushes them batch by batch
/// through a [`LogForwarder`].
pub struct App {
    config: Config,
    component: TrackerComponent,
    forwarder: LogForwarder,
}

impl App {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let component = build_component(&config)?;
        Self::new(config, component)
    }

    pub fn new(config: Config, component: TrackerComponent) -> anyhow::Result<Self> {
        let mut forwarder = LogForwarder::new(
            &component,
            ForwarderConfig {
                include_context: config.context,
            },
        )
        .context("Failed to initialize log forwarder")?;

        if config.context {
            forwarder = forwarder.with_context_provider(Box::new(VarsContext::from_process_env()));
        }

        Ok(Self {
            config,
            component,
            forwarder,
        })
    }

    pub fn forwarder(&self) -> &LogForwarder {
        &self.forwarder
    }

    /// Forwards everything from the configured input. Returns the number of
    /// events handed to the client.
    pub fn run(&self) -> anyhow::Result<usize> {
        match &self.config.input {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open input {}", path.display()))?;
                self.forward(BufReader::new(file))
            }
            None => self.forward(std::io::stdin().lock()),
        }
    }

    pub fn forward<R: BufRead>(&self, reader: R) -> anyhow::Result<usize> {
        let mut records = RecordReader::new(reader);
        let mut sent = 0;
        let mut flushes = 0;

        loop {
            let batch = records.next_batch(self.config.batch_size)?;
            if batch.is_empty() {
                break;
            }

            flushes += 1;
            debug!("Flush {} with {} records", flushes, batch.len());
            let exported = self
                .forwarder
                .export(batch)
                .with_context(|| format!("Flush {flushes} failed after {sent} events"))?;
            sent += exported;
        }

        if self.component.enabled() {
            self.component.get_client()?.flush()?;
        }

        info!("Forwarded {} events in {} flushes", sent, flushes);
        Ok(sent)
    }
}

fn build_component(config: &Config) -> anyhow::Result<TrackerComponent> {
    if !config.enabled {
        return Ok(TrackerComponent::disabled());
    }

    if let Some(dsn) = &config.dsn {
        return Ok(TrackerComponent::new(sentry_client(config, dsn)?));
    }

    let writer: Box<dyn Write + Send> = match &config.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    Ok(TrackerComponent::new(Arc::new(JsonLinesClient::new(writer))))
}

#[cfg(feature = "sentry")]
fn sentry_client(config: &Config, dsn: &str) -> anyhow::Result<Arc<dyn ErrorTrackingClient>> {
    use crate::client::{SentryClient, SentryOptions};

    let mut options = SentryOptions::new(dsn);
    options.environment = config.environment.clone();
    options.release = config.release.clone();
    options.server_name = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok());

    Ok(Arc::new(SentryClient::new(options)?))
}

#[cfg(not(feature = "sentry"))]
fn sentry_client(_config: &Config, _dsn: &str) -> anyhow::Result<Arc<dyn ErrorTrackingClient>> {
    anyhow::bail!("this build has no Sentry support; rebuild with the `sentry` feature")
}

pub fn main() -> anyhow::Result<()> {
    let config = Config::from_args(std::env::args_os())?;
    setup_logging(config.log_level, &config.log_directives)?;

    info!("Starting sentry-log-target v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: enabled={}, context={}, batch_size={}, sentry={}",
        config.enabled,
        config.context,
        config.batch_size,
        config.dsn.is_some()
    );

    let app = App::from_config(config)?;
    if let Err(e) = app.run() {
        error!("Forwarding failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
