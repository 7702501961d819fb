//! Reusable NPR parking fee server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! dataset loading, zone catalog, address registry client, REST API,
//! metrics, and graceful shutdown.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};

use crate::application::{
    AddressLookupPort, DisabledAddressLookup, FareEngine, ParkingService, ZoneCatalog,
    ZoneResolver,
};
use crate::config::{AppConfig, LogFormat};
use crate::infrastructure::dataset;
use crate::infrastructure::{BagClient, BagClientConfig};
use crate::interfaces::create_api_router;
use crate::shared::errors::DataLoadError;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the server.
#[derive(Default)]
pub struct ServerOptions {
    pub config: AppConfig,
}

// ── Service assembly ───────────────────────────────────────────────

/// Services built from the tariff dataset.
pub struct LoadedServices {
    pub service: Arc<ParkingService>,
    pub dataset_rows: usize,
}

/// Loads the dataset and wires catalog, resolver and fare engine.
///
/// A dataset that cannot be loaded is fatal: the service must not answer
/// fee requests without tariffs.
pub fn load_services(config: &AppConfig) -> Result<LoadedServices, DataLoadError> {
    let table = Arc::new(dataset::load_from(&config.dataset.csv_file)?);
    let dataset_rows = table.len();

    let catalog = Arc::new(ZoneCatalog::build(&table));
    if catalog.is_empty() {
        warn!("Dataset contains no zones; every calculation will fail");
    }

    let resolver = Arc::new(ZoneResolver::new(catalog, address_lookup(config)));
    let engine = Arc::new(FareEngine::new(table));

    Ok(LoadedServices {
        service: Arc::new(ParkingService::new(resolver, engine)),
        dataset_rows,
    })
}

fn address_lookup(config: &AppConfig) -> Arc<dyn AddressLookupPort> {
    if !config.bag.enabled {
        info!("BAG address lookup disabled, using postcode heuristics only");
        return Arc::new(DisabledAddressLookup);
    }
    if config.bag.api_key.is_none() {
        warn!("No BAG API key configured; address lookups will likely be rejected");
    }

    match BagClient::new(BagClientConfig {
        base_url: config.bag.base_url.clone(),
        api_key: config.bag.api_key.clone(),
        timeout: config.bag.timeout(),
    }) {
        Ok(client) => {
            info!(base_url = %config.bag.base_url, "BAG address lookup enabled");
            Arc::new(client)
        }
        Err(e) => {
            error!(error = %e, "Failed to build BAG client, address lookup disabled");
            Arc::new(DisabledAddressLookup)
        }
    }
}

/// The global metrics recorder can only be installed once per process;
/// later starts in the same process reuse it.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running server.
///
/// ```rust,no_run
/// use npr_parking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub service: Arc<ParkingService>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Port the API is listening on.
    pub api_port: u16,

    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Loads the dataset, builds the services and starts the REST API.
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        info!("Starting NPR parking fee service...");

        let prometheus_handle = prometheus_handle()?;

        let LoadedServices {
            service,
            dataset_rows,
        } = load_services(&app_cfg)?;

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let api_router = create_api_router(service.clone(), dataset_rows, prometheus_handle);

        let api_addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let api_port = listener.local_addr()?.port();
        info!("REST API listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            service,
            config: app_cfg,
            api_port,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Waits until the API has stopped. After shutdown is triggered,
    /// in-flight requests get the configured timeout to finish.
    pub async fn wait(self) {
        let signal = self.shutdown.signal();
        let grace = self.shutdown.timeout();
        let mut api_task = self.api_task;

        tokio::select! {
            result = &mut api_task => {
                log_task_result(result);
                return;
            }
            _ = signal.wait() => {}
        }

        info!("Waiting up to {}s for in-flight requests...", grace.as_secs());
        match tokio::time::timeout(grace, &mut api_task).await {
            Ok(result) => log_task_result(result),
            Err(_) => {
                warn!("Shutdown timeout elapsed, aborting REST API");
                api_task.abort();
            }
        }
        info!("NPR parking fee service stopped");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down NPR parking fee service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

fn log_task_result(result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => info!("REST API server stopped"),
        Err(e) => error!("REST API server task panicked: {}", e),
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DATASET: &str = "AreaManagerId,FareCalculationCode,StartDateFarePart,EndDateFarePart,\
StartDurationFarePart,EndDurationFarePart,AmountFarePart,StepSizeFarePart,AmountCumulative
14,TAR01,20000101,99991231,0,60,1.00,15,0
14,TAR01,20000101,99991231,60,999999,0.75,15,0
";

    fn config_with_dataset(file: &tempfile::NamedTempFile) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.dataset.csv_file = file.path().to_path_buf();
        cfg.bag.enabled = false;
        cfg.server.port = 0;
        cfg
    }

    fn dataset_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_services_builds_catalog() {
        let file = dataset_file();
        let loaded = load_services(&config_with_dataset(&file)).unwrap();
        assert_eq!(loaded.dataset_rows, 2);
        assert_eq!(loaded.service.resolver().catalog().len(), 1);
    }

    #[test]
    fn missing_dataset_is_fatal() {
        let mut cfg = AppConfig::default();
        cfg.dataset.csv_file = "missing/dataset.csv".into();
        assert!(matches!(
            load_services(&cfg),
            Err(DataLoadError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn start_and_shutdown() {
        let file = dataset_file();
        let handle = ServerHandle::start(ServerOptions {
            config: config_with_dataset(&file),
        })
        .await
        .unwrap();
        assert_ne!(handle.api_port, 0);
        assert!(handle.is_running());
        handle.shutdown().await;
    }
}
