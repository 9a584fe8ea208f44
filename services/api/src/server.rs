use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredStore, InMemoryDocumentRepository, InMemoryKpiRepository};
use crate::routes::application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mariner_qhse::config::{AppConfig, StorageConfig};
use mariner_qhse::error::AppError;
use mariner_qhse::telemetry;
use mariner_qhse::workflows::documents::{
    DocumentService, InMemoryObjectStore, LocalDiskObjectStore, WorkflowSettings,
};
use mariner_qhse::workflows::kpi::KpiService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = object_store(&config.storage)?;
    info!(store = %store.describe(), "object store selected");
    let settings = WorkflowSettings {
        transition_policy: config.workflow.transition_policy,
        upload_ceiling: config.storage.max_upload_bytes,
    };
    let documents = Arc::new(DocumentService::with_settings(
        Arc::new(InMemoryDocumentRepository::default()),
        Arc::new(store),
        settings,
    ));
    let kpi = Arc::new(KpiService::new(Arc::new(InMemoryKpiRepository::default())));

    let app = application_routes(documents, kpi)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        transition_policy = ?settings.transition_policy,
        upload_ceiling = settings.upload_ceiling,
        "mariner qhse service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn object_store(config: &StorageConfig) -> Result<ConfiguredStore, AppError> {
    Ok(match &config.directory {
        Some(directory) => ConfiguredStore::Disk(LocalDiskObjectStore::new(directory)?),
        None => ConfiguredStore::Memory(InMemoryObjectStore::default()),
    })
}
