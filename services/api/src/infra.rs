use job_board::accounts::SessionKeys;
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::storage::Database;
use job_board::{Integrations, JobBoard};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Open the configured database and wire the live adapters around it.
pub(crate) async fn build_board(config: &AppConfig) -> Result<JobBoard, AppError> {
    let db = Database::open(&config.database.path, config.database.max_connections).await?;
    assemble(db, config)
}

fn assemble(db: Database, config: &AppConfig) -> Result<JobBoard, AppError> {
    let integrations = Integrations::from_config(config)?;
    let keys = SessionKeys::new(config.session.secret.as_bytes(), config.session.ttl_secs);
    Ok(JobBoard::new(
        db,
        keys,
        integrations,
        config.environment.is_debug(),
    ))
}

#[cfg(test)]
pub(crate) async fn test_board() -> JobBoard {
    use job_board::config::{
        AppEnvironment, DatabaseConfig, ServerConfig, SessionConfig, TelemetryConfig,
    };

    let config = AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "warn".to_string(),
        },
        database: DatabaseConfig {
            path: ":memory:".into(),
            max_connections: 1,
        },
        session: SessionConfig {
            secret: "service-test-secret".to_string(),
            ttl_secs: 3600,
        },
        smtp: None,
    };
    let db = Database::open_in_memory().await.expect("database opens");
    assemble(db, &config).expect("board assembles")
}
