//! Shared application state

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::clock::{SharedClock, SystemClock};
use crate::config::Config;
use crate::engine::sweeper::SweeperStatus;
use crate::external::artifact::ArtifactClient;
use crate::external::notify::Notifier;
use crate::external::payment::PaymentGateway;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state, cloned into every handler and task.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Time source (swappable in tests)
    pub clock: SharedClock,
    /// Payment gateway client
    pub payments: PaymentGateway,
    /// User notification sink
    pub notifier: Notifier,
    /// Entry artifact (QR payload) service client
    pub artifacts: ArtifactClient,
    /// Last sweeper pass, exposed on the health surface
    pub sweeper_status: Arc<RwLock<SweeperStatus>>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let payments = PaymentGateway::new(
            config.payment_gateway_url.clone(),
            config.payment_gateway_key.clone(),
            config.payment_timeout_secs,
        );
        let notifier = Notifier::new(config.notify_webhook_url.clone());
        let artifacts = ArtifactClient::new(config.artifact_service_url.clone());

        Ok(Self {
            pool,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            payments,
            notifier,
            artifacts,
            sweeper_status: Arc::new(RwLock::new(SweeperStatus::default())),
        })
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }
}
