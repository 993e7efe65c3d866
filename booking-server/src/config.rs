//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Booking server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for actor authentication
    pub jwt_secret: String,
    /// Payment gateway base URL (empty disables real charges in dev)
    pub payment_gateway_url: String,
    /// Payment gateway API key
    pub payment_gateway_key: String,
    /// Payment gateway request timeout (seconds); a timeout is a failed payment
    pub payment_timeout_secs: u64,
    /// Notification webhook URL (empty = log-only notifier)
    pub notify_webhook_url: String,
    /// Artifact generator URL (empty = locally derived artifact refs)
    pub artifact_service_url: String,
    /// Sweeper poll interval in seconds
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            payment_gateway_url: std::env::var("PAYMENT_GATEWAY_URL").unwrap_or_default(),
            payment_gateway_key: Self::require_secret("PAYMENT_GATEWAY_KEY", &environment)?,
            payment_timeout_secs: std::env::var("PAYMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").unwrap_or_default(),
            artifact_service_url: std::env::var("ARTIFACT_SERVICE_URL").unwrap_or_default(),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            environment,
        })
    }
}
