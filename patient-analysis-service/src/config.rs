//! Service configuration, resolved once at startup and threaded explicitly
//! into construction. Nothing below the handlers reads the environment.

use std::path::PathBuf;
use std::time::Duration;

use diagnosis_flow::CompletionConfig;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    /// Scratch directory for uploads awaiting extraction.
    pub upload_dir: PathBuf,
    /// How long a stored analysis stays retrievable.
    pub result_ttl: Duration,
    pub completion: CompletionConfig,
}

impl ServiceConfig {
    pub const DEFAULT_PORT: u16 = 3000;
    pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(3600);

    /// Read configuration from the environment: `PORT`, `UPLOAD_DIR`,
    /// `RESULT_TTL_SECS`, plus the completion variables. A missing
    /// `ANTHROPIC_API_KEY` is not an error; analyses run against the
    /// offline fallback instead.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_PORT);
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("patient-analysis-uploads"));
        let result_ttl = std::env::var("RESULT_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_RESULT_TTL);

        Self {
            port,
            upload_dir,
            result_ttl,
            completion: CompletionConfig::from_env(),
        }
    }
}
