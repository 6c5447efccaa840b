use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("missing required configuration key `{0}`")]
    MissingConfig(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported browser target: {0}")]
    UnsupportedTarget(String),

    /// Remote execution is mandatory in containerized/CI environments, so a
    /// failed connection has no fallback.
    #[error("remote endpoint unreachable: {url}")]
    RemoteConnection {
        url: String,
        #[source]
        source: thirtyfour::error::WebDriverError,
    },

    #[error("local browser launch failed: {0}")]
    LocalLaunch(String),

    #[error("no active session: {0}")]
    NoActiveSession(&'static str),

    #[error("navigation failed: {url}")]
    Navigation {
        url: String,
        #[source]
        source: thirtyfour::error::WebDriverError,
    },

    #[error(transparent)]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// True for errors raised while obtaining a session. The runner marks the
    /// scenario failed on these instead of aborting the whole run.
    pub fn is_provisioning(&self) -> bool {
        matches!(
            self,
            HarnessError::RemoteConnection { .. } | HarnessError::LocalLaunch(_)
        )
    }
}
