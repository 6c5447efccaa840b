//! Session lifecycle management.
//!
//! A [`SessionManager`] owns the single active session handle for its owner
//! (one manager per scenario thread; sharing a handle across concurrent
//! scenarios races UI state). The state machine is
//! Uninitialized → Active → Terminated, and the manager is reusable:
//! `acquire()` after `terminate()` provisions a fresh handle.
//!
//! Navigation never implicitly acquires. Calling `goto`/`refresh` on a
//! manager that is not Active fails with `NoActiveSession` at every call
//! site; the scenario engine's before-hook owns `acquire()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::environ::Environment;
use crate::error::{HarnessError, Result};
use crate::provision::{self, ProvisionedSession};

/// The live automation session as the lifecycle manager sees it.
///
/// The production implementation wraps a WebDriver session; tests substitute
/// [`crate::testing::MockFactory`] to exercise the state machine without a
/// browser.
#[async_trait]
pub trait SessionLike: Send {
    /// Process-unique identity of this handle.
    fn id(&self) -> u64;

    async fn goto(&self, url: &str) -> Result<()>;

    async fn refresh(&self) -> Result<()>;

    /// Release the underlying session. Consumes the handle; a closed session
    /// is gone for good.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Seam between the lifecycle manager and the provisioner.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(
        &self,
        config: &HarnessConfig,
        environment: Environment,
    ) -> Result<Box<dyn SessionLike>>;
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Production factory delegating to [`crate::provision`].
pub struct WebDriverFactory;

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(
        &self,
        config: &HarnessConfig,
        environment: Environment,
    ) -> Result<Box<dyn SessionLike>> {
        let provisioned = provision::provision(config, environment).await?;
        Ok(Box::new(WebDriverSession {
            id: next_session_id(),
            inner: provisioned,
        }))
    }
}

struct WebDriverSession {
    id: u64,
    inner: ProvisionedSession,
}

#[async_trait]
impl SessionLike for WebDriverSession {
    fn id(&self) -> u64 {
        self.id
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .driver
            .goto(url)
            .await
            .map_err(|source| HarnessError::Navigation { url: url.to_string(), source })
    }

    async fn refresh(&self) -> Result<()> {
        self.inner.driver.refresh().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let WebDriverSession { inner, .. } = *self;
        inner.driver.quit().await?;
        if let Some(mut child) = inner.driver_process {
            // The driver usually exits once its session quits; reap it so a
            // stray process never outlives the run.
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        Ok(())
    }
}

enum State {
    Uninitialized,
    Active(Box<dyn SessionLike>),
    Terminated,
}

pub struct SessionManager {
    config: Arc<HarnessConfig>,
    environment: Environment,
    factory: Arc<dyn SessionFactory>,
    state: State,
}

impl SessionManager {
    pub fn new(config: Arc<HarnessConfig>) -> Self {
        Self::with_factory(config, Environment::detect(), Arc::new(WebDriverFactory))
    }

    pub fn with_factory(
        config: Arc<HarnessConfig>,
        environment: Environment,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            environment,
            factory,
            state: State::Uninitialized,
        }
    }

    /// Provision a session if none is active and return its handle id.
    /// Idempotent: an Active manager returns the existing handle untouched.
    pub async fn acquire(&mut self) -> Result<u64> {
        if let State::Active(session) = &self.state {
            debug!(target = "gridline", session = session.id(), "session already active");
            return Ok(session.id());
        }

        let session = self.factory.open(&self.config, self.environment).await?;
        let id = session.id();
        debug!(target = "gridline", session = id, "session acquired");
        self.state = State::Active(session);
        Ok(id)
    }

    /// Accessor for the active handle. This is the only way other components
    /// reach the session; nobody constructs their own.
    pub fn session(&self) -> Result<&dyn SessionLike> {
        match &self.state {
            State::Active(session) => Ok(session.as_ref()),
            State::Uninitialized => Err(HarnessError::NoActiveSession("none acquired yet")),
            State::Terminated => Err(HarnessError::NoActiveSession("already terminated")),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Navigate to the configured application base URL.
    pub async fn goto_app(&self) -> Result<()> {
        let url = self.config.app_url()?.to_string();
        self.goto(&url).await
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.session()?.goto(url).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.session()?.refresh().await
    }

    /// Release the session. Idempotent: terminating a manager that holds no
    /// session is a no-op, never an error.
    pub async fn terminate(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Terminated) {
            State::Active(session) => {
                let id = session.id();
                session.close().await?;
                info!(target = "gridline", session = id, "session terminated");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
