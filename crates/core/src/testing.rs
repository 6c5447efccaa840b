//! Test doubles for the session seam.
//!
//! [`MockFactory`] and its sessions let the lifecycle state machine be
//! exercised without spawning a browser: they count opens/closes and record
//! navigations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::HarnessConfig;
use crate::environ::Environment;
use crate::error::{HarnessError, Result};
use crate::session::{SessionFactory, SessionLike, next_session_id};

#[derive(Default)]
pub struct MockCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

impl MockCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }
}

pub struct MockFactory {
    counters: Arc<MockCounters>,
    fail_open: bool,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(MockCounters::default()),
            fail_open: false,
        })
    }

    /// A factory whose every `open` fails with a provisioning error.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            counters: Arc::new(MockCounters::default()),
            fail_open: true,
        })
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        self.counters.clone()
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    async fn open(
        &self,
        _config: &HarnessConfig,
        _environment: Environment,
    ) -> Result<Box<dyn SessionLike>> {
        if self.fail_open {
            return Err(HarnessError::LocalLaunch("mock open failure".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            id: next_session_id(),
            counters: self.counters.clone(),
        }))
    }
}

struct MockSession {
    id: u64,
    counters: Arc<MockCounters>,
}

#[async_trait]
impl SessionLike for MockSession {
    fn id(&self) -> u64 {
        self.id
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.counters.navigations.lock().push(url.to_string());
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
