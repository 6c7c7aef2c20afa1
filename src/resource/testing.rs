//! Scriptable connector for unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ResourceError;
use crate::resource::connector::{Connection, Connector};

/// Connector whose behaviour is flipped from the test body.
#[derive(Default)]
pub struct ScriptedConnector {
    pub connects: AtomicU32,
    pub refuse_connect: AtomicBool,
    /// Shared with every connection handed out; `true` makes pings fail.
    pub broken: Arc<AtomicBool>,
    pub connect_delay: Option<Duration>,
}

impl ScriptedConnector {
    pub fn slow(delay: Duration) -> Self {
        Self {
            connect_delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(ResourceError::Connect("refused".to_string()));
        }
        Ok(Box::new(ScriptedConnection {
            broken: self.broken.clone(),
        }))
    }

    fn target(&self) -> String {
        "scripted".to_string()
    }
}

struct ScriptedConnection {
    broken: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn ping(&mut self) -> Result<(), ResourceError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(ResourceError::ConnectionLost("server closed the connection".to_string()))
        } else {
            Ok(())
        }
    }

    async fn close(&mut self) {}
}
