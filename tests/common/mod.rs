//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use conn_warden::config::{PlatformEnv, WardenConfig};
use conn_warden::health::Supervisor;
use conn_warden::resource::{Connection, Connector, ResourceHandle, ResourceRegistry};
use conn_warden::{ResourceError, Services};

/// Connector whose behaviour is flipped from the test body.
#[derive(Default)]
pub struct ScriptedConnector {
    pub connects: AtomicU32,
    pub refuse_connect: AtomicBool,
    /// Shared with every connection handed out; `true` makes pings fail.
    pub broken: Arc<AtomicBool>,
}

impl ScriptedConnector {
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Simulate the far end dropping every open binding.
    pub fn drop_connections(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    /// Refuse new connections and fail existing ones.
    pub fn go_down(&self) {
        self.refuse_connect.store(true, Ordering::SeqCst);
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(ResourceError::Connect("connection refused".to_string()));
        }
        // A fresh binding starts out healthy.
        self.broken.store(false, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            broken: self.broken.clone(),
        }))
    }

    fn target(&self) -> String {
        "scripted://test".to_string()
    }
}

struct ScriptedConnection {
    broken: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn ping(&mut self) -> Result<(), ResourceError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(ResourceError::ConnectionLost(
                "server closed the connection unexpectedly".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn close(&mut self) {}
}

/// A supervisor over a scripted connector, with short timeouts.
pub fn scripted(name: &str) -> (Supervisor, Arc<ScriptedConnector>) {
    let connector = Arc::new(ScriptedConnector::default());
    let handle = Arc::new(ResourceHandle::new(name, connector.clone()));
    let supervisor =
        Supervisor::with_timeouts(handle, Duration::from_millis(200), Duration::from_millis(200));
    (supervisor, connector)
}

/// Registry holding one scripted resource per name.
pub fn registry_with(names: &[&str]) -> (Arc<ResourceRegistry>, Vec<Arc<ScriptedConnector>>) {
    let registry = Arc::new(ResourceRegistry::new());
    let mut connectors = Vec::new();
    for name in names {
        let (supervisor, connector) = scripted(name);
        assert!(registry.register(supervisor));
        connectors.push(connector);
    }
    (registry, connectors)
}

/// Services around a prepared registry, outside the hosting platform.
pub fn services(registry: Arc<ResourceRegistry>, config: WardenConfig) -> Arc<Services> {
    Arc::new(Services::from_parts(config, registry, PlatformEnv::default()).unwrap())
}

/// Bind an ephemeral port and serve `router` on it.
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Start a TCP backend that accepts connections and holds them open.
pub async fn start_mock_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    addr
}
