//! TCP-level binding to a resource address (e.g. a managed Postgres host).
//!
//! Liveness is judged from the socket alone: a peek that reports EOF or an
//! error means the far end dropped us. No bytes are consumed, so the binding
//! stays usable for a protocol driver layered on top.

use async_trait::async_trait;
use std::future::poll_fn;
use std::task::Poll;
use tokio::io::{AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;

use crate::error::ResourceError;
use crate::resource::connector::{Connection, Connector};

/// Opens a TCP stream to a fixed address.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| ResourceError::Connect(format!("{}: {}", self.address, e)))?;
        let _ = stream.set_nodelay(true);

        tracing::debug!(address = %self.address, "TCP binding established");
        Ok(Box::new(TcpConnection { stream }))
    }

    fn target(&self) -> String {
        format!("tcp://{}", self.address)
    }
}

struct TcpConnection {
    stream: TcpStream,
}

#[async_trait]
impl Connection for TcpConnection {
    async fn ping(&mut self) -> Result<(), ResourceError> {
        let stream = &mut self.stream;
        let mut byte = [0u8; 1];
        let mut buf = ReadBuf::new(&mut byte);

        // A pending peek means the socket is open and quiet.
        poll_fn(|cx| match stream.poll_peek(cx, &mut buf) {
            Poll::Pending => Poll::Ready(Ok(())),
            Poll::Ready(Ok(0)) => Poll::Ready(Err(ResourceError::ConnectionLost(
                "peer closed the connection".to_string(),
            ))),
            Poll::Ready(Ok(_)) => Poll::Ready(Ok(())),
            Poll::Ready(Err(e)) => Poll::Ready(Err(ResourceError::ConnectionLost(e.to_string()))),
        })
        .await
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
