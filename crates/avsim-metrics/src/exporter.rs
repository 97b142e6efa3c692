//! ---
//! avsim_section: "03-observability"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "HTTP scrape endpoint for the simulator registry."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{render, SharedRegistry};

/// Running `/metrics` endpoint. Dropping it without [`stop`](Self::stop)
/// leaves the server running until the runtime exits.
#[derive(Debug)]
pub struct MetricsExporter {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl MetricsExporter {
    /// Bind `addr` and serve `registry` at `/metrics`.
    pub async fn start(registry: SharedRegistry, addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind metrics listener {addr}"))?;
        let addr = listener.local_addr().context("metrics listener has no address")?;
        let app = Router::new().route("/metrics", get(scrape)).with_state(registry);

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .await
        });
        info!(target: "avsim::metrics", address = %addr, "metrics exporter listening");
        Ok(Self { addr, stop, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn stop(self) -> Result<()> {
        let _ = self.stop.send(());
        self.task
            .await
            .context("metrics exporter task panicked")?
            .context("metrics exporter failed")
    }
}

async fn scrape(State(registry): State<SharedRegistry>) -> Response {
    match render(&registry) {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            error!(target: "avsim::metrics", error = %err, "scrape failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_registry, SimulationMetrics};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn serves_registry_over_http() {
        let registry = new_registry();
        let metrics = SimulationMetrics::new(registry.clone()).unwrap();
        metrics.inc_tick("replay");
        let exporter = MetricsExporter::start(registry, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(exporter.addr().port(), 0);

        let mut stream = TcpStream::connect(exporter.addr()).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("avsim_ticks_total{mode=\"replay\"} 1"));

        exporter.stop().await.unwrap();
    }
}
