//! Gateway orchestration.
//!
//! # Data Flow
//! ```text
//! Request (from http::server)
//!     → load current snapshot (one atomic read per request)
//!     → routing table match        → miss: 404
//!     → balancer select            → miss: 503
//!     → upstream forward           → error: 502/504 + mark unhealthy
//!     → relay upstream response
//!
//! Reload (from config::watcher or an explicit call):
//!     load + validate new config   → failure: keep current snapshot
//!     → build new routing table
//!     → publish (config, table) atomically
//! ```
//!
//! # Design Decisions
//! - The snapshot is an `ArcSwap`: readers take a stable `Arc` for the
//!   whole request, so a mid-request reload never tears state
//! - Health registry and cursor live outside the snapshot; they are
//!   process-lifetime and survive reloads
//! - The listener is bound once; a changed listen_port only logs a warning

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayConfig;
use crate::config::watcher::ConfigWatcher;
use crate::http::server::{HttpServer, RequestHandler};
use crate::http::{HttpRequest, HttpResponse};
use crate::load_balancer::LoadBalancer;
use crate::routing::RoutingTable;
use crate::upstream::{ForwardError, UpstreamClient};

/// An immutable (config, routing table) pair published atomically on reload.
#[derive(Debug)]
pub struct ConfigSnapshot {
    pub config: GatewayConfig,
    pub table: RoutingTable,
}

impl ConfigSnapshot {
    /// Derive the routing table from the config it is published with.
    fn build(config: GatewayConfig) -> Self {
        let table = RoutingTable::from_routes(&config.routes);
        Self { config, table }
    }
}

/// Request-path state shared between the server tasks and reloads.
pub struct GatewayCore {
    snapshot: ArcSwap<ConfigSnapshot>,
    balancer: LoadBalancer,
    client: UpstreamClient,
}

impl GatewayCore {
    fn new(config: GatewayConfig) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(ConfigSnapshot::build(config)),
            balancer: LoadBalancer::new(),
            client: UpstreamClient::new(),
        }
    }

    /// A stable handle on the currently published snapshot.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot.load_full()
    }

    pub fn balancer(&self) -> &LoadBalancer {
        &self.balancer
    }

    /// Load, validate and atomically publish a new snapshot.
    ///
    /// On failure the current snapshot is untouched.
    pub fn reload(&self, path: &Path) -> Result<(), ConfigError> {
        let new_config = load_config(path)?;

        {
            let current = self.snapshot.load();
            if new_config.listen_port != current.config.listen_port {
                tracing::warn!(
                    old_port = current.config.listen_port,
                    new_port = new_config.listen_port,
                    "listen_port changed; a restart is required to rebind"
                );
            }
        }

        let routes = new_config.routes.len();
        self.snapshot
            .store(Arc::new(ConfigSnapshot::build(new_config)));
        tracing::info!(routes, "configuration applied");
        Ok(())
    }

    /// Route, select, forward and translate failures into statuses.
    async fn dispatch(
        &self,
        request_id: &str,
        request: &HttpRequest,
        snapshot: &ConfigSnapshot,
    ) -> HttpResponse {
        let Some(route) = snapshot.table.match_route(&request.path) else {
            tracing::warn!(request_id, path = %request.path, "no route matched");
            return HttpResponse::not_found();
        };

        let Some(backend) = self.balancer.select(&route.backends) else {
            tracing::error!(
                request_id,
                pattern = %route.path_pattern,
                "all backends unavailable"
            );
            return HttpResponse::service_unavailable();
        };
        tracing::debug!(request_id, backend = %backend, "selected backend");

        let timeout = snapshot.config.backend_timeout();
        match self.client.forward(request, &backend, timeout).await {
            Ok(response) => response,
            Err(ForwardError::Timeout) => {
                tracing::error!(request_id, backend = %backend, "upstream timed out");
                self.balancer.mark_unhealthy(&backend);
                HttpResponse::gateway_timeout()
            }
            Err(e) => {
                tracing::error!(request_id, backend = %backend, error = %e, "upstream request failed");
                self.balancer.mark_unhealthy(&backend);
                HttpResponse::bad_gateway()
            }
        }
    }
}

#[async_trait]
impl RequestHandler for GatewayCore {
    async fn handle(&self, request: HttpRequest) -> HttpResponse {
        let request_id = request
            .header("x-request-id")
            .unwrap_or("-")
            .to_string();
        tracing::info!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            "request"
        );

        let snapshot = self.snapshot.load_full();
        let response = self.dispatch(&request_id, &request, &snapshot).await;

        tracing::info!(
            request_id = %request_id,
            status = response.status_code,
            reason = %response.reason,
            "response"
        );
        response
    }

    fn client_timeout(&self) -> Duration {
        self.snapshot.load().config.client_timeout()
    }
}

/// Reverse-proxy gateway: owns the server, the snapshot and hot reload.
///
/// Lifecycle: created → started (`start`, listener bound) → stopped
/// (`stop`, listener closed). Hot reload is a sub-lifecycle within the
/// started state, toggled by `enable_hot_reload` / `disable_hot_reload`.
pub struct Gateway {
    core: Arc<GatewayCore>,
    config_path: PathBuf,
    reload_poll_interval: Duration,
    server: Option<HttpServer>,
    watcher: Option<ConfigWatcher>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            core: Arc::new(GatewayCore::new(config)),
            config_path: config_path.into(),
            reload_poll_interval: crate::config::watcher::DEFAULT_POLL_INTERVAL,
            server: None,
            watcher: None,
        }
    }

    /// Override how often the watcher polls the config file.
    pub fn set_reload_poll_interval(&mut self, interval: Duration) {
        self.reload_poll_interval = interval;
    }

    pub fn core(&self) -> &Arc<GatewayCore> {
        &self.core
    }

    /// Bind the listener and start serving. No-op if already started.
    pub async fn start(&mut self) -> std::io::Result<()> {
        if self.server.is_some() {
            return Ok(());
        }
        let snapshot = self.core.snapshot();
        tracing::info!(port = snapshot.config.listen_port, "starting gateway");
        let server = HttpServer::start(
            snapshot.config.listen_port,
            snapshot.config.max_connections,
            self.core.clone(),
        )
        .await?;
        self.server = Some(server);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.server.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(HttpServer::local_addr)
    }

    /// Stop accepting connections; in-flight handlers complete.
    pub async fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            tracing::info!("stopping gateway");
            server.stop().await;
        }
    }

    /// Republish an explicit snapshot from `path`.
    pub fn reload(&self, path: &Path) -> Result<(), ConfigError> {
        self.core.reload(path)
    }

    /// Begin watching the config file; changes republish the snapshot.
    /// Idempotent while running.
    pub fn enable_hot_reload(&mut self) {
        let interval = self.reload_poll_interval;
        let config_path = self.config_path.clone();
        let watcher = self
            .watcher
            .get_or_insert_with(|| ConfigWatcher::new(config_path).with_poll_interval(interval));
        if watcher.is_running() {
            tracing::warn!("hot reload already enabled");
            return;
        }

        let core = self.core.clone();
        watcher.start(move |path| {
            tracing::info!(path = %path.display(), "configuration file changed, reloading");
            if let Err(e) = core.reload(path) {
                tracing::error!(error = %e, "reload failed, keeping current configuration");
            }
        });
        tracing::info!("hot reload enabled");
    }

    /// Stop the watcher. Idempotent.
    pub async fn disable_hot_reload(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            if watcher.is_running() {
                watcher.stop().await;
                tracing::info!("hot reload disabled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{MatchType, Route};
    use std::io::Write;

    fn config_with_routes(listen_port: u16, routes: Vec<Route>) -> GatewayConfig {
        GatewayConfig {
            listen_port,
            routes,
            ..GatewayConfig::default()
        }
    }

    fn route(pattern: &str, backends: &[&str], priority: u32) -> Route {
        Route {
            path_pattern: pattern.to_string(),
            match_type: MatchType::Prefix,
            backends: backends.iter().map(|b| b.to_string()).collect(),
            priority,
        }
    }

    #[test]
    fn snapshot_is_built_from_its_own_config() {
        let core = GatewayCore::new(config_with_routes(
            8080,
            vec![route("/a", &["http://up1"], 1), route("/b", &["http://up2"], 2)],
        ));
        let snapshot = core.snapshot();
        assert_eq!(snapshot.table.len(), snapshot.config.routes.len());
        for r in snapshot.table.routes() {
            assert!(snapshot.config.routes.contains(r));
        }
    }

    #[test]
    fn failed_reload_keeps_the_current_snapshot() {
        let core = GatewayCore::new(config_with_routes(8080, vec![route("/a", &["http://up1"], 1)]));
        let before = core.snapshot();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ this is not json").unwrap();
        assert!(core.reload(file.path()).is_err());

        let after = core.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn successful_reload_swaps_the_whole_snapshot() {
        let core = GatewayCore::new(config_with_routes(8080, vec![route("/a", &["http://up1"], 1)]));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "listen_port": 8080,
                "routes": [{"path_pattern": "/b", "backends": ["http://up2"]}]
            }"#,
        )
        .unwrap();
        core.reload(file.path()).unwrap();

        let snapshot = core.snapshot();
        assert!(snapshot.table.match_route("/a").is_none());
        let matched = snapshot.table.match_route("/b/x").unwrap();
        assert_eq!(matched.backends, ["http://up2"]);
    }

    #[test]
    fn concurrent_readers_never_observe_a_torn_snapshot() {
        let core = Arc::new(GatewayCore::new(config_with_routes(
            8080,
            vec![route("/a", &["http://up1"], 1)],
        )));

        let reader_core = core.clone();
        let reader = std::thread::spawn(move || {
            for _ in 0..2000 {
                let snapshot = reader_core.snapshot();
                // The table must always be derived from the config it is
                // published with: same route count, same patterns.
                assert_eq!(snapshot.table.len(), snapshot.config.routes.len());
                for r in snapshot.table.routes() {
                    assert!(snapshot.config.routes.contains(r));
                }
            }
        });

        let file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..50u32 {
            let doc = format!(
                r#"{{
                    "listen_port": 8080,
                    "routes": [
                        {{"path_pattern": "/gen{i}", "backends": ["http://up{i}"]}},
                        {{"path_pattern": "/extra{i}", "backends": ["http://alt{i}"], "priority": 2}}
                    ]
                }}"#
            );
            std::fs::write(file.path(), doc).unwrap();
            core.reload(file.path()).unwrap();
        }

        reader.join().unwrap();
    }

    #[test]
    fn health_state_survives_reload() {
        let core = GatewayCore::new(config_with_routes(8080, vec![route("/a", &["http://up1"], 1)]));
        core.balancer().mark_unhealthy("http://up1");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"listen_port": 8080, "routes": [{"path_pattern": "/b", "backends": ["http://up2"]}]}"#,
        )
        .unwrap();
        core.reload(file.path()).unwrap();

        assert!(!core.balancer().is_healthy("http://up1"));
    }

    #[tokio::test]
    async fn miss_and_exhausted_pool_map_to_404_and_503() {
        let core = GatewayCore::new(config_with_routes(
            8080,
            vec![route("/api", &["http://up1"], 1)],
        ));

        let miss = HttpRequest {
            method: "GET".to_string(),
            path: "/other".to_string(),
            version: "HTTP/1.1".to_string(),
            headers: crate::http::Headers::new(),
            body: Vec::new(),
        };
        assert_eq!(core.handle(miss.clone()).await.status_code, 404);

        core.balancer().mark_unhealthy("http://up1");
        let mut hit = miss;
        hit.path = "/api/x".to_string();
        assert_eq!(core.handle(hit).await.status_code, 503);
    }
}
