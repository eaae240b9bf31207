use crate::request::HttpRequest;
use crate::router::dispatch::Dispatch;
use crate::router::matcher::HttpRequestMatcher;
use crate::router::route_config::{read_routing_config, RoutingConfig};
use crate::router::table::RouteTable;
use anyhow::{anyhow, Context};
use log::{debug, error, info, warn};
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};

#[derive(Debug)]
pub struct Router {
    config_path: Option<PathBuf>,
    config: RwLock<Arc<RoutingConfig>>,
}

impl Router {
    /// Loads the routing file at `config_path`.
    pub async fn new(config_path: &Path) -> anyhow::Result<Self> {
        let config = read_routing_config(config_path).with_context(|| {
            format!("Failed to load routes from {}", config_path.display())
        })?;
        info!(
            "Loaded {} routes from {}",
            config.routes().len(),
            config_path.display()
        );

        Ok(Router {
            config_path: Some(config_path.to_path_buf()),
            config: RwLock::new(Arc::new(config)),
        })
    }

    /// A router over an in-memory config, without a file to reload from.
    pub fn from_config(config: RoutingConfig) -> Self {
        Router {
            config_path: None,
            config: RwLock::new(Arc::new(config)),
        }
    }

    pub async fn config(&self) -> Arc<RoutingConfig> {
        self.config.read().await.clone()
    }

    /// Resolves a request to the first route it matches.
    pub async fn route(&self, request: &HttpRequest) -> Option<Dispatch> {
        let config = self.config().await;
        let matcher = Arc::new(
            HttpRequestMatcher::new(request.clone()).with_host_patterns(config.host_patterns()),
        );

        let table = match RouteTable::build(&config, matcher) {
            Ok(table) => table,
            Err(err) => {
                error!("Failed to build route table: {}", err);
                return None;
            }
        };

        match table.find_match() {
            Some(route) => {
                info!(
                    "Route {} {} to {}::{}",
                    request.method(),
                    request.path(),
                    route.controller(),
                    route.action()
                );
                Some(Dispatch::from_route(&route, request.path()))
            }
            None => {
                debug!("No route for {} {}", request.method(), request.path());
                None
            }
        }
    }

    /// Re-reads the routing file. On failure the current routes stay active.
    pub async fn reload(&self) -> anyhow::Result<()> {
        let config_path = self
            .config_path
            .as_ref()
            .ok_or_else(|| anyhow!("Router was not loaded from a file"))?;

        let config = read_routing_config(config_path).with_context(|| {
            format!("Failed to reload routes from {}", config_path.display())
        })?;
        let count = config.routes().len();

        *self.config.write().await = Arc::new(config);
        info!("Reloaded {} routes from {}", count, config_path.display());
        Ok(())
    }

    /// Reloads the routing file whenever it changes, until shutdown.
    pub async fn start_config_watcher(
        &self,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let config_path = self
            .config_path
            .clone()
            .ok_or_else(|| anyhow!("Router was not loaded from a file"))?;

        // Editors often replace the file, so watch its directory instead.
        let watch_dir = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        info!("Watching {} for route changes", config_path.display());

        loop {
            tokio::select! {
                Some(res) = event_rx.recv() => match res {
                    Ok(event) if touches_file(&event, &config_path) => {
                        debug!("Routing config changed: {:?}", event.kind);
                        if let Err(err) = self.reload().await {
                            warn!("Keeping previous routes: {:?}", err);
                        }
                    }
                    Ok(_) => {}
                    Err(err) => error!("Config watcher error: {:?}", err),
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received. Stopping config watcher...");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

fn touches_file(event: &Event, config_path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path.file_name() == config_path.file_name())
}
