use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info, warn};
use path_router::cli::Cli;
use path_router::request::HttpRequest;
use path_router::router::{Dispatch, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::watch;

#[derive(Serialize)]
struct Resolved<'a> {
    #[serde(flatten)]
    dispatch: &'a Dispatch,
    params: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let cli = Cli::parse();
    let router = Arc::new(Router::new(&cli.route_config).await?);

    if cli.stdin {
        return serve_stdin(router).await;
    }

    let target = match cli.target.as_deref() {
        Some(target) => target,
        None => bail!("Missing request target"),
    };
    let mut request = HttpRequest::parse(&cli.method, target)?;
    for header in &cli.headers {
        request = request.with_raw_header(header)?;
    }

    match router.route(&request).await {
        Some(dispatch) => print_dispatch(&dispatch),
        None => bail!("No route for {} {}", request.method(), request.path()),
    }
}

async fn serve_stdin(router: Arc<Router>) -> Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let shutdown_task = tokio::spawn(handle_shutdown_signal(shutdown_tx.clone()));

    let watcher_router = Arc::clone(&router);
    let watcher_rx = shutdown_rx.clone();
    let config_task = tokio::spawn(async move {
        if let Err(e) = watcher_router.start_config_watcher(watcher_rx).await {
            error!("Failed to start config watcher: {:?}", e);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input. Stopping...");
                    break;
                };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                let request = match HttpRequest::from_request_line(line) {
                    Ok(request) => request,
                    Err(err) => {
                        warn!("Skipping request line: {:#}", err);
                        continue;
                    }
                };

                match router.route(&request).await {
                    Some(dispatch) => print_dispatch(&dispatch)?,
                    None => warn!("No route for {} {}", request.method(), request.path()),
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    shutdown_task.abort();
    config_task.await?;

    Ok(())
}

fn print_dispatch(dispatch: &Dispatch) -> Result<()> {
    let resolved = Resolved {
        dispatch,
        params: dispatch.params(),
    };
    print!("---\n{}", serde_yaml::to_string(&resolved)?);
    Ok(())
}

pub async fn handle_shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    // Wait for a shutdown signal (e.g., Ctrl+C)
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        return;
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}
