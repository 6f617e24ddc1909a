//! Local dashboard server.
//!
//! Serves the page, stylesheet, icon, generated lookup and script directory
//! straight from a base directory. Unknown paths get a 404.

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

/// URL path → file name, relative to the base directory.
pub const STATIC_ASSETS: &[(&str, &str)] = &[
    ("/", "index.html"),
    ("/styles.css", "styles.css"),
    ("/dict_indicadores.json", "dict_indicadores.json"),
    ("/icone.ico", "icone.ico"),
];

pub const SCRIPTS_ROUTE: &str = "/scripts";
pub const SCRIPTS_DIR: &str = "scripts";

/// Builds the router for the dashboard rooted at `base_dir`.
pub fn router(base_dir: &Path) -> Router {
    let mut app = Router::new();
    for (route, file) in STATIC_ASSETS {
        app = app.route_service(route, ServeFile::new(base_dir.join(file)));
    }
    app.nest_service(SCRIPTS_ROUTE, ServeDir::new(base_dir.join(SCRIPTS_DIR)))
}

/// Opens `url` in the desktop's default browser.
///
/// The opener process is waited on by `webbrowser`, so nothing is left behind
/// once the browser has been handed the URL.
pub fn open_browser(url: &str) -> std::io::Result<()> {
    webbrowser::open(url)
}

/// Serves the dashboard on `addr` until the process is stopped.
///
/// When `launch_browser` is set, the browser is pointed at the server one
/// second after the listener is bound.
#[tracing::instrument(skip(base_dir), fields(base_dir = %base_dir.display()))]
pub async fn serve(base_dir: PathBuf, addr: SocketAddr, launch_browser: bool) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let local = listener.local_addr()?;
    let url = format!("http://{local}");

    for (route, file) in STATIC_ASSETS {
        if !base_dir.join(file).exists() {
            warn!(route, file, "Static asset missing, route will answer 404");
        }
    }

    if launch_browser {
        let url = url.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let target = url.clone();
            let opened = tokio::task::spawn_blocking(move || open_browser(&target)).await;
            if let Ok(Err(e)) = opened {
                warn!(url = %url, error = %e, "Could not open browser");
            }
        });
    }

    info!(url = %url, "Dashboard listening");
    axum::serve(listener, router(&base_dir))
        .await
        .context("server failed")?;
    Ok(())
}
