use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::FileManagerError;
use crate::middleware::log_request;
use crate::protocol::handlers;
use crate::storage::{EntryMutator, PathGuard};

/// State shared by every request handler
#[derive(Debug)]
pub struct AppState {
    pub mutator: EntryMutator,
    pub config: ServerConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Creates the root directory if it is missing and builds the guard on it.
    pub fn new(config: ServerConfig) -> Result<Self, FileManagerError> {
        let root = config.server_root_path();

        if let Err(e) = std::fs::create_dir_all(&root) {
            warn!("Failed to create server root directory {}: {}", root.display(), e);
        }

        let guard = PathGuard::new(&root)?;
        info!("Server root directory: {}", guard.root().display());

        let mutator = EntryMutator::new(guard, config.default_folder_name.clone());
        Ok(Self { mutator, config })
    }

    pub fn guard(&self) -> &PathGuard {
        self.mutator.guard()
    }
}

/// The route table. Upload bodies are capped at the configured size.
pub fn router(state: SharedState) -> Router {
    let body_limit = state.config.max_upload_size_bytes();

    Router::new()
        .route("/", get(handlers::browse))
        .route("/download", get(handlers::download))
        .route("/upload", post(handlers::upload))
        .route("/delete", delete(handlers::delete))
        .route("/create-folder", post(handlers::create_folder))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

pub struct Server {
    listener: TcpListener,
    state: SharedState,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, FileManagerError> {
        let socket = config.listen_socket();
        let state = Arc::new(AppState::new(config)?);

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, FileManagerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn start(self) -> Result<(), FileManagerError> {
        info!(
            "Starting RAX file manager on http://{} (root {})",
            self.local_addr()?,
            self.state.guard().root().display()
        );

        let app = router(Arc::clone(&self.state));
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}
