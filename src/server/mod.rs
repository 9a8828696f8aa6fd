//! Analytics read API.
//!
//! Thin read-only HTTP layer over the raw tables the pipeline produces.
//! Column names and types in those tables are a stability contract for
//! this service and for the external transform stage; neither may
//! change without a migration.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{AsyncSqlitePool, DetectionRepository, MessageRepository};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<MessageRepository>,
    pub detections: Arc<DetectionRepository>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let pool = AsyncSqlitePool::new(&settings.database_url);
        Self {
            messages: Arc::new(MessageRepository::new(pool.clone())),
            detections: Arc::new(DetectionRepository::new(pool)),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting analytics API at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
