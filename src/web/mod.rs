//! Web server module.
//!
//! JSON and text views over the registry, plus runtime target management.

mod handlers;

pub use handlers::*;

use crate::monitor::Registry;
use crate::scheduler::Scheduler;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub scheduler: Arc<Scheduler>,
}

/// Web server for uptrail.
pub struct Server {
    port: u16,
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(port: u16, scheduler: Arc<Scheduler>) -> Self {
        Self {
            port,
            state: AppState {
                registry: scheduler.registry().clone(),
                scheduler,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            // Text report
            .route("/", get(handlers::handle_report))
            // API endpoints
            .route(
                "/api/targets",
                get(handlers::handle_get_targets)
                    .post(handlers::handle_create_target)
                    .delete(handlers::handle_delete_target),
            )
            .route("/api/snapshot", get(handlers::handle_get_snapshot))
            .route("/api/snapshots", get(handlers::handle_get_snapshots))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
