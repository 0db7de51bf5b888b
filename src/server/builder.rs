//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::registry::CollectionRegistry;
use super::router::build_record_routes;
use crate::config::{AppConfig, PaginationConfig};
use crate::core::service::RecordService;
use crate::entities::{catalog, seeds};
use crate::storage::{InMemoryRecordService, load_seed_file, seed_records};
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers with auto-registered routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .register(InMemoryRecordService::new(catalog::students()))?
///     .register(InMemoryRecordService::new(catalog::feedback()))?
///     .build()?;
/// ```
pub struct ServerBuilder {
    registry: CollectionRegistry,
    pagination: PaginationConfig,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            registry: CollectionRegistry::new(),
            pagination: PaginationConfig::default(),
            custom_routes: Vec::new(),
        }
    }

    /// In-memory collections as listed in `config`, seeded
    ///
    /// Each collection gets its demo records when `demo_seed` is set, then
    /// the contents of its `seed_file`, if any.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::new().with_pagination(config.pagination);

        for collection in &config.collections {
            let schema = catalog::builtin(&collection.name)
                .ok_or_else(|| anyhow!("Unknown collection '{}'", collection.name))?;
            let service = InMemoryRecordService::new(schema);

            if collection.demo_seed {
                seed_records(&service, seeds::demo(&collection.name)).await?;
            }
            if let Some(path) = &collection.seed_file {
                seed_records(&service, load_seed_file(path)?).await?;
            }

            builder = builder.register(service)?;
        }

        Ok(builder)
    }

    /// Page size defaults and limits for list requests
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Register a collection service
    pub fn register(self, service: impl RecordService + 'static) -> Result<Self> {
        self.register_shared(Arc::new(service))
    }

    /// Register a collection service that is also used elsewhere
    pub fn register_shared(mut self, service: Arc<dyn RecordService>) -> Result<Self> {
        tracing::debug!(collection = service.schema().plural(), "registering collection");
        self.registry.register(service)?;
        Ok(self)
    }

    /// Add custom routes to the server
    ///
    /// Use this to add routes that don't fit the CRUD pattern, such as
    /// reports or webhooks. They share the CORS and tracing layers.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the final REST router
    pub fn build(self) -> Result<Router> {
        if self.registry.is_empty() {
            return Err(anyhow!(
                "No collections registered. Call .register() at least once"
            ));
        }

        let state = AppState {
            registry: Arc::new(self.registry),
            pagination: self.pagination,
        };

        let mut app = build_record_routes(state);
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let collections = self.registry.names().join(", ");
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(%collections, "Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGTERM or Ctrl+C
///
/// A signal handler that cannot be installed never fires; the other one
/// still does.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
