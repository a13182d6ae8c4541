//! Library management: books, borrowers, and the borrow/return workflow.

pub mod error;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod service;
pub mod store;
pub mod validation;

use async_trait::async_trait;
use axum::Router;
use shelf_kernel::{InitCtx, Migration, Module};

pub use error::{ConflictKind, EntityKind, LibraryError, LibraryResult};
pub use models::{Book, BookId, Borrower, BorrowerId, NewBook, NewBorrower};
pub use service::LibraryService;

/// Name of the module; routes are served under `/library-management/api`.
pub const MODULE_NAME: &str = "library-management";

pub struct LibraryModule {
    service: LibraryService,
}

impl LibraryModule {
    pub fn new(service: LibraryService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for LibraryModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "library module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![store::SCHEMA]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self.service.count_books().await?;
        tracing::info!(
            module = self.name(),
            books,
            "library module started"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "library module stopped");
        Ok(())
    }
}

/// Create a new instance of the library module
pub fn create_module(service: LibraryService) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(LibraryModule::new(service))
}
