//! Persistence gateways for shelf.
//!
//! The [`Repository`] trait is the only storage contract the domain sees.
//! [`MemoryRepository`] backs tests; SQL-backed gateways live next to the
//! entities they persist and share the [`Database`] handle defined here.

pub mod database;
pub mod error;
pub mod memory;
pub mod migrate;
pub mod repository;

pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryRepository;
pub use migrate::Migration;
pub use repository::{Entity, Repository};
