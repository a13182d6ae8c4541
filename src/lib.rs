//! Shelf: a small library-management service.
//!
//! Books and borrowers are registered over HTTP; a book moves between
//! available and borrowed through the library module's service.

pub mod bootstrap;
pub mod modules;

pub use modules::library;
