pub mod library;

use shelf_db::Database;
use shelf_kernel::ModuleRegistry;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register(library::create_module(library::LibraryService::sqlite(db)));
}
