use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Connect to the configured database.
pub async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    Database::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to open database")
}

/// Apply every pending module migration. Returns the number applied.
pub async fn migrate(registry: &ModuleRegistry, db: &Database) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = shelf_db::migrate::apply(db, &migrations)
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Register and initialize modules, then migrate when `auto_migrate` is set.
pub async fn prepare(settings: &Settings, db: &Database) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    crate::modules::register_all(&mut registry, db);

    let ctx = InitCtx { settings, db };
    registry.init_modules(&ctx).await?;

    if settings.database.auto_migrate {
        migrate(&registry, db).await?;
    }

    Ok(registry)
}

/// Run the service until a shutdown signal arrives.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "shelf bootstrap starting"
    );

    let db = connect(&settings).await?;
    let registry = prepare(&settings, &db).await?;

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.start_modules(&ctx).await?;
    tracing::info!("shelf bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings).await;

    let stopped = registry.stop_modules().await;
    db.close().await;

    served?;
    stopped
}
