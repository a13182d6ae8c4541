use sqlx::Row;

use crate::database::Database;
use crate::error::{StorageError, StorageResult};

/// Migration contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

const LEDGER: &str = r#"
    CREATE TABLE IF NOT EXISTS _shelf_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (module, id)
    );
"#;

/// Apply every `(module, migration)` pair not yet recorded in the ledger.
/// Each migration runs in its own transaction. Returns how many were applied.
pub async fn apply(db: &Database, migrations: &[(String, Migration)]) -> StorageResult<usize> {
    sqlx::raw_sql(LEDGER).execute(db.pool()).await?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let done = sqlx::query(
            "SELECT COUNT(*) AS n FROM _shelf_migrations WHERE module = ? AND id = ?",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_one(db.pool())
        .await?
        .try_get::<i64, _>("n")?;
        if done > 0 {
            tracing::debug!(
                target: "shelf-db",
                module = %module,
                migration = migration.id,
                "already applied"
            );
            continue;
        }

        let failed = |source| StorageError::Migration {
            module: module.clone(),
            id: migration.id.to_string(),
            source,
        };

        let mut tx = db.pool().begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        sqlx::query("INSERT INTO _shelf_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await?;

        tracing::info!(
            target: "shelf-db",
            module = %module,
            migration = migration.id,
            "migration applied"
        );
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes() -> Vec<(String, Migration)> {
        vec![(
            "notes".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE note (id INTEGER PRIMARY KEY, body TEXT NOT NULL);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::in_memory().await.unwrap();

        assert_eq!(apply(&db, &notes()).await.unwrap(), 1);
        assert_eq!(apply(&db, &notes()).await.unwrap(), 0);

        sqlx::query("INSERT INTO note (body) VALUES ('hello')")
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn broken_migration_is_not_recorded() {
        let db = Database::in_memory().await.unwrap();
        let broken = vec![(
            "notes".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE note (id INTEGER PRIMARY KEY; garbage",
            },
        )];

        let err = apply(&db, &broken).await.unwrap_err();
        assert!(matches!(err, StorageError::Migration { ref module, .. } if module == "notes"));

        // Fixed migration with the same id still applies.
        assert_eq!(apply(&db, &notes()).await.unwrap(), 1);
    }
}
