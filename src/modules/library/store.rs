//! SQLite-backed gateways for books and borrowers.

use async_trait::async_trait;
use shelf_db::{Database, Entity, Migration, Repository, StorageError, StorageResult};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::models::{Book, BookId, Borrower, BorrowerId, NewBook, NewBorrower};

pub(crate) const SCHEMA: Migration = Migration {
    id: "001_init",
    up: r#"
        CREATE TABLE borrowers (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL CHECK (trim(name) <> ''),
            email TEXT NOT NULL UNIQUE CHECK (trim(email) <> '')
        );

        CREATE TABLE books (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            isbn        TEXT    NOT NULL CHECK (trim(isbn) <> ''),
            title       TEXT    NOT NULL CHECK (trim(title) <> ''),
            author      TEXT    NOT NULL CHECK (trim(author) <> ''),
            borrowed    INTEGER NOT NULL DEFAULT 0,
            borrower_id INTEGER REFERENCES borrowers (id),
            version     INTEGER NOT NULL DEFAULT 0,
            CHECK ((borrowed = 0 AND borrower_id IS NULL)
                OR (borrowed = 1 AND borrower_id IS NOT NULL))
        );

        CREATE INDEX books_borrower_id ON books (borrower_id);
    "#,
};

const SELECT_BOOKS: &str = r#"
    SELECT b.id, b.isbn, b.title, b.author, b.version,
           b.borrower_id, r.name AS borrower_name, r.email AS borrower_email
    FROM books b
    LEFT JOIN borrowers r ON r.id = b.borrower_id
"#;

/// Maps SQLite's `UNIQUE constraint failed: table.column` onto the column name.
fn classify(entity: &'static str, err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = db_err
                .message()
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            return StorageError::UniqueViolation { entity, field };
        }
    }
    StorageError::Database(err)
}

async fn count_rows(db: &Database, table: &'static str) -> StorageResult<usize> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await?;
    Ok(usize::try_from(n).unwrap_or_default())
}

pub struct SqliteBookRepository {
    db: Database,
}

impl SqliteBookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn hydrate(row: &SqliteRow) -> StorageResult<Book> {
        let borrower = match row.try_get::<Option<i64>, _>("borrower_id")? {
            Some(id) => Some(Borrower::restore(
                BorrowerId::new(id),
                row.try_get("borrower_name")?,
                row.try_get("borrower_email")?,
            )),
            None => None,
        };

        let draft = NewBook::new(
            row.try_get::<&str, _>("isbn")?,
            row.try_get::<&str, _>("title")?,
            row.try_get::<&str, _>("author")?,
        )
        .map_err(|fields| {
            StorageError::Database(sqlx::Error::Decode(
                format!("stored book violates field rules: {fields:?}").into(),
            ))
        })?;

        Ok(Book::restore(
            BookId::new(row.try_get("id")?),
            draft,
            borrower,
            row.try_get("version")?,
        ))
    }

    async fn insert(conn: &mut SqliteConnection, draft: NewBook) -> StorageResult<Book> {
        let id = sqlx::query("INSERT INTO books (isbn, title, author) VALUES (?, ?, ?)")
            .bind(draft.isbn())
            .bind(draft.title())
            .bind(draft.author())
            .execute(&mut *conn)
            .await
            .map_err(|err| classify(Book::KIND, err))?
            .last_insert_rowid();
        Ok(Book::from_draft(BookId::new(id), draft))
    }
}

#[async_trait]
impl Repository<Book> for SqliteBookRepository {
    async fn save(&self, draft: NewBook) -> StorageResult<Book> {
        let mut conn = self.db.pool().acquire().await?;
        Self::insert(&mut conn, draft).await
    }

    async fn save_all(&self, drafts: Vec<NewBook>) -> StorageResult<Vec<Book>> {
        let mut tx = self.db.pool().begin().await?;
        let mut books = Vec::with_capacity(drafts.len());
        for draft in drafts {
            // Dropping `tx` on error rolls the whole batch back.
            books.push(Self::insert(&mut *tx, draft).await?);
        }
        tx.commit().await?;
        Ok(books)
    }

    async fn update(&self, book: &Book) -> StorageResult<Book> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET isbn = ?, title = ?, author = ?, borrowed = ?, borrower_id = ?,
                version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(book.isbn())
        .bind(book.title())
        .bind(book.author())
        .bind(book.is_borrowed())
        .bind(book.borrower().map(|b| b.id().get()))
        .bind(book.id().get())
        .bind(book.version())
        .execute(self.db.pool())
        .await
        .map_err(|err| classify(Book::KIND, err))?;

        if result.rows_affected() == 0 {
            let id = book.id().to_string();
            return Err(match self.find_by_id(book.id()).await? {
                Some(_) => StorageError::StaleVersion {
                    entity: Book::KIND,
                    id,
                },
                None => StorageError::Missing {
                    entity: Book::KIND,
                    id,
                },
            });
        }

        Ok(book.clone().with_version(book.version() + 1))
    }

    async fn find_by_id(&self, id: BookId) -> StorageResult<Option<Book>> {
        let row = sqlx::query(&format!("{SELECT_BOOKS} WHERE b.id = ?"))
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(Self::hydrate).transpose()
    }

    async fn find_all(&self) -> StorageResult<Vec<Book>> {
        let rows = sqlx::query(&format!("{SELECT_BOOKS} ORDER BY b.id"))
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Self::hydrate).collect()
    }

    async fn count(&self) -> StorageResult<usize> {
        count_rows(&self.db, "books").await
    }
}

pub struct SqliteBorrowerRepository {
    db: Database,
}

impl SqliteBorrowerRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn hydrate(row: &SqliteRow) -> StorageResult<Borrower> {
        Ok(Borrower::restore(
            BorrowerId::new(row.try_get("id")?),
            row.try_get("name")?,
            row.try_get("email")?,
        ))
    }

    async fn insert(conn: &mut SqliteConnection, draft: NewBorrower) -> StorageResult<Borrower> {
        let id = sqlx::query("INSERT INTO borrowers (name, email) VALUES (?, ?)")
            .bind(draft.name())
            .bind(draft.email())
            .execute(&mut *conn)
            .await
            .map_err(|err| classify(Borrower::KIND, err))?
            .last_insert_rowid();
        Ok(Borrower::from_draft(BorrowerId::new(id), draft))
    }
}

#[async_trait]
impl Repository<Borrower> for SqliteBorrowerRepository {
    async fn save(&self, draft: NewBorrower) -> StorageResult<Borrower> {
        let mut conn = self.db.pool().acquire().await?;
        Self::insert(&mut conn, draft).await
    }

    async fn save_all(&self, drafts: Vec<NewBorrower>) -> StorageResult<Vec<Borrower>> {
        let mut tx = self.db.pool().begin().await?;
        let mut borrowers = Vec::with_capacity(drafts.len());
        for draft in drafts {
            borrowers.push(Self::insert(&mut *tx, draft).await?);
        }
        tx.commit().await?;
        Ok(borrowers)
    }

    async fn update(&self, _borrower: &Borrower) -> StorageResult<Borrower> {
        Err(StorageError::Immutable {
            entity: Borrower::KIND,
        })
    }

    async fn find_by_id(&self, id: BorrowerId) -> StorageResult<Option<Borrower>> {
        let row = sqlx::query("SELECT id, name, email FROM borrowers WHERE id = ?")
            .bind(id.get())
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(Self::hydrate).transpose()
    }

    async fn find_all(&self) -> StorageResult<Vec<Borrower>> {
        let rows = sqlx::query("SELECT id, name, email FROM borrowers ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(Self::hydrate).collect()
    }

    async fn count(&self) -> StorageResult<usize> {
        count_rows(&self.db, "borrowers").await
    }
}
