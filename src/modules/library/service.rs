use std::sync::Arc;

use shelf_db::{Database, Repository};

use super::error::{ConflictKind, EntityKind, LibraryError, LibraryResult};
use super::models::{Book, BookId, Borrower, BorrowerId, NewBook, NewBorrower};
use super::store::{SqliteBookRepository, SqliteBorrowerRepository};

/// Orchestrates registration and the borrow/return workflow.
///
/// Checks that need storage (existence, availability) live here; the
/// state transition itself belongs to [`Book`].
#[derive(Clone)]
pub struct LibraryService {
    books: Arc<dyn Repository<Book>>,
    borrowers: Arc<dyn Repository<Borrower>>,
}

impl LibraryService {
    pub fn new(
        books: Arc<dyn Repository<Book>>,
        borrowers: Arc<dyn Repository<Borrower>>,
    ) -> Self {
        Self { books, borrowers }
    }

    pub fn sqlite(db: &Database) -> Self {
        Self::new(
            Arc::new(SqliteBookRepository::new(db.clone())),
            Arc::new(SqliteBorrowerRepository::new(db.clone())),
        )
    }

    pub async fn register_borrower(&self, draft: NewBorrower) -> LibraryResult<Borrower> {
        let borrower = self.borrowers.save(draft).await?;
        tracing::info!(borrower_id = %borrower.id(), "borrower registered");
        Ok(borrower)
    }

    pub async fn register_book(&self, draft: NewBook) -> LibraryResult<Book> {
        let book = self.books.save(draft).await?;
        tracing::info!(book_id = %book.id(), "book registered");
        Ok(book)
    }

    /// All-or-nothing: a failure leaves none of the batch stored.
    pub async fn register_books(&self, drafts: Vec<NewBook>) -> LibraryResult<Vec<Book>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let books = self.books.save_all(drafts).await?;
        tracing::info!(count = books.len(), "books registered in bulk");
        Ok(books)
    }

    pub async fn get_all_books(&self) -> LibraryResult<Vec<Book>> {
        Ok(self.books.find_all().await?)
    }

    pub async fn count_books(&self) -> LibraryResult<usize> {
        Ok(self.books.count().await?)
    }

    /// Checks run in a fixed order (book exists, book available, borrower
    /// exists) so the reported error is deterministic when several fail.
    pub async fn borrow_book(
        &self,
        book_id: BookId,
        borrower_id: BorrowerId,
    ) -> LibraryResult<Book> {
        let mut book = self
            .books
            .find_by_id(book_id)
            .await?
            .ok_or(LibraryError::NotFound(EntityKind::Book))?;

        if book.is_borrowed() {
            return Err(LibraryError::Conflict(ConflictKind::AlreadyBorrowed));
        }

        let borrower = self
            .borrowers
            .find_by_id(borrower_id)
            .await?
            .ok_or(LibraryError::NotFound(EntityKind::Borrower))?;

        book.borrow(borrower)?;
        let book = self.books.update(&book).await?;

        tracing::info!(%book_id, %borrower_id, "book borrowed");
        Ok(book)
    }

    pub async fn return_book(&self, book_id: BookId) -> LibraryResult<Book> {
        let mut book = self
            .books
            .find_by_id(book_id)
            .await?
            .ok_or(LibraryError::NotFound(EntityKind::Book))?;

        book.mark_returned()?;
        let book = self.books.update(&book).await?;

        tracing::info!(%book_id, "book returned");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_db::MemoryRepository;

    impl LibraryService {
        fn in_memory() -> Self {
            Self::new(
                Arc::new(MemoryRepository::<Book>::new()),
                Arc::new(MemoryRepository::<Borrower>::new()),
            )
        }
    }

    fn book(isbn: &str, title: &str, author: &str) -> NewBook {
        NewBook::new(isbn, title, author).unwrap()
    }

    fn design_patterns() -> NewBook {
        book("9780134685991", "Design Patterns", "Erich Gamma")
    }

    fn effective_java() -> NewBook {
        book("9780201633610", "Effective Java", "Joshua Bloch")
    }

    fn ishani() -> NewBorrower {
        NewBorrower::new("Ishani", "ishani@example.com").unwrap()
    }

    const MISSING_BOOK: BookId = BookId::new(999);
    const MISSING_BORROWER: BorrowerId = BorrowerId::new(999);

    #[tokio::test]
    async fn register_borrower_assigns_id() {
        let service = LibraryService::in_memory();
        let saved = service.register_borrower(ishani()).await.unwrap();
        assert_eq!(saved.id(), BorrowerId::new(1));
        assert_eq!(saved.email(), "ishani@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let service = LibraryService::in_memory();
        service.register_borrower(ishani()).await.unwrap();

        let err = service.register_borrower(ishani()).await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::DuplicateEmail)));
    }

    #[tokio::test]
    async fn register_book_starts_available() {
        let service = LibraryService::in_memory();
        let saved = service.register_book(design_patterns()).await.unwrap();
        assert_eq!(saved.id(), BookId::new(1));
        assert!(!saved.is_borrowed());
        assert!(saved.borrower().is_none());
    }

    #[tokio::test]
    async fn bulk_register_and_list() {
        let service = LibraryService::in_memory();
        let saved = service
            .register_books(vec![design_patterns(), effective_java()])
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved.iter().all(|b| !b.is_borrowed()));

        let all = service.get_all_books().await.unwrap();
        assert_eq!(all, saved);
        assert_eq!(service.count_books().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn bulk_register_empty_list() {
        let service = LibraryService::in_memory();
        assert!(service.register_books(Vec::new()).await.unwrap().is_empty());
        assert!(service.get_all_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn borrow_book_success() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();
        let borrower = service.register_borrower(ishani()).await.unwrap();

        let borrowed = service.borrow_book(book.id(), borrower.id()).await.unwrap();
        assert!(borrowed.is_borrowed());
        assert_eq!(borrowed.borrower(), Some(&borrower));

        let stored = service.get_all_books().await.unwrap();
        assert_eq!(stored, vec![borrowed]);
    }

    #[tokio::test]
    async fn borrow_missing_book_reports_book_even_without_borrower() {
        let service = LibraryService::in_memory();
        let err = service
            .borrow_book(MISSING_BOOK, MISSING_BORROWER)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(EntityKind::Book)));

        let borrower = service.register_borrower(ishani()).await.unwrap();
        let err = service
            .borrow_book(MISSING_BOOK, borrower.id())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(EntityKind::Book)));
    }

    #[tokio::test]
    async fn borrow_with_missing_borrower() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();

        let err = service
            .borrow_book(book.id(), MISSING_BORROWER)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(EntityKind::Borrower)));

        let books = service.get_all_books().await.unwrap();
        assert!(!books[0].is_borrowed());
    }

    #[tokio::test]
    async fn availability_is_checked_before_borrower_existence() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();
        let borrower = service.register_borrower(ishani()).await.unwrap();
        service.borrow_book(book.id(), borrower.id()).await.unwrap();

        let err = service
            .borrow_book(book.id(), MISSING_BORROWER)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::AlreadyBorrowed)));
    }

    #[tokio::test]
    async fn second_borrow_is_a_conflict() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();
        let borrower = service.register_borrower(ishani()).await.unwrap();

        service.borrow_book(book.id(), borrower.id()).await.unwrap();
        let err = service
            .borrow_book(book.id(), borrower.id())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::AlreadyBorrowed)));
    }

    #[tokio::test]
    async fn return_book_success_then_second_return_conflicts() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();
        let borrower = service.register_borrower(ishani()).await.unwrap();
        service.borrow_book(book.id(), borrower.id()).await.unwrap();

        let returned = service.return_book(book.id()).await.unwrap();
        assert!(!returned.is_borrowed());
        assert!(returned.borrower().is_none());

        let err = service.return_book(book.id()).await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::NotBorrowed)));
    }

    #[tokio::test]
    async fn return_never_borrowed_book() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();
        let err = service.return_book(book.id()).await.unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::NotBorrowed)));
    }

    #[tokio::test]
    async fn return_missing_book() {
        let service = LibraryService::in_memory();
        let err = service.return_book(MISSING_BOOK).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(EntityKind::Book)));
    }

    #[tokio::test]
    async fn book_can_be_borrowed_again_after_return() {
        let service = LibraryService::in_memory();
        let book = service.register_book(design_patterns()).await.unwrap();
        let first = service.register_borrower(ishani()).await.unwrap();
        let second = service
            .register_borrower(NewBorrower::new("Ravi", "ravi@example.com").unwrap())
            .await
            .unwrap();

        service.borrow_book(book.id(), first.id()).await.unwrap();
        service.return_book(book.id()).await.unwrap();
        let again = service.borrow_book(book.id(), second.id()).await.unwrap();

        assert!(again.is_borrowed());
        assert_eq!(again.borrower().map(Borrower::id), Some(second.id()));
    }

    #[tokio::test]
    async fn stale_copy_loses_the_race() {
        let books = Arc::new(MemoryRepository::<Book>::new());
        let borrowers = Arc::new(MemoryRepository::<Borrower>::new());
        let service = LibraryService::new(books.clone(), borrowers);
        let book = service.register_book(design_patterns()).await.unwrap();
        let borrower = service.register_borrower(ishani()).await.unwrap();

        // A competing request read the book before this borrow committed.
        let mut stale = books.find_by_id(book.id()).await.unwrap().unwrap();
        service.borrow_book(book.id(), borrower.id()).await.unwrap();

        stale.borrow(borrower).unwrap();
        let err: LibraryError = books.update(&stale).await.unwrap_err().into();
        assert!(matches!(
            err,
            LibraryError::Conflict(ConflictKind::ConcurrentModification)
        ));
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let service = LibraryService::in_memory();

        let book = service.register_book(design_patterns()).await.unwrap();
        assert_eq!(book.id(), BookId::new(1));
        let borrower = service.register_borrower(ishani()).await.unwrap();
        assert_eq!(borrower.id(), BorrowerId::new(1));

        let borrowed = service
            .borrow_book(BookId::new(1), BorrowerId::new(1))
            .await
            .unwrap();
        assert_eq!(borrowed.id(), BookId::new(1));
        assert!(borrowed.is_borrowed());
        assert_eq!(borrowed.borrower().map(Borrower::id), Some(BorrowerId::new(1)));

        let returned = service.return_book(BookId::new(1)).await.unwrap();
        assert_eq!(returned.id(), BookId::new(1));
        assert!(!returned.is_borrowed());
        assert!(returned.borrower().is_none());
    }
}
