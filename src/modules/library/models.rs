use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use shelf_db::Entity;

use super::error::{ConflictKind, LibraryError};
use super::validation::{self, FieldError};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Storage-assigned identifier of a book.
    BookId
);
entity_id!(
    /// Storage-assigned identifier of a borrower.
    BorrowerId
);

/// A person registered to borrow books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Borrower {
    id: BorrowerId,
    name: String,
    email: String,
}

impl Borrower {
    pub fn id(&self) -> BorrowerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn restore(id: BorrowerId, name: String, email: String) -> Self {
        Self { id, name, email }
    }
}

/// A borrower that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrower {
    name: String,
    email: String,
}

impl NewBorrower {
    /// Trims both fields; `name` must be non-blank and `email` a valid address.
    pub fn new(name: &str, email: &str) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = validation::required("name", name, &mut errors);
        let email = validation::email("email", email, &mut errors);
        if errors.is_empty() {
            Ok(Self { name, email })
        } else {
            Err(errors)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl Entity for Borrower {
    type Id = BorrowerId;
    type Draft = NewBorrower;

    const KIND: &'static str = "borrower";
    const MUTABLE: bool = false;

    fn from_draft(id: BorrowerId, draft: NewBorrower) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
        }
    }

    fn id(&self) -> BorrowerId {
        self.id
    }

    fn unique_keys(draft: &NewBorrower) -> Vec<(&'static str, String)> {
        vec![("email", draft.email.clone())]
    }
}

/// A registered book and its lending state.
///
/// The borrower is the single source of truth for availability: a book is
/// borrowed exactly when it holds a borrower, and only [`Book::borrow`] and
/// [`Book::mark_returned`] move it between the two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: BookId,
    isbn: String,
    title: String,
    author: String,
    borrower: Option<Borrower>,
    version: i64,
}

impl Book {
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_borrowed(&self) -> bool {
        self.borrower.is_some()
    }

    pub fn borrower(&self) -> Option<&Borrower> {
        self.borrower.as_ref()
    }

    /// Available → Borrowed.
    pub fn borrow(&mut self, borrower: Borrower) -> Result<(), LibraryError> {
        if self.is_borrowed() {
            return Err(LibraryError::Conflict(ConflictKind::AlreadyBorrowed));
        }
        self.borrower = Some(borrower);
        Ok(())
    }

    /// Borrowed → Available.
    pub fn mark_returned(&mut self) -> Result<(), LibraryError> {
        if self.borrower.take().is_none() {
            return Err(LibraryError::Conflict(ConflictKind::NotBorrowed));
        }
        Ok(())
    }

    pub(crate) fn restore(
        id: BookId,
        draft: NewBook,
        borrower: Option<Borrower>,
        version: i64,
    ) -> Self {
        Self {
            id,
            isbn: draft.isbn,
            title: draft.title,
            author: draft.author,
            borrower,
            version,
        }
    }
}

impl Serialize for Book {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            id: BookId,
            isbn: &'a str,
            title: &'a str,
            author: &'a str,
            borrowed: bool,
            borrower: Option<&'a Borrower>,
        }

        Wire {
            id: self.id,
            isbn: &self.isbn,
            title: &self.title,
            author: &self.author,
            borrowed: self.is_borrowed(),
            borrower: self.borrower.as_ref(),
        }
        .serialize(serializer)
    }
}

/// A book that has not been stored yet; always available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    isbn: String,
    title: String,
    author: String,
}

impl NewBook {
    /// Trims every field; none may be blank.
    pub fn new(isbn: &str, title: &str, author: &str) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let isbn = validation::required("isbn", isbn, &mut errors);
        let title = validation::required("title", title, &mut errors);
        let author = validation::required("author", author, &mut errors);
        if errors.is_empty() {
            Ok(Self {
                isbn,
                title,
                author,
            })
        } else {
            Err(errors)
        }
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

impl Entity for Book {
    type Id = BookId;
    type Draft = NewBook;

    const KIND: &'static str = "book";

    fn from_draft(id: BookId, draft: NewBook) -> Self {
        Self::restore(id, draft, None, 0)
    }

    fn id(&self) -> BookId {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn design_patterns() -> Book {
        let draft = NewBook::new("9780134685991", "Design Patterns", "Joshua Bloch").unwrap();
        Book::from_draft(BookId::new(1), draft)
    }

    fn ishani() -> Borrower {
        let draft = NewBorrower::new("Ishani", "ishani@example.com").unwrap();
        Borrower::from_draft(BorrowerId::new(1), draft)
    }

    #[test]
    fn new_book_starts_available() {
        let book = design_patterns();
        assert!(!book.is_borrowed());
        assert!(book.borrower().is_none());
        assert_eq!(book.version(), 0);
    }

    #[test]
    fn borrow_then_return_round_trips() {
        let mut book = design_patterns();

        book.borrow(ishani()).unwrap();
        assert!(book.is_borrowed());
        assert_eq!(book.borrower().map(Borrower::id), Some(BorrowerId::new(1)));

        book.mark_returned().unwrap();
        assert!(!book.is_borrowed());
        assert!(book.borrower().is_none());

        book.borrow(ishani()).unwrap();
        assert!(book.is_borrowed());
    }

    #[test]
    fn borrowing_twice_is_a_conflict() {
        let mut book = design_patterns();
        book.borrow(ishani()).unwrap();

        let err = book.borrow(ishani()).unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Conflict(ConflictKind::AlreadyBorrowed)
        ));
        assert!(book.is_borrowed());
    }

    #[test]
    fn returning_an_available_book_is_a_conflict() {
        let mut book = design_patterns();
        let err = book.mark_returned().unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(ConflictKind::NotBorrowed)));
    }

    #[test]
    fn drafts_trim_and_reject_blank_fields() {
        let draft = NewBook::new(" 9780201633610 ", "Effective Java ", " Erich Gamma").unwrap();
        assert_eq!(draft.isbn(), "9780201633610");
        assert_eq!(draft.title(), "Effective Java");
        assert_eq!(draft.author(), "Erich Gamma");

        let errors = NewBook::new("", "  ", "Someone").unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["isbn", "title"]);
    }

    #[test]
    fn borrower_draft_requires_valid_email() {
        let errors = NewBorrower::new("Ishani", "not-an-email").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn book_serializes_with_borrowed_flag() {
        let mut book = design_patterns();
        assert_eq!(
            serde_json::to_value(&book).unwrap(),
            json!({
                "id": 1,
                "isbn": "9780134685991",
                "title": "Design Patterns",
                "author": "Joshua Bloch",
                "borrowed": false,
                "borrower": null
            })
        );

        book.borrow(ishani()).unwrap();
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["borrowed"], true);
        assert_eq!(
            value["borrower"],
            json!({"id": 1, "name": "Ishani", "email": "ishani@example.com"})
        );
    }
}
