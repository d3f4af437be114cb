use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    catalog::types::{
        Annotation, Author, AuthorBooksPage, BookWithAuthors, SearchResult, Sequence,
        SequenceBooksPage,
    },
    Result,
};

/// Read-only access to the remote book catalog.
///
/// `Ok(None)` means the entity does not exist; transport and decode problems
/// surface as errors. Search operations express "nothing matched" through an
/// empty `SearchResult` instead.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn search_books(
        &self,
        query: &str,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<BookWithAuthors>>;

    async fn search_authors(
        &self,
        query: &str,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<Author>>;

    async fn search_sequences(
        &self,
        query: &str,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<Sequence>>;

    async fn book_by_id(&self, book_id: u32) -> Result<Option<BookWithAuthors>>;

    async fn author_books(
        &self,
        author_id: u32,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<Option<AuthorBooksPage>>;

    async fn sequence_books(
        &self,
        sequence_id: u32,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<Option<SequenceBooksPage>>;

    async fn random_book(&self, langs: &[String]) -> Result<Option<BookWithAuthors>>;

    async fn random_author(&self, langs: &[String]) -> Result<Option<Author>>;

    async fn random_sequence(&self, langs: &[String]) -> Result<Option<Sequence>>;

    async fn book_annotation(&self, book_id: u32) -> Result<Option<Annotation>>;

    async fn author_annotation(&self, author_id: u32) -> Result<Option<Annotation>>;

    async fn update_log(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<BookWithAuthors>>;

    /// Fetch the raw file bytes for a book. `Ok(None)` covers both a missing
    /// book and a catalog that refused the conversion.
    async fn download(&self, book_id: u32, file_type: &str) -> Result<Option<Vec<u8>>>;
}
