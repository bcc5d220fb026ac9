//! Request-scoped dataloaders for nested fields
//!
//! Each loader collects the parent ids requested within one tick and
//! issues a single multi-id query per store, replacing the per-parent
//! round-trips a naive nested resolver would make.

use async_graphql::dataloader::Loader;
use libris_common::db::models::{Author as DbAuthor, Book as DbBook};
use libris_common::db::Repository;
use libris_common::docstore::models::{
    AuthorMetadata as DocAuthorMetadata, BookMetadata as DocBookMetadata,
};
use libris_common::docstore::DocRepository;
use libris_common::errors::AppError;
use std::collections::HashMap;
use std::sync::Arc;

/// Batch lookup of authors by id
pub struct AuthorLoader {
    repo: Repository,
}

impl AuthorLoader {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

impl Loader<i32> for AuthorLoader {
    type Value = DbAuthor;
    type Error = Arc<AppError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let authors = self.repo.find_authors_by_ids(keys).await.map_err(Arc::new)?;
        Ok(authors.into_iter().map(|author| (author.id, author)).collect())
    }
}

/// Batch lookup of each author's books, newest publication first
pub struct AuthorBooksLoader {
    repo: Repository,
}

impl AuthorBooksLoader {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

impl Loader<i32> for AuthorBooksLoader {
    type Value = Vec<DbBook>;
    type Error = Arc<AppError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let books = self
            .repo
            .find_books_by_author_ids(keys)
            .await
            .map_err(Arc::new)?;

        let mut grouped: HashMap<i32, Vec<DbBook>> = HashMap::new();
        for book in books {
            grouped.entry(book.author_id).or_default().push(book);
        }

        Ok(grouped)
    }
}

/// Batch lookup of author metadata documents by author id
pub struct AuthorMetadataLoader {
    docs: DocRepository,
}

impl AuthorMetadataLoader {
    pub fn new(docs: DocRepository) -> Self {
        Self { docs }
    }
}

impl Loader<i32> for AuthorMetadataLoader {
    type Value = DocAuthorMetadata;
    type Error = Arc<AppError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let metadata = self
            .docs
            .find_author_metadata_by_ids(keys)
            .await
            .map_err(Arc::new)?;

        Ok(metadata
            .into_iter()
            .map(|meta| (meta.author_id, meta))
            .collect())
    }
}

/// Batch lookup of book metadata documents by book id
pub struct BookMetadataLoader {
    docs: DocRepository,
}

impl BookMetadataLoader {
    pub fn new(docs: DocRepository) -> Self {
        Self { docs }
    }
}

impl Loader<i32> for BookMetadataLoader {
    type Value = DocBookMetadata;
    type Error = Arc<AppError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let metadata = self
            .docs
            .find_book_metadata_by_ids(keys)
            .await
            .map_err(Arc::new)?;

        Ok(metadata
            .into_iter()
            .map(|meta| (meta.book_id, meta))
            .collect())
    }
}
