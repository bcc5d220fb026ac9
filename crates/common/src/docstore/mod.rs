//! Document store layer (MongoDB)
//!
//! Provides:
//! - Typed collections for metadata and review documents
//! - Repository pattern for data access
//! - Index bootstrap

pub mod models;
mod repository;

pub use repository::{BookMetadataUpdate, DocRepository};

use crate::config::DocStoreConfig;
use crate::errors::Result;
use bson::doc;
use models::{AuthorMetadata, BookMetadata, Review};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

/// Collection names
const AUTHOR_METADATA: &str = "author_metadata";
const BOOK_METADATA: &str = "book_metadata";
const REVIEWS: &str = "reviews";

/// Document store handle wrapping one MongoDB database
#[derive(Clone)]
pub struct DocStore {
    db: Database,
}

impl DocStore {
    /// Connect to the document store
    pub async fn new(config: &DocStoreConfig) -> Result<Self> {
        info!("Connecting to document store...");

        let client = Client::with_uri_str(&config.url).await?;
        let db = client.database(&config.database);

        info!(database = %config.database, "Document store connection established");

        Ok(Self { db })
    }

    pub fn author_metadata(&self) -> Collection<AuthorMetadata> {
        self.db.collection(AUTHOR_METADATA)
    }

    pub fn book_metadata(&self) -> Collection<BookMetadata> {
        self.db.collection(BOOK_METADATA)
    }

    pub fn reviews(&self) -> Collection<Review> {
        self.db.collection(REVIEWS)
    }

    /// Create the indexes the queries rely on
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.author_metadata()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "authorId": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;

        self.book_metadata()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "bookId": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        self.reviews()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "bookId": 1, "createdAt": -1 })
                    .build(),
            )
            .await?;

        info!("Document store indexes ensured");
        Ok(())
    }

    /// Ping the document store to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
