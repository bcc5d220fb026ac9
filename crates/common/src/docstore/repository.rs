//! Repository pattern for document store operations
//!
//! Metadata documents are created lazily and maintained with best-effort
//! writes; nothing here coordinates with the relational store. Counter
//! adjustment is a plain read-modify-write (no compare-and-swap), which
//! matches the service's documented consistency model.

use crate::docstore::models::{
    compute_rating_stats, AuthorMetadata, BookMetadata, RatingStats, Review, DEFAULT_LANGUAGE,
};
use crate::docstore::DocStore;
use crate::errors::{AppError, Result};
use crate::pagination::PageRequest;
use bson::doc;
use bson::oid::ObjectId;
use futures::stream::TryStreamExt;
use mongodb::options::ReturnDocument;

/// Partial update for a book metadata document; `None` fields are left
/// untouched
#[derive(Debug, Clone, Default)]
pub struct BookMetadataUpdate {
    pub genres: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub isbn: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
}

/// Repository for document store data access
#[derive(Clone)]
pub struct DocRepository {
    store: DocStore,
}

impl DocRepository {
    /// Create a new repository over the given store
    pub fn new(store: DocStore) -> Self {
        Self { store }
    }

    /// Ping the document store
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    // ========================================================================
    // Author Metadata Operations
    // ========================================================================

    /// Create the paired metadata document for a freshly created author
    pub async fn create_author_metadata(
        &self,
        author_id: i32,
        profile_image_url: Option<String>,
        profile_image_public_id: Option<String>,
    ) -> Result<AuthorMetadata> {
        let now = chrono::Utc::now();

        let mut metadata = AuthorMetadata {
            id: None,
            author_id,
            social_media: None,
            profile_image_url,
            profile_image_public_id,
            awards: Vec::new(),
            total_books: 0,
            average_rating: None,
            followers: 0,
            created_at: now,
            updated_at: now,
        };

        let result = self.store.author_metadata().insert_one(&metadata).await?;
        metadata.id = result.inserted_id.as_object_id();

        Ok(metadata)
    }

    /// Find the metadata document for one author
    pub async fn find_author_metadata(&self, author_id: i32) -> Result<Option<AuthorMetadata>> {
        self.store
            .author_metadata()
            .find_one(doc! { "authorId": author_id })
            .await
            .map_err(Into::into)
    }

    /// Metadata documents for a set of authors (batch lookup)
    pub async fn find_author_metadata_by_ids(
        &self,
        author_ids: &[i32],
    ) -> Result<Vec<AuthorMetadata>> {
        let cursor = self
            .store
            .author_metadata()
            .find(doc! { "authorId": { "$in": author_ids.to_vec() } })
            .await?;

        cursor.try_collect().await.map_err(Into::into)
    }

    /// Set the profile image on an author's metadata, creating the
    /// document if it does not exist yet
    pub async fn set_author_profile_image(
        &self,
        author_id: i32,
        url: String,
        public_id: Option<String>,
    ) -> Result<()> {
        let now = bson::DateTime::now();

        let mut set = doc! { "profileImageUrl": url, "updatedAt": now };
        if let Some(public_id) = public_id {
            set.insert("profileImagePublicId", public_id);
        }

        self.store
            .author_metadata()
            .update_one(
                doc! { "authorId": author_id },
                doc! {
                    "$set": set,
                    "$setOnInsert": {
                        "awards": [],
                        "totalBooks": 0i64,
                        "followers": 0i64,
                        "createdAt": now,
                    },
                },
            )
            .upsert(true)
            .await?;

        Ok(())
    }

    /// Delete the metadata document for one author
    pub async fn delete_author_metadata(&self, author_id: i32) -> Result<bool> {
        let result = self
            .store
            .author_metadata()
            .delete_one(doc! { "authorId": author_id })
            .await?;

        Ok(result.deleted_count > 0)
    }

    /// Adjust the denormalized book counter by `delta`, flooring at zero.
    ///
    /// Read-modify-write without coordination: concurrent adjustments can
    /// lose an update. The reconciliation pass bounds the drift.
    pub async fn adjust_author_total_books(&self, author_id: i32, delta: i64) -> Result<()> {
        if let Some(metadata) = self.find_author_metadata(author_id).await? {
            let next = (metadata.total_books + delta).max(0);
            if next != metadata.total_books {
                self.set_author_total_books(author_id, next).await?;
            }
        }
        Ok(())
    }

    /// Overwrite the denormalized book counter
    pub async fn set_author_total_books(&self, author_id: i32, total_books: i64) -> Result<()> {
        self.store
            .author_metadata()
            .update_one(
                doc! { "authorId": author_id },
                doc! { "$set": { "totalBooks": total_books, "updatedAt": bson::DateTime::now() } },
            )
            .await?;

        Ok(())
    }

    /// Every author metadata document (reconciliation scan)
    pub async fn all_author_metadata(&self) -> Result<Vec<AuthorMetadata>> {
        let cursor = self.store.author_metadata().find(doc! {}).await?;
        cursor.try_collect().await.map_err(Into::into)
    }

    // ========================================================================
    // Book Metadata Operations
    // ========================================================================

    /// Create the paired metadata document for a freshly created book
    pub async fn create_book_metadata(
        &self,
        book_id: i32,
        cover_image_url: Option<String>,
        cover_image_public_id: Option<String>,
    ) -> Result<BookMetadata> {
        let now = chrono::Utc::now();

        let mut metadata = BookMetadata {
            id: None,
            book_id,
            genres: Vec::new(),
            tags: Vec::new(),
            isbn: None,
            page_count: None,
            language: DEFAULT_LANGUAGE.to_string(),
            cover_image_url,
            cover_image_public_id,
            average_rating: None,
            total_reviews: 0,
            total_ratings: 0,
            created_at: now,
            updated_at: now,
        };

        let result = self.store.book_metadata().insert_one(&metadata).await?;
        metadata.id = result.inserted_id.as_object_id();

        Ok(metadata)
    }

    /// Find the metadata document for one book
    pub async fn find_book_metadata(&self, book_id: i32) -> Result<Option<BookMetadata>> {
        self.store
            .book_metadata()
            .find_one(doc! { "bookId": book_id })
            .await
            .map_err(Into::into)
    }

    /// Metadata documents for a set of books (batch lookup)
    pub async fn find_book_metadata_by_ids(&self, book_ids: &[i32]) -> Result<Vec<BookMetadata>> {
        let cursor = self
            .store
            .book_metadata()
            .find(doc! { "bookId": { "$in": book_ids.to_vec() } })
            .await?;

        cursor.try_collect().await.map_err(Into::into)
    }

    /// Apply a partial update to a book's metadata, creating the document
    /// if it does not exist yet
    pub async fn update_book_metadata(
        &self,
        book_id: i32,
        update: BookMetadataUpdate,
    ) -> Result<BookMetadata> {
        let now = bson::DateTime::now();

        let mut set = doc! { "updatedAt": now };
        if let Some(genres) = update.genres {
            set.insert("genres", genres);
        }
        if let Some(tags) = update.tags {
            set.insert("tags", tags);
        }
        if let Some(isbn) = update.isbn {
            set.insert("isbn", isbn);
        }
        if let Some(page_count) = update.page_count {
            set.insert("pageCount", page_count);
        }
        if let Some(language) = update.language {
            set.insert("language", language);
        }
        if let Some(url) = update.cover_image_url {
            set.insert("coverImageUrl", url);
        }
        if let Some(public_id) = update.cover_image_public_id {
            set.insert("coverImagePublicId", public_id);
        }

        // Defaults for a document created by this upsert; fields already
        // named in $set must not repeat here.
        let mut set_on_insert = doc! {
            "totalReviews": 0i64,
            "totalRatings": 0i64,
            "createdAt": now,
        };
        for (field, default) in [
            ("genres", bson::Bson::Array(Vec::new())),
            ("tags", bson::Bson::Array(Vec::new())),
            ("language", bson::Bson::String(DEFAULT_LANGUAGE.to_string())),
        ] {
            if !set.contains_key(field) {
                set_on_insert.insert(field, default);
            }
        }

        let metadata = self
            .store
            .book_metadata()
            .find_one_and_update(
                doc! { "bookId": book_id },
                doc! { "$set": set, "$setOnInsert": set_on_insert },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        metadata.ok_or_else(|| AppError::Internal {
            message: format!("Upsert returned no metadata document for book {}", book_id),
        })
    }

    /// Set the cover image on a book's metadata, creating the document if
    /// it does not exist yet
    pub async fn set_book_cover_image(
        &self,
        book_id: i32,
        url: String,
        public_id: Option<String>,
    ) -> Result<()> {
        self.update_book_metadata(
            book_id,
            BookMetadataUpdate {
                cover_image_url: Some(url),
                cover_image_public_id: public_id,
                ..Default::default()
            },
        )
        .await?;

        Ok(())
    }

    /// Delete the metadata document for one book
    pub async fn delete_book_metadata(&self, book_id: i32) -> Result<bool> {
        let result = self
            .store
            .book_metadata()
            .delete_one(doc! { "bookId": book_id })
            .await?;

        Ok(result.deleted_count > 0)
    }

    /// Every book metadata document (reconciliation scan)
    pub async fn all_book_metadata(&self) -> Result<Vec<BookMetadata>> {
        let cursor = self.store.book_metadata().find(doc! {}).await?;
        cursor.try_collect().await.map_err(Into::into)
    }

    // ========================================================================
    // Review Operations
    // ========================================================================

    /// Insert a new review
    pub async fn create_review(
        &self,
        book_id: i32,
        rating: i32,
        comment: Option<String>,
        reviewer_name: String,
    ) -> Result<Review> {
        let now = chrono::Utc::now();

        let mut review = Review {
            id: None,
            book_id,
            user_id: None,
            rating,
            comment,
            reviewer_name,
            helpful: 0,
            created_at: now,
            updated_at: now,
        };

        let result = self.store.reviews().insert_one(&review).await?;
        review.id = result.inserted_id.as_object_id();

        Ok(review)
    }

    /// Find review by id
    pub async fn find_review(&self, id: ObjectId) -> Result<Option<Review>> {
        self.store
            .reviews()
            .find_one(doc! { "_id": id })
            .await
            .map_err(Into::into)
    }

    /// Reviews for one book, newest first, with pagination
    pub async fn list_reviews(
        &self,
        book_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<Review>, u64)> {
        let filter = doc! { "bookId": book_id };

        let total = self.store.reviews().count_documents(filter.clone()).await?;

        let cursor = self
            .store
            .reviews()
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(page.offset())
            .limit(page.limit as i64)
            .await?;

        let reviews = cursor.try_collect().await?;

        Ok((reviews, total))
    }

    /// The newest `limit` reviews for one book
    pub async fn latest_reviews(&self, book_id: i32, limit: i64) -> Result<Vec<Review>> {
        let cursor = self
            .store
            .reviews()
            .find(doc! { "bookId": book_id })
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .await?;

        cursor.try_collect().await.map_err(Into::into)
    }

    /// All reviews for one book (aggregate recomputation)
    pub async fn reviews_for_book(&self, book_id: i32) -> Result<Vec<Review>> {
        let cursor = self.store.reviews().find(doc! { "bookId": book_id }).await?;
        cursor.try_collect().await.map_err(Into::into)
    }

    /// Apply a partial update to one review
    pub async fn update_review(
        &self,
        id: ObjectId,
        rating: Option<i32>,
        comment: Option<String>,
    ) -> Result<Option<Review>> {
        let mut set = doc! { "updatedAt": bson::DateTime::now() };
        if let Some(rating) = rating {
            set.insert("rating", rating);
        }
        if let Some(comment) = comment {
            set.insert("comment", comment);
        }

        self.store
            .reviews()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(Into::into)
    }

    /// Delete one review
    pub async fn delete_review(&self, id: ObjectId) -> Result<bool> {
        let result = self.store.reviews().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Increment a review's helpful counter
    pub async fn mark_review_helpful(&self, id: ObjectId) -> Result<Option<Review>> {
        self.store
            .reviews()
            .find_one_and_update(
                doc! { "_id": id },
                doc! {
                    "$inc": { "helpful": 1i64 },
                    "$set": { "updatedAt": bson::DateTime::now() },
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(Into::into)
    }

    /// Delete every review for one book; returns the number removed
    pub async fn delete_reviews_for_book(&self, book_id: i32) -> Result<u64> {
        let result = self
            .store
            .reviews()
            .delete_many(doc! { "bookId": book_id })
            .await?;

        Ok(result.deleted_count)
    }

    // ========================================================================
    // Rating Aggregates
    // ========================================================================

    /// Compute the current rating aggregate for one book from its reviews
    pub async fn rating_stats(&self, book_id: i32) -> Result<RatingStats> {
        let reviews = self.reviews_for_book(book_id).await?;
        Ok(compute_rating_stats(&reviews))
    }

    /// Write a rating aggregate onto the book's metadata document,
    /// creating it if missing. A book with no ratings has its average
    /// removed rather than left stale.
    pub async fn apply_rating_stats(&self, book_id: i32, stats: &RatingStats) -> Result<()> {
        let now = bson::DateTime::now();

        let set_on_insert = doc! {
            "genres": [],
            "tags": [],
            "language": DEFAULT_LANGUAGE,
            "createdAt": now,
        };

        let update = match stats.average_rating {
            Some(average) => doc! {
                "$set": {
                    "totalReviews": stats.total_reviews,
                    "totalRatings": stats.total_ratings,
                    "averageRating": average,
                    "updatedAt": now,
                },
                "$setOnInsert": set_on_insert,
            },
            None => doc! {
                "$set": {
                    "totalReviews": stats.total_reviews,
                    "totalRatings": stats.total_ratings,
                    "updatedAt": now,
                },
                "$unset": { "averageRating": "" },
                "$setOnInsert": set_on_insert,
            },
        };

        self.store
            .book_metadata()
            .update_one(doc! { "bookId": book_id }, update)
            .upsert(true)
            .await?;

        Ok(())
    }

    /// Recompute and persist the rating aggregate for one book
    pub async fn recompute_rating_stats(&self, book_id: i32) -> Result<RatingStats> {
        let stats = self.rating_stats(book_id).await?;
        self.apply_rating_stats(book_id, &stats).await?;
        Ok(stats)
    }
}
