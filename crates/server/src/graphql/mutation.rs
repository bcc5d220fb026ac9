//! Mutation resolvers
//!
//! Every mutation is a fixed sequence of independent store operations:
//! the gating existence check and the primary write propagate failures,
//! while counter updates, metadata cleanup, and remote image deletion
//! are best-effort (logged and swallowed). The relational write comes
//! first for creates and last for deletes, keeping the window where a
//! document references a nonexistent row as small as the two
//! uncoordinated stores allow.

use async_graphql::{Context, ErrorExtensions, Object, Result, ResultExt, Upload, ID};
use bson::oid::ObjectId;
use libris_common::config::AppConfig;
use libris_common::db::{AuthorChanges, BookChanges, Repository};
use libris_common::docstore::{BookMetadataUpdate, DocRepository};
use libris_common::errors::AppError;
use libris_common::images::{extract_public_id_from_url, ImageHost};
use std::io::Read;
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

use super::inputs::{
    AuthorInput, AuthorUpdateInput, BookInput, BookMetadataInput, BookUpdateInput, ReviewInput,
};
use super::parse_entity_id;
use super::types::{Author, Book, BookMetadata, ImageUploadResponse, Review};

/// Upload size cap
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

fn parse_review_id(id: &ID) -> Result<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|_| {
        AppError::InvalidId {
            value: id.to_string(),
        }
        .extend()
    })
}

fn validation_error(err: validator::ValidationErrors) -> async_graphql::Error {
    AppError::Validation {
        message: err.to_string(),
        field: None,
    }
    .extend()
}

/// The deletion key for a stored asset: the persisted public id when
/// present, otherwise recovered from the URL (documents written before
/// the id was persisted).
fn asset_public_id(explicit: Option<String>, url: Option<&str>) -> Option<String> {
    explicit.or_else(|| url.and_then(extract_public_id_from_url))
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    // ========================================================================
    // Book Mutations
    // ========================================================================

    async fn create_book(&self, ctx: &Context<'_>, input: BookInput) -> Result<Book> {
        input.validate().map_err(validation_error)?;

        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();

        // Gate: the referenced author must exist
        repo.find_author_by_id(input.author_id)
            .await
            .extend()?
            .ok_or(AppError::AuthorNotFound {
                id: input.author_id,
            })
            .extend()?;

        let book = repo
            .create_book(
                input.title,
                input.description,
                input.published_date.map(|date| date.0),
                input.author_id,
            )
            .await
            .extend()?;

        let public_id = asset_public_id(
            input.cover_image_public_id,
            input.cover_image_url.as_deref(),
        );
        docs.create_book_metadata(book.id, input.cover_image_url, public_id)
            .await
            .extend()?;

        if let Err(e) = docs.adjust_author_total_books(input.author_id, 1).await {
            warn!(error = %e, author_id = input.author_id, "Failed to update author totalBooks count");
        }

        tracing::info!(book_id = book.id, author_id = book.author_id, "Book created");

        Ok(Book(book))
    }

    async fn update_book(&self, ctx: &Context<'_>, id: ID, input: BookUpdateInput) -> Result<Book> {
        input.validate().map_err(validation_error)?;

        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();
        let images = ctx.data_unchecked::<ImageHost>();

        let id = parse_entity_id(&id)?;

        let book = repo
            .find_book_by_id(id)
            .await
            .extend()?
            .ok_or(AppError::BookNotFound { id })
            .extend()?;

        let old_author_id = book.author_id;

        // Author reassignment: gate on the new author, then move the
        // denormalized counters best-effort
        if let Some(new_author_id) = input.author_id {
            if new_author_id != old_author_id {
                repo.find_author_by_id(new_author_id)
                    .await
                    .extend()?
                    .ok_or(AppError::AuthorNotFound { id: new_author_id })
                    .extend()?;

                if let Err(e) = docs.adjust_author_total_books(old_author_id, -1).await {
                    warn!(error = %e, author_id = old_author_id, "Failed to update author totalBooks count");
                }
                if let Err(e) = docs.adjust_author_total_books(new_author_id, 1).await {
                    warn!(error = %e, author_id = new_author_id, "Failed to update author totalBooks count");
                }
            }
        }

        let updated = repo
            .update_book(
                id,
                BookChanges {
                    title: input.title,
                    description: input.description,
                    published_date: input.published_date.map(|date| date.0),
                    author_id: input.author_id,
                },
            )
            .await
            .extend()?;

        if let Some(cover_image_url) = input.cover_image_url {
            let metadata = docs.find_book_metadata(id).await.extend()?;

            // A changed cover retires the old remote asset; an unchanged
            // URL must not trigger a deletion call
            if let Some(metadata) = &metadata {
                if let Some(old_url) = &metadata.cover_image_url {
                    if *old_url != cover_image_url {
                        let delete_key = asset_public_id(
                            metadata.cover_image_public_id.clone(),
                            Some(old_url.as_str()),
                        );
                        if let Some(key) = delete_key {
                            if let Err(e) = images.destroy(&key).await {
                                warn!(error = %e, public_id = %key, "Failed to delete old book cover image");
                            }
                        }
                    }
                }
            }

            let public_id = asset_public_id(
                input.cover_image_public_id,
                Some(cover_image_url.as_str()),
            );
            docs.set_book_cover_image(id, cover_image_url, public_id)
                .await
                .extend()?;
        }

        Ok(Book(updated))
    }

    async fn delete_book(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();
        let images = ctx.data_unchecked::<ImageHost>();

        let id = parse_entity_id(&id)?;

        repo.find_book_by_id(id)
            .await
            .extend()?
            .ok_or(AppError::BookNotFound { id })
            .extend()?;

        // Best-effort document-side cleanup; each step is independently
        // fire-and-forget
        match docs.find_book_metadata(id).await {
            Ok(Some(metadata)) => {
                let delete_key = asset_public_id(
                    metadata.cover_image_public_id.clone(),
                    metadata.cover_image_url.as_deref(),
                );
                if let Some(key) = delete_key {
                    if let Err(e) = images.destroy(&key).await {
                        warn!(error = %e, public_id = %key, "Failed to delete book cover image");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, book_id = id, "Failed to fetch book metadata for cleanup"),
        }

        if let Err(e) = docs.delete_book_metadata(id).await {
            warn!(error = %e, book_id = id, "Failed to delete book metadata");
        }
        if let Err(e) = docs.delete_reviews_for_book(id).await {
            warn!(error = %e, book_id = id, "Failed to delete book reviews");
        }

        // The relational row goes last; it is the source of truth for
        // existence
        repo.delete_book(id).await.extend()?;

        tracing::info!(book_id = id, "Book deleted");

        Ok(true)
    }

    // ========================================================================
    // Author Mutations
    // ========================================================================

    async fn create_author(&self, ctx: &Context<'_>, input: AuthorInput) -> Result<Author> {
        input.validate().map_err(validation_error)?;

        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();

        let author = repo
            .create_author(
                input.name,
                input.biography,
                input.born_date.map(|date| date.0),
            )
            .await
            .extend()?;

        let public_id = asset_public_id(
            input.profile_image_public_id,
            input.profile_image_url.as_deref(),
        );
        docs.create_author_metadata(author.id, input.profile_image_url, public_id)
            .await
            .extend()?;

        tracing::info!(author_id = author.id, "Author created");

        Ok(Author(author))
    }

    async fn update_author(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: AuthorUpdateInput,
    ) -> Result<Author> {
        input.validate().map_err(validation_error)?;

        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();

        let id = parse_entity_id(&id)?;

        repo.find_author_by_id(id)
            .await
            .extend()?
            .ok_or(AppError::AuthorNotFound { id })
            .extend()?;

        let updated = repo
            .update_author(
                id,
                AuthorChanges {
                    name: input.name,
                    biography: input.biography,
                    born_date: input.born_date.map(|date| date.0),
                },
            )
            .await
            .extend()?;

        if let Some(profile_image_url) = input.profile_image_url {
            let public_id = asset_public_id(
                input.profile_image_public_id,
                Some(profile_image_url.as_str()),
            );
            docs.set_author_profile_image(id, profile_image_url, public_id)
                .await
                .extend()?;
        }

        Ok(Author(updated))
    }

    async fn delete_author(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();

        let id = parse_entity_id(&id)?;

        repo.find_author_by_id(id)
            .await
            .extend()?
            .ok_or(AppError::AuthorNotFound { id })
            .extend()?;

        // Business rule: deletion is blocked while books reference the
        // author
        let count = repo.count_books_by_author(id).await.extend()?;
        if count > 0 {
            return Err(AppError::AuthorHasBooks { id, count }.extend());
        }

        docs.delete_author_metadata(id).await.extend()?;
        repo.delete_author(id).await.extend()?;

        tracing::info!(author_id = id, "Author deleted");

        Ok(true)
    }

    // ========================================================================
    // Book Metadata Mutations
    // ========================================================================

    async fn update_book_metadata(
        &self,
        ctx: &Context<'_>,
        book_id: i32,
        input: BookMetadataInput,
    ) -> Result<BookMetadata> {
        input.validate().map_err(validation_error)?;

        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();

        repo.find_book_by_id(book_id)
            .await
            .extend()?
            .ok_or(AppError::BookNotFound { id: book_id })
            .extend()?;

        let public_id = asset_public_id(
            input.cover_image_public_id,
            input.cover_image_url.as_deref(),
        );

        let metadata = docs
            .update_book_metadata(
                book_id,
                BookMetadataUpdate {
                    genres: input.genres,
                    tags: input.tags,
                    isbn: input.isbn,
                    page_count: input.page_count,
                    language: input.language,
                    cover_image_url: input.cover_image_url,
                    cover_image_public_id: public_id,
                },
            )
            .await
            .extend()?;

        Ok(BookMetadata(metadata))
    }

    // ========================================================================
    // Review Mutations
    // ========================================================================

    async fn create_review(&self, ctx: &Context<'_>, input: ReviewInput) -> Result<Review> {
        input.validate().map_err(validation_error)?;

        let repo = ctx.data_unchecked::<Repository>();
        let docs = ctx.data_unchecked::<DocRepository>();

        // Gate: the reviewed book must exist
        repo.find_book_by_id(input.book_id)
            .await
            .extend()?
            .ok_or(AppError::BookNotFound { id: input.book_id })
            .extend()?;

        let review = docs
            .create_review(
                input.book_id,
                input.rating,
                input.comment,
                input.reviewer_name,
            )
            .await
            .extend()?;

        if let Err(e) = docs.recompute_rating_stats(input.book_id).await {
            warn!(error = %e, book_id = input.book_id, "Error updating book rating stats");
        }

        Ok(Review(review))
    }

    async fn update_review(
        &self,
        ctx: &Context<'_>,
        id: ID,
        rating: Option<i32>,
        comment: Option<String>,
    ) -> Result<Review> {
        let docs = ctx.data_unchecked::<DocRepository>();

        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::Validation {
                    message: "rating must be between 1 and 5".to_string(),
                    field: Some("rating".to_string()),
                }
                .extend());
            }
        }

        let review_id = parse_review_id(&id)?;

        let review = docs
            .find_review(review_id)
            .await
            .extend()?
            .ok_or(AppError::ReviewNotFound { id: id.to_string() })
            .extend()?;

        let updated = docs
            .update_review(review_id, rating, comment)
            .await
            .extend()?
            .ok_or(AppError::ReviewNotFound { id: id.to_string() })
            .extend()?;

        if rating.is_some() {
            if let Err(e) = docs.recompute_rating_stats(review.book_id).await {
                warn!(error = %e, book_id = review.book_id, "Error updating book rating stats");
            }
        }

        Ok(Review(updated))
    }

    async fn delete_review(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let docs = ctx.data_unchecked::<DocRepository>();

        let review_id = parse_review_id(&id)?;

        let review = docs
            .find_review(review_id)
            .await
            .extend()?
            .ok_or(AppError::ReviewNotFound { id: id.to_string() })
            .extend()?;

        docs.delete_review(review_id).await.extend()?;

        if let Err(e) = docs.recompute_rating_stats(review.book_id).await {
            warn!(error = %e, book_id = review.book_id, "Error updating book rating stats");
        }

        Ok(true)
    }

    async fn mark_review_helpful(&self, ctx: &Context<'_>, id: ID) -> Result<Review> {
        let docs = ctx.data_unchecked::<DocRepository>();

        let review_id = parse_review_id(&id)?;

        let review = docs
            .mark_review_helpful(review_id)
            .await
            .extend()?
            .ok_or(AppError::ReviewNotFound { id: id.to_string() })
            .extend()?;

        Ok(Review(review))
    }

    // ========================================================================
    // Image Upload
    // ========================================================================

    async fn upload_image(
        &self,
        ctx: &Context<'_>,
        file: Upload,
        #[graphql(name = "type")] image_type: Option<String>,
    ) -> Result<ImageUploadResponse> {
        let config = ctx.data_unchecked::<Arc<AppConfig>>();
        let images = ctx.data_unchecked::<ImageHost>();

        let upload = file.value(ctx)?;

        let mime = upload.content_type.clone().unwrap_or_default();
        if !mime.starts_with("image/") {
            return Err(AppError::InvalidImageType { mime }.extend());
        }

        let filename = upload.filename.clone();
        let mut data = Vec::new();
        upload
            .into_read()
            .read_to_end(&mut data)
            .map_err(|e| AppError::from(e).extend())?;

        if data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::PayloadTooLarge {
                size: data.len(),
                limit: MAX_IMAGE_BYTES,
            }
            .extend());
        }

        let root = &config.images.root_folder;
        let folder = match image_type.as_deref() {
            Some("author") => format!("{}/authors", root),
            Some("book") => format!("{}/books", root),
            _ => root.clone(),
        };

        let uploaded = images.upload(data, &folder, &filename).await.extend()?;

        tracing::info!(public_id = %uploaded.public_id, folder = %folder, "Image uploaded");

        Ok(ImageUploadResponse {
            url: uploaded.url,
            public_id: uploaded.public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_id_rejects_garbage() {
        assert!(parse_review_id(&ID("not-an-object-id".to_string())).is_err());
        assert!(parse_review_id(&ID("65f0a1b2c3d4e5f6a7b8c9d0".to_string())).is_ok());
    }

    #[test]
    fn test_asset_public_id_prefers_persisted_id() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1/libris/books/from-url.jpg";
        assert_eq!(
            asset_public_id(Some("persisted/id".to_string()), Some(url)),
            Some("persisted/id".to_string())
        );
    }

    #[test]
    fn test_asset_public_id_falls_back_to_url_parsing() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1/libris/books/from-url.jpg";
        assert_eq!(
            asset_public_id(None, Some(url)),
            Some("libris/books/from-url".to_string())
        );
        assert_eq!(asset_public_id(None, Some("https://example.com/x.jpg")), None);
        assert_eq!(asset_public_id(None, None), None);
    }
}
