//! GraphQL object types
//!
//! Thin wrappers over the store models. Nested fields on `Book` and
//! `Author` resolve through the request-scoped dataloaders; a failing
//! nested lookup degrades to null/empty with a log line instead of
//! failing the whole query.

use async_graphql::dataloader::DataLoader;
use async_graphql::{Context, ErrorExtensions, Object, Result, SimpleObject, ID};
use libris_common::db::models::{Author as DbAuthor, Book as DbBook};
use libris_common::docstore::models::{
    AuthorMetadata as DocAuthorMetadata, BookMetadata as DocBookMetadata, Review as DocReview,
    SocialMedia as DocSocialMedia,
};
use libris_common::docstore::DocRepository;
use libris_common::errors::AppError;
use libris_common::pagination::PageInfo;

use super::loaders::{AuthorBooksLoader, AuthorLoader, AuthorMetadataLoader, BookMetadataLoader};
use super::scalars::Date;

/// Newest reviews returned on the nested `Book.reviews` field
const NESTED_REVIEW_LIMIT: i64 = 10;

pub struct Book(pub DbBook);

#[Object]
impl Book {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    #[graphql(name = "published_date")]
    async fn published_date(&self) -> Option<Date> {
        self.0.published_date.map(Into::into)
    }

    #[graphql(name = "author_id")]
    async fn author_id(&self) -> i32 {
        self.0.author_id
    }

    async fn author(&self, ctx: &Context<'_>) -> Result<Author> {
        let loader = ctx.data_unchecked::<DataLoader<AuthorLoader>>();
        let author = loader
            .load_one(self.0.author_id)
            .await
            .map_err(|e| e.as_ref().extend())?
            .ok_or_else(|| {
                AppError::AuthorNotFound {
                    id: self.0.author_id,
                }
                .extend()
            })?;

        Ok(Author(author))
    }

    async fn metadata(&self, ctx: &Context<'_>) -> Option<BookMetadata> {
        let loader = ctx.data_unchecked::<DataLoader<BookMetadataLoader>>();
        match loader.load_one(self.0.id).await {
            Ok(metadata) => metadata.map(BookMetadata),
            Err(e) => {
                tracing::warn!(error = %e, book_id = self.0.id, "Error fetching book metadata");
                None
            }
        }
    }

    async fn reviews(&self, ctx: &Context<'_>) -> Vec<Review> {
        let docs = ctx.data_unchecked::<DocRepository>();
        match docs.latest_reviews(self.0.id, NESTED_REVIEW_LIMIT).await {
            Ok(reviews) => reviews.into_iter().map(Review).collect(),
            Err(e) => {
                tracing::warn!(error = %e, book_id = self.0.id, "Error fetching book reviews");
                Vec::new()
            }
        }
    }

    async fn created_at(&self) -> Date {
        self.0.created_at.into()
    }

    async fn updated_at(&self) -> Date {
        self.0.updated_at.into()
    }
}

pub struct Author(pub DbAuthor);

#[Object]
impl Author {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn biography(&self) -> Option<&str> {
        self.0.biography.as_deref()
    }

    #[graphql(name = "born_date")]
    async fn born_date(&self) -> Option<Date> {
        self.0.born_date.map(Into::into)
    }

    async fn books(&self, ctx: &Context<'_>) -> Vec<Book> {
        let loader = ctx.data_unchecked::<DataLoader<AuthorBooksLoader>>();
        match loader.load_one(self.0.id).await {
            Ok(books) => books
                .unwrap_or_default()
                .into_iter()
                .map(Book)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, author_id = self.0.id, "Error fetching author books");
                Vec::new()
            }
        }
    }

    async fn metadata(&self, ctx: &Context<'_>) -> Option<AuthorMetadata> {
        let loader = ctx.data_unchecked::<DataLoader<AuthorMetadataLoader>>();
        match loader.load_one(self.0.id).await {
            Ok(metadata) => metadata.map(AuthorMetadata),
            Err(e) => {
                tracing::warn!(error = %e, author_id = self.0.id, "Error fetching author metadata");
                None
            }
        }
    }

    async fn created_at(&self) -> Date {
        self.0.created_at.into()
    }

    async fn updated_at(&self) -> Date {
        self.0.updated_at.into()
    }
}

pub struct BookMetadata(pub DocBookMetadata);

#[Object]
impl BookMetadata {
    async fn id(&self) -> ID {
        ID(self.0.id.map(|id| id.to_hex()).unwrap_or_default())
    }

    async fn book_id(&self) -> i32 {
        self.0.book_id
    }

    async fn genres(&self) -> &[String] {
        &self.0.genres
    }

    async fn tags(&self) -> &[String] {
        &self.0.tags
    }

    async fn isbn(&self) -> Option<&str> {
        self.0.isbn.as_deref()
    }

    async fn page_count(&self) -> Option<i32> {
        self.0.page_count
    }

    async fn language(&self) -> &str {
        &self.0.language
    }

    async fn cover_image_url(&self) -> Option<&str> {
        self.0.cover_image_url.as_deref()
    }

    async fn average_rating(&self) -> Option<f64> {
        self.0.average_rating
    }

    async fn total_reviews(&self) -> i32 {
        self.0.total_reviews as i32
    }

    async fn total_ratings(&self) -> i32 {
        self.0.total_ratings as i32
    }

    async fn created_at(&self) -> Date {
        self.0.created_at.into()
    }

    async fn updated_at(&self) -> Date {
        self.0.updated_at.into()
    }
}

pub struct AuthorMetadata(pub DocAuthorMetadata);

#[Object]
impl AuthorMetadata {
    async fn id(&self) -> ID {
        ID(self.0.id.map(|id| id.to_hex()).unwrap_or_default())
    }

    async fn author_id(&self) -> i32 {
        self.0.author_id
    }

    async fn social_media(&self) -> Option<SocialMedia> {
        self.0.social_media.clone().map(Into::into)
    }

    async fn profile_image_url(&self) -> Option<&str> {
        self.0.profile_image_url.as_deref()
    }

    async fn awards(&self) -> &[String] {
        &self.0.awards
    }

    async fn total_books(&self) -> i32 {
        self.0.total_books as i32
    }

    async fn average_rating(&self) -> Option<f64> {
        self.0.average_rating
    }

    async fn followers(&self) -> i32 {
        self.0.followers as i32
    }

    async fn created_at(&self) -> Date {
        self.0.created_at.into()
    }

    async fn updated_at(&self) -> Date {
        self.0.updated_at.into()
    }
}

#[derive(SimpleObject)]
pub struct SocialMedia {
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub website: Option<String>,
}

impl From<DocSocialMedia> for SocialMedia {
    fn from(social: DocSocialMedia) -> Self {
        Self {
            twitter: social.twitter,
            facebook: social.facebook,
            website: social.website,
        }
    }
}

pub struct Review(pub DocReview);

#[Object]
impl Review {
    async fn id(&self) -> ID {
        ID(self.0.id.map(|id| id.to_hex()).unwrap_or_default())
    }

    async fn book_id(&self) -> i32 {
        self.0.book_id
    }

    async fn user_id(&self) -> Option<&str> {
        self.0.user_id.as_deref()
    }

    async fn rating(&self) -> i32 {
        self.0.rating
    }

    async fn comment(&self) -> Option<&str> {
        self.0.comment.as_deref()
    }

    async fn reviewer_name(&self) -> &str {
        &self.0.reviewer_name
    }

    async fn helpful(&self) -> i32 {
        self.0.helpful as i32
    }

    async fn created_at(&self) -> Date {
        self.0.created_at.into()
    }

    async fn updated_at(&self) -> Date {
        self.0.updated_at.into()
    }
}

#[derive(SimpleObject)]
pub struct PaginationInfo {
    pub current_page: i32,
    pub total_pages: i32,
    pub total_items: i32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl From<PageInfo> for PaginationInfo {
    fn from(info: PageInfo) -> Self {
        Self {
            current_page: info.current_page as i32,
            total_pages: info.total_pages as i32,
            total_items: info.total_items as i32,
            has_next_page: info.has_next_page,
            has_prev_page: info.has_prev_page,
        }
    }
}

#[derive(SimpleObject)]
pub struct BookConnection {
    pub books: Vec<Book>,
    pub pagination: PaginationInfo,
}

#[derive(SimpleObject)]
pub struct AuthorConnection {
    pub authors: Vec<Author>,
    pub pagination: PaginationInfo,
}

#[derive(SimpleObject)]
pub struct ReviewConnection {
    pub reviews: Vec<Review>,
    pub pagination: PaginationInfo,
}

#[derive(SimpleObject)]
pub struct SearchResults {
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
}

#[derive(SimpleObject)]
pub struct ImageUploadResponse {
    pub url: String,
    pub public_id: String,
}
