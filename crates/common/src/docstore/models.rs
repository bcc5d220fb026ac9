//! Document models for the metadata and review collections
//!
//! Documents are correlated with their relational counterpart by a plain
//! numeric id field; nothing enforces that relationship across stores.

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Social links on an author profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMedia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Per-author document, keyed 1:1 by the relational author id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorMetadata {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub author_id: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_media: Option<SocialMedia>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,

    /// Asset id returned by the image host at upload time; deletion key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_public_id: Option<String>,

    #[serde(default)]
    pub awards: Vec<String>,

    /// Incrementally maintained count of owned books; can drift and is
    /// repaired by the reconciliation pass
    #[serde(default)]
    pub total_books: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,

    #[serde(default)]
    pub followers: i64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Per-book document, keyed 1:1 by the relational book id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub book_id: i32,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,

    pub language: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,

    /// Asset id returned by the image host at upload time; deletion key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_public_id: Option<String>,

    /// Mean of present ratings, absent while the book has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,

    #[serde(default)]
    pub total_reviews: i64,

    #[serde(default)]
    pub total_ratings: i64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Default language for new book metadata
pub const DEFAULT_LANGUAGE: &str = "English";

/// A user-submitted review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub book_id: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub rating: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    pub reviewer_name: String,

    #[serde(default)]
    pub helpful: i64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Denormalized rating aggregate for one book
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    pub total_reviews: i64,
    pub total_ratings: i64,
    pub average_rating: Option<f64>,
}

/// Recompute the rating aggregate wholesale from a book's reviews.
///
/// `average_rating` is the mean of present ratings rounded to one
/// decimal, and absent (not zero) while no ratings exist.
pub fn compute_rating_stats(reviews: &[Review]) -> RatingStats {
    let total_reviews = reviews.len() as i64;
    let ratings: Vec<i64> = reviews
        .iter()
        .filter(|r| r.rating > 0)
        .map(|r| i64::from(r.rating))
        .collect();
    let total_ratings = ratings.len() as i64;

    let average_rating = if total_ratings > 0 {
        let sum: i64 = ratings.iter().sum();
        let mean = sum as f64 / total_ratings as f64;
        Some((mean * 10.0).round() / 10.0)
    } else {
        None
    };

    RatingStats {
        total_reviews,
        total_ratings,
        average_rating,
    }
}

impl BookMetadata {
    /// Whether the stored aggregate differs from a freshly computed one
    pub fn stats_differ(&self, stats: &RatingStats) -> bool {
        self.total_reviews != stats.total_reviews
            || self.total_ratings != stats.total_ratings
            || self.average_rating != stats.average_rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32) -> Review {
        let now = Utc::now();
        Review {
            id: None,
            book_id: 1,
            user_id: None,
            rating,
            comment: None,
            reviewer_name: "reader".to_string(),
            helpful: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stats_for_single_review() {
        let stats = compute_rating_stats(&[review(4)]);
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.total_ratings, 1);
        assert_eq!(stats.average_rating, Some(4.0));
    }

    #[test]
    fn test_stats_for_no_reviews_clears_average() {
        let stats = compute_rating_stats(&[]);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.total_ratings, 0);
        assert_eq!(stats.average_rating, None);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // (5 + 4 + 4) / 3 = 4.333... -> 4.3
        let stats = compute_rating_stats(&[review(5), review(4), review(4)]);
        assert_eq!(stats.average_rating, Some(4.3));

        // (5 + 4) / 2 = 4.5
        let stats = compute_rating_stats(&[review(5), review(4)]);
        assert_eq!(stats.average_rating, Some(4.5));
    }

    #[test]
    fn test_unrated_reviews_counted_separately() {
        // Legacy documents may carry a zero rating; they count as reviews
        // but not as ratings.
        let stats = compute_rating_stats(&[review(0), review(3)]);
        assert_eq!(stats.total_reviews, 2);
        assert_eq!(stats.total_ratings, 1);
        assert_eq!(stats.average_rating, Some(3.0));
    }

    #[test]
    fn test_stats_differ() {
        let now = Utc::now();
        let meta = BookMetadata {
            id: None,
            book_id: 1,
            genres: vec![],
            tags: vec![],
            isbn: None,
            page_count: None,
            language: DEFAULT_LANGUAGE.to_string(),
            cover_image_url: None,
            cover_image_public_id: None,
            average_rating: Some(4.0),
            total_reviews: 1,
            total_ratings: 1,
            created_at: now,
            updated_at: now,
        };

        let same = RatingStats {
            total_reviews: 1,
            total_ratings: 1,
            average_rating: Some(4.0),
        };
        assert!(!meta.stats_differ(&same));

        let drifted = RatingStats {
            total_reviews: 2,
            total_ratings: 2,
            average_rating: Some(4.5),
        };
        assert!(meta.stats_differ(&drifted));
    }
}
