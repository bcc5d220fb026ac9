//! Periodic aggregate reconciliation
//!
//! The denormalized counters are maintained by best-effort incremental
//! updates at mutation time and can drift (lost updates, swallowed
//! failures, uncoordinated deletes). This task recounts them from their
//! source collections on an interval: `totalBooks` from the books table
//! and the rating aggregate from the reviews collection. Each pass is
//! idempotent.

use libris_common::db::Repository;
use libris_common::docstore::DocRepository;
use libris_common::errors::Result;
use libris_common::metrics;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Spawn the reconciliation loop
pub fn spawn(repo: Repository, docs: DocRepository, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting aggregate reconciliation task");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match run_once(&repo, &docs).await {
                Ok(repairs) => {
                    metrics::record_reconcile_run(repairs);
                    if repairs > 0 {
                        info!(repairs, "Reconciliation repaired drifted aggregates");
                    } else {
                        debug!("Reconciliation found no drift");
                    }
                }
                Err(e) => error!(error = %e, "Reconciliation pass failed"),
            }
        }
    })
}

/// One full pass over both aggregate kinds; returns the number of
/// repaired fields
pub async fn run_once(repo: &Repository, docs: &DocRepository) -> Result<u64> {
    let mut repairs = 0;

    // totalBooks: recount from the books table
    let counts: HashMap<i32, i64> = repo.book_counts_by_author().await?.into_iter().collect();

    for metadata in docs.all_author_metadata().await? {
        let expected = counts.get(&metadata.author_id).copied().unwrap_or(0);
        if metadata.total_books != expected {
            warn!(
                author_id = metadata.author_id,
                stored = metadata.total_books,
                expected,
                "Repairing drifted totalBooks counter"
            );
            docs.set_author_total_books(metadata.author_id, expected)
                .await?;
            repairs += 1;
        }
    }

    // Rating aggregates: recompute from the reviews collection
    for metadata in docs.all_book_metadata().await? {
        let stats = docs.rating_stats(metadata.book_id).await?;
        if metadata.stats_differ(&stats) {
            warn!(
                book_id = metadata.book_id,
                stored_reviews = metadata.total_reviews,
                expected_reviews = stats.total_reviews,
                "Repairing drifted rating aggregate"
            );
            docs.apply_rating_stats(metadata.book_id, &stats).await?;
            repairs += 1;
        }
    }

    Ok(repairs)
}
