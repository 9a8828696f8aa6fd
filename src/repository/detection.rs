//! Repository for the raw image detection table.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::DetectionRecord;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::ImageDetection;
use crate::schema::raw_image_detections as detections;

const INSERT_CHUNK: usize = 500;

/// Repository for `raw_image_detections` with full-replace writes.
#[derive(Clone)]
pub struct DetectionRepository {
    pool: AsyncSqlitePool,
}

impl DetectionRepository {
    /// Create a new detection repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the entire table contents with the given detections.
    ///
    /// Detections for images removed since the last run are implicitly
    /// dropped; unchanged images were recomputed upstream (no caching by
    /// content hash).
    pub async fn replace_all(&self, dets: &[ImageDetection]) -> Result<usize, DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(detections::table).execute(&mut conn).await?;

        let records: Vec<DetectionRecord> = dets.iter().map(DetectionRecord::from).collect();
        let mut inserted = 0;
        for chunk in records.chunks(INSERT_CHUNK) {
            // Batch inserts only implement the sync SQLite execute path, so
            // run them on the wrapped connection via spawn_blocking.
            let chunk = chunk.to_vec();
            inserted += conn
                .spawn_blocking(move |conn| {
                    diesel::RunQueryDsl::execute(
                        diesel::insert_into(detections::table).values(chunk),
                        conn,
                    )
                })
                .await?;
        }

        Ok(inserted)
    }

    /// Total row count.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        detections::table
            .select(diesel::dsl::count_star())
            .first(&mut conn)
            .await
    }

    /// Get all detections, ordered by channel then message ID.
    pub async fn get_all(&self) -> Result<Vec<ImageDetection>, DieselError> {
        let mut conn = self.pool.get().await?;

        detections::table
            .order((
                detections::channel_name.asc(),
                detections::message_id.asc(),
            ))
            .load::<DetectionRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ImageDetection::from).collect())
    }

    /// Row counts per image category.
    pub async fn category_counts(&self) -> Result<Vec<(String, i64)>, DieselError> {
        let mut conn = self.pool.get().await?;

        detections::table
            .group_by(detections::image_category)
            .select((detections::image_category, diesel::dsl::count_star()))
            .order(detections::image_category.asc())
            .load::<(String, i64)>(&mut conn)
            .await
    }
}
