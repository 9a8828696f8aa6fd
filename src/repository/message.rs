//! Repository for the raw message table.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::MessageRecord;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::RawMessage;
use crate::schema::raw_telegram_messages as messages;

/// Rows per INSERT batch, comfortably under SQLite's bind-variable cap.
const INSERT_CHUNK: usize = 500;

/// Repository for `raw_telegram_messages` with full-replace writes.
#[derive(Clone)]
pub struct MessageRepository {
    pool: AsyncSqlitePool,
}

/// Daily post count for one channel.
#[derive(Debug, QueryableByName)]
pub struct DailyCount {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub day: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub post_count: i64,
}

impl MessageRepository {
    /// Create a new message repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the entire table contents with the given messages.
    ///
    /// Every load is a total snapshot of the current on-disk JSON, not an
    /// incremental append. The delete and the inserts are separate
    /// statements; a failure in between leaves a partial table, which is
    /// safe because the only recovery path is an idempotent re-run.
    pub async fn replace_all(&self, msgs: &[RawMessage]) -> Result<usize, DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(messages::table).execute(&mut conn).await?;

        let records: Vec<MessageRecord> = msgs.iter().map(MessageRecord::from).collect();
        let mut inserted = 0;
        for chunk in records.chunks(INSERT_CHUNK) {
            // Batch inserts only implement the sync SQLite execute path, so
            // run them on the wrapped connection via spawn_blocking.
            let chunk = chunk.to_vec();
            inserted += conn
                .spawn_blocking(move |conn| {
                    diesel::RunQueryDsl::execute(
                        diesel::insert_into(messages::table).values(chunk),
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

        messages::table
            .select(diesel::dsl::count_star())
            .first(&mut conn)
            .await
    }

    /// Get all messages, ordered by channel then message ID.
    pub async fn get_all(&self) -> Result<Vec<RawMessage>, DieselError> {
        let mut conn = self.pool.get().await?;

        messages::table
            .order((messages::channel_name.asc(), messages::message_id.asc()))
            .load::<MessageRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(RawMessage::from).collect())
    }

    /// Most recent non-null message texts, newest first.
    pub async fn recent_texts(&self, limit: i64) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        let texts: Vec<Option<String>> = messages::table
            .filter(messages::message_text.is_not_null())
            .order(messages::message_date.desc())
            .limit(limit)
            .select(messages::message_text)
            .load(&mut conn)
            .await?;

        Ok(texts.into_iter().flatten().collect())
    }

    /// Per-day post counts for one channel, newest day first.
    pub async fn daily_activity(&self, channel_name: &str) -> Result<Vec<DailyCount>, DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query(
            "SELECT date(message_date) AS day, COUNT(*) AS post_count \
             FROM raw_telegram_messages \
             WHERE channel_name = ? AND message_date IS NOT NULL \
             GROUP BY day ORDER BY day DESC",
        )
        .bind::<diesel::sql_types::Text, _>(channel_name)
        .load::<DailyCount>(&mut conn)
        .await
    }

    /// Case-insensitive substring search over message text, newest first.
    pub async fn search(&self, keyword: &str, limit: i64) -> Result<Vec<RawMessage>, DieselError> {
        let mut conn = self.pool.get().await?;

        let pattern = format!("%{}%", keyword);
        messages::table
            .filter(messages::message_text.like(pattern))
            .order(messages::message_date.desc())
            .limit(limit)
            .load::<MessageRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(RawMessage::from).collect())
    }
}
