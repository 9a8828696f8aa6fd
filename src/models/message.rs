//! Captured channel post.

use chrono::{DateTime, Utc};

/// One captured post from a public channel.
///
/// Uniqueness is on `(message_id, channel_name)`: message IDs are only
/// unique within a channel. The loader enforces the pair after
/// deduplication, keeping the first occurrence in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    /// Message ID, unique within the channel.
    pub message_id: i64,
    /// Stable channel slug (the username without the leading `@`).
    pub channel_name: String,
    /// Channel display title.
    pub channel_title: String,
    /// Post timestamp. Null when the source value was missing or
    /// unparsable (soft-fail coercion, never aborts a load).
    pub message_date: Option<DateTime<Utc>>,
    /// Post text, if any.
    pub message_text: Option<String>,
    /// Whether the post carried media.
    pub has_media: bool,
    /// Local path of the captured image, set iff `has_media` and the
    /// scraper downloaded one.
    pub image_path: Option<String>,
    /// View count at capture time.
    pub views: i64,
    /// Forward count at capture time.
    pub forwards: i64,
}
