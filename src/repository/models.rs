//! Database record types mirroring the raw tables.
//!
//! Records keep the storage representation (RFC 3339 text timestamps,
//! category strings); conversions to and from the domain models live
//! here so repositories stay mostly query code.

use diesel::prelude::*;

use super::parse_datetime_opt;
use crate::models::{ImageCategory, ImageDetection, RawMessage};
use crate::schema::{raw_image_detections, raw_telegram_messages};

/// Row of `raw_telegram_messages`.
#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = raw_telegram_messages)]
pub struct MessageRecord {
    pub message_id: i64,
    pub channel_name: String,
    pub channel_title: String,
    pub message_date: Option<String>,
    pub message_text: Option<String>,
    pub has_media: bool,
    pub image_path: Option<String>,
    pub views: i64,
    pub forwards: i64,
}

impl From<&RawMessage> for MessageRecord {
    fn from(msg: &RawMessage) -> Self {
        MessageRecord {
            message_id: msg.message_id,
            channel_name: msg.channel_name.clone(),
            channel_title: msg.channel_title.clone(),
            message_date: msg.message_date.map(|dt| dt.to_rfc3339()),
            message_text: msg.message_text.clone(),
            has_media: msg.has_media,
            image_path: msg.image_path.clone(),
            views: msg.views,
            forwards: msg.forwards,
        }
    }
}

impl From<MessageRecord> for RawMessage {
    fn from(record: MessageRecord) -> Self {
        RawMessage {
            message_id: record.message_id,
            channel_name: record.channel_name,
            channel_title: record.channel_title,
            message_date: parse_datetime_opt(record.message_date),
            message_text: record.message_text,
            has_media: record.has_media,
            image_path: record.image_path,
            views: record.views,
            forwards: record.forwards,
        }
    }
}

/// Row of `raw_image_detections`.
#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = raw_image_detections)]
pub struct DetectionRecord {
    pub message_id: String,
    pub channel_name: String,
    pub detected_class: String,
    pub confidence: f64,
    pub image_category: String,
    pub all_classes: String,
    pub image_path: String,
}

impl From<&ImageDetection> for DetectionRecord {
    fn from(det: &ImageDetection) -> Self {
        DetectionRecord {
            message_id: det.message_id.clone(),
            channel_name: det.channel_name.clone(),
            detected_class: det.detected_class.clone(),
            confidence: det.confidence,
            image_category: det.image_category.as_str().to_string(),
            all_classes: det.all_classes.clone(),
            image_path: det.image_path.clone(),
        }
    }
}

impl From<DetectionRecord> for ImageDetection {
    fn from(record: DetectionRecord) -> Self {
        ImageDetection {
            message_id: record.message_id,
            channel_name: record.channel_name,
            detected_class: record.detected_class,
            confidence: record.confidence,
            image_category: ImageCategory::from_str(&record.image_category)
                .unwrap_or(ImageCategory::Other),
            all_classes: record.all_classes,
            image_path: record.image_path,
        }
    }
}
