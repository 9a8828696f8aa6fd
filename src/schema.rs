// Diesel table definitions for the raw landing tables.
//
// SQLite has no schemas, so the `raw.` prefix of the warehouse layout
// becomes a `raw_` table prefix. Column names and types are a stability
// contract for the downstream transform stage and the read API.

diesel::table! {
    raw_telegram_messages (message_id, channel_name) {
        message_id -> BigInt,
        channel_name -> Text,
        channel_title -> Text,
        message_date -> Nullable<Text>,
        message_text -> Nullable<Text>,
        has_media -> Bool,
        image_path -> Nullable<Text>,
        views -> BigInt,
        forwards -> BigInt,
    }
}

diesel::table! {
    raw_image_detections (channel_name, message_id) {
        message_id -> Text,
        channel_name -> Text,
        detected_class -> Text,
        confidence -> Double,
        image_category -> Text,
        all_classes -> Text,
        image_path -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(raw_telegram_messages, raw_image_detections);
