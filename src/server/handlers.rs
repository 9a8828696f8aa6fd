//! API endpoint handlers.

use std::collections::HashMap;
use std::sync::OnceLock;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::repository::DieselError;

/// How many recent message texts feed the token report.
const TEXT_SAMPLE_LIMIT: i64 = 1000;
/// How many top tokens to return.
const TOP_TOKEN_LIMIT: usize = 10;
/// Tokens this short are noise, not product mentions.
const MIN_TOKEN_CHARS: usize = 4;
/// Hard cap on search results.
const SEARCH_LIMIT: i64 = 50;

type HandlerError = (StatusCode, String);

fn internal(e: DieselError) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("query failed: {}", e))
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub token: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct ChannelActivity {
    pub date: String,
    pub post_count: i64,
    pub channel_name: String,
}

#[derive(Debug, Serialize)]
pub struct VisualContentStats {
    pub image_category: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct VisualContentResponse {
    pub stats: Vec<VisualContentStats>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub message_id: i64,
    pub channel_name: String,
    pub date: Option<String>,
    pub message_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

/// Health check endpoint for container orchestration.
pub async fn health() -> Json<HealthCheck> {
    Json(HealthCheck { status: "ok" })
}

/// Most frequent text tokens from recent messages, approximating
/// "product" extraction.
pub async fn top_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<TopProduct>>, HandlerError> {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    let token_re = TOKEN_RE.get_or_init(|| Regex::new(r"\w+").expect("static regex"));

    let texts = state
        .messages
        .recent_texts(TEXT_SAMPLE_LIMIT)
        .await
        .map_err(internal)?;

    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in &texts {
        for token in token_re.find_iter(&text.to_lowercase()) {
            let token = token.as_str();
            if token.chars().count() >= MIN_TOKEN_CHARS {
                *counts.entry(token.to_string()).or_default() += 1;
            }
        }
    }

    let mut top: Vec<TopProduct> = counts
        .into_iter()
        .map(|(token, count)| TopProduct { token, count })
        .collect();
    // Count descending, token ascending for a deterministic report.
    top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.token.cmp(&b.token)));
    top.truncate(TOP_TOKEN_LIMIT);

    Ok(Json(top))
}

/// Daily post counts for a specific channel, newest day first.
pub async fn channel_activity(
    State(state): State<AppState>,
    Path(channel_name): Path<String>,
) -> Result<Json<Vec<ChannelActivity>>, HandlerError> {
    let days = state
        .messages
        .daily_activity(&channel_name)
        .await
        .map_err(internal)?;

    Ok(Json(
        days.into_iter()
            .map(|d| ChannelActivity {
                date: d.day,
                post_count: d.post_count,
                channel_name: channel_name.clone(),
            })
            .collect(),
    ))
}

/// Count of images per content category.
pub async fn visual_content(
    State(state): State<AppState>,
) -> Result<Json<VisualContentResponse>, HandlerError> {
    let stats = state
        .detections
        .category_counts()
        .await
        .map_err(internal)?
        .into_iter()
        .map(|(image_category, count)| VisualContentStats {
            image_category,
            count,
        })
        .collect();

    Ok(Json(VisualContentResponse { stats }))
}

/// Keyword search over message text, newest first, capped at 50 rows.
pub async fn search_messages(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, HandlerError> {
    let keyword = match params.keyword.as_deref().map(str::trim) {
        Some(keyword) if !keyword.is_empty() => keyword.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "missing query parameter `keyword`".to_string(),
            ))
        }
    };

    let messages = state
        .messages
        .search(&keyword, SEARCH_LIMIT)
        .await
        .map_err(internal)?;

    Ok(Json(
        messages
            .into_iter()
            .map(|m| SearchResult {
                message_id: m.message_id,
                channel_name: m.channel_name,
                date: m.message_date.map(|dt| dt.format("%Y-%m-%d").to_string()),
                message_text: m.message_text,
            })
            .collect(),
    ))
}
