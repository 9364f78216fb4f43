use chrono::{DateTime, Utc};
use rating_sync_models::{ItemIds, RatingItem};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use crate::error::SourceError;
use crate::http::truncate_body;

pub const TRAKT_API_VERSION: &str = "2";

const BODY_LOG_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct TraktIds {
    #[serde(default)]
    trakt: Option<u64>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    imdb: Option<String>,
    #[serde(default)]
    tmdb: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TraktMovie {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    ids: Option<TraktIds>,
}

#[derive(Debug, Deserialize)]
struct TraktRatingItem {
    #[serde(default)]
    rated_at: Option<String>,
    #[serde(default)]
    rating: Option<Value>,
    #[serde(default)]
    movie: Option<TraktMovie>,
}

/// Remove slashes from IMDB ID (Trakt sometimes includes them)
fn remove_slashes(s: &str) -> String {
    s.replace('/', "")
}

pub fn ratings_url(base: &str, username: &str) -> String {
    format!("{}/users/{}/ratings/movies", base, urlencoding::encode(username))
}

/// Map a non-200 answer onto the error taxonomy
pub fn classify_status(status: u16, body: &str, username: &str) -> Result<(), SourceError> {
    match status {
        200 => Ok(()),
        429 => Err(SourceError::RateLimited { service: "trakt" }),
        403 => Err(SourceError::AccessDenied { user: username.to_string() }),
        404 => Err(SourceError::UserNotFound { user: username.to_string() }),
        other => Err(SourceError::UnexpectedStatus {
            status: other,
            body: truncate_body(body, BODY_LOG_LIMIT),
        }),
    }
}

/// Parse the `/ratings/movies` body.
///
/// The body must be a JSON array. Individual entries are read leniently: a
/// missing or non-numeric rating becomes 0 and entries without a movie are
/// dropped.
pub fn parse_rated_movies(body: &str) -> Result<Vec<RatingItem>, SourceError> {
    let value: Value = serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(SourceError::Malformed(format!(
                "expected a JSON array, got {}",
                truncate_body(&other.to_string(), BODY_LOG_LIMIT)
            )))
        }
    };

    let mut items = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in entries {
        let parsed: TraktRatingItem = match serde_json::from_value(entry) {
            Ok(parsed) => parsed,
            Err(e) => {
                skipped += 1;
                debug!("Trakt ratings: skipping unreadable entry: {}", e);
                continue;
            }
        };
        let Some(movie) = parsed.movie else {
            skipped += 1;
            continue;
        };

        let rating = parsed
            .rating
            .as_ref()
            .and_then(Value::as_f64)
            .map(|r| r as i32)
            .unwrap_or(0);

        let ids = movie
            .ids
            .map(|ids| ItemIds {
                trakt_id: ids.trakt,
                slug: ids.slug,
                imdb_id: ids.imdb.as_deref().map(remove_slashes),
                tmdb_id: ids.tmdb,
            })
            .unwrap_or_default();

        let rated_at = parsed
            .rated_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        items.push(RatingItem {
            rating,
            title: movie.title.unwrap_or_else(|| "Unknown".to_string()),
            year: movie.year,
            ids,
            rated_at,
        });
    }

    debug!("Parsed Trakt ratings: items={}, skipped={}", items.len(), skipped);
    Ok(items)
}

/// Fetch a user's public movie ratings
pub async fn get_rated_movies(
    client: &Client,
    base: &str,
    username: &str,
    client_id: &str,
) -> Result<Vec<RatingItem>, SourceError> {
    let url = ratings_url(base, username);

    let response = client
        .get(&url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("trakt-api-version", TRAKT_API_VERSION)
        .header("trakt-api-key", client_id)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;
    if let Err(e) = classify_status(status, &body, username) {
        warn!(status, "Trakt ratings request failed: {}", e);
        return Err(e);
    }

    parse_rated_movies(&body)
}
