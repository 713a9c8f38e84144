//! Movie, actor and rating entities plus their transfer shapes.

use chrono::NaiveDate;
use marquee_core::catalog_import::parse_release_date;
use marquee_core::movie::normalize_text_filter;
use marquee_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A row from the `movies` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: DbId,
    pub title: String,
    pub release_date: NaiveDate,
    /// Optimistic concurrency token, bumped on every replace.
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `actors` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: DbId,
    pub name: String,
    pub movie_id: DbId,
}

/// A row from the `ratings` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: DbId,
    pub stars: i32,
    pub movie_id: DbId,
}

/// A movie with its children fully loaded, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDto {
    pub id: DbId,
    pub title: String,
    pub release_date: NaiveDate,
    pub version: i32,
    pub actors: Vec<Actor>,
    pub ratings: Vec<Rating>,
}

impl MovieDto {
    pub fn from_parts(movie: Movie, actors: Vec<Actor>, ratings: Vec<Rating>) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            release_date: movie.release_date,
            version: movie.version,
            actors,
            ratings,
        }
    }
}

/// Request body for creating or replacing a movie.
///
/// Child ids and `movieId` values sent by the client are ignored; children
/// always get fresh store-assigned ids.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    /// Must match the path id on replace when present.
    #[serde(default)]
    pub id: Option<DbId>,
    pub title: String,
    #[serde(deserialize_with = "deserialize_release_date")]
    pub release_date: NaiveDate,
    /// Expected current version on replace. Omit to skip the check.
    #[serde(default)]
    pub version: Option<i32>,
    #[serde(default)]
    pub actors: Vec<ActorInput>,
    #[serde(default)]
    pub ratings: Vec<RatingInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorInput {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingInput {
    pub stars: i32,
}

/// One row of the paginated movie listing.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: DbId,
    pub title: String,
    pub release_date: NaiveDate,
    /// Actor names joined with `", "` in actor id order.
    pub actors: String,
    /// Mean star rating, `0` when the movie has no ratings.
    pub average_rating: f64,
}

/// Response envelope for the movie listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub total_pages: i64,
    pub data: Vec<MovieSummary>,
}

/// Listing filters. Every `Some` field must match (conjunction).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of any actor's name.
    pub actor_name: Option<String>,
    /// Exact release year.
    pub release_year: Option<i32>,
    /// At least one rating with `stars >= min_rating`.
    pub min_rating: Option<i32>,
}

impl MovieFilter {
    /// Drop blank text filters so they behave as absent.
    pub fn normalized(self) -> Self {
        Self {
            title: normalize_text_filter(self.title),
            actor_name: normalize_text_filter(self.actor_name),
            ..self
        }
    }
}

/// Result of a bulk catalog import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub movies_imported: usize,
    pub actors_imported: usize,
}

/// Accept plain dates as well as the date-time strings older clients send.
fn deserialize_release_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_release_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid release date '{raw}'")))
}
