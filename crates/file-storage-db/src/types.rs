use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored file row returned from SELECT queries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbFileRow {
    pub uuid: String,
    pub name: String,
    pub owner: String,
    pub data: Vec<u8>,
    pub size: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Parameters for inserting a new stored file
#[derive(Debug, Clone)]
pub struct CreateDbFileParams<'a> {
    pub uuid: &'a str,
    pub name: &'a str,
    pub owner: &'a str,
    pub data: &'a [u8],
    pub created: DateTime<Utc>,
}

/// Parameters for rewriting the content of an existing stored file
#[derive(Debug, Clone)]
pub struct UpdateDbFileParams<'a> {
    pub uuid: &'a str,
    pub data: &'a [u8],
    pub modified: DateTime<Utc>,
}
