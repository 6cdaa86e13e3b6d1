//! Last-refresh timestamp.

use super::file::{read_optional, write_atomic};
use super::StoreError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persists when the vault was last refreshed, as an RFC 3339 string.
#[derive(Debug, Clone)]
pub struct RefreshStampStore {
    path: PathBuf,
}

impl RefreshStampStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded refresh; an unparsable stamp reads as never refreshed.
    pub async fn last(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(content.trim()) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unparsable refresh stamp");
                Ok(None)
            }
        }
    }

    pub async fn record(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        write_atomic(&self.path, at.to_rfc3339().as_bytes()).await
    }
}

/// Relative age of the last refresh: `"N/A"`, `"now"` or `"<minutes>m ago"`.
pub fn describe_age(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match last {
        None => "N/A".to_string(),
        Some(at) => {
            let minutes = (now - at).num_minutes();
            if minutes < 1 {
                "now".to_string()
            } else {
                format!("{}m ago", minutes)
            }
        }
    }
}
