//! Typed access-log records
//!
//! One record per log line. Lines look like:
//!
//! ```text
//! "10.0.0.1","-","apache",1549574332,"GET /api/user HTTP/1.0",200,1234
//! ```

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::MonitorError;

/// Status ranges classified as errors.
const CLIENT_ERRORS: RangeInclusive<u16> = 400..=451;
const SERVER_ERRORS: RangeInclusive<u16> = 500..=511;

/// Number of CSV columns in a well-formed log line.
const FIELD_COUNT: usize = 7;

/// A single parsed access-log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub remote_host: String,
    pub ident: String,
    pub auth_user: String,
    /// Second-resolution request time.
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub status: u16,
    pub bytes: u64,
}

impl LogRecord {
    /// Parse one CSV log line into a record.
    ///
    /// The request column is split into method, path and protocol.
    pub fn parse(line: &str) -> Result<Self, MonitorError> {
        let malformed = || MonitorError::MalformedRecord(line.to_string());

        let [remote_host, ident, auth_user, time, request, status, bytes]: [String; FIELD_COUNT] =
            split_quoted(line).try_into().map_err(|_| malformed())?;

        let seconds: i64 = time.trim().parse().map_err(|_| malformed())?;
        let timestamp = DateTime::from_timestamp(seconds, 0).ok_or_else(|| malformed())?;

        let mut request_parts = request.split_whitespace();
        let (Some(method), Some(path), Some(protocol), None) = (
            request_parts.next(),
            request_parts.next(),
            request_parts.next(),
            request_parts.next(),
        ) else {
            return Err(malformed());
        };

        Ok(Self {
            remote_host,
            ident,
            auth_user,
            timestamp,
            method: method.to_string(),
            path: path.to_string(),
            protocol: protocol.to_string(),
            status: status.trim().parse().map_err(|_| malformed())?,
            bytes: bytes.trim().parse().map_err(|_| malformed())?,
        })
    }

    /// The first non-empty path segment rendered as `/segment`, or `/` for
    /// the root path.
    pub fn section(&self) -> String {
        match self.path.split('/').find(|segment| !segment.is_empty()) {
            Some(first) => format!("/{first}"),
            None => "/".to_string(),
        }
    }

    /// True for client errors (400-451) and server errors (500-511).
    pub fn is_error(&self) -> bool {
        CLIENT_ERRORS.contains(&self.status) || SERVER_ERRORS.contains(&self.status)
    }
}

/// Split one log line on commas, honoring double-quoted fields.
fn split_quoted(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
