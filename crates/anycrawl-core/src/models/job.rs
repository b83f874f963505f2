//! Job domain model and its status machine.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::jobs;

/// The operation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Scrape,
    Crawl,
    Search,
    Map,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Crawl => "crawl",
            Self::Search => "search",
            Self::Map => "map",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scrape" => Some(Self::Scrape),
            "crawl" => Some(Self::Crawl),
            "search" => Some(Self::Search),
            "map" => Some(Self::Map),
            _ => None,
        }
    }
}

/// Job lifecycle status.
///
/// Legal transitions: `Pending -> Running -> {Completed, Failed}`,
/// `Pending -> Cancelled`, `Running -> Cancelled`. All of `Completed`,
/// `Failed`, `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether transitioning from `self` to `next` is a legal edge in the
    /// job status machine.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Pending, Running) | (Pending, Cancelled) => true,
            (Running, Completed) | (Running, Failed) | (Running, Cancelled) => true,
            _ => false,
        }
    }
}

/// A job row as stored in the database.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = jobs)]
pub struct Job {
    pub id: String,
    pub kind: String,
    pub queue_name: String,
    pub api_key_id: String,
    pub input_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub status: String,
    pub total_count: i32,
    pub completed_count: i32,
    pub failed_count: i32,
    pub credits_used: i64,
    pub deducted_at: Option<String>,
    pub cache_hits: i32,
    pub result_blob: Option<String>,
    pub failure_message: Option<String>,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_str(&self.status).unwrap_or(JobStatus::Failed)
    }

    pub fn kind(&self) -> JobKind {
        JobKind::from_str(&self.kind).unwrap_or(JobKind::Scrape)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub id: String,
    pub kind: String,
    pub queue_name: String,
    pub api_key_id: String,
    pub input_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub status: String,
    pub total_count: i32,
    pub completed_count: i32,
    pub failed_count: i32,
    pub credits_used: i64,
    pub deducted_at: Option<String>,
    pub cache_hits: i32,
    pub result_blob: Option<String>,
    pub failure_message: Option<String>,
}

impl NewJob {
    pub fn create(kind: JobKind, queue_name: &str, api_key_id: &str, input_url: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.as_str().to_string(),
            queue_name: queue_name.to_string(),
            api_key_id: api_key_id.to_string(),
            input_url: input_url.to_string(),
            created_at: now.clone(),
            updated_at: now,
            status: JobStatus::Pending.as_str().to_string(),
            total_count: 1,
            completed_count: 0,
            failed_count: 0,
            credits_used: 0,
            deducted_at: None,
            cache_hits: 0,
            result_blob: None,
            failure_message: None,
        }
    }
}
