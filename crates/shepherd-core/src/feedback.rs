//! Traffic feedback posted by students and the recent-updates board.
//!
//! Submissions land in the `traffic_feedback` collection. The board shows the
//! newest entries from the last day, and a fresh submission is placed on top
//! of the list that was on screen when it was sent.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FeedbackError, FeedbackStoreError, Result};

pub const RECENT_WINDOW_HOURS: i64 = 24;
pub const RECENT_LIMIT: usize = 10;
pub const UNKNOWN_STUDENT: &str = "Unknown";
pub const UNKNOWN_TIME: &str = "Unknown Time";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackCategory {
    Accident,
    HeavyTraffic,
    RoadConstruction,
    #[default]
    Other,
}

impl FeedbackCategory {
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackCategory::Accident => "Accident",
            FeedbackCategory::HeavyTraffic => "Heavy Traffic",
            FeedbackCategory::RoadConstruction => "Road Construction",
            FeedbackCategory::Other => "Other",
        }
    }
}

/// What a student sends from the feedback form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackSubmission {
    pub message: String,
    #[serde(default)]
    pub category: FeedbackCategory,
    #[serde(default)]
    pub student_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Stored feedback document. Field names match the collection's documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficFeedback {
    pub message: String,
    pub category: FeedbackCategory,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "stdNumber")]
    pub std_number: String,
    pub location: Option<String>,
}

impl TrafficFeedback {
    /// Rejects blank messages. A missing or blank student number becomes
    /// [`UNKNOWN_STUDENT`]; a missing location stays empty.
    pub fn from_submission(
        submission: FeedbackSubmission,
        now: DateTime<Utc>,
    ) -> std::result::Result<Self, FeedbackError> {
        if submission.message.trim().is_empty() {
            return Err(FeedbackError::BlankMessage);
        }

        let std_number = submission
            .student_number
            .filter(|number| !number.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_STUDENT.to_string());

        Ok(Self {
            message: submission.message,
            category: submission.category,
            timestamp: now.timestamp_millis(),
            std_number,
            location: submission.location,
        })
    }

    /// `HH:mm` in UTC.
    pub fn time_label(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_else(|| UNKNOWN_TIME.to_string())
    }
}

/// One row of the recent-updates list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateView {
    pub student: String,
    pub time: String,
    pub message: String,
    pub category: FeedbackCategory,
    pub category_label: String,
    pub timestamp: i64,
}

impl From<&TrafficFeedback> for UpdateView {
    fn from(feedback: &TrafficFeedback) -> Self {
        Self {
            student: feedback.std_number.clone(),
            time: feedback.time_label(),
            message: feedback.message.clone(),
            category: feedback.category,
            category_label: feedback.category.label().to_string(),
            timestamp: feedback.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentQuery {
    /// Exclusive lower bound, milliseconds since the Unix epoch.
    pub since_millis: i64,
    pub limit: usize,
}

impl RecentQuery {
    pub fn last_day(now: DateTime<Utc>) -> Self {
        Self {
            since_millis: (now - Duration::hours(RECENT_WINDOW_HOURS)).timestamp_millis(),
            limit: RECENT_LIMIT,
        }
    }
}

/// Entries newer than `query.since_millis`, newest first, at most `query.limit`.
pub fn select_recent(entries: &[TrafficFeedback], query: &RecentQuery) -> Vec<TrafficFeedback> {
    let mut recent: Vec<TrafficFeedback> = entries
        .iter()
        .filter(|entry| entry.timestamp > query.since_millis)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(query.limit);
    recent
}

/// Puts `submitted` on top of the list that was already shown.
pub fn prepend_update(submitted: TrafficFeedback, shown: Vec<TrafficFeedback>) -> Vec<TrafficFeedback> {
    let mut updates = Vec::with_capacity(shown.len() + 1);
    updates.push(submitted);
    updates.extend(shown);
    updates
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn add(&self, feedback: TrafficFeedback) -> std::result::Result<(), FeedbackStoreError>;
    async fn recent(
        &self,
        query: RecentQuery,
    ) -> std::result::Result<Vec<TrafficFeedback>, FeedbackStoreError>;
}

/// In-memory collection. An unavailable store fails every call.
#[derive(Debug, Default)]
pub struct MemoryFeedbackStore {
    entries: Mutex<Vec<TrafficFeedback>>,
    unavailable: Option<String>,
}

impl MemoryFeedbackStore {
    pub fn new(entries: Vec<TrafficFeedback>) -> Self {
        Self {
            entries: Mutex::new(entries),
            unavailable: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            unavailable: Some(message.into()),
        }
    }

    fn check(&self) -> std::result::Result<(), FeedbackStoreError> {
        match &self.unavailable {
            Some(message) => Err(FeedbackStoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn add(&self, feedback: TrafficFeedback) -> std::result::Result<(), FeedbackStoreError> {
        self.check()?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(feedback);
        Ok(())
    }

    async fn recent(
        &self,
        query: RecentQuery,
    ) -> std::result::Result<Vec<TrafficFeedback>, FeedbackStoreError> {
        self.check()?;
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(select_recent(&entries, &query))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub submitted: UpdateView,
    pub recent_updates: Vec<UpdateView>,
}

/// Validates and stores a submission, then returns it on top of the recent
/// updates read just before it was stored. A failed read leaves only the new
/// entry on the board.
pub async fn submit_feedback(
    store: &dyn FeedbackStore,
    submission: FeedbackSubmission,
    now: DateTime<Utc>,
) -> Result<FeedbackReceipt> {
    let feedback = TrafficFeedback::from_submission(submission, now)?;

    let shown = store
        .recent(RecentQuery::last_day(now))
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "failed to load recent traffic updates");
            Vec::new()
        });

    store.add(feedback.clone()).await?;
    info!(
        category = feedback.category.label(),
        student = %feedback.std_number,
        "traffic feedback submitted"
    );

    let submitted = UpdateView::from(&feedback);
    let updates = prepend_update(feedback, shown);
    Ok(FeedbackReceipt {
        submitted,
        recent_updates: updates.iter().map(UpdateView::from).collect(),
    })
}

/// Updates from the last day, newest first.
pub async fn recent_updates(store: &dyn FeedbackStore, now: DateTime<Utc>) -> Result<Vec<UpdateView>> {
    let recent = store.recent(RecentQuery::last_day(now)).await?;
    Ok(recent.iter().map(UpdateView::from).collect())
}
