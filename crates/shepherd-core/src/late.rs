//! Late-arrival notifications sent to a lecturer.
//!
//! The form only produces a notification once both a lecturer and a reason
//! have been picked. Delivery is behind [`NotificationSink`].

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LateNotificationError, NotificationError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LateNotificationForm {
    /// Lecturer's address.
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub student_number: String,
    #[serde(default)]
    pub lecturer_name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub extra_info: String,
}

/// Payload posted to the notification function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateNotification {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_number: String,
    pub lecturer_name: String,
    pub reason: String,
    pub extra_info: String,
}

fn selected(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl LateNotificationForm {
    pub fn into_notification(self) -> std::result::Result<LateNotification, LateNotificationError> {
        let lecturer_name = selected(self.lecturer_name).ok_or(LateNotificationError::NoLecturer)?;
        let reason = selected(self.reason).ok_or(LateNotificationError::NoReason)?;

        Ok(LateNotification {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            student_number: self.student_number,
            lecturer_name,
            reason,
            extra_info: self.extra_info,
        })
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &LateNotification) -> std::result::Result<(), NotificationError>;
}

/// Keeps every notification in memory in the order it was sent. A rejecting
/// outbox refuses every send.
#[derive(Debug, Default)]
pub struct OutboxNotificationSink {
    sent: Mutex<Vec<LateNotification>>,
    rejecting: Option<String>,
}

impl OutboxNotificationSink {
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            rejecting: Some(message.into()),
        }
    }

    pub fn sent(&self) -> Vec<LateNotification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NotificationSink for OutboxNotificationSink {
    async fn send(&self, notification: &LateNotification) -> std::result::Result<(), NotificationError> {
        if let Some(message) = &self.rejecting {
            return Err(NotificationError::Rejected(message.clone()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}

/// Builds the notification from the form and hands it to `sink`.
pub async fn send_late_notification(
    sink: &dyn NotificationSink,
    form: LateNotificationForm,
) -> Result<LateNotification> {
    let notification = form.into_notification()?;
    sink.send(&notification).await?;
    info!(
        student = %notification.student_number,
        lecturer = %notification.lecturer_name,
        "late notification sent"
    );
    Ok(notification)
}
