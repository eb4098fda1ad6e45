use crate::errors::CoreError;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Lifecycle of a single batch task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    /// Reserved; no timeout is enforced
    Timeout,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Timeout => "timeout",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub(crate) type TaskCallback<'a, T> = Box<dyn FnOnce(T) -> Result<(), CoreError> + Send + 'a>;

/// Snapshot of a task's state
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub id: Uuid,
    pub label: String,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub error: Option<String>,
}

/// A deferred computation plus the callback that consumes its result
pub struct AsyncTask<'a, T> {
    id: Uuid,
    label: String,
    future: Option<BoxFuture<'a, Result<T, CoreError>>>,
    on_result: Option<TaskCallback<'a, T>>,
    status: TaskStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    duration: Option<Duration>,
    error: Option<String>,
}

impl<'a, T> AsyncTask<'a, T> {
    pub(crate) fn new(
        label: String,
        future: BoxFuture<'a, Result<T, CoreError>>,
        on_result: TaskCallback<'a, T>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            future: Some(future),
            on_result: Some(on_result),
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
            started: None,
            duration: None,
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub(crate) fn take_future(&mut self) -> Option<BoxFuture<'a, Result<T, CoreError>>> {
        self.future.take()
    }

    pub(crate) fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        self.started = Some(Instant::now());
    }

    /// Hand the value to the result callback; a callback error fails the task
    pub(crate) fn deliver(&mut self, value: T) -> Result<(), CoreError> {
        match self.on_result.take() {
            Some(callback) => callback(value),
            None => Ok(()),
        }
    }

    pub(crate) fn finish(&mut self, status: TaskStatus, error: Option<String>) {
        self.status = status;
        self.ended_at = Some(Utc::now());
        self.duration = self.started.map(|started| started.elapsed());
        self.error = error;
    }

    pub fn report(&self) -> TaskReport {
        TaskReport {
            id: self.id,
            label: self.label.clone(),
            status: self.status,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration: self.duration,
            error: self.error.clone(),
        }
    }
}

impl<T> std::fmt::Debug for AsyncTask<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncTask")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("status", &self.status)
            .field("duration", &self.duration)
            .finish()
    }
}
