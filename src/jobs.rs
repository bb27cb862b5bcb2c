//! In-memory tracking for asynchronous query jobs.
//!
//! `POST /query/async` returns a job id immediately; the query runs in a
//! background task and its result is looked up via `GET /jobs/{id}`. The
//! table is process-local by design — a durable multi-tenant queue is an
//! explicit non-goal.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Completed payload of a query, shared by the sync and async endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// Wall-clock processing time in seconds.
    pub processing_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Default)]
pub struct JobTable {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in the `processing` state and return its id.
    pub fn create(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        self.jobs.write().unwrap().insert(
            job_id.clone(),
            JobStatus {
                job_id: job_id.clone(),
                status: JobState::Processing,
                result: None,
                error: None,
            },
        );
        job_id
    }

    pub fn complete(&self, job_id: &str, result: QueryResponse) {
        if let Some(job) = self.jobs.write().unwrap().get_mut(job_id) {
            job.status = JobState::Completed;
            job.result = Some(result);
            job.error = None;
        }
    }

    pub fn fail(&self, job_id: &str, error: String) {
        if let Some(job) = self.jobs.write().unwrap().get_mut(job_id) {
            job.status = JobState::Failed;
            job.error = Some(error);
        }
    }

    pub fn get(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().unwrap().get(job_id).cloned()
    }
}
