//! Job storage and progress notification.
//!
//! The engine keeps no job state of its own. Callers that need to look jobs
//! up later (or watch them progress) hand the engine an observer.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crossbeam_channel::Sender;
use uuid::Uuid;

use super::job::JobSnapshot;

/// Receives a snapshot on every job transition.
pub trait JobObserver: Send + Sync {
    /// Called after the job changed state or progress.
    fn on_update(&self, job: &JobSnapshot);
}

/// Queryable job storage.
pub trait JobStore: JobObserver {
    /// Latest snapshot of a job.
    fn get(&self, id: &Uuid) -> Option<JobSnapshot>;

    /// Insert or replace a snapshot.
    fn put(&self, job: JobSnapshot);

    /// Forget a job, returning its last snapshot.
    fn remove(&self, id: &Uuid) -> Option<JobSnapshot>;

    /// Progress of a job, or `None` for an unknown id.
    fn progress(&self, id: &Uuid) -> Option<u8> {
        self.get(id).map(|job| job.progress)
    }
}

/// In-process job store.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, JobSnapshot>>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if no jobs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots of all stored jobs, oldest first.
    pub fn all(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }
}

impl JobObserver for MemoryJobStore {
    fn on_update(&self, job: &JobSnapshot) {
        self.put(job.clone());
    }
}

impl JobStore for MemoryJobStore {
    fn get(&self, id: &Uuid) -> Option<JobSnapshot> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn put(&self, job: JobSnapshot) {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.id, job);
    }

    fn remove(&self, id: &Uuid) -> Option<JobSnapshot> {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}

/// Forward snapshots over a channel, e.g. to drive a progress display.
impl JobObserver for Sender<JobSnapshot> {
    fn on_update(&self, job: &JobSnapshot) {
        if self.send(job.clone()).is_err() {
            log::debug!("job {} update dropped: receiver gone", job.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::job::JobStatus;
    use crate::format::Format;
    use chrono::Utc;

    fn snapshot(progress: u8, status: JobStatus) -> JobSnapshot {
        JobSnapshot {
            id: Uuid::new_v4(),
            source: Format::Markdown,
            target: Format::Html,
            status,
            progress,
            error: None,
            input_bytes: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryJobStore::new();
        let mut job = snapshot(0, JobStatus::Pending);
        store.on_update(&job);
        assert_eq!(store.progress(&job.id), Some(0));

        job.status = JobStatus::Completed;
        job.progress = 100;
        store.on_update(&job);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&job.id).unwrap().status, JobStatus::Completed);
        assert_eq!(store.progress(&job.id), Some(100));

        assert!(store.remove(&job.id).is_some());
        assert!(store.is_empty());
        assert_eq!(store.progress(&job.id), None);
    }

    #[test]
    fn test_channel_observer() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let job = snapshot(25, JobStatus::Processing);
        tx.on_update(&job);
        assert_eq!(rx.try_recv().unwrap().progress, 25);

        // A closed channel is not an error for the sender
        drop(rx);
        tx.on_update(&job);
    }
}
