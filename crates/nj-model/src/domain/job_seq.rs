use std::sync::atomic::{AtomicU64, Ordering};

use crate::{JobId, JobRecord, ModelError};

/// Issues [`JobRecord`]s with monotonically increasing ids, starting at 1.
///
/// Each producer of jobs owns its own sequence; ids are unique within it and never reused.
#[derive(Debug)]
pub struct JobSeq {
    next: AtomicU64,
}

impl JobSeq {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create a record for `command` under the next id.
    ///
    /// Blank-line filtering is the caller's business; only a truly empty command is rejected.
    pub fn create(&self, command: impl Into<String>) -> Result<JobRecord, ModelError> {
        let command = command.into();
        if command.is_empty() {
            return Err(ModelError::EmptyCommand);
        }
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(JobRecord::new(JobId::new(id), command))
    }

    /// Number of records issued so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for JobSeq {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let seq = JobSeq::new();
        let a = seq.create("echo a").unwrap();
        let b = seq.create("echo b").unwrap();

        assert_eq!(a.id(), JobId::new(1));
        assert_eq!(b.id(), JobId::new(2));
        assert_eq!(seq.issued(), 2);
    }

    #[test]
    fn empty_command_is_rejected_without_consuming_an_id() {
        let seq = JobSeq::new();
        assert_eq!(seq.create("").unwrap_err(), ModelError::EmptyCommand);
        assert_eq!(seq.issued(), 0);

        let job = seq.create("true").unwrap();
        assert_eq!(job.id().get(), 1);
    }

    #[test]
    fn duplicate_commands_are_distinct_jobs() {
        let seq = JobSeq::new();
        let a = seq.create("make").unwrap();
        let b = seq.create("make").unwrap();

        assert_eq!(a.command(), b.command());
        assert_ne!(a, b);
    }

    #[test]
    fn sequences_are_independent() {
        let first = JobSeq::new();
        let second = JobSeq::new();
        first.create("x").unwrap();

        assert_eq!(second.create("y").unwrap().id().get(), 1);
    }

    #[test]
    fn record_serializes_id_and_command() {
        let job = JobSeq::new().create("uname -a").unwrap();
        let json = serde_json::to_string(&job).unwrap();
        assert_eq!(json, r#"{"id":1,"command":"uname -a"}"#);
    }
}
