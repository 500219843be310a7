use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::Serialize;

use crate::JobId;

/// One unit of work: an opaque shell command plus the id it was issued under.
///
/// Records are only created through [`JobSeq::create`](crate::JobSeq::create).
/// Two records are equal when their ids are equal; duplicate command text is legal
/// and yields distinct jobs.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    id: JobId,
    command: String,
}

impl JobRecord {
    pub(crate) fn new(id: JobId, command: String) -> Self {
        Self { id, command }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Command text, forwarded verbatim to the execution transport.
    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl PartialEq for JobRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JobRecord {}

impl Hash for JobRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {}: {}", self.id, self.command)
    }
}
