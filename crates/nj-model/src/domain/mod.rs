mod job_id;
pub use job_id::JobId;

mod job_record;
pub use job_record::JobRecord;

mod job_seq;
pub use job_seq::JobSeq;

/// Identity of a remote endpoint (whatever the execution transport accepts, e.g. an ssh alias).
pub type HostName = String;
