use thiserror::Error;

use nj_exec::ExecError;
use nj_model::{HostName, JobId};

use crate::{dispatch::HookStage, mux::Exit, mux::ProcessId};

#[derive(Debug, Error)]
pub enum CoreError {
    /// Scheduling defect: a job was handed to a slot that is still running one.
    #[error("host {host} is busy; refusing job {job}")]
    HostBusy { host: HostName, job: JobId },

    /// Scheduling defect: reclaim on a slot with nothing running.
    #[error("host {host} has no running job to reclaim")]
    HostIdle { host: HostName },

    #[error("completion reported for unknown process {0}")]
    UnknownProcess(ProcessId),

    #[error("job {job} on {host} failed ({exit}): {command}")]
    RemoteExecution {
        host: HostName,
        job: JobId,
        command: String,
        exit: Exit,
    },

    #[error("{stage} hook on {host} failed ({exit})")]
    HookFailed {
        stage: HookStage,
        host: HostName,
        exit: Exit,
    },

    #[error("exec error: {0}")]
    Exec(#[from] ExecError),
}

impl CoreError {
    /// Returns `true` for errors that can only come from broken dispatcher bookkeeping.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            CoreError::HostBusy { .. } | CoreError::HostIdle { .. } | CoreError::UnknownProcess(_)
        )
    }
}
