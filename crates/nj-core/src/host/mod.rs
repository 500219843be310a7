use std::process::Output;

use tracing::{debug, warn};

use nj_exec::Transport;
use nj_model::{HostName, JobRecord};

use crate::{
    error::CoreError,
    mux::{Multiplexer, ProcessHandle, ProcessId},
};

/// What a slot is doing right now.
#[derive(Debug)]
pub enum HostState {
    Idle,
    Running { job: JobRecord, process: ProcessHandle },
}

/// Output of a job taken back from its slot.
#[derive(Debug)]
pub struct Reclaimed {
    pub job: JobRecord,
    /// Decoded stdout followed by decoded stderr.
    pub output: String,
}

/// One remote endpoint that runs at most one job at a time.
///
/// `Idle --assign--> Running --reclaim--> Idle`; `jobs_run` counts completed reclaims.
#[derive(Debug)]
pub struct HostSlot {
    name: HostName,
    state: HostState,
    jobs_run: u64,
}

impl HostSlot {
    pub fn new(name: impl Into<HostName>) -> Self {
        Self {
            name: name.into(),
            state: HostState::Idle,
            jobs_run: 0,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn jobs_run(&self) -> u64 {
        self.jobs_run
    }

    #[inline]
    pub fn state(&self) -> &HostState {
        &self.state
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(self.state, HostState::Running { .. })
    }

    pub fn current_job(&self) -> Option<&JobRecord> {
        match &self.state {
            HostState::Running { job, .. } => Some(job),
            HostState::Idle => None,
        }
    }

    pub fn process_id(&self) -> Option<ProcessId> {
        match &self.state {
            HostState::Running { process, .. } => Some(process.id()),
            HostState::Idle => None,
        }
    }

    /// Start `job` on this host and hand the process to `mux`.
    ///
    /// A failed spawn leaves the slot idle.
    pub fn assign(
        &mut self,
        job: JobRecord,
        transport: &dyn Transport,
        mux: &mut Multiplexer,
    ) -> Result<ProcessId, CoreError> {
        if self.is_busy() {
            return Err(CoreError::HostBusy {
                host: self.name.clone(),
                job: job.id(),
            });
        }

        let child = transport.spawn(&self.name, job.command())?;
        let process = mux.watch(child);
        let id = process.id();

        debug!(
            target: "nj.core.host",
            host = %self.name,
            job = %job.id(),
            process = %id,
            pid = ?process.pid(),
            "job assigned"
        );
        self.state = HostState::Running { job, process };
        Ok(id)
    }

    /// Take the finished job back, returning its decoded output.
    ///
    /// Meant to be called once the multiplexer reported the process as terminated.
    pub async fn reclaim(&mut self) -> Result<Reclaimed, CoreError> {
        let HostState::Running { job, process } = std::mem::replace(&mut self.state, HostState::Idle)
        else {
            return Err(CoreError::HostIdle {
                host: self.name.clone(),
            });
        };

        let id = process.id();
        let output = match process.collect().await {
            Ok(out) => decode(&out),
            Err(e) => {
                warn!(target: "nj.core.host", host = %self.name, job = %job.id(), error = %e, "output lost");
                String::new()
            }
        };

        self.jobs_run += 1;
        debug!(
            target: "nj.core.host",
            host = %self.name,
            job = %job.id(),
            process = %id,
            jobs_run = self.jobs_run,
            "job reclaimed"
        );
        Ok(Reclaimed { job, output })
    }
}

/// Stdout then stderr, each decoded as lossy UTF-8.
pub(crate) fn decode(out: &Output) -> String {
    let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&out.stderr));
    text
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::mux::Next;
    use nj_exec::ShellTransport;
    use nj_model::JobSeq;

    #[tokio::test]
    async fn assign_then_reclaim_round_trip() {
        let seq = JobSeq::new();
        let transport = ShellTransport::new();
        let mut mux = Multiplexer::new();
        let mut host = HostSlot::new("alpha");

        let job = seq.create("echo \"on $NJ_HOST\"; echo warn >&2").unwrap();
        let pid = host.assign(job.clone(), &transport, &mut mux).unwrap();
        assert!(matches!(host.state(), HostState::Running { job: j, .. } if *j == job));
        assert_eq!(host.process_id(), Some(pid));
        assert_eq!(host.current_job(), Some(&job));

        let Next::Completed(done) = mux.next().await else {
            panic!("expected a completion");
        };
        assert_eq!(done.id, pid);

        let back = host.reclaim().await.unwrap();
        assert_eq!(back.job, job);
        assert_eq!(back.output, "on alpha\nwarn\n");
        assert!(matches!(host.state(), HostState::Idle));
        assert_eq!(host.jobs_run(), 1);
    }

    #[tokio::test]
    async fn assign_on_busy_slot_is_rejected() {
        let seq = JobSeq::new();
        let transport = ShellTransport::new();
        let mut mux = Multiplexer::new();
        let mut host = HostSlot::new("alpha");

        host.assign(seq.create("sleep 0.1").unwrap(), &transport, &mut mux)
            .unwrap();
        let err = host
            .assign(seq.create("true").unwrap(), &transport, &mut mux)
            .unwrap_err();

        assert!(matches!(err, CoreError::HostBusy { ref host, .. } if host == "alpha"));
        assert!(err.is_defect());
        assert_eq!(mux.outstanding(), 1);
    }

    #[tokio::test]
    async fn reclaim_on_idle_slot_is_rejected() {
        let mut host = HostSlot::new("alpha");
        let err = host.reclaim().await.unwrap_err();
        assert!(matches!(err, CoreError::HostIdle { .. }));
        assert_eq!(host.jobs_run(), 0);
    }

    #[tokio::test]
    async fn failed_spawn_leaves_slot_idle() {
        let seq = JobSeq::new();
        let transport = nj_exec::SshTransport::new().with_program("/nonexistent/ssh-binary");
        let mut mux = Multiplexer::new();
        let mut host = HostSlot::new("alpha");

        let err = host
            .assign(seq.create("true").unwrap(), &transport, &mut mux)
            .unwrap_err();
        assert!(matches!(err, CoreError::Exec(_)));
        assert!(!host.is_busy());
        assert_eq!(mux.outstanding(), 0);
    }
}
