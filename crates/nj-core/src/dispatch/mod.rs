//! The dispatcher: job queue, host pool and the completion-driven scheduling loop.
//!
//! One coordinating task owns all mutable state. It only suspends while waiting on the
//! [`Multiplexer`], so slots, the ticket map and the queue cursor are never touched
//! concurrently and need no locking.
mod config;
pub use config::{DispatchConfig, HookStage, HostHooks};

mod report;
pub use report::{HostTally, JobOutcome, RunReport};

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, error, info, instrument, warn};

use nj_exec::Transport;
use nj_model::{HostName, JobRecord};

use crate::{
    echo::{OutputSink, StdoutSink},
    error::CoreError,
    host::{HostSlot, Reclaimed, decode},
    mux::{Completion, Exit, Multiplexer, Next, ProcessId},
};

/// Where a run currently is. `Seeding -> Draining -> Reporting -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Draining,
    Reporting,
    Done,
}

pub struct Dispatcher {
    hosts: Vec<HostSlot>,
    jobs: Vec<JobRecord>,
    /// Index of the next job to hand out.
    next: usize,
    /// Outstanding ticket -> index into `hosts`. The job lives in the slot's own state.
    running: HashMap<ProcessId, usize>,
    mux: Multiplexer,
    transport: Arc<dyn Transport>,
    sink: Box<dyn OutputSink>,
    cfg: DispatchConfig,
    phase: Phase,
    outcomes: Vec<JobOutcome>,
    failed: usize,
}

impl Dispatcher {
    pub fn new<I, H>(
        hosts: I,
        jobs: Vec<JobRecord>,
        transport: Arc<dyn Transport>,
        cfg: DispatchConfig,
    ) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<HostName>,
    {
        let sink = Box::new(StdoutSink::new(cfg.echo, cfg.color));
        Self {
            hosts: hosts.into_iter().map(HostSlot::new).collect(),
            jobs,
            next: 0,
            running: HashMap::new(),
            mux: Multiplexer::new(),
            transport,
            sink,
            cfg,
            phase: Phase::Seeding,
            outcomes: Vec::new(),
            failed: 0,
        }
    }

    /// Replace the stdout sink used for echoed output.
    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    #[inline]
    pub fn hosts(&self) -> &[HostSlot] {
        &self.hosts
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Jobs not yet handed to any host.
    #[inline]
    pub fn pending(&self) -> usize {
        self.jobs.len() - self.next
    }

    /// Jobs currently running.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// Host index an outstanding ticket belongs to.
    pub fn host_of(&self, id: ProcessId) -> Option<usize> {
        self.running.get(&id).copied()
    }

    /// Every busy slot is referenced by exactly one outstanding ticket and vice versa.
    pub fn is_consistent(&self) -> bool {
        let busy = self.hosts.iter().filter(|h| h.is_busy()).count();
        busy == self.running.len()
            && busy == self.mux.outstanding()
            && self
                .running
                .iter()
                .all(|(id, &idx)| self.hosts.get(idx).and_then(HostSlot::process_id) == Some(*id))
    }

    /// Run everything: setup hooks, seed, drain until no process is outstanding,
    /// cleanup hooks, then report per-host totals.
    ///
    /// Under [`FailurePolicy::Abort`](nj_model::FailurePolicy::Abort) the first failed job ends the
    /// run with [`CoreError::RemoteExecution`]; nothing else is assigned and no report is built.
    /// Processes already running are left to finish on their own.
    #[instrument(level = "debug", skip(self), fields(hosts = self.hosts.len(), jobs = self.jobs.len()))]
    pub async fn run(&mut self) -> Result<RunReport, CoreError> {
        if self.hosts.is_empty() && !self.jobs.is_empty() {
            warn!(
                target: "nj.core.dispatch",
                jobs = self.jobs.len(),
                "no hosts configured; nothing will be dispatched"
            );
        }

        self.run_hooks(HookStage::Setup).await?;
        self.seed()?;

        self.phase = Phase::Draining;
        while let Next::Completed(completion) = self.mux.next().await {
            self.drain_one(completion).await?;
            debug_assert!(self.is_consistent());
        }

        self.phase = Phase::Reporting;
        self.run_hooks(HookStage::Cleanup).await?;

        let report = self.report();
        for tally in &report.hosts {
            info!(target: "nj.core.dispatch", host = %tally.name, jobs_run = tally.jobs_run, "host finished");
        }
        info!(
            target: "nj.core.dispatch",
            total = report.total,
            failed = report.failed,
            undispatched = report.undispatched,
            "run complete"
        );

        self.phase = Phase::Done;
        Ok(report)
    }

    /// Give every host, in pool order, one job while jobs last.
    pub fn seed(&mut self) -> Result<(), CoreError> {
        self.phase = Phase::Seeding;
        for idx in 0..self.hosts.len() {
            let Some(job) = self.pop_job() else {
                break;
            };
            self.start(idx, job)?;
        }
        debug!(
            target: "nj.core.dispatch",
            in_flight = self.in_flight(),
            pending = self.pending(),
            "hosts seeded"
        );
        Ok(())
    }

    /// Wait for the next process to terminate; [`Next::Empty`] once none is outstanding.
    pub async fn next_completion(&mut self) -> Next {
        self.mux.next().await
    }

    /// Handle one completion: reclaim the host, echo its output, apply the failure policy,
    /// then start the next queued job on the first idle host in pool order.
    pub async fn drain_one(&mut self, completion: Completion) -> Result<(), CoreError> {
        let Completion { id, exit } = completion;
        let idx = self
            .running
            .remove(&id)
            .ok_or(CoreError::UnknownProcess(id))?;

        let slot = &mut self.hosts[idx];
        let Reclaimed { job, output } = slot.reclaim().await?;
        let host = slot.name().to_string();

        self.emit(&host, Some(&job), &output);
        self.outcomes.push(JobOutcome {
            job: job.id(),
            command: job.command().to_string(),
            host: host.clone(),
            exit: exit.clone(),
        });

        if exit.success() {
            debug!(target: "nj.core.dispatch", job = %job.id(), %host, "job finished");
        } else {
            self.failed += 1;
            if self.cfg.failure.is_fatal() {
                error!(
                    target: "nj.core.dispatch",
                    job = %job.id(),
                    %host,
                    %exit,
                    command = job.command(),
                    pending = self.pending(),
                    "job failed; aborting run"
                );
                return Err(CoreError::RemoteExecution {
                    host,
                    job: job.id(),
                    command: job.command().to_string(),
                    exit,
                });
            }
            warn!(
                target: "nj.core.dispatch",
                job = %job.id(),
                %host,
                %exit,
                command = job.command(),
                "job failed; continuing"
            );
        }

        if self.pending() > 0 {
            // The slot just reclaimed is idle, so the scan always finds one.
            let free = self.first_idle().unwrap_or(idx);
            if let Some(job) = self.pop_job() {
                self.start(free, job)?;
            }
        }
        Ok(())
    }

    fn pop_job(&mut self) -> Option<JobRecord> {
        let job = self.jobs.get(self.next)?.clone();
        self.next += 1;
        Some(job)
    }

    /// Always scans from the start of the pool: simple and deterministic, not load-aware.
    fn first_idle(&self) -> Option<usize> {
        self.hosts.iter().position(|h| !h.is_busy())
    }

    fn start(&mut self, idx: usize, job: JobRecord) -> Result<(), CoreError> {
        let job_id = job.id();
        let slot = &mut self.hosts[idx];
        let ticket = slot.assign(job, self.transport.as_ref(), &mut self.mux)?;
        self.running.insert(ticket, idx);

        info!(
            target: "nj.core.dispatch",
            job = %job_id,
            of = self.jobs.len(),
            host = %self.hosts[idx].name(),
            "started job"
        );
        Ok(())
    }

    fn emit(&mut self, host: &str, job: Option<&JobRecord>, text: &str) {
        if self.cfg.echo.is_on() && !text.trim().is_empty() {
            self.sink.emit(host, job, text);
        }
    }

    /// Run a hook on each host in turn. Hooks go through the same transport but
    /// do not count as jobs.
    async fn run_hooks(&mut self, stage: HookStage) -> Result<(), CoreError> {
        let Some(script) = self.cfg.hooks.get(stage).map(str::to_owned) else {
            return Ok(());
        };

        for idx in 0..self.hosts.len() {
            let host = self.hosts[idx].name().to_string();
            debug!(target: "nj.core.dispatch", %stage, %host, "running hook");

            let child = self.transport.spawn(&host, &script)?;
            let result = child.wait_with_output().await;
            let exit = Exit::from(&result);
            if let Ok(out) = &result {
                self.emit(&host, None, &decode(out));
            }

            if !exit.success() {
                if self.cfg.failure.is_fatal() {
                    error!(target: "nj.core.dispatch", %stage, %host, %exit, "hook failed; aborting run");
                    return Err(CoreError::HookFailed { stage, host, exit });
                }
                warn!(target: "nj.core.dispatch", %stage, %host, %exit, "hook failed; continuing");
            }
        }
        Ok(())
    }

    fn report(&self) -> RunReport {
        let hosts: Vec<HostTally> = self
            .hosts
            .iter()
            .map(|h| HostTally {
                name: h.name().to_string(),
                jobs_run: h.jobs_run(),
            })
            .collect();
        let total = hosts.iter().map(|t| t.jobs_run).sum();

        RunReport {
            hosts,
            total,
            failed: self.failed,
            undispatched: self.pending(),
            jobs: self.outcomes.clone(),
        }
    }
}
