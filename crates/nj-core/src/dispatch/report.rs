use std::fmt;

use serde::Serialize;

use nj_model::{HostName, JobId};

use crate::mux::Exit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostTally {
    pub name: HostName,
    pub jobs_run: u64,
}

/// Where and how one job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub job: JobId,
    pub command: String,
    pub host: HostName,
    pub exit: Exit,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Per-host totals, in pool order.
    pub hosts: Vec<HostTally>,
    /// Sum of all `jobs_run`.
    pub total: u64,
    /// Jobs that exited unsuccessfully (only non-zero under the ignore policy).
    pub failed: usize,
    /// Jobs never started (only non-zero with an empty host pool).
    pub undispatched: usize,
    /// Outcomes in completion order.
    pub jobs: Vec<JobOutcome>,
}

impl RunReport {
    pub fn jobs_run(&self, host: &str) -> Option<u64> {
        self.hosts
            .iter()
            .find(|t| t.name == host)
            .map(|t| t.jobs_run)
    }

    pub fn outcome(&self, job: JobId) -> Option<&JobOutcome> {
        self.jobs.iter().find(|o| o.job == job)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tally in &self.hosts {
            writeln!(f, "{} ran {} jobs", tally.name, tally.jobs_run)?;
        }
        write!(f, "total jobs run: {}", self.total)?;
        if self.failed > 0 {
            write!(f, "\nfailed jobs: {}", self.failed)?;
        }
        if self.undispatched > 0 {
            write!(f, "\nundispatched jobs: {}", self.undispatched)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            hosts: vec![
                HostTally { name: "a".into(), jobs_run: 2 },
                HostTally { name: "b".into(), jobs_run: 1 },
            ],
            total: 3,
            failed: 0,
            undispatched: 0,
            jobs: vec![JobOutcome {
                job: JobId::new(1),
                command: "true".into(),
                host: "a".into(),
                exit: Exit::Code(0),
            }],
        }
    }

    #[test]
    fn display_matches_classic_summary() {
        assert_eq!(
            report().to_string(),
            "a ran 2 jobs\nb ran 1 jobs\ntotal jobs run: 3"
        );
    }

    #[test]
    fn display_mentions_failures_only_when_present() {
        let mut r = report();
        r.failed = 1;
        assert!(r.to_string().ends_with("failed jobs: 1"));
    }

    #[test]
    fn lookups() {
        let r = report();
        assert_eq!(r.jobs_run("b"), Some(1));
        assert_eq!(r.jobs_run("zz"), None);
        assert_eq!(r.outcome(JobId::new(1)).map(|o| o.host.as_str()), Some("a"));
    }
}
