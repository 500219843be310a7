//! Execution transports: how a command string reaches a host.
//!
//! The dispatcher only needs three things from a transport: a spawned child right away,
//! and, once it ends, its exit status plus separately captured stdout/stderr.
//! [`Transport::spawn`] provides exactly that on top of [`Transport::command`].
use tokio::process::{Child, Command};
use tracing::trace;

use crate::{
    error::{ExecError, ExecResult},
    util::capture,
};

pub trait Transport: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Build the local command that runs `script` on `host`.
    fn command(&self, host: &str, script: &str) -> ExecResult<Command>;

    /// Spawn `script` on `host` with stdout and stderr piped.
    fn spawn(&self, host: &str, script: &str) -> ExecResult<Child> {
        validate(host, script)?;

        let mut cmd = self.command(host, script)?;
        capture(&mut cmd);

        trace!(target: "nj.exec", transport = self.name(), host, script, "spawn");
        cmd.spawn()
            .map_err(|e| ExecError::Spawn(format!("{} on {host}: {e}", self.name())))
    }
}

pub(crate) fn validate(host: &str, script: &str) -> ExecResult<()> {
    if host.trim().is_empty() {
        return Err(ExecError::EmptyHost);
    }
    if script.is_empty() {
        return Err(ExecError::EmptyCommand);
    }
    Ok(())
}

#[cfg(feature = "shell")]
pub mod shell;

#[cfg(feature = "ssh")]
pub mod ssh;
