use tokio::process::Command;

use crate::{error::ExecResult, transport::Transport, util::cmd_program};

/// Runs commands on remote hosts through the system `ssh` client.
///
/// The command line is `ssh [options..] <host> <script>`; the remote login shell
/// interprets `script`. By default `BatchMode=yes` is passed so a host that would
/// prompt for a password fails fast instead of hanging the run.
#[derive(Clone, Debug)]
pub struct SshTransport {
    pub program: String,
    pub options: Vec<String>,
}

impl SshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Append a raw ssh argument (e.g. `-p`, `2222` or `-oConnectTimeout=5`).
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.options.push(option.into());
        self
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            options: vec!["-o".to_string(), "BatchMode=yes".to_string()],
        }
    }
}

impl Transport for SshTransport {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn command(&self, host: &str, script: &str) -> ExecResult<Command> {
        let mut cmd = cmd_program(&self.program, &self.options);
        cmd.arg(host).arg(script);
        Ok(cmd)
    }
}
