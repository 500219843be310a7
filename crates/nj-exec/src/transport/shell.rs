use std::path::PathBuf;

use tokio::process::Command;

use crate::{error::ExecResult, transport::Transport};

/// Environment variable carrying the host name into locally executed commands.
pub const HOST_ENV: &str = "NJ_HOST";

/// ShellTransport: runs the command locally in a shell (`sh -c` / `cmd /C`).
///
/// The host name is not used to reach anything; it is exported as [`HOST_ENV`] so
/// scripts can tell which slot they were given. Handy for dry runs and tests.
#[derive(Clone, Debug, Default)]
pub struct ShellTransport {
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl ShellTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Transport for ShellTransport {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn command(&self, host: &str, script: &str) -> ExecResult<Command> {
        let mut cmd = shell(script);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd.env(HOST_ENV, host);
        Ok(cmd)
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_family = "windows")] {
        fn shell(script: &str) -> Command {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
            cmd
        }
    } else {
        fn shell(script: &str) -> Command {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
            cmd
        }
    }
}
