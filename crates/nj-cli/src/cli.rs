use std::{io::IsTerminal, path::PathBuf, sync::Arc};

use clap::{Parser, ValueEnum};

use nj_core::{DispatchConfig, EchoMode, HostHooks};
use nj_exec::{ShellTransport, SshTransport, Transport};
use nj_model::FailurePolicy;
use nj_observe::{LoggerConfig, LoggerFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Run each command on its host through `ssh`.
    Ssh,
    /// Run every command locally with `sh -c` (host exported as NJ_HOST).
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Run a list of shell commands across a pool of hosts, one job per host at a time.
#[derive(Debug, Parser)]
#[command(name = "netjobs", version)]
pub struct Cli {
    /// Transcode every .avi under DIR instead of reading the job list.
    pub dir: Option<PathBuf>,

    /// Host list, one per line.
    #[arg(long, default_value = "hosts.txt")]
    pub hosts: PathBuf,

    /// Job list, one shell command per line.
    #[arg(long, default_value = "jobs.txt")]
    pub jobs: PathBuf,

    #[arg(long, value_enum, default_value_t = TransportKind::Ssh)]
    pub transport: TransportKind,

    /// Extra argument for ssh (repeatable), e.g. --ssh-option=-oConnectTimeout=5.
    #[arg(long = "ssh-option", allow_hyphen_values = true)]
    pub ssh_options: Vec<String>,

    /// What to do when a job exits non-zero: abort | ignore.
    #[arg(long, default_value = "abort")]
    pub on_failure: FailurePolicy,

    /// Print job output as jobs finish: off | plain | tagged.
    #[arg(long, default_value = "off")]
    pub echo: EchoMode,

    #[arg(long)]
    pub no_color: bool,

    /// Command to run once on every host before any job.
    #[arg(long)]
    pub setup: Option<String>,

    /// Command to run once on every host after all jobs.
    #[arg(long)]
    pub cleanup: Option<String>,

    /// Do not print the end-of-run summary.
    #[arg(long, short)]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    /// Log level for netjobs' own targets (others stay at warn), or a full filter
    /// directive such as `warn,nj.core.dispatch=debug`.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// text | json
    #[arg(long, default_value = "text")]
    pub log_format: LoggerFormat,
}

impl Cli {
    pub fn logger_config(&self) -> LoggerConfig {
        let mut cfg = LoggerConfig::default()
            .with_level(self.log_level.clone())
            .with_format(self.log_format);
        cfg.use_color &= !self.no_color;
        cfg
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_failure(self.on_failure)
            .with_echo(self.echo)
            .with_color(!self.no_color && std::io::stdout().is_terminal())
            .with_hooks(HostHooks {
                setup: self.setup.clone(),
                cleanup: self.cleanup.clone(),
            })
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        match self.transport {
            TransportKind::Ssh => {
                let ssh = self
                    .ssh_options
                    .iter()
                    .fold(SshTransport::new(), |ssh, opt| ssh.with_option(opt.clone()));
                Arc::new(ssh)
            }
            TransportKind::Local => Arc::new(ShellTransport::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_read_list_files_over_ssh() {
        let cli = Cli::try_parse_from(["netjobs"]).unwrap();
        assert_eq!(cli.dir, None);
        assert_eq!(cli.hosts, PathBuf::from("hosts.txt"));
        assert_eq!(cli.jobs, PathBuf::from("jobs.txt"));
        assert_eq!(cli.transport, TransportKind::Ssh);
        assert_eq!(cli.on_failure, FailurePolicy::Abort);
        assert_eq!(cli.echo, EchoMode::Off);
        assert_eq!(cli.transport().name(), "ssh");
    }

    #[test]
    fn positional_dir_selects_transcoding() {
        let cli = Cli::try_parse_from(["netjobs", "/srv/videos"]).unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/srv/videos")));
    }

    #[test]
    fn options_map_into_dispatch_config() {
        let cli = Cli::try_parse_from([
            "netjobs",
            "--transport",
            "local",
            "--on-failure",
            "ignore",
            "--echo",
            "tagged",
            "--setup",
            "mkdir -p /tmp/work",
        ])
        .unwrap();

        let cfg = cli.dispatch_config();
        assert_eq!(cfg.failure, FailurePolicy::Ignore);
        assert_eq!(cfg.echo, EchoMode::Tagged);
        assert_eq!(cfg.hooks.setup.as_deref(), Some("mkdir -p /tmp/work"));
        assert!(cfg.hooks.cleanup.is_none());
        assert_eq!(cli.transport().name(), "shell");
    }

    #[test]
    fn bad_policy_is_rejected() {
        assert!(Cli::try_parse_from(["netjobs", "--on-failure", "retry"]).is_err());
    }
}
