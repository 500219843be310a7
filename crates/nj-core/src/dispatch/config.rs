use std::fmt;

use nj_model::FailurePolicy;

use crate::echo::EchoMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Setup,
    Cleanup,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Setup => f.write_str("setup"),
            HookStage::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// Commands run once on every host, before the first job and after the last one.
#[derive(Debug, Clone, Default)]
pub struct HostHooks {
    pub setup: Option<String>,
    pub cleanup: Option<String>,
}

impl HostHooks {
    pub fn get(&self, stage: HookStage) -> Option<&str> {
        let script = match stage {
            HookStage::Setup => self.setup.as_deref(),
            HookStage::Cleanup => self.cleanup.as_deref(),
        };
        script.filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Reaction to a job (or hook) that exits unsuccessfully.
    pub failure: FailurePolicy,
    /// Print remote output as jobs finish.
    pub echo: EchoMode,
    /// Colorize host tags in echoed output.
    pub color: bool,
    pub hooks: HostHooks,
}

impl DispatchConfig {
    pub fn with_failure(mut self, failure: FailurePolicy) -> Self {
        self.failure = failure;
        self
    }

    pub fn with_echo(mut self, echo: EchoMode) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_hooks(mut self, hooks: HostHooks) -> Self {
        self.hooks = hooks;
        self
    }
}
