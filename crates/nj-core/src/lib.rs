pub mod error;
pub use error::CoreError;

pub mod mux;
pub use mux::{Completion, Exit, Multiplexer, Next, ProcessHandle, ProcessId};

pub mod host;
pub use host::{HostSlot, HostState, Reclaimed};

pub mod echo;
pub use echo::{EchoMode, OutputSink, StdoutSink};

pub mod dispatch;
pub use dispatch::{
    DispatchConfig, Dispatcher, HookStage, HostHooks, HostTally, JobOutcome, Phase, RunReport,
};
