mod error;
pub use error::{ExecError, ExecResult};

mod util;

pub mod transport;
pub use transport::Transport;

#[cfg(feature = "shell")]
pub use transport::shell::ShellTransport;
#[cfg(feature = "ssh")]
pub use transport::ssh::SshTransport;

