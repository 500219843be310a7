use std::process::Stdio;

use tokio::process::Command;

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

/// Pipe both output streams so they can be collected once the process ends.
/// Stdin is closed: remote commands must not wait on the dispatcher's terminal.
pub fn capture(cmd: &mut Command) {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
}
