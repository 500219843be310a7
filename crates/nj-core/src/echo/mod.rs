use std::{
    io::{self, Write},
    str::FromStr,
};

use colored::Colorize;

use nj_model::JobRecord;

/// Whether finished jobs' output is printed while the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    #[default]
    Off,
    /// Print the output as is.
    Plain,
    /// Prefix every line with the host it came from (`host :: line`).
    Tagged,
}

impl EchoMode {
    #[inline]
    pub fn is_on(&self) -> bool {
        !matches!(self, EchoMode::Off)
    }
}

impl FromStr for EchoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(EchoMode::Off),
            "plain" => Ok(EchoMode::Plain),
            "tagged" => Ok(EchoMode::Tagged),
            _ => Err(format!("invalid echo mode: {s} (expected: off|plain|tagged)")),
        }
    }
}

/// Receives remote output as jobs (and host hooks, with `job == None`) finish.
pub trait OutputSink: Send {
    fn emit(&mut self, host: &str, job: Option<&JobRecord>, text: &str);
}

/// Writes remote output to the process stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    tagged: bool,
    color: bool,
}

impl StdoutSink {
    pub fn new(mode: EchoMode, color: bool) -> Self {
        Self {
            tagged: matches!(mode, EchoMode::Tagged),
            color,
        }
    }
}

impl OutputSink for StdoutSink {
    fn emit(&mut self, host: &str, _job: Option<&JobRecord>, text: &str) {
        let rendered = if self.tagged {
            tag_lines(host, text, self.color)
        } else {
            text.trim_end().to_string()
        };
        if rendered.is_empty() {
            return;
        }
        let mut out = io::stdout().lock();
        // A closed stdout must not take the run down with it.
        let _ = writeln!(out, "{rendered}");
    }
}

/// Prefix each non-empty line of `text` with `host :: `; the host is bright cyan when `color` is set.
pub fn tag_lines(host: &str, text: &str, color: bool) -> String {
    let tag = if color {
        host.bright_cyan().to_string()
    } else {
        host.to_string()
    };
    text.lines()
        .filter(|line| !line.is_empty())
        .map(|line| format!("{tag} :: {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_every_non_empty_line() {
        let text = "one\n\ntwo\n";
        assert_eq!(tag_lines("web-1", text, false), "web-1 :: one\nweb-1 :: two");
    }

    #[test]
    fn colored_tag_wraps_host_only() {
        // Ignore NO_COLOR / CLICOLOR from the environment.
        colored::control::set_override(true);
        assert_eq!(
            tag_lines("db", "ok", true),
            "\x1b[96mdb\x1b[0m :: ok"
        );
    }

    #[test]
    fn blank_output_renders_nothing() {
        assert_eq!(tag_lines("db", "\n\n", false), "");
    }

    #[test]
    fn echo_mode_parsing() {
        assert_eq!("Tagged".parse::<EchoMode>(), Ok(EchoMode::Tagged));
        assert_eq!("none".parse::<EchoMode>(), Ok(EchoMode::Off));
        assert!("loud".parse::<EchoMode>().is_err());
        assert!(!EchoMode::default().is_on());
    }
}
