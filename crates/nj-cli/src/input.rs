//! Host and job lists: one entry per line, blank lines and `#` comments skipped.
use std::{fs, path::Path};

use anyhow::Context;

use nj_model::{JobRecord, JobSeq};

pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

pub fn read_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_lines(&text))
}

pub fn read_jobs(path: &Path, seq: &JobSeq) -> anyhow::Result<Vec<JobRecord>> {
    read_list(path)?
        .into_iter()
        .map(|cmd| seq.create(cmd).map_err(anyhow::Error::from))
        .collect()
}
