//! Job generation from a directory tree: every `.avi` file becomes one
//! ffmpeg command transcoding it to an HEVC `.mkv` next to the source.
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;
use walkdir::WalkDir;

use nj_model::{JobRecord, JobSeq};

const SOURCE_EXT: &str = "avi";
const TARGET_EXT: &str = "mkv";

/// Source files under `dir`, sorted by path.
pub fn scan(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == SOURCE_EXT)
        {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

pub fn command_for(src: &Path) -> String {
    let dst = src.with_extension(TARGET_EXT);
    format!(
        "ffmpeg -nostdin -y -i {} -c:v libx265 -c:a copy {}",
        quote(src),
        quote(&dst)
    )
}

pub fn jobs(dir: &Path, seq: &JobSeq) -> anyhow::Result<Vec<JobRecord>> {
    let sources = scan(dir)?;
    debug!(target: "nj.cli", dir = %dir.display(), files = sources.len(), "transcode sources found");
    sources
        .iter()
        .map(|src| seq.create(command_for(src)).map_err(anyhow::Error::from))
        .collect()
}

/// Single-quote `path` for a POSIX shell.
fn quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_sources_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/deep")).unwrap();
        fs::write(dir.path().join("b/deep/two.avi"), b"").unwrap();
        fs::write(dir.path().join("a.avi"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("done.mkv"), b"").unwrap();

        let found = scan(dir.path()).unwrap();
        assert_eq!(
            found,
            [dir.path().join("a.avi"), dir.path().join("b/deep/two.avi")]
        );
    }

    #[test]
    fn command_quotes_paths() {
        let cmd = command_for(Path::new("/media/it's here.avi"));
        assert_eq!(
            cmd,
            r"ffmpeg -nostdin -y -i '/media/it'\''s here.avi' -c:v libx265 -c:a copy '/media/it'\''s here.mkv'"
        );
    }

    #[test]
    fn one_job_per_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.avi"), b"").unwrap();
        fs::write(dir.path().join("y.avi"), b"").unwrap();

        let seq = JobSeq::new();
        let jobs = jobs(dir.path(), &seq).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].command().contains("x.mkv"));
        assert!(jobs[1].command().contains("y.mkv"));
    }
}
