use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Exit code used when yt-dlp could not be started at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 127;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not start {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("lost contact with {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub working_dir: PathBuf,
    pub executable: PathBuf,
    pub args: Vec<String>,
}

/// Run the child to completion, relaying its stdout to `out` line by line.
///
/// stdin and stderr are inherited. Each line is flushed as soon as it is read
/// so progress shows up live, and bytes are passed through untouched. Returns
/// the child's exit code, or -1 when it was killed without one.
pub fn run(invocation: &Invocation, out: &mut dyn Write) -> Result<i32, LaunchError> {
    let path = &invocation.executable;
    tracing::debug!("running {} {:?}", path.display(), invocation.args);

    let mut child = Command::new(path)
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            path: path.clone(),
            source,
        })?;

    if let Some(stdout) = child.stdout.take() {
        relay_lines(BufReader::new(stdout), out);
    }

    // Always reap the child, even when the relay gave up early.
    let status = child.wait().map_err(|source| LaunchError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!("{} exited with {}", path.display(), status);
    Ok(status.code().unwrap_or(-1))
}

/// Copy `reader` to `out` one line at a time until EOF or a read error.
fn relay_lines(mut reader: impl BufRead, out: &mut dyn Write) {
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("stopped relaying yt-dlp output: {}", e);
                return;
            }
        }
        // A closed console must not stop the download.
        if let Err(e) = out.write_all(&line).and_then(|()| out.flush()) {
            tracing::debug!("stdout relay failed: {}", e);
        }
    }
}
