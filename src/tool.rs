//! Running the external compression tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::CompressionProfile;
use crate::error::{MergeSplitError, Result};

/// Everything needed to compress one document. Built once per compress job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    source: PathBuf,
    destination: PathBuf,
    profile: CompressionProfile,
    tool: PathBuf,
}

impl CompressionRequest {
    /// Build a request.
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        profile: CompressionProfile,
        tool: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            profile,
            tool: tool.into(),
        }
    }

    /// Document being compressed.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Where the compressed document is written.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Compression profile.
    pub fn profile(&self) -> CompressionProfile {
        self.profile
    }

    /// Tool binary.
    pub fn tool(&self) -> &Path {
        &self.tool
    }

    /// Tool arguments, in the fixed `pdfwrite` template.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-sDEVICE=pdfwrite".to_string(),
            "-dCompatibilityLevel=1.4".to_string(),
            format!("-dPDFSETTINGS={}", self.profile.as_tool_arg()),
            "-dNOPAUSE".to_string(),
            "-dQUIET".to_string(),
            "-dBATCH".to_string(),
            format!("-sOutputFile={}", self.destination.display()),
            self.source.display().to_string(),
        ]
    }
}

/// How the tool process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    /// Process exited on its own. Exits without a code (killed by an outside
    /// signal) are reported as `-1`.
    Exited(i32),
    /// Process was killed because the job was cancelled.
    Killed,
}

impl ToolExit {
    /// True for a zero exit code.
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// Spawns a tool, streams its combined stdout/stderr line by line, and
/// reports how it ended.
pub struct ExternalToolRunner;

impl ExternalToolRunner {
    /// Run `program` with `args`, calling `on_line` for every output line in
    /// arrival order.
    ///
    /// When `cancel` fires the process is killed, remaining output is
    /// discarded, and [`ToolExit::Killed`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::ToolLaunchFailed`] if the process cannot be
    /// spawned.
    pub async fn run<F>(
        program: &Path,
        args: &[String],
        cancel: &CancellationToken,
        mut on_line: F,
    ) -> Result<ToolExit>
    where
        F: FnMut(&str),
    {
        debug!(program = %program.display(), ?args, "Spawning tool");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MergeSplitError::ToolLaunchFailed {
                tool: program.to_path_buf(),
                source,
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cancellation requested, killing tool");
                    let _ = child.kill().await;
                    return Ok(ToolExit::Killed);
                }
                line = rx.recv() => match line {
                    Some(line) => on_line(&line),
                    None => break,
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                Ok(ToolExit::Killed)
            }
            status = child.wait() => {
                let code = match status {
                    Ok(status) => status.code().unwrap_or(-1),
                    Err(e) => {
                        warn!("Error waiting for tool: {}", e);
                        -1
                    }
                };
                if code != 0 {
                    warn!("Tool exited with code: {}", code);
                }
                Ok(ToolExit::Exited(code))
            }
        }
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}
