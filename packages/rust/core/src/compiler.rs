//! Markup → binary artifact compilation through an external toolchain.
//!
//! Each [`DocumentCompiler::compile`] call owns a fresh temporary directory.
//! The compiler runs with that directory as its working directory and is
//! expected to leave `<stem>.<ext>` beside the source; moving that file to the
//! requested output path is the success boundary. The directory and everything
//! the compiler wrote into it are removed on every exit path.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use wordy_shared::{CompilerConfig, Result, WordyError};

use crate::prompt::{DOCUMENT_END_MARKER, DOCUMENT_START_MARKER};

/// File stem of the generated source inside the temporary directory.
const SOURCE_STEM: &str = "document";

/// Extension of the generated source.
const SOURCE_EXTENSION: &str = "tex";

/// Lines of compiler output kept per stream for error reports.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// Reject markup that is not a complete document.
pub fn validate_document(markup: &str) -> Result<()> {
    let trimmed = markup.trim_start();

    if trimmed.is_empty() {
        return Err(WordyError::malformed("generated document is empty"));
    }
    if !trimmed.starts_with(DOCUMENT_START_MARKER) {
        let head: String = trimmed.chars().take(40).collect();
        return Err(WordyError::malformed(format!(
            "document does not start with {DOCUMENT_START_MARKER} (starts with {head:?})"
        )));
    }
    if !trimmed.contains(DOCUMENT_END_MARKER) {
        return Err(WordyError::malformed(format!(
            "document is missing {DOCUMENT_END_MARKER}"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// DocumentCompiler
// ---------------------------------------------------------------------------

/// Runs the configured compiler over generated markup.
#[derive(Debug, Clone)]
pub struct DocumentCompiler {
    config: CompilerConfig,
    workspace_root: PathBuf,
}

impl DocumentCompiler {
    /// Compiler whose temporary directories live under the system temp dir.
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            workspace_root: std::env::temp_dir(),
        }
    }

    /// Place temporary directories under `root` instead.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Compile `markup` and move the artifact to `output`.
    #[instrument(skip_all, fields(command = %self.config.command, output = %output.display()))]
    pub async fn compile(&self, markup: &str, output: &Path) -> Result<PathBuf> {
        validate_document(markup)?;

        let workspace = tempfile::Builder::new()
            .prefix("wordy-compile-")
            .tempdir_in(&self.workspace_root)
            .map_err(|e| WordyError::io(&self.workspace_root, e))?;

        debug!(workspace = %workspace.path().display(), "created compile workspace");

        let outcome = self.compile_in(workspace.path(), markup, output).await;
        cleanup(workspace);

        let artifact = outcome?;
        info!(artifact = %artifact.display(), "document compiled");
        Ok(artifact)
    }

    async fn compile_in(&self, dir: &Path, markup: &str, output: &Path) -> Result<PathBuf> {
        let source_name = format!("{SOURCE_STEM}.{SOURCE_EXTENSION}");
        let source = dir.join(&source_name);
        tokio::fs::write(&source, markup)
            .await
            .map_err(|e| WordyError::io(&source, e))?;

        let secs = self.config.timeout_secs;
        let run = tokio::time::timeout(Duration::from_secs(secs), self.run(dir, &source_name))
            .await
            .map_err(|_| WordyError::timeout("document compilation", secs))??;

        if !run.status.success() {
            return Err(WordyError::compilation(
                format!("`{}` failed ({})", self.config.command, run.status),
                run.diagnostics(),
            ));
        }

        let artifact = dir.join(format!("{SOURCE_STEM}.{}", self.config.artifact_extension));
        if !tokio::fs::try_exists(&artifact).await.unwrap_or(false) {
            return Err(WordyError::compilation(
                format!(
                    "`{}` exited successfully but produced no {}",
                    self.config.command,
                    artifact.display()
                ),
                run.diagnostics(),
            ));
        }

        move_artifact(&artifact, output).await?;
        Ok(output.to_path_buf())
    }

    /// Spawn the compiler and wait for it, streaming stdout to the log.
    async fn run(&self, dir: &Path, source_name: &str) -> Result<CompilerRun> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(source_name)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WordyError::compilation(
                    format!("failed to launch `{}`: {e}", self.config.command),
                    None,
                )
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WordyError::compilation("failed to capture compiler stdout", None))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WordyError::compilation("failed to capture compiler stderr", None))?;

        let (stdout_tail, stderr_tail) =
            tokio::join!(read_tail(stdout, true), read_tail(stderr, false));

        let status = child.wait().await.map_err(|e| {
            WordyError::compilation(format!("failed to wait for compiler: {e}"), None)
        })?;

        debug!(%status, "compiler exited");

        Ok(CompilerRun {
            status,
            stdout_tail,
            stderr_tail,
        })
    }
}

/// Exit status and trailing output of one compiler run.
struct CompilerRun {
    status: ExitStatus,
    stdout_tail: VecDeque<String>,
    stderr_tail: VecDeque<String>,
}

impl CompilerRun {
    fn diagnostics(&self) -> Option<String> {
        let lines: Vec<&str> = self
            .stdout_tail
            .iter()
            .chain(self.stderr_tail.iter())
            .map(String::as_str)
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Read a stream to EOF, keeping the last [`DIAGNOSTIC_TAIL_LINES`] lines.
/// Output is decoded lossily; compilers do not promise UTF-8.
async fn read_tail<R: AsyncRead + Unpin>(stream: R, echo: bool) -> VecDeque<String> {
    let mut reader = BufReader::new(stream);
    let mut tail = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                if echo {
                    debug!(target: "wordy::compiler", "{line}");
                }
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Err(e) => {
                warn!(error = %e, "failed to read compiler output");
                break;
            }
        }
    }

    tail
}

/// Move the artifact out of the workspace, copying across filesystems.
async fn move_artifact(artifact: &Path, output: &Path) -> Result<()> {
    if tokio::fs::rename(artifact, output).await.is_ok() {
        return Ok(());
    }

    tokio::fs::copy(artifact, output)
        .await
        .map_err(|e| WordyError::io(output, e))?;
    Ok(())
}

/// Remove the workspace; failures are logged and otherwise ignored.
fn cleanup(workspace: TempDir) {
    let path = workspace.path().to_path_buf();
    match workspace.close() {
        Ok(()) => debug!(workspace = %path.display(), "removed compile workspace"),
        Err(e) => warn!(workspace = %path.display(), error = %e, "failed to remove compile workspace"),
    }
}
