//! Version-control transports driving the system `git` and `hg` binaries.
//!
//! Checkouts land in a `.checkout` subdirectory first so a failed clone never
//! leaves VCS bookkeeping in the destination. The bookkeeping directory
//! (`.git`/`.hg`) is stripped before the tree is moved into place.

use std::path::Path;
use std::process::Stdio;

use tokio::fs;
use tokio::process::Command;
use tracing::debug;

use super::file::move_contents;
use crate::engine::Metadata;
use crate::engine::error::EngineError;
use crate::engine::source::Transport;

/// Clones `location` and moves the working tree into `into_dir`.
pub(super) async fn fetch(
    transport: Transport,
    location: &str,
    into_dir: &Path,
) -> Result<Metadata, EngineError> {
    let checkout = into_dir.join(".checkout");

    let revision = match transport {
        Transport::Git => {
            let mut clone = Command::new("git");
            clone.args(["clone", "--depth", "1", location]).arg(&checkout);
            run_tool(&mut clone, "git", location).await?;

            let mut rev_parse = Command::new("git");
            rev_parse.arg("-C").arg(&checkout).args(["rev-parse", "HEAD"]);
            let head = run_tool(&mut rev_parse, "git", location).await?;

            remove_bookkeeping(&checkout.join(".git")).await?;
            head
        }
        Transport::Hg => {
            let mut clone = Command::new("hg");
            clone.arg("clone").arg(location).arg(&checkout);
            run_tool(&mut clone, "hg", location).await?;

            let mut identify = Command::new("hg");
            identify.arg("-R").arg(&checkout).args(["identify", "--id"]);
            let id = run_tool(&mut identify, "hg", location).await?;

            remove_bookkeeping(&checkout.join(".hg")).await?;
            id
        }
        other => {
            return Err(EngineError::unsupported_transport(location, other.as_str()));
        }
    };

    move_contents(&checkout, into_dir).await?;
    fs::remove_dir_all(&checkout)
        .await
        .map_err(|e| EngineError::io(&checkout, e))?;

    debug!(revision = %revision, "checkout complete");
    Ok(Metadata {
        transport,
        artifact: None,
        revision: Some(revision),
        bytes: None,
    })
}

async fn remove_bookkeeping(dir: &Path) -> Result<(), EngineError> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(dir, e)),
    }
}

/// Runs a configured tool invocation and returns trimmed stdout.
///
/// Spawn failures and non-zero exits both map to [`EngineError::Tool`], with
/// captured stderr as the detail for the latter.
async fn run_tool(command: &mut Command, tool: &str, url: &str) -> Result<String, EngineError> {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    debug!(tool = %tool, url = %url, "running tool");
    let output = command
        .output()
        .await
        .map_err(|e| EngineError::tool(tool, url, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::tool(tool, url, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_tool_returns_trimmed_stdout() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo checkout-ok"]);

        let stdout = run_tool(&mut command, "sh", "test://source").await.unwrap();
        assert_eq!(stdout, "checkout-ok");
    }

    #[tokio::test]
    async fn test_run_tool_captures_stderr_on_failure() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo clone failed >&2; exit 1"]);

        let err = run_tool(&mut command, "sh", "test://source")
            .await
            .unwrap_err();
        match err {
            EngineError::Tool { tool, detail, .. } => {
                assert_eq!(tool, "sh");
                assert!(detail.contains("clone failed"), "stderr in: {detail}");
            }
            other => panic!("Expected Tool error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary_is_tool_error() {
        let mut command = Command::new("definitely-not-a-real-vcs-tool");

        let err = run_tool(&mut command, "definitely-not-a-real-vcs-tool", "test://source")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Tool { .. }));
    }
}
