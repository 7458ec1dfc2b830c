//! yt-dlp process runner shared by extraction and catalog search.
//!
//! yt-dlp is invoked as a child process with `--dump-single-json`; its
//! stdout is parsed with serde and its stderr is reduced to a one-line
//! diagnostic that callers classify into their own error types.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::process::Command;

use crate::item::ItemIdentifier;
use crate::profile::ClientProfile;

const MAX_DIAGNOSTIC_LEN: usize = 300;

/// Canonical watch URL used as the lookup key for an item.
pub fn watch_url(item: &ItemIdentifier) -> String {
    format!("https://www.youtube.com/watch?v={item}")
}

/// Failures running yt-dlp.
#[derive(Debug, Error)]
pub enum YtDlpError {
    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("yt-dlp exited with {code:?}: {diagnostic}")]
    Exited {
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("Unparsable yt-dlp output: {reason}")]
    InvalidOutput { reason: String },
}

/// Coarse classification of a yt-dlp failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Unavailable,
    Rejected,
    Other,
}

impl YtDlpError {
    /// Classifies the failure from its diagnostic text.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Exited { diagnostic, .. } => classify_diagnostic(diagnostic),
            _ => FailureKind::Other,
        }
    }
}

/// Maps well-known yt-dlp error messages to a failure kind.
pub fn classify_diagnostic(diagnostic: &str) -> FailureKind {
    let message = diagnostic.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|needle| message.contains(needle));

    if any(&[
        "not a bot",
        "http error 429",
        "too many requests",
        "http error 403",
    ]) {
        FailureKind::Rejected
    } else if any(&["requested format is not available", "no video formats"]) {
        FailureKind::Unavailable
    } else if any(&[
        "video unavailable",
        "private video",
        "has been removed",
        "does not exist",
        "incomplete youtube id",
        "not available",
    ]) {
        FailureKind::NotFound
    } else {
        FailureKind::Other
    }
}

/// Handle on the yt-dlp executable. Cheap to clone, holds no process state.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Arguments presenting `profile` to the upstream.
    pub fn profile_args(profile: &ClientProfile) -> Vec<String> {
        let mut args = vec![
            "--add-header".to_string(),
            format!("User-Agent:{}", profile.user_agent()),
        ];
        for (name, value) in profile.headers() {
            args.push("--add-header".to_string());
            args.push(format!("{name}:{value}"));
        }
        if !profile.player_clients().is_empty() {
            args.push("--extractor-args".to_string());
            args.push(format!(
                "youtube:player_client={}",
                profile.player_clients().join(",")
            ));
        }
        args
    }

    /// Runs yt-dlp with `args` followed by `-- target` and parses the JSON on stdout.
    ///
    /// The child is killed if the timeout elapses or the future is dropped.
    ///
    /// # Errors
    /// - `YtDlpError::Spawn` - the executable could not be started
    /// - `YtDlpError::Timeout` - the run exceeded the configured timeout
    /// - `YtDlpError::Exited` - yt-dlp exited unsuccessfully
    /// - `YtDlpError::InvalidOutput` - stdout was not the expected JSON
    pub async fn run_json<T: DeserializeOwned>(
        &self,
        args: &[String],
        target: &str,
    ) -> Result<T, YtDlpError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--dump-single-json")
            .arg("--no-warnings")
            .arg("--no-progress")
            .args(args)
            .arg("--")
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running {} for {}", self.binary.display(), target);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(YtDlpError::Timeout {
                    timeout: self.timeout,
                });
            }
            Ok(Err(source)) => {
                return Err(YtDlpError::Spawn {
                    binary: self.binary.display().to_string(),
                    source,
                });
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(YtDlpError::Exited {
                code: output.status.code(),
                diagnostic: diagnostic_line(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| YtDlpError::InvalidOutput {
            reason: e.to_string(),
        })
    }
}

/// Picks the most informative stderr line: the last `ERROR:` line, or the
/// last non-empty line.
fn diagnostic_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let line = lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or(lines.last())
        .copied()
        .unwrap_or("no diagnostic output");

    line.chars().take(MAX_DIAGNOSTIC_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_bot_check() {
        let diagnostic = "ERROR: [youtube] abc: Sign in to confirm you're not a bot. \
                          Use --cookies-from-browser";
        assert_eq!(classify_diagnostic(diagnostic), FailureKind::Rejected);
        assert_eq!(
            classify_diagnostic("ERROR: unable to download: HTTP Error 429: Too Many Requests"),
            FailureKind::Rejected
        );
    }

    #[test]
    fn test_classifies_missing_items() {
        assert_eq!(
            classify_diagnostic("ERROR: [youtube] xyz: Video unavailable"),
            FailureKind::NotFound
        );
        assert_eq!(
            classify_diagnostic("ERROR: [youtube] xyz: Private video. Sign in if you've been granted access"),
            FailureKind::NotFound
        );
        assert_eq!(
            classify_diagnostic("ERROR: [youtube] xyz: Requested format is not available"),
            FailureKind::Unavailable
        );
        assert_eq!(
            classify_diagnostic("ERROR: something else broke"),
            FailureKind::Other
        );
    }

    #[test]
    fn test_diagnostic_prefers_error_lines() {
        let stderr = "WARNING: falling back\nERROR: [youtube] a: Video unavailable\n\nDEBUG: tail\n";
        assert_eq!(
            diagnostic_line(stderr),
            "ERROR: [youtube] a: Video unavailable"
        );
        assert_eq!(diagnostic_line("only line\n"), "only line");
        assert_eq!(diagnostic_line(""), "no diagnostic output");
        assert_eq!(diagnostic_line(&"x".repeat(1000)).len(), MAX_DIAGNOSTIC_LEN);
    }

    #[test]
    fn test_profile_args_carry_identity() {
        let profile = ClientProfile::builtin("desktop-browser").unwrap();
        let args = YtDlp::profile_args(&profile);

        assert_eq!(args[0], "--add-header");
        assert!(args[1].starts_with("User-Agent:Mozilla/5.0"));
        assert!(args.contains(&"Accept-Language:en-US,en;q=0.9".to_string()));
        assert!(args.contains(&"youtube:player_client=web_music,web".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let ytdlp = YtDlp::new("/nonexistent/yt-dlp-binary", Duration::from_secs(1));
        let result: Result<serde_json::Value, _> = ytdlp.run_json(&[], "target").await;
        assert!(matches!(result, Err(YtDlpError::Spawn { .. })));
    }
}
