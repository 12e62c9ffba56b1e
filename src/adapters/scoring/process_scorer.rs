//! Sentiment scorer running as a child process.
//!
//! The batch is written to stdin as a JSON array of strings; the process
//! answers on stdout with `{"score": f64, "confidence": f64}`. Any extra
//! fields are ignored. The child is killed if the call is dropped, which is
//! how the decision engine's timeout stops a hung scorer.

use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ScorerConfig;
use crate::domain::decision::DecisionResult;
use crate::domain::feedback::MessageBatch;
use crate::ports::{ScoringError, SentimentScorer};

/// Longest stderr excerpt carried into an error message.
const STDERR_EXCERPT: usize = 512;

#[derive(Debug, Deserialize)]
struct ScorerOutput {
    score: f64,
    confidence: f64,
}

/// Scorer backed by an external command.
#[derive(Debug, Clone)]
pub struct ProcessScorer {
    command: String,
    args: Vec<String>,
}

impl ProcessScorer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ScorerConfig) -> Self {
        Self::new(config.command.clone(), config.args_list())
    }
}

#[async_trait]
impl SentimentScorer for ProcessScorer {
    async fn score(&self, batch: &MessageBatch) -> Result<DecisionResult, ScoringError> {
        let input = serde_json::to_vec(batch.messages())
            .map_err(|e| ScoringError::unavailable(format!("cannot encode batch: {}", e)))?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScoringError::unavailable(format!("cannot spawn {}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&input).await {
                Ok(()) => {}
                // The scorer may exit without reading; its exit status decides.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!(command = %self.command, "Scorer closed stdin early");
                }
                Err(e) => {
                    return Err(ScoringError::unavailable(format!("cannot write batch: {}", e)))
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ScoringError::unavailable(format!("scorer did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            return Err(ScoringError::unavailable(format!(
                "scorer exited with {}: {}",
                output.status, excerpt
            )));
        }

        parse_output(&output.stdout)
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// Parses scorer stdout into a validated result.
pub fn parse_output(stdout: &[u8]) -> Result<DecisionResult, ScoringError> {
    let text = std::str::from_utf8(stdout)
        .map_err(|_| ScoringError::malformed("stdout is not UTF-8"))?
        .trim();
    let raw: ScorerOutput = serde_json::from_str(text)
        .map_err(|e| ScoringError::malformed(format!("{}: {:?}", e, text)))?;
    DecisionResult::new(raw.score, raw.confidence).map_err(|e| ScoringError::malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> ProcessScorer {
        ProcessScorer::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn batch(messages: &[&str]) -> MessageBatch {
        MessageBatch::new(messages.iter().map(|m| m.to_string()).collect())
    }

    #[test]
    fn parse_output_ignores_extra_fields() {
        let result = parse_output(br#" {"score": 0.8, "confidence": 0.9, "model": "x"} "#).unwrap();
        assert_eq!(result.score(), 0.8);
        assert_eq!(result.confidence(), 0.9);
    }

    #[test]
    fn parse_output_rejects_out_of_range() {
        let err = parse_output(br#"{"score": 1.5, "confidence": 0.9}"#).unwrap_err();
        assert!(matches!(err, ScoringError::Malformed { .. }));
    }

    #[test]
    fn parse_output_rejects_missing_fields() {
        assert!(matches!(
            parse_output(br#"{"score": 0.5}"#),
            Err(ScoringError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn batch_is_sent_as_json_on_stdin() {
        let scorer = shell(
            r#"if grep -q '\["great idea","ship it"\]'; then echo '{"score":0.9,"confidence":0.8}'; else echo '{"score":0.1,"confidence":0.8}'; fi"#,
        );
        let result = scorer.score(&batch(&["great idea", "ship it"])).await.unwrap();
        assert_eq!(result.score(), 0.9);
    }

    #[tokio::test]
    async fn non_zero_exit_is_unavailable() {
        let err = shell("echo oops >&2; exit 3")
            .score(&batch(&["a"]))
            .await
            .unwrap_err();
        match err {
            ScoringError::Unavailable { message } => assert!(message.contains("oops")),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn garbage_stdout_is_malformed() {
        let err = shell("cat >/dev/null; echo not-json")
            .score(&batch(&["a"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Malformed { .. }));
    }

    #[tokio::test]
    async fn missing_executable_is_unavailable() {
        let err = ProcessScorer::new("/nonexistent/scorer", vec![])
            .score(&batch(&["a"]))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
