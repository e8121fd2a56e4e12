//! Document parsing: upload, poll the job until it settles, extract fields,
//! and compare them against expected values.

use paslaugos_core::{DocumentParser, JobState, ParseError, ParseUpload};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the job reaches a terminal state.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: Some(120),
        }
    }
}

/// Build an upload from a file on disk; only PDF and common image types.
pub fn upload_from_file(path: &Path) -> Result<ParseUpload, ParseError> {
    let mime_type = mime_type_for(path)
        .ok_or_else(|| ParseError::UnsupportedFile(path.display().to_string()))?;
    let bytes = std::fs::read(path)
        .map_err(|e| ParseError::Submit(anyhow::anyhow!("reading {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(ParseUpload {
        file_name,
        mime_type: mime_type.to_string(),
        bytes,
    })
}

#[must_use]
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Check the job status until it succeeds, fails or runs out of attempts.
/// Sleeps `interval` between non-terminal checks. `on_state` sees every state.
pub async fn poll_until_done<P, F>(
    parser: &P,
    job_id: &str,
    policy: PollPolicy,
    mut on_state: F,
) -> Result<u32, ParseError>
where
    P: DocumentParser + ?Sized,
    F: FnMut(&JobState),
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let state = parser
            .status(job_id)
            .await
            .map_err(|source| ParseError::Status {
                job_id: job_id.to_string(),
                source,
            })?;
        debug!("Job {job_id} attempt {attempts}: {state:?}");
        on_state(&state);

        match state {
            JobState::Succeeded => return Ok(attempts),
            JobState::Failed(reason) => {
                return Err(ParseError::JobFailed {
                    job_id: job_id.to_string(),
                    reason,
                });
            }
            JobState::Pending | JobState::Running => {}
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(ParseError::Timeout {
                job_id: job_id.to_string(),
                attempts,
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Structured fields from a parse result: `pages[0].items[0].value`, with
/// Markdown code fences removed, parsed as JSON.
pub fn extract_fields(result: &Value) -> Result<Value, ParseError> {
    let raw = result["pages"][0]["items"][0]["value"]
        .as_str()
        .ok_or_else(|| ParseError::Extraction("missing pages[0].items[0].value".to_string()))?;
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|e| ParseError::Extraction(e.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCheck {
    pub field: String,
    pub expected: Value,
    pub actual: Option<Value>,
    pub matches: bool,
}

/// Compare each expected field with the parsed value. Strings compare after
/// trimming; everything else compares structurally.
#[must_use]
pub fn validate_fields(parsed: &Value, expected: &Map<String, Value>) -> Vec<FieldCheck> {
    expected
        .iter()
        .map(|(field, want)| {
            let actual = parsed.get(field).cloned();
            let matches = actual.as_ref().is_some_and(|got| values_match(got, want));
            FieldCheck {
                field: field.clone(),
                expected: want.clone(),
                actual,
                matches,
            }
        })
        .collect()
}

fn values_match(got: &Value, want: &Value) -> bool {
    match (got, want) {
        (Value::String(a), Value::String(b)) => a.trim() == b.trim(),
        _ => got == want,
    }
}

/// Full flow used by the `parse` command.
pub async fn parse_document<P, F>(
    parser: &P,
    upload: &ParseUpload,
    policy: PollPolicy,
    on_state: F,
) -> Result<Value, ParseError>
where
    P: DocumentParser + ?Sized,
    F: FnMut(&JobState),
{
    let job_id = parser.submit(upload).await.map_err(ParseError::Submit)?;
    info!("[{}] Uploaded, job id {job_id}", upload.file_name);

    let attempts = poll_until_done(parser, &job_id, policy, on_state).await?;
    info!("Job {job_id} finished after {attempts} status checks");

    let result = parser
        .result(&job_id)
        .await
        .map_err(|source| ParseError::Result {
            job_id: job_id.clone(),
            source,
        })?;
    extract_fields(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedParser {
        states: Mutex<Vec<JobState>>,
        checks: Mutex<u32>,
        result: Value,
    }

    impl ScriptedParser {
        fn new(mut states: Vec<JobState>, result: Value) -> Self {
            states.reverse();
            Self {
                states: Mutex::new(states),
                checks: Mutex::new(0),
                result,
            }
        }
    }

    #[async_trait]
    impl DocumentParser for ScriptedParser {
        async fn submit(&self, _upload: &ParseUpload) -> anyhow::Result<String> {
            Ok("job-1".to_string())
        }

        async fn status(&self, _job_id: &str) -> anyhow::Result<JobState> {
            *self.checks.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            Ok(if states.len() > 1 {
                states.pop().unwrap()
            } else {
                states.last().cloned().unwrap()
            })
        }

        async fn result(&self, _job_id: &str) -> anyhow::Result<Value> {
            Ok(self.result.clone())
        }
    }

    fn fast(max_attempts: Option<u32>) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    fn invoice_result() -> Value {
        json!({"pages": [{"items": [{"value": "```json\n{\"invoice_number\": \"SF-001\", \"sum\": 121.0}\n```"}]}]})
    }

    #[tokio::test]
    async fn test_poll_succeeds_after_pending() {
        let parser = ScriptedParser::new(
            vec![JobState::Pending, JobState::Running, JobState::Succeeded],
            Value::Null,
        );
        let mut seen = Vec::new();
        let attempts = poll_until_done(&parser, "job-1", fast(Some(10)), |s| seen.push(s.clone()))
            .await
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(seen.last(), Some(&JobState::Succeeded));
    }

    #[tokio::test]
    async fn test_poll_reports_failed_job() {
        let parser = ScriptedParser::new(
            vec![JobState::Pending, JobState::Failed("bad pdf".into())],
            Value::Null,
        );
        let err = poll_until_done(&parser, "job-1", fast(None), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::JobFailed { ref reason, .. } if reason == "bad pdf"));
    }

    #[tokio::test]
    async fn test_poll_times_out() {
        let parser = ScriptedParser::new(vec![JobState::Running], Value::Null);
        let err = poll_until_done(&parser, "job-1", fast(Some(4)), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Timeout { attempts: 4, .. }));
        assert_eq!(*parser.checks.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_parse_document_end_to_end() {
        let parser = ScriptedParser::new(
            vec![JobState::Pending, JobState::Succeeded],
            invoice_result(),
        );
        let upload = ParseUpload {
            file_name: "saskaita.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: vec![1, 2, 3],
        };
        let fields = parse_document(&parser, &upload, fast(Some(5)), |_| {})
            .await
            .unwrap();
        assert_eq!(fields["invoice_number"], "SF-001");
    }

    #[test]
    fn test_extract_fields_without_fence() {
        let result = json!({"pages": [{"items": [{"value": "{\"a\": 1}"}]}]});
        assert_eq!(extract_fields(&result).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extract_fields_errors() {
        assert!(matches!(
            extract_fields(&json!({"pages": []})),
            Err(ParseError::Extraction(_))
        ));
        let not_json = json!({"pages": [{"items": [{"value": "Invoice SF-001"}]}]});
        assert!(matches!(
            extract_fields(&not_json),
            Err(ParseError::Extraction(_))
        ));
    }

    #[test]
    fn test_validate_fields() {
        let parsed = json!({"invoice_number": " SF-001 ", "sum": 121.0, "vat": "LT100"});
        let expected = json!({"invoice_number": "SF-001", "sum": 100.0, "date": "2024-01-01"});
        let checks = validate_fields(&parsed, expected.as_object().unwrap());

        let by_field = |f: &str| checks.iter().find(|c| c.field == f).unwrap();
        assert!(by_field("invoice_number").matches);
        assert!(!by_field("sum").matches);
        assert_eq!(by_field("sum").actual, Some(json!(121.0)));
        assert!(!by_field("date").matches);
        assert_eq!(by_field("date").actual, None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.PDF")), Some("application/pdf"));
        assert_eq!(mime_type_for(Path::new("scan.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("notes.txt")), None);
        assert!(matches!(
            upload_from_file(Path::new("notes.txt")),
            Err(ParseError::UnsupportedFile(_))
        ));
    }
}
