//! Natural-language to SQL assistant boundary

use std::process::Stdio;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use insight_core::{Insights, QueryResult};

/// Everything the assistant gets to see for one question
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantRequest {
    /// The user's question
    pub prompt: String,

    /// Schema summary of every loaded table
    pub schema: String,

    /// A few rows of the first table, for context
    pub sample: QueryResult,
}

impl AssistantRequest {
    /// Sample rows as a JSON array of column-to-value objects, keys in
    /// column order
    fn sample_json(&self) -> String {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = self
            .sample
            .rows
            .iter()
            .map(|row| {
                self.sample
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        let value = serde_json::to_value(cell).unwrap_or(serde_json::Value::Null);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect();
        serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    /// Full prompt text handed to the model
    pub fn render(&self) -> String {
        format!(
            "You are an expert data analyst and SQLite author.\n\
             Database Schema:\n{schema}\n\n\
             Sample Rows:\n{sample}\n\n\
             User Query: \"{prompt}\"\n\n\
             Task:\n\
             1. Write one SQLite query that answers the question.\n\
             2. Explain the approach in plain business terms.\n\
             3. Give a forward-looking prediction with a confidence between 0 and 1, \
             the reasoning behind it and a what-if scenario.\n\n\
             Reply with a single JSON object of the form\n\
             {{\"sql\": \"...\", \"explanation\": \"...\", \"insights\": \
             {{\"prediction\": \"...\", \"confidence\": 0.0, \"reasoning\": \"...\", \"whatIf\": \"...\"}}}}\n",
            schema = self.schema.trim_end(),
            sample = self.sample_json(),
            prompt = self.prompt,
        )
    }
}

/// Parsed assistant reply. Only `sql` is ever executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub sql: String,

    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default)]
    pub insights: Option<Insights>,
}

impl AssistantResponse {
    /// Parse model output, taking the outermost `{ ... }` span as the JSON body
    pub fn from_text(text: &str) -> Result<Self> {
        let start = text.find('{');
        let end = text.rfind('}');
        let body = match (start, end) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => bail!("assistant reply contains no JSON object"),
        };

        let response: AssistantResponse =
            serde_json::from_str(body).context("assistant reply is not a valid response object")?;
        if response.sql.trim().is_empty() {
            bail!("assistant reply has an empty sql field");
        }
        Ok(response)
    }
}

/// Generates SQL for a question
#[async_trait]
pub trait SqlAssistant: Send + Sync {
    async fn generate(&self, request: &AssistantRequest) -> Result<AssistantResponse>;
}

/// Assistant backed by an external command.
///
/// The rendered prompt is written to the command's stdin and its stdout is
/// parsed as the reply.
#[derive(Debug, Clone)]
pub struct CommandAssistant {
    program: String,
    args: Vec<String>,
}

impl CommandAssistant {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace-separated command line
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("assistant command is empty"))?;
        Ok(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl SqlAssistant for CommandAssistant {
    async fn generate(&self, request: &AssistantRequest) -> Result<AssistantResponse> {
        debug!("Running assistant command {}", self.program);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start assistant '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.render().as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            bail!(
                "assistant '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        AssistantResponse::from_text(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::Cell;

    #[test]
    fn test_from_text_strips_fences() {
        let text = "Here you go:\n```json\n{\"sql\": \"SELECT 1\", \"explanation\": \"one\", \
                    \"insights\": {\"prediction\": \"up\", \"confidence\": 0.8, \"reasoning\": \"r\", \"whatIf\": \"w\"}}\n```";
        let response = AssistantResponse::from_text(text).unwrap();
        assert_eq!(response.sql, "SELECT 1");
        assert_eq!(response.explanation.as_deref(), Some("one"));

        let insights = response.insights.unwrap();
        assert_eq!(insights.confidence, 0.8);
        assert_eq!(insights.what_if.as_deref(), Some("w"));
    }

    #[test]
    fn test_from_text_minimal() {
        let response = AssistantResponse::from_text("{\"sql\": \"SELECT 2\"}").unwrap();
        assert_eq!(response.explanation, None);
        assert_eq!(response.insights, None);
    }

    #[test]
    fn test_from_text_rejects_garbage() {
        assert!(AssistantResponse::from_text("no json here").is_err());
        assert!(AssistantResponse::from_text("{\"explanation\": \"x\"}").is_err());
        assert!(AssistantResponse::from_text("{\"sql\": \"  \"}").is_err());
    }

    #[test]
    fn test_render_includes_context() {
        let request = AssistantRequest {
            prompt: "top regions".to_string(),
            schema: "Table t: [region (TEXT), amount (NUMERIC)]\n".to_string(),
            sample: QueryResult::normalize(
                vec!["region".into(), "amount".into()],
                vec![vec!["north".into(), Cell::Number(10.0)]],
                "SELECT * FROM \"t\" LIMIT 5",
            ),
        };
        let prompt = request.render();
        assert!(prompt.contains("Table t: [region (TEXT), amount (NUMERIC)]"));
        assert!(prompt.contains("[{\"region\":\"north\",\"amount\":10.0}]"));
        assert!(prompt.contains("User Query: \"top regions\""));
    }

    #[test]
    fn test_command_line_parsing() {
        assert!(CommandAssistant::from_command_line("   ").is_err());
        let assistant = CommandAssistant::from_command_line("llm -m fast").unwrap();
        assert_eq!(assistant.program, "llm");
        assert_eq!(assistant.args, vec!["-m", "fast"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_assistant_round_trip() {
        let assistant = CommandAssistant::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo '{\"sql\": \"SELECT 3\"}'".to_string()],
        );
        let request = AssistantRequest {
            prompt: "q".to_string(),
            schema: "No tables loaded.".to_string(),
            sample: QueryResult::default(),
        };
        let response = assistant.generate(&request).await.unwrap();
        assert_eq!(response.sql, "SELECT 3");
    }
}
