//! Advisory classification over an OpenAI-compatible chat completions API.
//!
//! Answers are suggestions only. They are validated against the keyword
//! rules and then run through the ladder like any other suggestion.

use async_trait::async_trait;
use bankfusion_core::{AdvisoryError, Direction, RawTransaction};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You classify single transactions from Indian bank statements. \
Descriptions are noisy: expect reference numbers, UPI handles, card masks and bank codes. \
Identify the payment rail and the counterparty, then pick the closest category. \
Allowed categories: Food, Groceries, Travel, Transport, Shopping, Entertainment, Utilities, \
Healthcare, Education, Rent, Salary, Investment, Insurance, Cash Withdrawal, Bank Charges, \
Transfer, Others. Use Others only when nothing else fits. \
A credit is never an expense and a salary is never a debit. \
Reply with one JSON object and nothing else: \
{\"merchant\": string, \"category\": string, \
\"channel\": \"UPI|CARD|NEFT|IMPS|CASH|BANK_TRANSFER|OTHER\", \
\"debit_or_credit\": \"debit|credit\", \"confidence\": number between 0 and 1, \
\"rationale\": short string}";

/// Row as sent to the advisory service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryRequest {
    pub date: String,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
    pub balance: f64,
    pub transaction_type: Direction,
}

impl From<&RawTransaction> for AdvisoryRequest {
    fn from(txn: &RawTransaction) -> Self {
        Self {
            date: txn.date.clone(),
            description: txn.description.clone(),
            debit: txn.debit,
            credit: txn.credit,
            balance: txn.balance.unwrap_or(0.0),
            transaction_type: txn.transaction_type,
        }
    }
}

/// Raw advisory answer, labels still in the service's vocabulary
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdvisorySuggestion {
    #[serde(default = "default_merchant")]
    pub merchant: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default = "default_direction")]
    pub debit_or_credit: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub rationale: String,
}

fn default_merchant() -> String {
    "Unknown".into()
}

fn default_category() -> String {
    "Others".into()
}

fn default_channel() -> String {
    "OTHER".into()
}

fn default_direction() -> String {
    "debit".into()
}

fn default_confidence() -> f32 {
    0.5
}

#[async_trait]
pub trait AdvisoryClassifier: Send + Sync {
    async fn classify(&self, request: &AdvisoryRequest) -> Result<AdvisorySuggestion, AdvisoryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorySettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.0,
            max_tokens: 500,
            timeout: Duration::from_secs(20),
        }
    }
}

pub struct OpenAiClassifier {
    client: reqwest::Client,
    api_key: String,
    settings: AdvisorySettings,
}

impl OpenAiClassifier {
    pub fn new(api_key: impl Into<String>, settings: AdvisorySettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AdvisoryClassifier for OpenAiClassifier {
    async fn classify(&self, request: &AdvisoryRequest) -> Result<AdvisorySuggestion, AdvisoryError> {
        #[derive(Serialize)]
        struct Msg {
            role: &'static str,
            content: String,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let row = serde_json::to_string(request).map_err(|e| AdvisoryError::Malformed(e.to_string()))?;
        let body = Req {
            model: &self.settings.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Msg {
                    role: "user",
                    content: row,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), txt));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| AdvisoryError::Malformed(e.to_string()))?;
        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AdvisoryError::Malformed("empty choices".into()))?;
        parse_content(&content)
    }
}

fn transport_error(e: reqwest::Error) -> AdvisoryError {
    if e.is_timeout() {
        AdvisoryError::Timeout
    } else {
        AdvisoryError::Transport(e.to_string())
    }
}

/// Non-success status. Credential problems are told apart so the run can stop.
pub fn status_error(status: u16, body: String) -> AdvisoryError {
    if status == 401 || status == 403 || body.to_lowercase().contains("invalid_api_key") {
        AdvisoryError::Unauthorized {
            status,
            message: body,
        }
    } else {
        AdvisoryError::Status { status, body }
    }
}

/// Parse the message content, tolerating a markdown fence around the JSON
pub fn parse_content(content: &str) -> Result<AdvisorySuggestion, AdvisoryError> {
    let mut text = content.trim();
    if text.starts_with("```") {
        text = text.split("```").nth(1).unwrap_or_default();
        text = text.strip_prefix("json").unwrap_or(text).trim();
    }
    serde_json::from_str(text).map_err(|e| AdvisoryError::Malformed(format!("{e}: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let s = parse_content(
            r#"{"merchant":"Blue Tokai","category":"Food","channel":"CARD","debit_or_credit":"debit","confidence":0.92,"rationale":"coffee roaster"}"#,
        )
        .unwrap();
        assert_eq!(s.merchant, "Blue Tokai");
        assert_eq!(s.category, "Food");
        assert!((s.confidence - 0.92).abs() < 1e-6);
    }

    #[test]
    fn test_parse_fenced_json_with_defaults() {
        let content = "```json\n{\"merchant\": \"Urban Company\", \"category\": \"Others\"}\n```";
        let s = parse_content(content).unwrap();
        assert_eq!(s.merchant, "Urban Company");
        assert_eq!(s.channel, "OTHER");
        assert_eq!(s.debit_or_credit, "debit");
        assert_eq!(s.confidence, 0.5);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_content("I think this is food").unwrap_err();
        assert!(matches!(err, AdvisoryError::Malformed(_)));
        assert!(!err.is_auth());
    }

    #[test]
    fn test_status_classification() {
        assert!(status_error(401, String::new()).is_auth());
        assert!(status_error(403, "forbidden".into()).is_auth());
        assert!(status_error(400, r#"{"error":{"code":"invalid_api_key"}}"#.into()).is_auth());
        assert_eq!(
            status_error(503, "overloaded".into()),
            AdvisoryError::Status {
                status: 503,
                body: "overloaded".into()
            }
        );
    }

    #[test]
    fn test_request_from_row() {
        let txn = RawTransaction::from_amounts(3, "05/01/24", "POS 4111XX1234 BLUE TOKAI", 320.0, 0.0, Some(9_180.0)).unwrap();
        let req = AdvisoryRequest::from(&txn);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["transaction_type"], "debit");
        assert_eq!(json["balance"], 9180.0);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let c = OpenAiClassifier::new(
            "sk-test",
            AdvisorySettings {
                base_url: "http://localhost:8080/v1/".into(),
                ..AdvisorySettings::default()
            },
        );
        assert_eq!(c.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
