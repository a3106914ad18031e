//! Response bodies of the store API.
//!
//! Every endpoint answers with a JSON object that may carry `success`,
//! `error` and `message` next to its payload fields.

use kvdesk_core::{KvError, Record, Result, SearchHit, StoreConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    /// The payload, unless the body reports a failure.
    pub fn into_result(self) -> Result<T> {
        let failed = match self.success {
            Some(success) => !success,
            None => self.error.is_some(),
        };
        if failed {
            let message = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "Request failed".to_string());
            return Err(KvError::Api(message));
        }
        Ok(self.payload)
    }

    /// `error`, falling back to `message`
    pub fn detail(self) -> Option<String> {
        self.error.or(self.message)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ack {}

#[derive(Debug, Deserialize)]
pub(crate) struct Keys {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordData {
    pub data: Option<Record>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResults {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub config: StoreConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRecord<'a> {
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateConfig<'a> {
    pub db_path: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: for<'de> Deserialize<'de>>(body: &str) -> Envelope<T> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn success_false_uses_error_then_message() {
        let err = parse::<Ack>(r#"{"success": false, "error": "boom", "message": "m"}"#)
            .into_result()
            .unwrap_err();
        assert_eq!(err, KvError::Api("boom".to_string()));

        let err = parse::<Ack>(r#"{"success": false, "message": "not found"}"#)
            .into_result()
            .unwrap_err();
        assert_eq!(err, KvError::Api("not found".to_string()));
    }

    #[test]
    fn bare_error_field_is_a_failure() {
        let err = parse::<Keys>(r#"{"error": "Database connection failed"}"#)
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "Database connection failed");
    }

    #[test]
    fn payload_without_success_flag() {
        let keys = parse::<Keys>(r#"{"keys": ["a", "b"]}"#).into_result().unwrap();
        assert_eq!(keys.keys, ["a", "b"]);
    }

    #[test]
    fn record_payload() {
        let data = parse::<RecordData>(
            r#"{"success": true, "data": {"key": "k", "value": {"a": 1}, "raw_value": "{\"a\":1}", "is_json": true}}"#,
        )
        .into_result()
        .unwrap();
        let record = data.data.unwrap();
        assert!(record.is_json);
        assert_eq!(record.raw_value, "{\"a\":1}");
    }

    #[test]
    fn config_keeps_unknown_fields() {
        let config = parse::<Config>(r#"{"success": true, "config": {"db_path": "/x.db", "theme": "dark"}}"#)
            .into_result()
            .unwrap()
            .config;
        assert_eq!(config.db_path.as_deref(), Some("/x.db"));
        assert_eq!(config.extra["theme"], "dark");
    }
}
