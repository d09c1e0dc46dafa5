//! Result types handed back by the endpoint wrappers.
//!
//! # Design
//! Payloads stay as `serde_json::Value`: the appliance's field meanings are
//! passed through, not modelled. Only the success/failure label is typed.

use std::fmt;

use serde_json::Value;

use crate::error::ApiError;

/// Message `validatefile` returns when the configuration is usable.
pub const VALIDATE_SUCCESS: &str =
    "All the config has been validated, please go ahead to kick off testing";

/// Whether the appliance reported `status == "200"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Fail,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("Success"),
            Outcome::Fail => f.write_str("Fail"),
        }
    }
}

/// Classified appliance reply: the outcome plus the full decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub outcome: Outcome,
    pub body: Value,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The `data` member of the body, if any.
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data")
    }
}

/// Result of the appliance's configuration prevalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub passed: bool,
    pub message: String,
}

/// Name the appliance gives a generated workload parameter file.
///
/// `fio-8vmdk-100ws-4k-70rdpct-100randompct-4threads` for the usual keys.
pub fn param_file_name<K, V>(params: &[(K, V)]) -> Result<String, ApiError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_ref())
            .ok_or_else(|| ApiError::MissingParameter(key.to_string()))
    };
    Ok(format!(
        "{}-{}vmdk-{}ws-{}-{}rdpct-{}randompct-{}threads",
        get("tool")?,
        get("diskNum")?,
        get("workSet")?,
        get("blockSize")?,
        get("readPercent")?,
        get("randomPercent")?,
        get("threadNum")?,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn param_file_name_from_workload_params() {
        let params = [
            ("diskNum", "8"),
            ("workSet", "100"),
            ("threadNum", "4"),
            ("blockSize", "4k"),
            ("readPercent", "70"),
            ("randomPercent", "100"),
            ("tool", "fio"),
        ];
        assert_eq!(
            param_file_name(&params).unwrap(),
            "fio-8vmdk-100ws-4k-70rdpct-100randompct-4threads"
        );
    }

    #[test]
    fn param_file_name_reports_missing_key() {
        let err = param_file_name(&[("tool", "fio")]).unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter(ref k) if k == "diskNum"));
    }

    #[test]
    fn reply_exposes_data() {
        let reply = Reply {
            outcome: Outcome::Success,
            body: json!({"status": "200", "data": "ok"}),
        };
        assert!(reply.is_success());
        assert_eq!(reply.data(), Some(&json!("ok")));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Success.to_string(), "Success");
        assert_eq!(Outcome::Fail.to_string(), "Fail");
    }
}
