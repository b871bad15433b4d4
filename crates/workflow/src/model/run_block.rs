//! `RunBlock` — the typed handler body of a [`Resource`](super::resource::Resource)
//! (spec §3, §9 "Tagged-union RunBlock").
//!
//! The manifest format carries five optional subfields (`llm`, `http`,
//! `exec`, `python`, `data`) on one struct; exactly one must be present.
//! [`RawRunBlock`] mirrors that wire shape for deserialization, and
//! [`RunBlock::from_raw`] is the fallible constructor that enforces the
//! "exactly one" invariant, producing the discriminated [`RunBody`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chat::ChatBlock;
use super::data::DataBlock;
use super::http::HttpBlock;
use super::process::{ExecBlock, PythonBlock};

/// A single validation rule evaluated after a resource's steps complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    /// Expression text evaluated by the template evaluator port.
    pub expression: String,
    /// Message recorded to the error registry when the expression is falsy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The rendered API-response payload a resource may contribute (spec §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponseBlock {
    /// Whether this contribution should be treated as successful.
    pub success: bool,
    /// Response payload, fed through `extractResponseData` by the assembler.
    pub response: ApiResponseData,
}

/// The `response.data` payload carried by an [`ApiResponseBlock`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiResponseData {
    /// Raw data items, recursively unwrapped by the response assembler.
    #[serde(default)]
    pub data: Vec<Value>,
}

/// The exactly-one-variant typed handler body of a [`RunBlock`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunBody {
    /// LLM call.
    Llm(ChatBlock),
    /// HTTP request.
    Http(HttpBlock),
    /// Shell execution.
    Exec(ExecBlock),
    /// Python script execution.
    Python(PythonBlock),
    /// Data-file registration.
    Data(DataBlock),
}

impl RunBody {
    /// The step name used in watermark protocol error messages (`"<step> error: ..."`).
    #[must_use]
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Llm(_) => "llm",
            Self::Http(_) => "http",
            Self::Exec(_) => "exec",
            Self::Python(_) => "python",
            Self::Data(_) => "data",
        }
    }
}

/// Error returned when a [`RawRunBlock`] does not carry exactly one body variant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunBlockError {
    /// None of `llm`/`http`/`exec`/`python`/`data` were present.
    #[error("run block has no typed body: exactly one of llm/http/exec/python/data is required")]
    NoBody,
    /// More than one of `llm`/`http`/`exec`/`python`/`data` were present.
    #[error("run block has {count} typed bodies, expected exactly one: {present:?}")]
    MultipleBodies {
        /// How many were present.
        count: usize,
        /// Which field names were present.
        present: Vec<&'static str>,
    },
}

/// Wire-format mirror of `RunBlock`: five optional subfields, exactly one
/// of which must be set. Deserialize into this, then call
/// [`RunBlock::from_raw`] to validate and convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRunBlock {
    /// LLM call body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<ChatBlock>,
    /// HTTP request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpBlock>,
    /// Shell execution body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecBlock>,
    /// Python execution body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<PythonBlock>,
    /// Data-file registration body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataBlock>,
    /// Expression gating whether this resource's steps run at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_condition: Option<String>,
    /// Expression checked before steps run; failure is a non-fatal error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_check: Option<String>,
    /// Post-step validation rules.
    #[serde(default)]
    pub validations: Vec<Validation>,
    /// Rendered API-response contribution, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_response: Option<ApiResponseBlock>,
}

/// The typed handler body of a workflow resource, plus the shared optional
/// gating/validation/response fields every body type carries (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct RunBlock {
    /// The one present typed body.
    pub body: RunBody,
    /// Expression gating whether this resource's steps run at all.
    pub skip_condition: Option<String>,
    /// Expression checked before steps run; failure is a non-fatal error.
    pub preflight_check: Option<String>,
    /// Post-step validation rules.
    pub validations: Vec<Validation>,
    /// Rendered API-response contribution, if any.
    pub api_response: Option<ApiResponseBlock>,
}

impl RunBlock {
    /// Construct a `RunBlock` directly from an already-resolved body.
    #[must_use]
    pub fn new(body: RunBody) -> Self {
        Self {
            body,
            skip_condition: None,
            preflight_check: None,
            validations: Vec::new(),
            api_response: None,
        }
    }

    /// Validate and convert a wire-format [`RawRunBlock`].
    ///
    /// # Errors
    ///
    /// Returns [`RunBlockError::NoBody`] if none of the five body fields are
    /// present, or [`RunBlockError::MultipleBodies`] if more than one is.
    pub fn from_raw(raw: RawRunBlock) -> Result<Self, RunBlockError> {
        let mut present = Vec::new();
        if raw.llm.is_some() {
            present.push("llm");
        }
        if raw.http.is_some() {
            present.push("http");
        }
        if raw.exec.is_some() {
            present.push("exec");
        }
        if raw.python.is_some() {
            present.push("python");
        }
        if raw.data.is_some() {
            present.push("data");
        }

        if present.len() > 1 {
            return Err(RunBlockError::MultipleBodies {
                count: present.len(),
                present,
            });
        }

        let body = match present.first() {
            Some(&"llm") => RunBody::Llm(raw.llm.expect("checked present")),
            Some(&"http") => RunBody::Http(raw.http.expect("checked present")),
            Some(&"exec") => RunBody::Exec(raw.exec.expect("checked present")),
            Some(&"python") => RunBody::Python(raw.python.expect("checked present")),
            Some(&"data") => RunBody::Data(raw.data.expect("checked present")),
            Some(_) | None => return Err(RunBlockError::NoBody),
        };

        Ok(Self {
            body,
            skip_condition: raw.skip_condition,
            preflight_check: raw.preflight_check,
            validations: raw.validations,
            api_response: raw.api_response,
        })
    }

    /// Convert back to the wire-format shape (used when re-serializing a
    /// resource after a handler has mutated its body in place).
    #[must_use]
    pub fn to_raw(&self) -> RawRunBlock {
        let mut raw = RawRunBlock {
            skip_condition: self.skip_condition.clone(),
            preflight_check: self.preflight_check.clone(),
            validations: self.validations.clone(),
            api_response: self.api_response.clone(),
            ..RawRunBlock::default()
        };
        match &self.body {
            RunBody::Llm(b) => raw.llm = Some(b.clone()),
            RunBody::Http(b) => raw.http = Some(b.clone()),
            RunBody::Exec(b) => raw.exec = Some(b.clone()),
            RunBody::Python(b) => raw.python = Some(b.clone()),
            RunBody::Data(b) => raw.data = Some(b.clone()),
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_empty() {
        let err = RunBlock::from_raw(RawRunBlock::default()).unwrap_err();
        assert_eq!(err, RunBlockError::NoBody);
    }

    #[test]
    fn from_raw_rejects_multiple() {
        let raw = RawRunBlock {
            llm: Some(ChatBlock::new("gpt", "hi")),
            exec: Some(ExecBlock::new("echo hi")),
            ..RawRunBlock::default()
        };
        let err = RunBlock::from_raw(raw).unwrap_err();
        match err {
            RunBlockError::MultipleBodies { count, present } => {
                assert_eq!(count, 2);
                assert_eq!(present, vec!["llm", "exec"]);
            }
            other => panic!("expected MultipleBodies, got {other:?}"),
        }
    }

    #[test]
    fn from_raw_accepts_single_body() {
        let raw = RawRunBlock {
            exec: Some(ExecBlock::new("echo hi")),
            ..RawRunBlock::default()
        };
        let block = RunBlock::from_raw(raw).unwrap();
        assert_eq!(block.body.step_name(), "exec");
    }

    #[test]
    fn round_trip_through_raw() {
        let raw = RawRunBlock {
            http: Some(HttpBlock::new("GET", "https://example.com")),
            skip_condition: Some("false".into()),
            ..RawRunBlock::default()
        };
        let block = RunBlock::from_raw(raw).unwrap();
        let back = block.to_raw();
        assert!(back.http.is_some());
        assert!(back.llm.is_none());
        assert_eq!(back.skip_condition.as_deref(), Some("false"));
    }

    #[test]
    fn step_name_matches_body() {
        assert_eq!(
            RunBlock::new(RunBody::Llm(ChatBlock::new("gpt", "hi")))
                .body
                .step_name(),
            "llm"
        );
        assert_eq!(
            RunBlock::new(RunBody::Data(DataBlock::new())).body.step_name(),
            "data"
        );
    }

    #[test]
    fn serde_roundtrip_raw() {
        let raw = RawRunBlock {
            python: Some(PythonBlock::new("print(1)")),
            validations: vec![Validation {
                expression: "len(stdout) > 0".into(),
                message: Some("expected output".into()),
            }],
            ..RawRunBlock::default()
        };
        let json = serde_json::to_string(&raw).unwrap();
        let back: RawRunBlock = serde_json::from_str(&json).unwrap();
        let block = RunBlock::from_raw(back).unwrap();
        assert_eq!(block.validations.len(), 1);
    }
}
