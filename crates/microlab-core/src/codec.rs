//! Serialization boundary for exam answers.
//!
//! Stored and transmitted answers have historically arrived in two forms: an
//! already-structured JSON object, or JSON text that still needs parsing
//! (sometimes double-encoded as a JSON string). Both are normalized here and
//! nowhere else.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::Answers;

/// Answers decode errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("answers text is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("answers do not match the exam layout: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("answers must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Encoded answers as received from storage or a caller.
#[derive(Debug, Clone, Copy)]
pub enum Encoded<'a> {
    Structured(&'a Value),
    Text(&'a str),
}

/// Outcome of decoding.
#[derive(Debug)]
pub enum Decoded {
    Read(Answers),
    /// Recognized as answers but could not be read.
    RecognizedButUnreadable(DecodeError),
}

impl Decoded {
    pub fn is_readable(&self) -> bool {
        matches!(self, Decoded::Read(_))
    }

    /// Best-effort answers: unreadable input becomes empty answers and is logged.
    pub fn into_answers(self) -> Answers {
        match self {
            Decoded::Read(answers) => answers,
            Decoded::RecognizedButUnreadable(error) => {
                tracing::warn!(%error, "substituting empty answers for unreadable payload");
                Answers::default()
            }
        }
    }

    pub fn into_result(self) -> Result<Answers, DecodeError> {
        match self {
            Decoded::Read(answers) => Ok(answers),
            Decoded::RecognizedButUnreadable(error) => Err(error),
        }
    }
}

/// Encode answers to JSON text. Total: extra keys pass through verbatim.
pub fn encode(answers: &Answers) -> String {
    answers.to_json_value().to_string()
}

/// Decode answers from either encoded form.
pub fn decode(input: Encoded<'_>) -> Decoded {
    let result = match input {
        Encoded::Structured(value) => decode_structured(value, true),
        Encoded::Text(text) => parse_text(text).and_then(|value| decode_structured(&value, true)),
    };

    match result {
        Ok(answers) => Decoded::Read(answers),
        Err(error) => Decoded::RecognizedButUnreadable(error),
    }
}

/// Shorthand for [`decode`] on text.
pub fn decode_text(text: &str) -> Decoded {
    decode(Encoded::Text(text))
}

/// Shorthand for [`decode`] on a structured value.
pub fn decode_value(value: &Value) -> Decoded {
    decode(Encoded::Structured(value))
}

fn parse_text(text: &str) -> Result<Value, DecodeError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(DecodeError::Syntax)
}

/// `unwrap_text` allows exactly one level of JSON-in-a-string.
fn decode_structured(value: &Value, unwrap_text: bool) -> Result<Answers, DecodeError> {
    match value {
        Value::Null => Ok(Answers::default()),
        Value::Object(_) => Answers::deserialize(value).map_err(DecodeError::Shape),
        Value::String(text) if unwrap_text => {
            let inner = parse_text(text)?;
            decode_structured(&inner, false)
        }
        Value::String(_) => Err(DecodeError::NotAnObject("string")),
        Value::Bool(_) => Err(DecodeError::NotAnObject("boolean")),
        Value::Number(_) => Err(DecodeError::NotAnObject("number")),
        Value::Array(_) => Err(DecodeError::NotAnObject("array")),
    }
}
