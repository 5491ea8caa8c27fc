use std::convert::TryFrom;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ReportError;

/// A single scalar property value from a compiler report.
///
/// The JSON schema stores integers, floats and booleans under the same `value` field,
/// so the kind is decided when the value is decoded.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum DynamicValue {
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl TryFrom<&serde_json::Value> for DynamicValue {
    type Error = ReportError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(DynamicValue::Bool(*b)),
            Value::Number(n) => {
                // Integers are narrowed to their low 32 bits, wide ones wrap.
                if let Some(i) = n.as_i64() {
                    Ok(DynamicValue::Int(i as i32))
                } else if let Some(u) = n.as_u64() {
                    Ok(DynamicValue::Int(u as i32))
                } else {
                    // serde_json rejects NaN and infinities, but values beyond the `f32`
                    // range still narrow to an infinity.
                    Ok(DynamicValue::Float(n.as_f64().unwrap_or_default() as f32))
                }
            }
            Value::Null => Err(ReportError::UnsupportedScalar { kind: "null" }),
            Value::String(_) => Err(ReportError::UnsupportedScalar { kind: "string" }),
            Value::Array(_) => Err(ReportError::UnsupportedScalar { kind: "array" }),
            Value::Object(_) => Err(ReportError::UnsupportedScalar { kind: "object" }),
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Int(i) => write!(f, "{}", i),
            DynamicValue::Float(v) => write!(f, "{:.2}", v),
            DynamicValue::Bool(b) => write!(f, "{}", b),
        }
    }
}
