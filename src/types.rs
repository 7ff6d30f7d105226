use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignalId(pub i64);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SignalId {
    fn from(v: i64) -> Self {
        SignalId(v)
    }
}

/// Primitive kind of a configured argument or a declared capability parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Str,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
            ParamKind::Str => "string",
        };
        f.write_str(s)
    }
}

/// A typed argument decoded from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Str(_) => ParamKind::Str,
        }
    }

    /// Decode a JSON node. Nodes that are not a number, bool or string yield `None`.
    pub fn from_json(node: &serde_json::Value) -> Option<Self> {
        match node {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ParamValue::Int(i))
                } else if n.is_f64() {
                    n.as_f64().map(ParamValue::Float)
                } else {
                    // u64 above i64::MAX
                    None
                }
            }
            serde_json::Value::Bool(b) => Some(ParamValue::Bool(*b)),
            serde_json::Value::String(s) => Some(ParamValue::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v:?}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

pub fn kinds_of(args: &[ParamValue]) -> Vec<ParamKind> {
    args.iter().map(ParamValue::kind).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub method: String,
    /// `None` means the zero-argument form of the action.
    pub params: Option<Vec<ParamValue>>,
}

impl ActionSpec {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(method: impl Into<String>, params: Vec<ParamValue>) -> Self {
        Self {
            method: method.into(),
            params: Some(params),
        }
    }

    pub fn args(&self) -> &[ParamValue] {
        self.params.as_deref().unwrap_or(&[])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRule {
    pub id: SignalId,
    pub actions: Vec<ActionSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_json_nodes_by_kind() {
        assert_eq!(ParamValue::from_json(&json!(60)), Some(ParamValue::Int(60)));
        assert_eq!(ParamValue::from_json(&json!(-3)), Some(ParamValue::Int(-3)));
        assert_eq!(ParamValue::from_json(&json!(1.5)), Some(ParamValue::Float(1.5)));
        assert_eq!(ParamValue::from_json(&json!(true)), Some(ParamValue::Bool(true)));
        assert_eq!(
            ParamValue::from_json(&json!("ES")),
            Some(ParamValue::Str("ES".into()))
        );
    }

    #[test]
    fn drops_null_object_and_array_nodes() {
        assert_eq!(ParamValue::from_json(&json!(null)), None);
        assert_eq!(ParamValue::from_json(&json!({"a": 1})), None);
        assert_eq!(ParamValue::from_json(&json!([[1, 2]])), None);
    }

    #[test]
    fn float_with_integral_value_stays_float() {
        assert_eq!(ParamValue::from_json(&json!(2.0)), Some(ParamValue::Float(2.0)));
    }

    #[test]
    fn absent_params_mean_no_args() {
        assert!(ActionSpec::new("setUp").args().is_empty());
    }
}
