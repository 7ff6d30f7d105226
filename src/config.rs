//! Signal configuration document.
//!
//! The document is decoded leniently: structural gaps (no `signals` array,
//! entries without an integer `id`, actions without a `method`) shrink the
//! action table instead of failing the load. Only I/O and JSON syntax errors
//! are fatal.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{ActionSpec, ParamValue, SignalId, SignalRule};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read signal config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse signal config: {details}")]
    Parse { details: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SignalConfig {
    pub signals: Vec<SignalRule>,
}

impl SignalConfig {
    pub fn new(signals: Vec<SignalRule>) -> Self {
        Self { signals }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(contents).map_err(|err| ConfigError::Parse {
            details: err.to_string(),
        })?;
        Ok(Self::from_value(&root))
    }

    pub fn from_value(root: &Value) -> Self {
        let Some(entries) = root.get("signals").and_then(Value::as_array) else {
            tracing::warn!("signal config has no `signals` array; every signal will take the fallback path");
            return Self::default();
        };

        let signals: Vec<SignalRule> = entries.iter().filter_map(decode_rule).collect();
        let cfg = Self { signals };
        for id in cfg.duplicate_ids() {
            tracing::warn!(signal = %id, "duplicate signal id; only the first rule is used");
        }
        cfg
    }

    /// First rule whose id matches.
    pub fn rule(&self, signal: SignalId) -> Option<&SignalRule> {
        self.signals.iter().find(|r| r.id == signal)
    }

    pub fn duplicate_ids(&self) -> Vec<SignalId> {
        let mut seen: BTreeMap<SignalId, usize> = BTreeMap::new();
        for rule in &self.signals {
            *seen.entry(rule.id).or_default() += 1;
        }
        seen.into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, _)| id)
            .collect()
    }
}

fn decode_rule(node: &Value) -> Option<SignalRule> {
    let Some(id) = node.get("id").and_then(Value::as_i64) else {
        tracing::warn!(entry = %node, "skipping signal entry without an integer id");
        return None;
    };
    let actions = node
        .get("actions")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(|a| decode_action(id, a)).collect())
        .unwrap_or_default();
    Some(SignalRule {
        id: SignalId(id),
        actions,
    })
}

fn decode_action(signal: i64, node: &Value) -> Option<ActionSpec> {
    let Some(method) = node.get("method").and_then(Value::as_str) else {
        tracing::warn!(signal, entry = %node, "skipping action without a method name");
        return None;
    };
    let params = match node.get("params") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items.iter().filter_map(ParamValue::from_json).collect()),
        // A scalar or object has no elements to walk: zero-argument form.
        Some(_) => Some(Vec::new()),
    };
    Some(ActionSpec {
        method: method.to_owned(),
        params,
    })
}

pub fn load_signal_config(path: &Path) -> Result<SignalConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = SignalConfig::from_json_str(&contents)?;
    tracing::info!(path = %path.display(), rules = cfg.signals.len(), "loaded signal config");
    Ok(cfg)
}
