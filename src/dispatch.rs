//! Signal dispatch: maps a signal id to the configured action sequence.
//!
//! A dispatch either runs every configured action of the first matching rule
//! (or the `cancelTrades` fallback when no rule matches) and then the
//! `doAlgo` finalizer, or stops at the first failing action. The finalizer is
//! skipped when anything before it fails.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::SignalConfig;
use crate::registry::{ActionError, CapabilityRegistry, FALLBACK_ACTION, FINALIZER_ACTION};
use crate::types::{ParamValue, SignalId};

/// Upcall interface the signal source drives.
pub trait SignalHandler: Send + Sync {
    fn handle_signal(&self, signal: SignalId) -> Result<DispatchReport, DispatchError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DispatchPath {
    Matched,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub signal: SignalId,
    pub path: DispatchPath,
    /// Methods run, in order, finalizer included.
    pub actions: Vec<String>,
}

#[derive(Debug, Error)]
#[error("signal {signal}: action {method} failed: {source}")]
pub struct DispatchError {
    pub signal: SignalId,
    pub method: String,
    #[source]
    pub source: ActionError,
}

pub struct SignalDispatcher<A> {
    algo: Arc<A>,
    registry: Arc<CapabilityRegistry<A>>,
    config: Arc<SignalConfig>,
}

impl<A> Clone for SignalDispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            algo: Arc::clone(&self.algo),
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
        }
    }
}

impl<A> SignalDispatcher<A> {
    pub fn new(algo: Arc<A>, registry: Arc<CapabilityRegistry<A>>, config: Arc<SignalConfig>) -> Self {
        Self {
            algo,
            registry,
            config,
        }
    }

    pub fn algo(&self) -> &A {
        &self.algo
    }

    pub fn dispatch(&self, signal: SignalId) -> Result<DispatchReport, DispatchError> {
        let mut run = Vec::new();

        let path = match self.config.rule(signal) {
            Some(rule) => {
                tracing::info!(%signal, actions = rule.actions.len(), "dispatching configured actions");
                for action in &rule.actions {
                    self.run_action(signal, &action.method, action.args(), &mut run)?;
                }
                DispatchPath::Matched
            }
            None => {
                tracing::warn!(%signal, fallback = FALLBACK_ACTION, "signal not configured");
                self.run_action(signal, FALLBACK_ACTION, &[], &mut run)?;
                DispatchPath::Fallback
            }
        };

        self.run_action(signal, FINALIZER_ACTION, &[], &mut run)?;

        Ok(DispatchReport {
            signal,
            path,
            actions: run,
        })
    }

    fn run_action(
        &self,
        signal: SignalId,
        method: &str,
        args: &[ParamValue],
        run: &mut Vec<String>,
    ) -> Result<(), DispatchError> {
        tracing::debug!(%signal, method, args = ?args, "invoking action");
        self.registry
            .invoke(&self.algo, method, args)
            .map_err(|source| {
                tracing::error!(%signal, method, error = %source, "action failed; aborting signal");
                DispatchError {
                    signal,
                    method: method.to_owned(),
                    source,
                }
            })?;
        run.push(method.to_owned());
        Ok(())
    }
}

impl<A: Send + Sync> SignalHandler for SignalDispatcher<A> {
    fn handle_signal(&self, signal: SignalId) -> Result<DispatchReport, DispatchError> {
        self.dispatch(signal)
    }
}
