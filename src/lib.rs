//! Config-driven trading signal dispatcher.
//!
//! A numbered signal arrives (usually over HTTP), is looked up in a JSON
//! action table, and each configured action is resolved against the
//! algorithm's capability registry and invoked in order. Unknown signals run
//! the `cancelTrades` fallback; every successful dispatch ends with `doAlgo`.

pub mod algo;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod types;

pub use crate::config::{load_signal_config, SignalConfig};
pub use crate::dispatch::{DispatchError, DispatchReport, SignalDispatcher, SignalHandler};
pub use crate::registry::CapabilityRegistry;
