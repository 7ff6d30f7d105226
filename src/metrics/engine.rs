use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::{DispatchError, DispatchPath, DispatchReport};
use crate::metrics::stats::SignalStats;
use crate::types::SignalId;

/// Dispatch outcome statistics keyed by signal id.
#[derive(Clone, Default)]
pub struct DispatchMetrics {
    by_signal: DashMap<SignalId, Arc<Mutex<SignalStats>>>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(
        &self,
        signal: SignalId,
        outcome: &Result<DispatchReport, DispatchError>,
        elapsed: Duration,
    ) {
        let stats = self.signal_stats(signal);
        let mut s = stats.lock();
        match outcome {
            Ok(report) => match report.path {
                DispatchPath::Matched => s.outcomes.matched += 1,
                DispatchPath::Fallback => s.outcomes.fallback += 1,
            },
            Err(err) => {
                s.outcomes.failed += 1;
                s.last_failed_method = Some(err.method.clone());
            }
        }
        s.latency_us
            .record(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    pub fn stats(&self, signal: SignalId) -> Option<SignalStats> {
        self.by_signal.get(&signal).map(|s| s.lock().clone())
    }

    pub fn snapshot_kv(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for entry in self.by_signal.iter() {
            let signal = entry.key();
            let s = entry.value().lock();
            out.insert(format!("dispatch|{signal}|matched"), s.outcomes.matched.to_string());
            out.insert(format!("dispatch|{signal}|fallback"), s.outcomes.fallback.to_string());
            out.insert(format!("dispatch|{signal}|failed"), s.outcomes.failed.to_string());
            out.insert(
                format!("dispatch|{signal}|failure_rate"),
                format!("{:.4}", s.outcomes.failure_rate()),
            );
            out.insert(format!("latency_us_p50|{signal}"), s.latency_us.p50().to_string());
            out.insert(format!("latency_us_p99|{signal}"), s.latency_us.p99().to_string());
            if let Some(m) = &s.last_failed_method {
                out.insert(format!("dispatch|{signal}|last_failed_method"), m.clone());
            }
        }
        out
    }

    fn signal_stats(&self, signal: SignalId) -> Arc<Mutex<SignalStats>> {
        self.by_signal
            .entry(signal)
            .or_insert_with(|| Arc::new(Mutex::new(SignalStats::default())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActionError;

    fn report(signal: i64, path: DispatchPath) -> Result<DispatchReport, DispatchError> {
        Ok(DispatchReport {
            signal: SignalId(signal),
            path,
            actions: vec!["doAlgo".into()],
        })
    }

    #[test]
    fn counts_outcomes_per_signal() {
        let m = DispatchMetrics::new();
        m.observe(SignalId(1), &report(1, DispatchPath::Matched), Duration::from_micros(40));
        m.observe(SignalId(1), &report(1, DispatchPath::Matched), Duration::from_micros(60));
        m.observe(SignalId(5), &report(5, DispatchPath::Fallback), Duration::from_micros(10));
        m.observe(
            SignalId(4),
            &Err(DispatchError {
                signal: SignalId(4),
                method: "setAlgoParam".into(),
                source: ActionError::CapabilityNotFound {
                    method: "setAlgoParam".into(),
                },
            }),
            Duration::from_micros(5),
        );

        let s1 = m.stats(SignalId(1)).unwrap();
        assert_eq!(s1.outcomes.matched, 2);
        assert_eq!(s1.latency_us.count(), 2);

        let kv = m.snapshot_kv();
        assert_eq!(kv["dispatch|5|fallback"], "1");
        assert_eq!(kv["dispatch|4|failed"], "1");
        assert_eq!(kv["dispatch|4|failure_rate"], "1.0000");
        assert_eq!(kv["dispatch|4|last_failed_method"], "setAlgoParam");
        assert!(m.stats(SignalId(99)).is_none());
    }
}
