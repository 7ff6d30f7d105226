use hdrhistogram::Histogram;

#[derive(Clone, Debug, Default)]
pub struct OutcomeCounters {
    pub matched: u64,
    pub fallback: u64,
    pub failed: u64,
}

impl OutcomeCounters {
    pub fn total(&self) -> u64 {
        self.matched + self.fallback + self.failed
    }

    pub fn failure_rate(&self) -> f64 {
        let denom = self.total();
        if denom == 0 {
            return 0.0;
        }
        (self.failed as f64) / (denom as f64)
    }
}

#[derive(Clone, Debug)]
pub struct Histo {
    inner: Histogram<u64>,
}

impl Default for Histo {
    fn default() -> Self {
        Self {
            // 3 significant figures, auto-resizing.
            inner: Histogram::new(3).expect("histo"),
        }
    }
}

impl Histo {
    pub fn record(&mut self, v: u64) {
        let _ = self.inner.record(v.max(1));
    }

    pub fn p50(&self) -> u64 {
        self.inner.value_at_quantile(0.50)
    }

    pub fn p99(&self) -> u64 {
        self.inner.value_at_quantile(0.99)
    }

    pub fn max(&self) -> u64 {
        self.inner.max()
    }

    pub fn count(&self) -> u64 {
        self.inner.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignalStats {
    pub outcomes: OutcomeCounters,
    /// Wall time of a whole dispatch, microseconds.
    pub latency_us: Histo,
    /// Method that failed most recently, if any.
    pub last_failed_method: Option<String>,
}
