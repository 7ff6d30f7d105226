use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::registry::{CapabilityRegistry, RegistryError};

/// Stub for the vendor trading algorithm.
///
/// In production this would front the real algo engine. Here every operation
/// is logged and appended to an in-memory journal so callers can observe the
/// exact call sequence a dispatch produced.
#[derive(Debug, Default)]
pub struct StubAlgo {
    journal: Mutex<Vec<String>>,
    params: Mutex<BTreeMap<i32, i32>>,
}

impl StubAlgo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capability table exposed to the dispatcher.
    pub fn registry() -> Result<CapabilityRegistry<StubAlgo>, RegistryError> {
        CapabilityRegistry::<StubAlgo>::builder()
            .action("setUp", StubAlgo::set_up)
            .action("performCalc", StubAlgo::perform_calc)
            .action("submitToMarket", StubAlgo::submit_to_market)
            .action("reverse", StubAlgo::reverse)
            .action("setAlgoParam", StubAlgo::set_algo_param)
            .action("cancelTrades", StubAlgo::cancel_trades)
            .action("doAlgo", StubAlgo::do_algo)
            .build()
    }

    fn record(&self, call: String) {
        tracing::info!(call = %call, "algo");
        self.journal.lock().push(call);
    }

    pub fn set_up(&self) {
        self.record("setUp()".into());
    }

    pub fn perform_calc(&self) {
        self.record("performCalc()".into());
    }

    pub fn submit_to_market(&self) {
        self.record("submitToMarket()".into());
    }

    pub fn reverse(&self) {
        self.record("reverse()".into());
    }

    pub fn set_algo_param(&self, param: i32, value: i32) {
        self.params.lock().insert(param, value);
        self.record(format!("setAlgoParam({param}, {value})"));
    }

    pub fn cancel_trades(&self) {
        self.record("cancelTrades()".into());
    }

    pub fn do_algo(&self) {
        self.record("doAlgo()".into());
    }

    /// Calls seen so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    pub fn param(&self, param: i32) -> Option<i32> {
        self.params.lock().get(&param).copied()
    }

    pub fn clear(&self) {
        self.journal.lock().clear();
    }
}
