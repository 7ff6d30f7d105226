use pretty_assertions::assert_eq;
use serde_json::json;
use signal_dispatch_bot::algo::StubAlgo;
use signal_dispatch_bot::config::{load_signal_config, SignalConfig};
use signal_dispatch_bot::dispatch::{DispatchPath, SignalDispatcher};
use signal_dispatch_bot::registry::ActionError;
use signal_dispatch_bot::types::SignalId;
use std::path::Path;
use std::sync::Arc;

fn dispatcher(cfg: SignalConfig) -> SignalDispatcher<StubAlgo> {
    SignalDispatcher::new(
        Arc::new(StubAlgo::new()),
        Arc::new(StubAlgo::registry().unwrap()),
        Arc::new(cfg),
    )
}

fn scenario_config() -> SignalConfig {
    SignalConfig::from_value(&json!({
        "signals": [
            {"id": 1, "actions": [
                {"method": "setUp"},
                {"method": "performCalc"},
                {"method": "submitToMarket"},
                {"method": "setAlgoParam", "params": [1, 60]}
            ]},
            {"id": 4, "actions": [
                {"method": "setAlgoParam", "params": [1]}
            ]}
        ]
    }))
}

#[test]
fn configured_signal_runs_actions_in_order_then_finalizer() {
    let d = dispatcher(scenario_config());
    let report = d.dispatch(SignalId(1)).unwrap();

    assert_eq!(report.path, DispatchPath::Matched);
    assert_eq!(
        d.algo().calls(),
        vec![
            "setUp()",
            "performCalc()",
            "submitToMarket()",
            "setAlgoParam(1, 60)",
            "doAlgo()",
        ]
    );
    assert_eq!(d.algo().param(1), Some(60));
}

#[test]
fn unknown_signal_cancels_trades_only() {
    let d = dispatcher(scenario_config());
    let report = d.dispatch(SignalId(5)).unwrap();

    assert_eq!(report.path, DispatchPath::Fallback);
    assert_eq!(d.algo().calls(), vec!["cancelTrades()", "doAlgo()"]);
}

#[test]
fn arity_mismatch_raises_and_skips_finalizer() {
    let d = dispatcher(scenario_config());
    let err = d.dispatch(SignalId(4)).unwrap_err();

    assert_eq!(err.method, "setAlgoParam");
    assert!(matches!(err.source, ActionError::ArgumentMismatch { arity: 1, .. }));
    assert!(err.to_string().contains("setAlgoParam"));
    assert!(d.algo().calls().is_empty());
}

#[test]
fn float_argument_does_not_match_int_parameter() {
    let d = dispatcher(SignalConfig::from_value(&json!({
        "signals": [{"id": 7, "actions": [
            {"method": "setUp"},
            {"method": "setAlgoParam", "params": [1, 60.5]},
            {"method": "submitToMarket"}
        ]}]
    })));
    let err = d.dispatch(SignalId(7)).unwrap_err();

    assert!(matches!(err.source, ActionError::ArgumentMismatch { .. }));
    assert_eq!(d.algo().calls(), vec!["setUp()"]);
}

#[test]
fn empty_or_scalar_params_run_zero_argument_form() {
    let d = dispatcher(SignalConfig::from_value(&json!({
        "signals": [{"id": 9, "actions": [
            {"method": "setUp", "params": []},
            {"method": "performCalc", "params": 5}
        ]}]
    })));
    let report = d.dispatch(SignalId(9)).unwrap();

    assert_eq!(report.path, DispatchPath::Matched);
    assert_eq!(d.algo().calls(), vec!["setUp()", "performCalc()", "doAlgo()"]);
}

#[test]
fn config_without_signals_always_falls_back() {
    let d = dispatcher(SignalConfig::from_value(&json!({"version": 2})));
    for id in [1, 2, -1] {
        d.dispatch(SignalId(id)).unwrap();
    }
    assert_eq!(d.algo().calls().len(), 6);
    assert!(d.algo().calls().iter().all(|c| c == "cancelTrades()" || c == "doAlgo()"));
}

#[test]
fn concurrent_dispatches_share_one_algo() {
    let d = dispatcher(scenario_config());
    std::thread::scope(|s| {
        for _ in 0..4 {
            let d = d.clone();
            s.spawn(move || {
                for _ in 0..25 {
                    d.dispatch(SignalId(1)).unwrap();
                }
            });
        }
    });
    let calls = d.algo().calls();
    assert_eq!(calls.len(), 100 * 5);
    assert_eq!(calls.iter().filter(|c| *c == "doAlgo()").count(), 100);
}

#[test]
fn shipped_config_matches_documented_signals() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/signal-config.json");
    let d = dispatcher(load_signal_config(&path).unwrap());

    d.dispatch(SignalId(2)).unwrap();
    assert_eq!(
        d.algo().calls(),
        vec!["reverse()", "setAlgoParam(1, 80)", "submitToMarket()", "doAlgo()"]
    );

    let err = d.dispatch(SignalId(4)).unwrap_err();
    assert_eq!(err.method, "setAlgoParam");
}
