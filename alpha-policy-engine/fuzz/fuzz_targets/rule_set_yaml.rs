#![no_main]

use alpha_policy_engine::policy::{DecisionEngine, RuleSetConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary YAML must only ever produce errors, and any rule set that
    // parses must compile into an engine without panicking
    if let Ok(config) = RuleSetConfig::from_yaml(data) {
        let _ = DecisionEngine::from_config(config);
    }
});
