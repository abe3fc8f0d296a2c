//! Full process wiring against the in-memory scripted bus: resolve config,
//! install logging, forward stdin batches until end-of-stream, then report
//! what a real bus client would have transmitted.
//!
//! ```sh
//! printf 'a\nb\nc\n' | cargo run --example stdin_forward -- --log-level debug demo
//! ```

use std::process::ExitCode;

use bus_bridge::testing::ScriptedBus;
use bus_bridge::{init_logging, resolve_config, run_forwarder, BridgeConfig, ConfigError};

fn main() -> ExitCode {
    let config = match resolve_config() {
        Ok(config) => config,
        // The demo falls back to defaults when no CLI args or conf file are
        // around; a real deployment treats that as fatal.
        Err(ConfigError::NotFound) => BridgeConfig::default(),
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging(&config.logging) {
        eprintln!("configuration error: {err}");
        return ExitCode::FAILURE;
    }

    let bus = ScriptedBus::new();
    bus.grant_credit(usize::MAX);

    if let Err(err) = run_forwarder(config.connection, bus.connector()) {
        eprintln!("forwarder failed: {err}");
        return ExitCode::FAILURE;
    }

    let sent = bus.sent();
    let lines: usize = sent.iter().map(|envelope| envelope.len()).sum();
    eprintln!(
        "transmitted {} envelope(s) covering {} line(s)",
        sent.len(),
        lines
    );
    ExitCode::SUCCESS
}
