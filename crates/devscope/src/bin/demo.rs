//! devscope demo
//!
//! Runs every scope operation against the standard console. Options are
//! read as JSON from `DEVSCOPE_OPTIONS`, e.g.
//! `DEVSCOPE_OPTIONS='{"colorize": false, "slowThreshold": 20}'`.

use devscope::{
    init_logging, scope_error, scope_info, scope_log, scope_warn, DevScope, LogConfig, ScopeConfig,
    ScopeResult,
};
use std::thread::sleep;
use std::time::Duration;

fn main() -> ScopeResult<()> {
    init_logging(&LogConfig::from_env("warn"))?;

    let config = match std::env::var("DEVSCOPE_OPTIONS") {
        Ok(json) => ScopeConfig::from_json(&json)?,
        Err(_) => ScopeConfig::default(),
    };
    let scope = DevScope::new(config);

    scope_log!(scope, "plain log line");
    scope_info!(scope, "informational", 1);
    scope_warn!(scope, "something looks off");
    scope_error!(scope, "something failed");

    let checksum = scope.watch("checksum", |data: Vec<u8>| {
        sleep(Duration::from_millis(15));
        data.iter().map(|b| u32::from(*b)).sum::<u32>()
    });
    checksum(vec![1, 2, 3]);

    let slow = scope.watch("slow_sum", |n: u64| {
        sleep(Duration::from_millis(150));
        (0..n).sum::<u64>()
    });
    slow(1000);

    let parse = scope.watch_result("parse_port", |s: &str| s.parse::<u16>());
    let _ = parse("8080");
    let _ = parse("eighty");

    let id = scope.start_group("startup");
    sleep(Duration::from_millis(30));
    scope.add_step(&id, "load config");
    sleep(Duration::from_millis(60));
    scope.add_step(&id, "open database");
    sleep(Duration::from_millis(10));
    scope.add_step(&id, "warm cache");
    scope.end_group(&id);

    let stats = scope.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    scope.clear_logs();
    Ok(())
}
