//! Integration tests for the instrumentation facade
//! Covers log bookkeeping across clears, group reports and the
//! documented end-to-end scenarios.

use devscope::{
    scope_error, scope_info, scope_log, scope_warn, DevScope, FixedMemory, GroupId, LogCategory,
    ManualClock, MemorySink, NoLocation, ScopeConfig,
};
use proptest::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Scope wired to deterministic collaborators
struct Fixture {
    scope: DevScope,
    sink: MemorySink,
    clock: ManualClock,
}

impl Fixture {
    fn new(config: ScopeConfig) -> Self {
        let sink = MemorySink::new();
        let clock = ManualClock::new();
        let scope = DevScope::builder()
            .config(config)
            .sink(sink.clone())
            .clock(clock.clone())
            .resolver(NoLocation)
            .memory_probe(FixedMemory::new(0))
            .build();
        Self { scope, sink, clock }
    }

    fn plain() -> Self {
        Self::new(ScopeConfig::default().with_colorize(false))
    }
}

#[derive(Debug, Clone)]
enum Action {
    Log(LogCategory),
    Clear,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        8 => prop::sample::select(LogCategory::ALL.to_vec()).prop_map(Action::Log),
        1 => Just(Action::Clear),
    ]
}

proptest! {
    #[test]
    fn prop_totals_track_logs_since_last_clear(actions in prop::collection::vec(action(), 0..60)) {
        let fx = Fixture::plain();
        let mut since_clear: Vec<LogCategory> = Vec::new();

        for (i, action) in actions.iter().enumerate() {
            match action {
                Action::Log(LogCategory::Log) => scope_log!(fx.scope, i),
                Action::Log(LogCategory::Error) => scope_error!(fx.scope, i),
                Action::Log(LogCategory::Warn) => scope_warn!(fx.scope, i),
                Action::Log(LogCategory::Info) => scope_info!(fx.scope, i),
                Action::Clear => {
                    fx.scope.clear_logs();
                    since_clear.clear();
                    continue;
                }
            }
            if let Action::Log(category) = action {
                since_clear.push(*category);
            }
        }

        let stats = fx.scope.stats();
        prop_assert_eq!(stats.total_logs, since_clear.len());
        prop_assert_eq!(stats.by_type.values().sum::<usize>(), stats.total_logs);
        for category in LogCategory::ALL {
            let expected = since_clear.iter().filter(|c| **c == category).count();
            prop_assert_eq!(stats.count(category), expected);
        }

        let expected_recent: Vec<LogCategory> =
            since_clear.iter().rev().take(5).rev().copied().collect();
        let recent: Vec<LogCategory> = stats.recent_logs.iter().map(|e| e.category).collect();
        prop_assert_eq!(recent, expected_recent);
    }

    #[test]
    fn prop_recent_logs_are_newest_in_call_order(count in 0usize..20) {
        let fx = Fixture::plain();
        for i in 0..count {
            scope_log!(fx.scope, i);
        }

        let stats = fx.scope.stats();
        let recent: Vec<String> = stats.recent_logs.iter().map(|e| e.message()).collect();
        let expected: Vec<String> =
            (count.saturating_sub(5)..count).map(|i| i.to_string()).collect();
        prop_assert_eq!(recent.len(), count.min(5));
        prop_assert_eq!(recent, expected);
    }

    #[test]
    fn prop_contiguous_steps_sum_to_whole(gaps in prop::collection::vec(1u64..500, 1..12)) {
        let fx = Fixture::plain();
        let id = fx.scope.start_group("tiles");

        for (i, gap) in gaps.iter().enumerate() {
            fx.clock.advance(Duration::from_millis(*gap));
            fx.scope.add_step(&id, &format!("step{i}"));
        }

        let report = fx.scope.end_group(&id).unwrap();
        prop_assert!((report.percent_sum() - 100.0).abs() < 1e-6);
        prop_assert!(report.rows.iter().all(|r| r.filled <= 50));
    }
}

#[test]
fn scenario_checkpoint_breakdown() {
    let fx = Fixture::plain();
    let id = fx.scope.start_group("X");

    fx.clock.advance(Duration::from_millis(100));
    fx.scope.add_step(&id, "a");
    fx.clock.advance(Duration::from_millis(200));
    fx.scope.add_step(&id, "b");

    let report = fx.scope.end_group(&id).unwrap();

    assert_eq!(report.total, Duration::from_millis(300));
    assert_eq!(report.rows[0].duration, Duration::from_millis(100));
    assert_eq!(report.rows[1].duration, Duration::from_millis(200));
    assert_eq!(report.rows[0].filled, 16);
    assert_eq!(report.rows[1].filled, 33);

    let lines = report.lines(false);
    assert_eq!(lines[0], "📊 X");
    assert_eq!(
        lines[1],
        format!("│{}{}│ 1. a 100.00ms (33.3%)", "█".repeat(16), "░".repeat(34))
    );
    assert_eq!(
        lines[2],
        format!("│{}{}│ 2. b 200.00ms (66.7%)", "█".repeat(33), "░".repeat(17))
    );
    assert_eq!(lines[3], "Total: 300.00ms");
}

#[test]
fn scenario_zero_elapsed_group() {
    let fx = Fixture::plain();
    let id = fx.scope.start_group("instant");
    fx.scope.add_step(&id, "a");
    fx.scope.add_step(&id, "b");

    let report = fx.scope.end_group(&id).unwrap();

    assert!(report.rows.iter().all(|r| r.percent == 0.0 && r.filled == 0));
    assert!(fx.sink.lines_for(LogCategory::Log)[0].contains("(0.0%)"));
}

#[test]
fn scenario_watched_panic() {
    let fx = Fixture::plain();
    let f = fx.scope.watch("f", |_: ()| -> () { panic!("broken") });

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(())));
    assert!(outcome.is_err());

    let lines = fx.sink.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].0, LogCategory::Info);
    assert!(lines[0].1.contains("calling f"));
    assert_eq!(lines[1].0, LogCategory::Error);
    assert!(lines[1].1.contains("f panicked: broken"));
    assert!(fx.scope.stats().count(LogCategory::Error) >= 1);
}

#[test]
fn scenario_uncolored_output_is_exact() {
    let fx = Fixture::plain();
    fx.clock.advance(Duration::from_millis(61_005));

    scope_log!(fx.scope, "a");
    scope_error!(fx.scope, "b");
    scope_warn!(fx.scope, "c");
    scope_info!(fx.scope, "d");

    let lines: Vec<String> = fx.sink.lines().into_iter().map(|(_, line)| line).collect();
    assert_eq!(
        lines,
        vec![
            "[00:01:01.005] <unknown> → a",
            "[00:01:01.005] <unknown> → b",
            "[00:01:01.005] <unknown> → c",
            "[00:01:01.005] <unknown> → d",
        ]
    );
    assert!(lines.iter().all(|line| !line.contains('\x1b')));
}

#[test]
fn scenario_unknown_ids_are_inert() {
    let fx = Fixture::plain();
    scope_log!(fx.scope, "before");
    let before = fx.scope.stats();

    let ended = fx.scope.start_group("done");
    fx.scope.end_group(&ended);
    fx.sink.take();
    fx.scope.clear_logs();
    scope_log!(fx.scope, "before");

    for id in [GroupId::from("never-issued"), ended] {
        fx.scope.add_step(&id, "x");
        assert!(fx.scope.end_group(&id).is_none());
    }

    assert_eq!(fx.scope.stats().total_logs, before.total_logs);
    assert_eq!(fx.sink.len(), 1);
    assert_eq!(fx.scope.live_groups(), 0);
}

#[test]
fn scenario_json_options() {
    let json = r#"{"colorize": false, "showMemory": false, "extra": [1, 2]}"#;
    let config = ScopeConfig::from_json(json).unwrap();
    let fx = Fixture::new(config);
    let clock = fx.clock.clone();

    let work = fx.scope.watch("work", move |_: ()| clock.advance(Duration::from_millis(7)));
    work(());

    assert_eq!(
        fx.sink.lines_for(LogCategory::Log),
        vec!["[00:00:00.007] <unknown> → ⚡ work took 7.00ms".to_string()]
    );
}

#[tokio::test]
async fn scenario_async_completion_is_reported_once() {
    let fx = Fixture::new(ScopeConfig::default().with_colorize(false).with_memory(false));
    let clock = fx.clock.clone();

    let load = fx.scope.watch_async("load", move |n: u32| {
        let clock = clock.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            clock.advance(Duration::from_millis(40));
            n * 2
        }
    });

    let (a, b) = tokio::join!(load(1), load(2));
    assert_eq!((a, b), (2, 4));

    let perf = fx.sink.lines_for(LogCategory::Log);
    assert_eq!(perf.len(), 2);
    assert_eq!(fx.sink.lines_for(LogCategory::Info).len(), 2);
}
