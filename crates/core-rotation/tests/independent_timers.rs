//! Timer-driven behaviour through the registry, on paused tokio time.

use core_config::{Config, OptionOverrides};
use core_events::{EVENT_CHANNEL_CAP, ElementId, Event};
use core_rotation::{Dispatch, InitOutcome, MemoryHost, Operation, Phase, WidgetRegistry};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until, timeout};

const A: ElementId = ElementId(1);
const B: ElementId = ElementId(2);

/// Pump events into the registry until `until`, counting ticks per element.
async fn pump(
    reg: &mut WidgetRegistry<MemoryHost>,
    rx: &mut mpsc::Receiver<Event>,
    until: Instant,
) -> HashMap<ElementId, usize> {
    let mut counts = HashMap::new();
    loop {
        tokio::select! {
            ev = rx.recv() => {
                let ev = ev.expect("registry holds a sender");
                if let Event::Tick(id, _) = ev {
                    *counts.entry(id).or_insert(0) += 1;
                }
                reg.handle_event(&ev);
            }
            _ = sleep_until(until) => break,
        }
    }
    counts
}

#[tokio::test(start_paused = true)]
async fn two_instances_tick_at_their_own_periods() {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let mut reg = WidgetRegistry::new(Config::default(), tx);
    reg.init_if_absent(
        A,
        MemoryHost::new("a,b,c"),
        &OptionOverrides::new().with_interval_ms(100),
    );
    reg.init_if_absent(
        B,
        MemoryHost::new("w,x,y,z"),
        &OptionOverrides::new().with_interval_ms(250),
    );

    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(1050)).await;

    assert_eq!(counts.get(&A), Some(&10));
    assert_eq!(counts.get(&B), Some(&4));
    assert_eq!(reg.get(A).unwrap().active_index(), 10 % 3);
    assert_eq!(reg.get(B).unwrap().active_index(), 4 % 4);
}

#[tokio::test(start_paused = true)]
async fn first_tick_is_delayed_by_one_interval() {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let mut reg = WidgetRegistry::new(Config::default(), tx);
    reg.init_if_absent(A, MemoryHost::new("a,b"), &OptionOverrides::new());

    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(1999)).await;
    assert!(counts.is_empty());
    assert_eq!(reg.get(A).unwrap().active_index(), 0);

    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(2)).await;
    assert_eq!(counts.get(&A), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn passthrough_starts_no_timer() {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let mut reg = WidgetRegistry::new(Config::default(), tx);
    assert_eq!(
        reg.init_if_absent(A, MemoryHost::new("OnlyOnePhrase"), &OptionOverrides::new()),
        InitOutcome::Initialized(Phase::Passthrough)
    );
    assert!(timeout(Duration::from_secs(30), rx.recv()).await.is_err());
    assert_eq!(reg.invoke(A, Operation::Start), Dispatch::Ignored);
    assert_eq!(reg.invoke(A, Operation::Tick), Dispatch::Ignored);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_drops_late_ticks() {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let late = tx.clone();
    let mut reg = WidgetRegistry::new(Config::default(), tx);
    reg.init_if_absent(
        A,
        MemoryHost::new("a,b,c"),
        &OptionOverrides::new().with_interval_ms(50),
    );

    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(60)).await;
    assert_eq!(counts.get(&A), Some(&1));
    let generation = reg.get(A).unwrap().generation();

    assert_eq!(reg.invoke(A, Operation::Stop), Dispatch::Applied);
    assert_eq!(reg.invoke_named(A, "stop"), Dispatch::Ignored);
    assert_eq!(reg.get(A).unwrap().phase(), Phase::Stopped);

    // A tick already queued before the stop is dropped.
    late.send(Event::Tick(A, generation)).await.unwrap();
    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(500)).await;
    assert_eq!(counts.get(&A), Some(&1));
    assert_eq!(reg.get(A).unwrap().active_index(), 1);

    // Resume.
    assert_eq!(reg.invoke(A, Operation::Start), Dispatch::Applied);
    assert_eq!(reg.invoke(A, Operation::Start), Dispatch::Ignored);
    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(110)).await;
    assert_eq!(counts.get(&A), Some(&2));
    assert_eq!(reg.get(A).unwrap().active_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn restart_ignores_ticks_queued_by_the_old_timer() {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let mut reg = WidgetRegistry::new(Config::default(), tx);
    reg.init_if_absent(
        A,
        MemoryHost::new("a,b,c"),
        &OptionOverrides::new().with_interval_ms(100),
    );
    let old = reg.get(A).unwrap().generation();

    // Let the first timer queue a tick without consuming it.
    tokio::time::sleep(Duration::from_millis(101)).await;
    assert_eq!(reg.invoke(A, Operation::Stop), Dispatch::Applied);
    assert_eq!(reg.invoke(A, Operation::Start), Dispatch::Applied);
    assert_ne!(reg.get(A).unwrap().generation(), old);

    let mut applied = 0;
    while let Ok(ev) = rx.try_recv() {
        assert_eq!(ev, Event::Tick(A, old));
        if reg.handle_event(&ev) == Dispatch::Applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 0);
    assert_eq!(reg.get(A).unwrap().active_index(), 0);

    // The new timer still fires one full interval after the restart.
    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(99)).await;
    assert!(counts.is_empty());
    let counts = pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(2)).await;
    assert_eq!(counts.get(&A), Some(&1));
    assert_eq!(reg.get(A).unwrap().active_index(), 1);
}

#[tokio::test(start_paused = true)]
async fn dispose_returns_host_and_unbinds() {
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let mut reg = WidgetRegistry::new(Config::default(), tx);
    reg.init_if_absent(
        A,
        MemoryHost::new("a,b,c"),
        &OptionOverrides::new().with_interval_ms(10),
    );
    pump(&mut reg, &mut rx, Instant::now() + Duration::from_millis(15)).await;

    let host = reg.dispose(A).expect("bound host");
    assert_eq!(host.class_list(), vec!["prev", "active", "next"]);
    assert!(!reg.contains(A));
    assert_eq!(reg.handle_tick(A, 1), Dispatch::Ignored);
    assert!(reg.dispose(A).is_none());

    // Rebinding after dispose starts a fresh widget.
    assert_eq!(
        reg.init_if_absent(A, MemoryHost::new("x,y"), &OptionOverrides::new()),
        InitOutcome::Initialized(Phase::Rotating)
    );
    assert_eq!(reg.stop_all(), 1);
    assert_eq!(reg.stop_all(), 0);
}
