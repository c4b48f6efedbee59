// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! End-to-end scenarios driven entirely through the public `aivory-agent`
//! API: `init`, `capture_exception`, `shutdown`, against a real WebSocket
//! collector and a scripted debugger link. The rate-limit and
//! reconnect/queue-drain scenarios are exercised at the crate level
//! (`aivory-debugger`'s `ratelimit_tests.rs`, `aivory-transport`'s
//! `session_tests.rs`/`queue_tests.rs`/`backoff_tests.rs`) rather than
//! re-run here, since they need to control time and socket drops more
//! directly than the public API exposes.
//!
//! `paused_exception`'s `uncaught` flag distinguishes a caught exception
//! (harvested for a later manual `capture_exception` lookup, S1) from an
//! uncaught one (auto-reported by the debugger path itself, S4) the same way
//! a real inspector's `Debugger.paused.data.uncaught` field would.

use std::sync::Arc;
use std::time::Duration;

use aivory_debugger::{InspectorEvent, PauseReason, PausedEvent};
use aivory_pipeline::{HookKind, RawException};
use aivory_specs::{call_frame, fake_collector, fake_collector_with, number_property, paused_exception, string_property};
use serial_test::serial;

fn boom(stack_text: &str) -> RawException {
    RawException { exception_type: "Error".to_owned(), message: "boom".to_owned(), stack_text: stack_text.to_owned() }
}

/// S1: a caught exception, manually reported, picks up locals the debugger
/// link harvested from a matching pause.
#[tokio::test]
#[serial]
async fn caught_exception_reports_harvested_locals() -> anyhow::Result<()> {
    let (collector_url, server) = fake_collector(1).await?;
    let inspector = Arc::new(aivory_specs::FakeInspectorLink::new());
    let hooks = Arc::new(aivory_specs::RecordingHookSource::new());

    aivory_agent::init(aivory_specs::test_options(collector_url), inspector.clone(), hooks).await?;

    let stack_text = "Error: boom\nat run (/app/a.js:9:1)";
    inspector
        .push_event(paused_exception(
            stack_text,
            "Error",
            vec![call_frame("run", "/app/a.js", 8, "scope-1")],
            false,
        ))
        .await;
    inspector.with_properties("scope-1", vec![number_property("x", 42), string_property("y", "hello")]).await;

    // Give the debugger task a moment to pop the event and complete the harvest.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let capture = aivory_agent::capture_exception(&boom(stack_text), None)
        .await
        .ok_or_else(|| anyhow::anyhow!("sampling rate defaults to 1.0, capture should not be dropped"))?;
    assert_eq!(capture.exception_type, "Error");
    assert_eq!(capture.message, "boom");
    assert_eq!(capture.local_variables.get("x").map(|v| v.value.as_str()), Some("42"));
    assert_eq!(capture.local_variables.get("y").map(|v| v.value.as_str()), Some("hello"));
    assert!(capture.stack_trace[0].line_number > 0);

    let frames = tokio::time::timeout(Duration::from_secs(2), server).await??;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("\"exception\""));

    aivory_agent::shutdown().await;
    Ok(())
}

/// S2: an uncaught exception with no prior handler is reported, then the
/// process is scheduled to exit after the transport has had time to flush.
#[tokio::test]
#[serial]
async fn uncaught_exception_reports_then_schedules_exit() -> anyhow::Result<()> {
    let (collector_url, server) = fake_collector(1).await?;
    let inspector = Arc::new(aivory_specs::FakeInspectorLink::new());
    let hooks = Arc::new(aivory_specs::RecordingHookSource::new());

    aivory_agent::init(aivory_specs::test_options(collector_url), inspector, hooks.clone()).await?;

    hooks
        .fire(
            HookKind::UncaughtException,
            RawException {
                exception_type: "TypeError".to_owned(),
                message: "boom".to_owned(),
                stack_text: "TypeError: boom\nat run (/app/a.js:9:1)".to_owned(),
            },
        )
        .await;

    let frames = tokio::time::timeout(Duration::from_secs(2), server).await??;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("\"exception_type\":\"TypeError\""));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(hooks.exit_calls().await, vec![1]);

    aivory_agent::shutdown().await;
    Ok(())
}

/// S4: the debugger path and the hook path both observe the same uncaught
/// exception. The debugger path reports it as soon as it harvests locals off
/// the pause, and the later hook-path firing for the same fingerprint is
/// suppressed — exactly one outbound message, not two and not zero.
#[tokio::test]
#[serial]
async fn hook_path_suppresses_a_fingerprint_already_seen_by_the_debugger() -> anyhow::Result<()> {
    let (collector_url, server) = fake_collector(1).await?;
    let inspector = Arc::new(aivory_specs::FakeInspectorLink::new());
    let hooks = Arc::new(aivory_specs::RecordingHookSource::new());

    aivory_agent::init(aivory_specs::test_options(collector_url), inspector.clone(), hooks.clone()).await?;

    let stack_text = "Error: boom\nat run (/app/a.js:9:1)";
    inspector
        .push_event(paused_exception(stack_text, "Error", vec![call_frame("run", "/app/a.js", 8, "scope-1")], true))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    hooks.fire(HookKind::UncaughtException, boom(stack_text)).await;

    let frames = tokio::time::timeout(Duration::from_secs(2), server).await??;
    assert_eq!(frames.len(), 1, "exactly one report should have been sent, not zero and not two");
    assert!(frames[0].contains("\"exception\""));

    aivory_agent::shutdown().await;
    Ok(())
}

/// S7: a remote `set_breakpoint` command reaches the debugger over the real
/// wire protocol, and a pause matching the resulting session id is reported
/// as `breakpoint_hit` with its captured locals.
#[tokio::test]
#[serial]
async fn remote_breakpoint_install_and_hit_round_trips() -> anyhow::Result<()> {
    let set_breakpoint = serde_json::json!({
        "type": "set_breakpoint",
        "payload": {"id": "b1", "file_path": "src/foo.js", "line_number": 10},
        "timestamp": 0,
    })
    .to_string();
    let (collector_url, server) = fake_collector_with(1, Some(set_breakpoint)).await?;

    let inspector = Arc::new(aivory_specs::FakeInspectorLink::new());
    let hooks = Arc::new(aivory_specs::RecordingHookSource::new());
    aivory_agent::init(aivory_specs::test_options(collector_url), inspector.clone(), hooks).await?;

    // Give the transport time to decode the inbound command and the
    // debugger time to install the breakpoint and hand back a session id.
    tokio::time::sleep(Duration::from_millis(50)).await;

    inspector
        .push_event(InspectorEvent::Paused(PausedEvent {
            reason: PauseReason::BreakpointHit,
            call_frames: vec![call_frame("foo", "src/foo.js", 9, "scope-1")],
            exception_type: None,
            exception_description: None,
            exception_uncaught: false,
            hit_breakpoint_ids: vec!["dbg-session-0".to_owned()],
        }))
        .await;
    inspector.with_properties("scope-1", vec![number_property("count", 7)]).await;

    let frames = tokio::time::timeout(Duration::from_secs(2), server).await??;
    assert_eq!(frames.len(), 1);
    let frame: serde_json::Value = serde_json::from_str(&frames[0])?;
    assert_eq!(frame["type"], "breakpoint_hit");
    assert_eq!(frame["payload"]["breakpoint_id"], "b1");
    assert_eq!(frame["payload"]["local_variables"]["count"]["value"], "7");

    aivory_agent::shutdown().await;
    Ok(())
}
