// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! The transport session driver: owns the WebSocket connection, the
//! reconnect-with-backoff loop, the heartbeat, and the outbound queue.
//!
//! Modeled on the upstream feed's reconnect loop: a single task drives the
//! whole connection lifecycle, `tokio::select!`-ing the socket against a
//! `CancellationToken` and a control channel, so nothing here needs a lock.

use std::sync::Arc;

use aivory_core::Config;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::backoff;
use crate::commands::InboundCommand;
use crate::connect::{self, RegistrationOutcome};
use crate::queue::OutboundQueue;
use crate::state::ConnectionState;
use crate::wire;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Capacity of the `command_sink` channel carrying decoded breakpoint
/// instructions out to the debugger session. Sized generously since the
/// read path must never block on a slow consumer (§4.C dispatch contract).
const COMMAND_CHANNEL_CAPACITY: usize = 256;

enum Control {
    Send(String, serde_json::Value),
    Shutdown,
}

/// A cheap, cloneable handle to a running transport session.
#[derive(Clone)]
pub struct TransportHandle {
    control_tx: mpsc::UnboundedSender<Control>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl TransportHandle {
    /// Enqueue an outbound message. Non-blocking: admission into the wire
    /// or the bounded buffer happens on the session task.
    pub fn send(&self, kind: impl Into<String>, payload: serde_json::Value) {
        let _ = self.control_tx.send(Control::Send(kind.into(), payload));
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn shutdown(&self) {
        let _ = self.control_tx.send(Control::Shutdown);
    }
}

/// Spawn the session driver task. Returns a handle for sending/observing
/// state, a receiver for commands decoded off the wire, and the
/// `CancellationToken` that tears the task down from the outside (used by
/// the agent's teardown ordering).
pub fn spawn(config: Arc<Config>) -> (TransportHandle, mpsc::Receiver<InboundCommand>, CancellationToken) {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let cancel = CancellationToken::new();

    let handle = TransportHandle { control_tx, state_rx };
    let task_cancel = cancel.clone();
    tokio::spawn(run(config, control_rx, command_tx, state_tx, task_cancel));

    (handle, command_rx, cancel)
}

async fn run(
    config: Arc<Config>,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    command_tx: mpsc::Sender<InboundCommand>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut queue = OutboundQueue::new(crate::queue::DEFAULT_CAPACITY);
    let mut attempt: u32 = 0;
    let mut reconnect_enabled = true;

    loop {
        if cancel.is_cancelled() {
            break;
        }
        if !reconnect_enabled {
            tracing::warn!("reconnect disabled after credential rejection, transport idle");
            break;
        }
        if attempt > backoff::MAX_ATTEMPTS {
            tracing::warn!(attempt, "max reconnect attempts reached, giving up");
            break;
        }
        if attempt > 0 {
            let delay = backoff::delay(attempt);
            tracing::debug!(?delay, attempt, "waiting before reconnect attempt");
            if !wait_or_drain(delay, &mut control_rx, &mut queue, &cancel).await {
                break;
            }
        }

        let _ = state_tx.send(ConnectionState::Connecting);
        let connect_fut = connect::connect_and_register(&config);
        tokio::pin!(connect_fut);
        let connected = loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                result = &mut connect_fut => break result,
                ctl = control_rx.recv() => {
                    match ctl {
                        Some(ctl) => {
                            if !handle_pre_registration_control(ctl, &mut queue) {
                                return;
                            }
                        }
                        None => return,
                    }
                }
            }
        };

        let (mut sink, mut source) = match connected {
            Ok(pair) => pair,
            Err(err) => {
                tracing::debug!(%err, "connect failed");
                let _ = state_tx.send(ConnectionState::Disconnected);
                attempt += 1;
                continue;
            }
        };
        let _ = state_tx.send(ConnectionState::Connected);

        let outcome = {
            let registration_fut = connect::await_registration(&mut source);
            tokio::pin!(registration_fut);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = &mut registration_fut => break result,
                    ctl = control_rx.recv() => {
                        match ctl {
                            Some(ctl) => {
                                if !handle_pre_registration_control(ctl, &mut queue) {
                                    return;
                                }
                            }
                            None => return,
                        }
                    }
                }
            }
        };

        match outcome {
            RegistrationOutcome::Registered => {
                tracing::info!(agent_id = %config.identity.agent_id, "registered with collector");
                attempt = 0;
                let _ = state_tx.send(ConnectionState::Registered);
                for message in queue.drain() {
                    if let Some(frame) = wire::encode(&message) {
                        if sink.send(frame).await.is_err() {
                            break;
                        }
                    }
                }

                let disconnect_reason = run_registered(
                    &config,
                    &mut sink,
                    &mut source,
                    &mut control_rx,
                    &command_tx,
                    &mut queue,
                    &cancel,
                )
                .await;

                let _ = state_tx.send(ConnectionState::Disconnected);
                match disconnect_reason {
                    DisconnectReason::Cancelled => return,
                    DisconnectReason::AuthRejected => {
                        reconnect_enabled = false;
                        continue;
                    }
                    DisconnectReason::SocketClosed => {
                        attempt += 1;
                        continue;
                    }
                }
            }
            RegistrationOutcome::AuthRejected => {
                tracing::warn!("collector rejected credentials, disabling reconnect");
                let _ = state_tx.send(ConnectionState::Disconnected);
                reconnect_enabled = false;
            }
            RegistrationOutcome::Failed => {
                let _ = state_tx.send(ConnectionState::Disconnected);
                attempt += 1;
            }
        }
    }
}

/// Sleep for `delay`, draining any `Control::Send` into `queue` meanwhile.
/// Returns `false` if cancelled or shut down during the wait.
async fn wait_or_drain(
    delay: Duration,
    control_rx: &mut mpsc::UnboundedReceiver<Control>,
    queue: &mut OutboundQueue,
    cancel: &CancellationToken,
) -> bool {
    let sleep_fut = sleep(delay);
    tokio::pin!(sleep_fut);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = &mut sleep_fut => return true,
            ctl = control_rx.recv() => {
                match ctl {
                    Some(ctl) => {
                        if !handle_pre_registration_control(ctl, queue) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
    }
}

/// Apply a control message received before `Registered`: sends are always
/// queued (admission requires `Registered`), shutdown stops the session.
fn handle_pre_registration_control(ctl: Control, queue: &mut OutboundQueue) -> bool {
    match ctl {
        Control::Send(kind, payload) => {
            queue.push(wire::stamped(kind, payload));
            true
        }
        Control::Shutdown => false,
    }
}

#[derive(Debug)]
enum DisconnectReason {
    Cancelled,
    AuthRejected,
    SocketClosed,
}

/// The steady-state `Registered` loop: heartbeats, inbound dispatch, and
/// outbound sends all interleave here until the socket drops or we're told
/// to stop.
async fn run_registered(
    config: &Config,
    sink: &mut connect::WsSink,
    source: &mut connect::WsSource,
    control_rx: &mut mpsc::UnboundedReceiver<Control>,
    command_tx: &mpsc::Sender<InboundCommand>,
    queue: &mut OutboundQueue,
    cancel: &CancellationToken,
) -> DisconnectReason {
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return DisconnectReason::Cancelled,
            _ = heartbeat.tick() => {
                let message = wire::heartbeat_message(config);
                if let Some(frame) = wire::encode(&message) {
                    if sink.send(frame).await.is_err() {
                        return DisconnectReason::SocketClosed;
                    }
                }
            }
            ctl = control_rx.recv() => {
                match ctl {
                    Some(Control::Send(kind, payload)) => {
                        let message = wire::stamped(kind, payload);
                        let Some(frame) = wire::encode(&message) else { continue };
                        if sink.send(frame).await.is_err() {
                            return DisconnectReason::SocketClosed;
                        }
                    }
                    Some(Control::Shutdown) | None => return DisconnectReason::Cancelled,
                }
            }
            incoming = source.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(reason) = dispatch_inbound(&text, command_tx).await {
                            return reason;
                        }
                    }
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {}
                    Some(Ok(WsMessage::Close(_))) | None => return DisconnectReason::SocketClosed,
                    Some(Err(err)) => {
                        tracing::debug!(%err, "socket read error");
                        return DisconnectReason::SocketClosed;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Decode and route one inbound frame. Returns `Some(reason)` when the
/// frame forces the connection down (an auth error arriving mid-session).
async fn dispatch_inbound(text: &str, command_tx: &mpsc::Sender<InboundCommand>) -> Option<DisconnectReason> {
    let message = wire::decode(text)?;
    match message.kind.as_str() {
        "registered" => {
            tracing::debug!("ignoring duplicate registered ack");
            None
        }
        "error" => {
            let code = message.payload.get("code").and_then(|v| v.as_str()).unwrap_or("");
            if matches!(code, "auth_error" | "invalid_api_key") {
                tracing::warn!(code, "collector revoked credentials mid-session");
                Some(DisconnectReason::AuthRejected)
            } else {
                tracing::debug!(code, "collector reported a non-fatal error");
                None
            }
        }
        "set_breakpoint" | "remove_breakpoint" => {
            match InboundCommand::from_payload(&message.kind, &message.payload) {
                Some(command) => {
                    if command_tx.try_send(command).is_err() {
                        tracing::warn!("command sink full or closed, dropping inbound command");
                    }
                }
                None => tracing::debug!(kind = %message.kind, "malformed inbound command payload"),
            }
            None
        }
        other => {
            tracing::debug!(kind = other, "ignoring unrecognized message type");
            None
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
