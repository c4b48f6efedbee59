// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Establishing the WebSocket connection and the `register` handshake
//! (§4.B, §6: "authenticated at connect with a bearer credential header").

use std::time::Duration;

use aivory_core::Config;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::wire;

pub type WsSink = futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, WsMessage>;
pub type WsSource = futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// How long to wait for a `registered` (or `error`) reply after `register`
/// is sent, before treating the attempt as failed.
pub const REGISTER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum ConnectError {
    Transport(String),
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// The outcome of waiting for the collector's reply to `register`.
pub enum RegistrationOutcome {
    Registered,
    /// The collector rejected the credential; reconnecting would not help.
    AuthRejected,
    /// The socket closed, or sent something other than `registered`/`error`.
    Failed,
}

/// Open the WebSocket connection and send `register` immediately, per the
/// `Connecting -> Connected` transition.
pub async fn connect_and_register(config: &Config) -> Result<(WsSink, WsSource), ConnectError> {
    let mut request = config
        .collector_url
        .as_str()
        .into_client_request()
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    let header_value = format!("Bearer {}", config.api_key)
        .parse()
        .map_err(|_| ConnectError::Transport("api key is not a valid header value".to_owned()))?;
    request.headers_mut().insert("Authorization", header_value);

    let (stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    let (mut sink, source) = stream.split();
    let register = wire::register_message(config);
    let frame = wire::encode(&register).ok_or_else(|| ConnectError::Transport("failed to encode register message".to_owned()))?;
    sink.send(frame).await.map_err(|e| ConnectError::Transport(e.to_string()))?;

    Ok((sink, source))
}

/// Wait for the collector's `registered` / `error` reply, bounded by
/// [`REGISTER_TIMEOUT`].
pub async fn await_registration(source: &mut WsSource) -> RegistrationOutcome {
    match tokio::time::timeout(REGISTER_TIMEOUT, wait_for_reply(source)).await {
        Ok(outcome) => outcome,
        Err(_) => RegistrationOutcome::Failed,
    }
}

async fn wait_for_reply(source: &mut WsSource) -> RegistrationOutcome {
    loop {
        match source.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                let Some(message) = wire::decode(&text) else { continue };
                match message.kind.as_str() {
                    "registered" => return RegistrationOutcome::Registered,
                    "error" => {
                        let code = message.payload.get("code").and_then(|v| v.as_str()).unwrap_or("");
                        return if matches!(code, "auth_error" | "invalid_api_key") {
                            RegistrationOutcome::AuthRejected
                        } else {
                            RegistrationOutcome::Failed
                        };
                    }
                    other => {
                        tracing::debug!(kind = other, "ignoring message received before registration ack");
                    }
                }
            }
            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
            _ => return RegistrationOutcome::Failed,
        }
    }
}
