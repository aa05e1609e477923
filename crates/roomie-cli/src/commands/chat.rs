//! Real-time chat client over the server's WebSocket channel.

use std::time::Duration;

use clap::{Args, Subcommand};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use roomie_core::config::AppConfig;
use roomie_core::error::{AppError, ErrorKind};
use roomie_core::types::UserId;
use roomie_realtime::message::types::{InboundMessage, OutboundMessage};

use crate::output;

/// Arguments for chat commands
#[derive(Debug, Args)]
pub struct ChatArgs {
    /// WebSocket URL; defaults to the configured server address
    #[arg(long)]
    pub url: Option<String>,

    /// Chat subcommand
    #[command(subcommand)]
    pub command: ChatCommand,
}

/// Chat subcommands
#[derive(Debug, Subcommand)]
pub enum ChatCommand {
    /// Go online and print presence changes and incoming messages
    Listen {
        /// Identity to announce
        #[arg(long)]
        user_id: String,
    },
    /// Go online, send one message, then disconnect
    Send {
        /// Sender identity
        #[arg(long)]
        from: String,
        /// Recipient identity
        #[arg(long)]
        to: String,
        /// Message body
        #[arg(long)]
        text: String,
    },
}

/// WebSocket URL for the configured server.
pub fn default_ws_url(config: &AppConfig) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        host => host,
    };
    format!("ws://{host}:{}/ws", config.server.port)
}

fn frame(msg: &InboundMessage) -> Result<Message, AppError> {
    Ok(Message::text(serde_json::to_string(msg)?))
}

fn ws_error(e: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::ExternalService, "WebSocket failure", e)
}

fn print_event(msg: &OutboundMessage) {
    match msg {
        OutboundMessage::OnlineUserListChanged { user_ids } => {
            let names: Vec<&str> = user_ids.iter().map(UserId::as_str).collect();
            println!("[online] {}", names.join(", "));
        }
        OutboundMessage::IncomingChatMessage { sender_id, text } => {
            println!("[{sender_id}] {text}");
        }
        OutboundMessage::Error { code, message } => {
            output::print_warning(&format!("{code}: {message}"));
        }
        OutboundMessage::Ping { .. } => {}
    }
}

/// Execute chat commands
pub async fn execute(args: &ChatArgs, config: &AppConfig) -> Result<(), AppError> {
    let url = args.url.clone().unwrap_or_else(|| default_ws_url(config));
    let (ws, _) = connect_async(url.as_str()).await.map_err(ws_error)?;
    let (mut tx, mut rx) = ws.split();
    debug!(url = %url, "Connected");

    match &args.command {
        ChatCommand::Listen { user_id } => {
            tx.send(frame(&InboundMessage::AnnounceIdentity {
                user_id: UserId::new(user_id.clone()),
            })?)
            .await
            .map_err(ws_error)?;
            output::print_success(&format!("Online as {user_id}, Ctrl+C to quit"));

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    next = rx.next() => match next {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<OutboundMessage>(text.as_str()) {
                                Ok(OutboundMessage::Ping { timestamp }) => {
                                    tx.send(frame(&InboundMessage::Pong { timestamp })?)
                                        .await
                                        .map_err(ws_error)?;
                                }
                                Ok(msg) => print_event(&msg),
                                Err(e) => debug!(error = %e, "Ignoring unknown frame"),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            output::print_warning("Server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(ws_error(e)),
                    },
                }
            }
        }
        ChatCommand::Send { from, to, text } => {
            let sender_id = UserId::new(from.clone());
            tx.send(frame(&InboundMessage::AnnounceIdentity {
                user_id: sender_id.clone(),
            })?)
            .await
            .map_err(ws_error)?;
            tx.send(frame(&InboundMessage::SendChatMessage {
                sender_id,
                receiver_id: UserId::new(to.clone()),
                text: text.clone(),
            })?)
            .await
            .map_err(ws_error)?;

            // give the server a moment to report a protocol error
            let deadline = tokio::time::sleep(Duration::from_millis(300));
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    next = rx.next() => match next {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(OutboundMessage::Error { code, message }) =
                                serde_json::from_str::<OutboundMessage>(text.as_str())
                            {
                                return Err(AppError::validation(format!("{code}: {message}")));
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    },
                }
            }
            output::print_success(&format!("Sent to {to}"));
        }
    }

    let _ = tx.send(Message::Close(None)).await;
    Ok(())
}
