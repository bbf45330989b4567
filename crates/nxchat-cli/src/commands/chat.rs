//! Interactive chat: a headless widget driven from stdin.

use super::history::render;
use anyhow::{Context, Result};
use nxchat_application::{
    AlertPlayer, ChatWidget, PageContext, SendRoute, TransferResult, WidgetServices, WidgetUpdate,
};
use nxchat_core::error::Result as NxResult;
use nxchat_core::message::MessageType;
use nxchat_infrastructure::NxChatPaths;
use nxchat_interaction::{HttpWidgetApi, SocketIoClient};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "Commands: /human  /end  /clear  /quit";

/// Rings the terminal bell.
struct TerminalBell;

impl AlertPlayer for TerminalBell {
    fn play_chime(&self) -> NxResult<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }

    fn play_tone(&self) -> NxResult<()> {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07")?;
        Ok(())
    }
}

pub async fn run(paths: &NxChatPaths, page: String, title: Option<String>) -> Result<()> {
    let (config, storage) = super::open(paths)?;

    let api = HttpWidgetApi::new(&config).context("Failed to create API client")?;
    let (socket, events) = SocketIoClient::spawn(&config).context("Failed to start socket")?;
    let socket = Arc::new(socket);

    let services = WidgetServices::new(Arc::new(api), socket.clone(), storage)
        .with_alert_player(Arc::new(TerminalBell));
    let widget = ChatWidget::new(config, services).await;

    let printer = tokio::spawn(print_updates(widget.subscribe()));
    let event_loop = widget.spawn_event_loop(events);

    let mut context = PageContext::new(page);
    context.title = title;
    let flow = widget.boot(&context).await;
    tracing::debug!("[Chat] Load flow: {:?}", flow);

    widget.set_open(true).await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            "/quit" => break,
            "/end" => widget.end_chat().await,
            "/clear" => widget.clear_history().await,
            "/human" => report_transfer(widget.request_transfer("Visitor asked for a human").await),
            "/help" => println!("{HELP}"),
            text => {
                if let SendRoute::Ai {
                    transfer: Some(result),
                } = widget.send_message(text).await
                {
                    report_transfer(result);
                }
            }
        }
    }

    widget.set_open(false).await;
    widget.unload().await;
    socket.shutdown();
    event_loop.abort();
    printer.abort();
    Ok(())
}

async fn print_updates(mut updates: tokio::sync::broadcast::Receiver<WidgetUpdate>) {
    loop {
        match updates.recv().await {
            Ok(WidgetUpdate::MessageAppended(message)) => {
                // the visitor's own lines are already on screen
                if message.message_type != MessageType::User {
                    println!("{}", render(&message));
                }
            }
            Ok(WidgetUpdate::HistoryRestored(messages)) => {
                for message in &messages {
                    println!("{}", render(message));
                }
            }
            Ok(WidgetUpdate::HistoryCleared) => println!("(history cleared)"),
            Ok(WidgetUpdate::StateChanged(state)) => {
                tracing::debug!("[Chat] State: {:?}", state);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("[Chat] Display fell behind by {} update(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn report_transfer(result: TransferResult) {
    if result == TransferResult::Requested {
        println!("(waiting for an agent to join)");
    }
}
