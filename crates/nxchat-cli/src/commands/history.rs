use anyhow::{Context, Result};
use nxchat_core::message::{Message, MessageHistory};
use nxchat_core::storage::{ClientStorage, StorageScope, keys};
use nxchat_infrastructure::NxChatPaths;

pub async fn show(paths: &NxChatPaths) -> Result<()> {
    let (config, storage) = super::open(paths)?;
    let raw = storage
        .get(StorageScope::Durable, &keys::history(&config.tenant_id))
        .await
        .context("Failed to read history")?;

    let history = MessageHistory::restore(raw.as_deref());
    if history.is_empty() {
        println!("No messages for tenant {}", config.tenant_id);
        return Ok(());
    }
    for message in history.messages() {
        println!("{}", render(message));
    }
    Ok(())
}

pub async fn clear(paths: &NxChatPaths) -> Result<()> {
    let (config, storage) = super::open(paths)?;
    storage
        .remove(StorageScope::Durable, &keys::history(&config.tenant_id))
        .await
        .context("Failed to clear history")?;
    println!("History cleared for tenant {}", config.tenant_id);
    Ok(())
}

/// One line per message: `[timestamp] type: content`.
pub(crate) fn render(message: &Message) -> String {
    let kind = label(message);
    format!("[{}] {}: {}", message.timestamp, kind, message.content)
}

fn label(message: &Message) -> &'static str {
    use nxchat_core::message::MessageType;
    match message.message_type {
        MessageType::User => "you",
        MessageType::Bot => "assistant",
        MessageType::Agent => "agent",
        MessageType::System => "system",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxchat_core::identity::VisitorIdentity;
    use nxchat_core::message::MessageType;

    #[test]
    fn test_render() {
        let identity = VisitorIdentity {
            visitor_id: "visitor_a_1".into(),
            session_id: "session_1_a".into(),
        };
        let mut message = Message::new(MessageType::Agent, "On it!", &identity);
        message.timestamp = "2026-01-01T00:00:00+00:00".into();
        assert_eq!(render(&message), "[2026-01-01T00:00:00+00:00] agent: On it!");
    }
}
