//! The bounded, ordered chat log shared by players and spectators.

use protocol::{MAX_CHAT_MESSAGES, MAX_MESSAGE_LENGTH, SYSTEM_SENDER_ID};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// One entry in the chat log.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub sender_id: i32,
    pub message: String,
    pub timestamp: u64,
    pub is_system: bool,
    pub is_spectator: bool,
}

/// Append-only log, bounded to [`MAX_CHAT_MESSAGES`] entries.
#[derive(Clone, Debug, Default)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
}

impl ChatLog {
    pub fn push_user(&mut self, sender_id: i32, text: &str, is_spectator: bool) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.push(sender_id, trimmed, false, is_spectator);
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.push(SYSTEM_SENDER_ID, &text.into(), true, false);
    }

    fn push(&mut self, sender_id: i32, text: &str, is_system: bool, is_spectator: bool) {
        let mut message: String = text.chars().take(MAX_MESSAGE_LENGTH).collect();
        message.retain(|c| !c.is_control() || c == ' ');
        self.messages.push_back(ChatMessage {
            sender_id,
            message,
            timestamp: now_epoch_secs(),
            is_system,
            is_spectator,
        });
        while self.messages.len() > MAX_CHAT_MESSAGES {
            self.messages.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_overlong_messages() {
        let mut log = ChatLog::default();
        let long = "x".repeat(MAX_MESSAGE_LENGTH + 50);
        log.push_user(0, &long, false);
        let entry = log.iter().next().unwrap();
        assert_eq!(entry.message.chars().count(), MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn drops_whitespace_only_messages() {
        let mut log = ChatLog::default();
        log.push_user(0, "   ", false);
        assert_eq!(log.iter().count(), 0);
    }

    #[test]
    fn evicts_oldest_past_cap() {
        let mut log = ChatLog::default();
        for i in 0..(MAX_CHAT_MESSAGES + 10) {
            log.push_user(0, &format!("msg {i}"), false);
        }
        assert_eq!(log.iter().count(), MAX_CHAT_MESSAGES);
        let first = log.iter().next().unwrap();
        assert_eq!(first.message, "msg 10");
    }

    #[test]
    fn system_messages_use_reserved_sender_id() {
        let mut log = ChatLog::default();
        log.push_system("Alice is the host");
        let entry = log.iter().next().unwrap();
        assert_eq!(entry.sender_id, SYSTEM_SENDER_ID);
        assert!(entry.is_system);
        assert!(!entry.is_spectator);
    }
}
