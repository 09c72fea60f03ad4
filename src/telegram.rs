// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Telegram delivery of analysis reports.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Option<Bot>,
    chat_id: Option<ChatId>,
}

impl TelegramNotifier {
    pub fn new(token: Option<String>, chat_id: Option<String>) -> Self {
        info!(
            "📱 Initializing Telegram: token={}, chat_id={}",
            token.as_ref().map(|_| "SET").unwrap_or("NONE"),
            chat_id.as_ref().map(|_| "SET").unwrap_or("NONE")
        );

        let bot = token.map(Bot::new);
        let chat_id = chat_id.and_then(|id| match id.trim().parse::<i64>() {
            Ok(num) => Some(ChatId(num)),
            Err(_) => {
                warn!("⚠️ TELEGRAM_CHAT_ID {} is not numeric, delivery disabled", id);
                None
            }
        });

        Self { bot, chat_id }
    }

    pub fn is_enabled(&self) -> bool {
        self.bot.is_some() && self.chat_id.is_some()
    }

    /// Send a Markdown report. A no-op when Telegram is not configured.
    pub async fn send_report(&self, message: &str) {
        if let (Some(bot), Some(chat_id)) = (&self.bot, &self.chat_id) {
            let result = bot
                .send_message(*chat_id, message)
                .parse_mode(ParseMode::Markdown)
                .await;
            match result {
                Ok(_) => info!("📤 Sent Telegram report"),
                Err(e) => error!("Failed to send Telegram report: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_settings() {
        assert!(!TelegramNotifier::new(None, None).is_enabled());
        assert!(!TelegramNotifier::new(Some("123:abc".into()), None).is_enabled());
    }

    #[test]
    fn test_non_numeric_chat_id_disables() {
        let notifier = TelegramNotifier::new(Some("123:abc".into()), Some("@channel".into()));
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn test_enabled_with_both_settings() {
        let notifier = TelegramNotifier::new(Some("123:abc".into()), Some("-1001234".into()));
        assert!(notifier.is_enabled());
    }
}
