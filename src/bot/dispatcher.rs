//! Conversation rules.
//!
//! Decides how to answer one incoming message. Rules are checked in order
//! and the first one that matches wins:
//!
//! 1. greeting word, not a number, sender has no menu yet: send the menu
//! 2. exactly `0`: start over and send the menu
//! 3. exactly an option code: send that option's instructions
//! 4. mentions `menu` or `volver`: start over and send the reset notice
//! 5. anything else: stay silent

use lazy_static::lazy_static;
use regex::Regex;

use crate::bot::menu::MenuStateStore;
use crate::bot::replies::{self, GO_BACK_OPTION};
use crate::types::{IncomingMessage, JID};

lazy_static! {
    static ref GREETING_RE: Regex = Regex::new(
        r"(?i)\b(buen|buenos|menu|menú|días|dias|tardes|quiero|puedo|tengo|noches|consulta|horario|horário|hola|olá)\b"
    )
    .expect("valid greeting regex");
}

const RESET_KEYWORDS: [&str; 2] = ["menu", "volver"];

/// What to do in response to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stay silent.
    Ignore,
    /// Send the greeting menu and remember the sender has it.
    SendMenu,
    /// Send the instructions for an option.
    SendCannedReply(&'static str),
    /// Forget the sender's menu and tell them how to get it back.
    SendResetNotice,
}

/// Trimmed, lower-cased message text.
pub fn normalize(body: Option<&str>) -> String {
    body.unwrap_or("").trim().to_lowercase()
}

/// Sender identity of a message, if it comes from a one-to-one chat.
pub fn direct_sender(message: &IncomingMessage) -> Option<JID> {
    message
        .from
        .parse::<JID>()
        .ok()
        .filter(JID::is_direct_chat)
}

pub fn is_greeting(body: &str) -> bool {
    GREETING_RE.is_match(body)
}

fn is_numeric(body: &str) -> bool {
    !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit())
}

/// Choose the action for `message` given who has already seen the menu.
///
/// Never mutates `menus`; state changes are part of carrying out the action.
pub fn decide(menus: &MenuStateStore, message: &IncomingMessage) -> Action {
    let Some(sender) = direct_sender(message) else {
        return Action::Ignore;
    };
    let body = normalize(message.body.as_deref());

    if is_greeting(&body) && !is_numeric(&body) && !menus.has_received_menu(&sender) {
        return Action::SendMenu;
    }

    if body == GO_BACK_OPTION {
        return Action::SendMenu;
    }

    if let Some(text) = replies::canned_reply(&body) {
        return Action::SendCannedReply(text);
    }

    if RESET_KEYWORDS.iter().any(|kw| body.contains(kw)) {
        return Action::SendResetNotice;
    }

    Action::Ignore
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::replies::CANNED_REPLIES;

    const ANA: &str = "34600000001@c.us";

    fn msg(from: &str, body: &str) -> IncomingMessage {
        IncomingMessage::new(from, Some(body.to_string()))
    }

    fn ana() -> JID {
        ANA.parse().unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Some("  HoLa Buenas \n")), "hola buenas");
        assert_eq!(normalize(None), "");
    }

    #[test]
    fn test_greetings_send_menu_to_new_sender() {
        let menus = MenuStateStore::new();
        for body in [
            "Hola",
            "buenos días",
            "Buenas tardes, tengo una consulta",
            "MENU",
            "menú",
            "quiero saber el horario",
            "olá",
            "días",
            "Horário?",
            "¿Puedo llevar la llave?",
        ] {
            assert_eq!(decide(&menus, &msg(ANA, body)), Action::SendMenu, "{body}");
        }
    }

    #[test]
    fn test_greeting_needs_whole_word() {
        let menus = MenuStateStore::new();
        assert_eq!(decide(&menus, &msg(ANA, "holaaa")), Action::Ignore);
        assert_eq!(decide(&menus, &msg(ANA, "chola")), Action::Ignore);
        assert_eq!(decide(&menus, &msg(ANA, "mediodías")), Action::Ignore);
    }

    #[test]
    fn test_greeting_is_ignored_once_menu_sent() {
        let menus = MenuStateStore::new();
        menus.mark_menu_sent(&ana());
        assert_eq!(decide(&menus, &msg(ANA, "hola")), Action::Ignore);
        assert_eq!(decide(&menus, &msg(ANA, "buenas noches")), Action::Ignore);
    }

    #[test]
    fn test_zero_always_sends_menu() {
        let menus = MenuStateStore::new();
        assert_eq!(decide(&menus, &msg(ANA, "0")), Action::SendMenu);
        assert_eq!(decide(&menus, &msg(ANA, " 0 ")), Action::SendMenu);

        menus.mark_menu_sent(&ana());
        assert_eq!(decide(&menus, &msg(ANA, "0")), Action::SendMenu);
    }

    #[test]
    fn test_every_option_returns_its_reply() {
        let menus = MenuStateStore::new();
        for &(code, text) in CANNED_REPLIES {
            assert_eq!(
                decide(&menus, &msg(ANA, code)),
                Action::SendCannedReply(text)
            );
        }
    }

    #[test]
    fn test_unknown_codes_stay_silent() {
        let menus = MenuStateStore::new();
        for body in ["11", "01", "00", "100", "1 2"] {
            assert_eq!(decide(&menus, &msg(ANA, body)), Action::Ignore, "{body}");
        }
    }

    #[test]
    fn test_reset_keywords() {
        let menus = MenuStateStore::new();
        menus.mark_menu_sent(&ana());
        assert_eq!(decide(&menus, &msg(ANA, "menu")), Action::SendResetNotice);
        assert_eq!(decide(&menus, &msg(ANA, "Quiero VOLVER")), Action::SendResetNotice);
        assert_eq!(decide(&menus, &msg(ANA, "volveré")), Action::SendResetNotice);
    }

    #[test]
    fn test_menu_with_option_is_a_reset() {
        let menus = MenuStateStore::new();
        menus.mark_menu_sent(&ana());
        assert_eq!(decide(&menus, &msg(ANA, "menu 5")), Action::SendResetNotice);
    }

    #[test]
    fn test_menu_substring_without_word_boundary() {
        let menus = MenuStateStore::new();
        assert_eq!(decide(&menus, &msg(ANA, "menus")), Action::SendResetNotice);
    }

    #[test]
    fn test_groups_are_ignored() {
        let menus = MenuStateStore::new();
        for body in ["hola", "0", "1", "menu"] {
            assert_eq!(
                decide(&menus, &msg("123456789-1234567890@g.us", body)),
                Action::Ignore
            );
            assert_eq!(decide(&menus, &msg("status@broadcast", body)), Action::Ignore);
            assert_eq!(decide(&menus, &msg("", body)), Action::Ignore);
        }
    }

    #[test]
    fn test_missing_body_is_ignored() {
        let menus = MenuStateStore::new();
        let message = IncomingMessage::new(ANA, None);
        assert_eq!(decide(&menus, &message), Action::Ignore);
    }

    #[test]
    fn test_device_jid_keeps_its_menu_state() {
        let menus = MenuStateStore::new();
        menus.mark_menu_sent(&"34600000001:3@s.whatsapp.net".parse().unwrap());
        assert_eq!(
            decide(&menus, &msg("34600000001:3@s.whatsapp.net", "hola")),
            Action::Ignore
        );
    }
}
