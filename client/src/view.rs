//! Pure presentation helpers shared by front ends.
//!
//! DESIGN
//! ======
//! Everything a chat surface shows besides raw records lives here: titles,
//! placeholders, the online roster, per-message display flags and the empty
//! conversation notices. Functions take published state by reference and
//! return owned view models, so they can be tested without a service.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use time::OffsetDateTime;

use crate::net::types::{Message, User};
use crate::util::color::display_color;

// =============================================================================
// HEADERS & INPUT
// =============================================================================

/// Window title for the active conversation.
#[must_use]
pub fn header_title(partner: Option<&User>) -> String {
    match partner {
        Some(partner) => format!("Private Chat with {}", partner.name),
        None => "Chat App".to_owned(),
    }
}

/// Conversation banner: heading plus status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub heading: String,
    pub status: String,
}

#[must_use]
pub fn chat_info(partner: Option<&User>) -> ChatInfo {
    match partner {
        Some(partner) => ChatInfo {
            heading: format!("Chatting with {}", partner.name),
            status: if partner.is_online { "Online" } else { "Offline" }.to_owned(),
        },
        None => ChatInfo {
            heading: "Public Chat".to_owned(),
            status: "Everyone can see these messages".to_owned(),
        },
    }
}

/// Composer placeholder for the active conversation.
#[must_use]
pub fn input_placeholder(partner: Option<&User>) -> String {
    match partner {
        Some(partner) => format!("Message {} privately...", partner.name),
        None => "Type a message to everyone...".to_owned(),
    }
}

/// Notice shown when the active conversation has no messages.
#[must_use]
pub fn empty_state(partner: Option<&User>) -> String {
    match partner {
        Some(partner) => format!("No private messages with {} yet. Start the conversation!", partner.name),
        None => "No messages in the public chat yet. Be the first to send a message!".to_owned(),
    }
}

/// First character of `name`, or `?` for an empty name.
#[must_use]
pub fn avatar_initial(name: &str) -> String {
    name.chars().next().map_or_else(|| "?".to_owned(), |c| c.to_string())
}

// =============================================================================
// ROSTER
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub initial: String,
    /// Avatar colour as lowercase `#rrggbb`.
    pub color: String,
    /// Row belongs to the logged-in user.
    pub is_me: bool,
}

/// Online users in roster order. The current user is matched by name.
#[must_use]
pub fn online_roster(users: &[User], current: Option<&User>) -> Vec<RosterEntry> {
    users
        .iter()
        .filter(|user| user.is_online)
        .map(|user| RosterEntry {
            id: user.id.clone(),
            name: user.name.clone(),
            initial: avatar_initial(&user.name),
            color: display_color(user.avatar.as_deref()),
            is_me: current.is_some_and(|me| me.name == user.name),
        })
        .collect()
}

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLine {
    pub id: String,
    /// Sender name, hidden on the viewer's own messages.
    pub sender_label: Option<String>,
    pub text: String,
    pub time: String,
    pub is_own: bool,
    pub is_private: bool,
}

/// Display lines for `messages` as seen by `viewer`.
#[must_use]
pub fn message_lines(messages: &[Message], viewer: Option<&User>) -> Vec<MessageLine> {
    messages
        .iter()
        .map(|message| {
            let is_own = viewer.is_some_and(|me| me.name == message.sender);
            MessageLine {
                id: message.id.clone(),
                sender_label: (!is_own).then(|| message.sender.clone()),
                text: message.text.clone(),
                time: short_time(message.timestamp),
                is_own,
                is_private: message.is_private,
            }
        })
        .collect()
}

/// `M/D/YY, h:mm AM` in UTC. Out-of-range timestamps render empty.
#[must_use]
pub fn short_time(millis: i64) -> String {
    let Ok(at) = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000) else {
        return String::new();
    };
    let (hour, period) = match at.hour() {
        0 => (12, "AM"),
        h @ 1..=11 => (h, "AM"),
        12 => (12, "PM"),
        h => (h - 12, "PM"),
    };
    format!(
        "{}/{}/{:02}, {}:{:02} {}",
        u8::from(at.month()),
        at.day(),
        at.year().rem_euclid(100),
        hour,
        at.minute(),
        period
    )
}
