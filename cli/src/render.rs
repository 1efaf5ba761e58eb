//! Terminal rendering of published chat state.
//!
//! DESIGN
//! ======
//! The message stream always carries the full conversation. The printer
//! remembers which message ids it already wrote under which title and prints
//! only the new tail; when the title changes or the snapshot no longer
//! extends what was shown, the conversation is redrawn.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::HashSet;

use chatline::net::types::User;
use chatline::view::{ChatInfo, MessageLine, RosterEntry};

#[must_use]
pub fn format_message(line: &MessageLine) -> String {
    let who = line.sender_label.as_deref().unwrap_or("you");
    let badge = if line.is_private { " [private]" } else { "" };
    format!("[{}] {who}: {}{badge}", line.time, line.text)
}

#[must_use]
pub fn format_roster(entries: &[RosterEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["no users online".to_owned()];
    }
    entries
        .iter()
        .map(|entry| {
            let me = if entry.is_me { " (you)" } else { "" };
            format!("({}) {}{me}", entry.initial, entry.name)
        })
        .collect()
}

/// Banner printed when the active conversation changes.
#[must_use]
pub fn format_banner(info: &ChatInfo, placeholder: &str) -> Vec<String> {
    vec![format!("-- {} ({})", info.heading, info.status), format!("   {placeholder}")]
}

/// Incremental conversation printer.
#[derive(Debug, Default)]
pub struct MessagePrinter {
    title: Option<String>,
    shown: Vec<String>,
}

impl MessagePrinter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Output lines for a new snapshot of the conversation titled `title`.
    pub fn render(&mut self, title: &str, lines: &[MessageLine], empty_notice: &str) -> Vec<String> {
        let ids = lines.iter().map(|line| line.id.clone()).collect::<Vec<_>>();
        let same_title = self.title.as_deref() == Some(title);
        let extends = ids.starts_with(&self.shown);

        let out = if same_title && extends {
            lines[self.shown.len()..].iter().map(format_message).collect()
        } else {
            let mut out = vec![format!("== {title} ==")];
            if lines.is_empty() {
                out.push(empty_notice.to_owned());
            } else {
                out.extend(lines.iter().map(format_message));
            }
            out
        };

        self.title = Some(title.to_owned());
        self.shown = ids;
        out
    }
}

/// Presence notices for users whose online flag changed between rosters.
#[must_use]
pub fn presence_changes(before: &[User], after: &[User]) -> Vec<String> {
    let was_online = before
        .iter()
        .filter(|u| u.is_online)
        .map(|u| u.id.as_str())
        .collect::<HashSet<_>>();
    let now_online = after
        .iter()
        .filter(|u| u.is_online)
        .map(|u| u.id.as_str())
        .collect::<HashSet<_>>();

    let mut out = Vec::new();
    for user in after {
        let id = user.id.as_str();
        if now_online.contains(id) && !was_online.contains(id) {
            out.push(format!("* {} is online", user.name));
        }
    }
    for user in before {
        let id = user.id.as_str();
        if was_online.contains(id) && !now_online.contains(id) {
            out.push(format!("* {} went offline", user.name));
        }
    }
    out
}
