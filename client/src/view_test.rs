use super::*;

fn user(id: &str, name: &str, online: bool) -> User {
    User { id: id.to_owned(), name: name.to_owned(), is_online: online, last_active: None, avatar: None }
}

fn message(id: &str, sender: &str, private: bool) -> Message {
    Message {
        id: id.to_owned(),
        text: format!("from {sender}"),
        sender: sender.to_owned(),
        receiver: "everyone".to_owned(),
        timestamp: 0,
        is_private: private,
    }
}

// =============================================================
// Headers
// =============================================================

#[test]
fn titles_follow_partner() {
    let bob = user("b", "Bob", true);
    assert_eq!(header_title(None), "Chat App");
    assert_eq!(header_title(Some(&bob)), "Private Chat with Bob");
    assert_eq!(input_placeholder(None), "Type a message to everyone...");
    assert_eq!(input_placeholder(Some(&bob)), "Message Bob privately...");
}

#[test]
fn chat_info_shows_partner_status() {
    let bob = user("b", "Bob", false);
    assert_eq!(
        chat_info(Some(&bob)),
        ChatInfo { heading: "Chatting with Bob".to_owned(), status: "Offline".to_owned() }
    );
    assert_eq!(chat_info(None).heading, "Public Chat");
}

#[test]
fn empty_states() {
    assert_eq!(
        empty_state(None),
        "No messages in the public chat yet. Be the first to send a message!"
    );
    assert_eq!(
        empty_state(Some(&user("b", "Bob", true))),
        "No private messages with Bob yet. Start the conversation!"
    );
}

#[test]
fn avatar_initial_handles_empty_and_unicode() {
    assert_eq!(avatar_initial("Alice"), "A");
    assert_eq!(avatar_initial("Émile"), "É");
    assert_eq!(avatar_initial(""), "?");
}

// =============================================================
// Roster
// =============================================================

#[test]
fn roster_lists_online_users_and_marks_me() {
    let mut alice = user("a", "Alice", true);
    alice.avatar = Some("#FF9800".to_owned());
    let users = vec![alice.clone(), user("b", "Bob", false), user("c", "Cy", true)];

    let entries = online_roster(&users, Some(&alice));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Alice");
    assert!(entries[0].is_me);
    assert_eq!(entries[0].color, "#ff9800");
    assert_eq!(entries[1].name, "Cy");
    assert!(!entries[1].is_me);
    assert_eq!(entries[1].initial, "C");
}

#[test]
fn roster_without_login_marks_nobody() {
    let entries = online_roster(&[user("a", "Alice", true)], None);
    assert!(!entries[0].is_me);
}

// =============================================================
// Messages
// =============================================================

#[test]
fn own_messages_hide_sender() {
    let me = user("a", "Alice", true);
    let lines = message_lines(&[message("1", "Alice", false), message("2", "Bob", true)], Some(&me));
    assert!(lines[0].is_own);
    assert_eq!(lines[0].sender_label, None);
    assert!(!lines[1].is_own);
    assert_eq!(lines[1].sender_label.as_deref(), Some("Bob"));
    assert!(lines[1].is_private);
}

#[test]
fn short_time_formats_utc() {
    assert_eq!(short_time(0), "1/1/70, 12:00 AM");
    assert_eq!(short_time(1_704_114_900_000), "1/1/24, 1:15 PM");
}

#[test]
fn short_time_out_of_range_is_empty() {
    assert_eq!(short_time(i64::MAX), "");
}
