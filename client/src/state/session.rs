//! Session identity and chat scope.
//!
//! DESIGN
//! ======
//! A session holds the logged-in user and the selected chat partner. The
//! private flag is never stored: it is derived from the partner, so partner
//! selection and private mode cannot drift apart.
//!
//! Two derived views exist:
//! - the send target (privacy flag + receiver) follows the partner alone,
//! - the read scope needs both a current user and a partner to be private,
//!   because the private message query is keyed on both names.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::net::query::Query;
use crate::net::types::{MESSAGES_COLLECTION, PUBLIC_RECEIVER, User};

/// Which conversation message reads are scoped to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChatScope {
    /// All non-private messages.
    #[default]
    Public,
    /// Private messages exchanged between `me` and `partner`.
    Private { me: String, partner: String },
}

impl ChatScope {
    /// Live query selecting this scope's messages, oldest first.
    #[must_use]
    pub fn messages_query(&self) -> Query {
        let query = Query::collection(MESSAGES_COLLECTION);
        let filtered = match self {
            Self::Public => query.where_eq("isPrivate", false),
            Self::Private { me, partner } => {
                let pair = [me.as_str(), partner.as_str()];
                query
                    .where_eq("isPrivate", true)
                    .where_in("sender", pair)
                    .where_in("receiver", pair)
            }
        };
        filtered.order_by_asc("timestamp")
    }
}

/// Privacy flag and receiver stamped onto an outgoing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendTarget {
    pub is_private: bool,
    pub receiver: String,
}

/// Current user plus selected partner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_user: Option<User>,
    pub selected_partner: Option<User>,
}

impl SessionState {
    /// Private mode is on exactly when a partner is selected.
    #[must_use]
    pub fn is_private_chat(&self) -> bool {
        self.selected_partner.is_some()
    }

    #[must_use]
    pub fn scope(&self) -> ChatScope {
        match (&self.current_user, &self.selected_partner) {
            (Some(me), Some(partner)) => ChatScope::Private { me: me.name.clone(), partner: partner.name.clone() },
            _ => ChatScope::Public,
        }
    }

    #[must_use]
    pub fn send_target(&self) -> SendTarget {
        match &self.selected_partner {
            Some(partner) => SendTarget { is_private: true, receiver: partner.name.clone() },
            None => SendTarget { is_private: false, receiver: PUBLIC_RECEIVER.to_owned() },
        }
    }

    /// Replace stored copies of the current user and partner with fresher
    /// records from `roster`, matched by id. Returns whether anything changed.
    pub fn refresh_from(&mut self, roster: &[User]) -> bool {
        let mut changed = false;
        for slot in [&mut self.current_user, &mut self.selected_partner] {
            if let Some(held) = slot.as_mut()
                && let Some(fresh) = roster.iter().find(|u| u.id == held.id)
                && fresh != held
            {
                *held = fresh.clone();
                changed = true;
            }
        }
        changed
    }
}
