//! Chat service: roster, session identity, partner selection and messages.
//!
//! ARCHITECTURE
//! ============
//! One [`ChatService`] per session. It publishes three pieces of state through
//! [`Observable`] holders (roster, session, messages for the active scope)
//! and exposes async operations that write to the [`DocumentStore`]. The
//! current user, selected partner and private flag are projections of the
//! one session value, so a reader never sees them out of step.
//!
//! Live queries run as spawned tasks that hold only a weak reference to the
//! service, so dropping the last handle stops them:
//! - the roster watcher is started once and republishes every snapshot,
//!   refreshing the stored current user and partner records along the way,
//! - the message watcher is bound to the scope computed when it started and
//!   is replaced whenever the scope changes.
//!
//! ERROR HANDLING
//! ==============
//! Remote failures are logged and returned as [`ChatError`]; local state is
//! left as it was. Status updates triggered as a side effect of a session
//! change (login, restore, logout) are logged and never block the change
//! itself. Watch errors keep the last published snapshot.
//!
//! TRADE-OFFS
//! ==========
//! There is no ordering guard between a send and a concurrent scope change:
//! the send is tagged with whatever scope is active when it starts.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures::StreamExt as _;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::net::query::Query;
use crate::net::store::{Document, DocumentStore, DocumentWrite, SnapshotStream, StoreError};
use crate::net::types::{MESSAGES_COLLECTION, Message, USERS_COLLECTION, User};
use crate::state::observable::{Observable, Subscription};
use crate::state::session::{ChatScope, SessionState};
use crate::util::color::avatar_for_name;
use crate::util::persistence::{SessionStorage, StorageError, load_json, save_json};

/// Storage key of the persisted session identity.
pub const CURRENT_USER_KEY: &str = "currentUser";

// =============================================================================
// TYPES
// =============================================================================

/// Errors returned by chat operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The document store rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Session storage could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored document does not have the expected shape.
    #[error("malformed {collection} document {id}: {message}")]
    Decode { collection: String, id: String, message: String },
}

/// Outcome of [`ChatService::add_user`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Login {
    pub user: User,
    /// `true` when a new user record was created.
    pub created: bool,
}

struct MessageWatch {
    scope: ChatScope,
    handle: JoinHandle<()>,
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn SessionStorage>,
    users: Observable<Vec<User>>,
    session: Observable<SessionState>,
    messages: Observable<Vec<Message>>,
    roster_watch: Mutex<Option<JoinHandle<()>>>,
    message_watch: Mutex<Option<MessageWatch>>,
    /// Bumped every time the message watcher is replaced; stale watchers
    /// drop their snapshots.
    message_generation: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let roster = self.roster_watch.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = roster.take() {
            handle.abort();
        }
        let messages = self.message_watch.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(watch) = messages.take() {
            watch.handle.abort();
        }
    }
}

/// Shared handle to the chat state. Clones refer to the same session.
#[derive(Clone)]
pub struct ChatService {
    inner: Arc<Inner>,
}

// =============================================================================
// CONSTRUCTION & LIFECYCLE
// =============================================================================

impl ChatService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                storage,
                users: Observable::new(Vec::new()),
                session: Observable::default(),
                messages: Observable::new(Vec::new()),
                roster_watch: Mutex::new(None),
                message_watch: Mutex::new(None),
                message_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Restore the persisted identity, then start the roster watcher.
    /// Returns the restored user, if any.
    pub async fn start(&self) -> Option<User> {
        let restored = self.restore_session().await;
        drop(self.watch_users());
        info!(restored = restored.as_ref().map(|u| u.name.as_str()), "chat service started");
        restored
    }

    /// Stop both live queries. Published state keeps its last values.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.inner.roster_watch).take() {
            handle.abort();
        }
        if let Some(watch) = lock(&self.inner.message_watch).take() {
            watch.handle.abort();
        }
        self.inner.message_generation.fetch_add(1, Ordering::SeqCst);
        info!("chat service stopped");
    }
}

// =============================================================================
// ROSTER
// =============================================================================

impl ChatService {
    /// Subscribe to the roster, starting the roster watcher if it is not
    /// already running.
    #[must_use]
    pub fn watch_users(&self) -> Subscription<Vec<User>> {
        let subscription = self.inner.users.subscribe();
        let mut slot = lock(&self.inner.roster_watch);
        let running = slot.as_ref().is_some_and(|handle| !handle.is_finished());
        if !running {
            let stream = self.inner.store.watch(Query::collection(USERS_COLLECTION));
            let weak = Arc::downgrade(&self.inner);
            *slot = Some(tokio::spawn(run_roster_watch(weak, stream)));
            debug!("roster watch started");
        }
        subscription
    }

    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.inner.users.get()
    }
}

async fn run_roster_watch(weak: Weak<Inner>, mut stream: SnapshotStream) {
    while let Some(item) = stream.next().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        match item {
            Ok(docs) => inner.publish_roster(&docs),
            Err(err) => warn!(error = %err, "roster watch failed; keeping last roster"),
        }
    }
    debug!("roster watch ended");
}

impl Inner {
    fn publish_roster(&self, docs: &[Document]) {
        let roster = docs
            .iter()
            .filter_map(|doc| match decode_user(doc) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!(error = %err, "skipping malformed user record");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(count = roster.len(), "roster snapshot");

        self.session.update(|session| session.refresh_from(&roster));
        self.users.set(roster);
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

impl ChatService {
    /// Subscribe to the messages of the scope active right now, replacing any
    /// running message watcher.
    #[must_use]
    pub fn watch_messages(&self) -> Subscription<Vec<Message>> {
        let subscription = self.inner.messages.subscribe();
        self.start_message_watch(self.scope());
        subscription
    }

    fn start_message_watch(&self, scope: ChatScope) {
        let mut slot = lock(&self.inner.message_watch);
        if let Some(previous) = slot.take() {
            previous.handle.abort();
        }
        let generation = self.inner.message_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let stream = self.inner.store.watch(scope.messages_query());
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(run_message_watch(weak, stream, generation));
        debug!(?scope, generation, "message watch started");
        *slot = Some(MessageWatch { scope, handle });
    }

    /// Point a running message watcher at the current scope.
    fn follow_scope(&self) {
        let scope = self.scope();
        let stale = lock(&self.inner.message_watch)
            .as_ref()
            .is_some_and(|watch| watch.scope != scope);
        if stale {
            self.start_message_watch(scope);
        }
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner.messages.get()
    }

    /// Write a message tagged with the active scope. Returns the message id.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Store`] when the store rejects the write.
    pub async fn send_message(&self, text: &str, sender: &str) -> Result<String, ChatError> {
        let target = self.session().send_target();
        let write = DocumentWrite::new()
            .set("text", text)
            .set("sender", sender)
            .set("receiver", target.receiver.as_str())
            .server_timestamp("timestamp")
            .set("isPrivate", target.is_private);

        match self.inner.store.create(MESSAGES_COLLECTION, write).await {
            Ok(id) => {
                debug!(%id, %sender, receiver = %target.receiver, private = target.is_private, "message sent");
                Ok(id)
            }
            Err(err) => {
                error!(error = %err, %sender, "send message failed");
                Err(err.into())
            }
        }
    }
}

async fn run_message_watch(weak: Weak<Inner>, mut stream: SnapshotStream, generation: u64) {
    while let Some(item) = stream.next().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if inner.message_generation.load(Ordering::SeqCst) != generation {
            break;
        }
        match item {
            Ok(docs) => inner.publish_messages(&docs),
            Err(err) => warn!(error = %err, "message watch failed; keeping last messages"),
        }
    }
    debug!(generation, "message watch ended");
}

impl Inner {
    fn publish_messages(&self, docs: &[Document]) {
        let messages = docs
            .iter()
            .filter_map(|doc| match decode_message(doc) {
                Ok(message) => Some(message),
                Err(err) => {
                    warn!(error = %err, "skipping malformed message record");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(count = messages.len(), "message snapshot");
        self.messages.set(messages);
    }
}

// =============================================================================
// SESSION
// =============================================================================

impl ChatService {
    /// Log in as `name`: reuse the first user with exactly that name or
    /// create one, then adopt it as the current user.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Store`] when the lookup or create fails and
    /// [`ChatError::Decode`] when the matching record is malformed. The
    /// session is unchanged in both cases.
    pub async fn add_user(&self, name: &str) -> Result<Login, ChatError> {
        let lookup = Query::collection(USERS_COLLECTION).where_eq("name", name);
        let existing = self.inner.store.query(&lookup).await.inspect_err(|err| {
            error!(error = %err, %name, "user lookup failed");
        })?;

        if let Some(doc) = existing.first() {
            let user = decode_user(doc).inspect_err(|err| error!(error = %err, %name, "existing user unreadable"))?;
            info!(id = %user.id, %name, "existing user logged in");
            self.set_current_user(Some(user.clone())).await;
            return Ok(Login { user, created: false });
        }

        let avatar = avatar_for_name(name);
        let write = DocumentWrite::new()
            .set("name", name)
            .set("isOnline", true)
            .server_timestamp("lastActive")
            .set("avatar", avatar);
        let id = self.inner.store.create(USERS_COLLECTION, write).await.inspect_err(|err| {
            error!(error = %err, %name, "user create failed");
        })?;

        let user = User {
            id,
            name: name.to_owned(),
            is_online: true,
            last_active: None,
            avatar: Some(avatar.to_owned()),
        };
        info!(id = %user.id, %name, "new user created");
        self.set_current_user(Some(user.clone())).await;
        Ok(Login { user, created: true })
    }

    /// Publish `user` as the current user, persist or forget the identity,
    /// and mark the user online when one is set.
    pub async fn set_current_user(&self, user: Option<User>) {
        self.inner.session.update(|session| {
            session.current_user.clone_from(&user);
            true
        });

        let persisted = match &user {
            Some(user) => save_json(self.inner.storage.as_ref(), CURRENT_USER_KEY, user),
            None => self.inner.storage.remove_item(CURRENT_USER_KEY),
        };
        if let Err(err) = persisted {
            warn!(error = %err, "session identity not persisted");
        }

        self.follow_scope();

        if let Some(user) = user {
            let _ = self.update_user_status(&user.id, true).await;
        }
    }

    /// Select a private chat partner, or return to public chat with `None`.
    /// The private flag follows the partner.
    pub fn select_partner(&self, partner: Option<User>) {
        debug!(partner = partner.as_ref().map(|u| u.name.as_str()), "partner selected");
        self.inner.session.update(|session| {
            session.selected_partner = partner;
            true
        });
        self.follow_scope();
    }

    /// Set a user's online flag and stamp `lastActive` with server time.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Store`] when the update fails, including
    /// [`StoreError::NotFound`] for unknown ids.
    pub async fn update_user_status(&self, user_id: &str, online: bool) -> Result<(), ChatError> {
        let write = DocumentWrite::new().set("isOnline", online).server_timestamp("lastActive");
        match self.inner.store.update(USERS_COLLECTION, user_id, write).await {
            Ok(()) => {
                debug!(%user_id, online, "user status updated");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, %user_id, online, "user status update failed");
                Err(err.into())
            }
        }
    }

    /// Mark the current user offline, then clear the identity and partner.
    pub async fn logout(&self) {
        if let Some(user) = self.current_user() {
            let _ = self.update_user_status(&user.id, false).await;
            info!(id = %user.id, name = %user.name, "user logged out");
        }
        self.set_current_user(None).await;
        self.select_partner(None);
    }

    /// Adopt the persisted identity, if any, and mark it online. A corrupt
    /// entry is logged and removed.
    pub async fn restore_session(&self) -> Option<User> {
        let user = match load_json::<User>(self.inner.storage.as_ref(), CURRENT_USER_KEY) {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(StorageError::Json(err)) => {
                warn!(error = %err, "discarding unreadable session identity");
                if let Err(err) = self.inner.storage.remove_item(CURRENT_USER_KEY) {
                    warn!(error = %err, "session identity not removed");
                }
                return None;
            }
            Err(err) => {
                warn!(error = %err, "session identity unavailable");
                return None;
            }
        };

        info!(id = %user.id, name = %user.name, "session restored");
        self.inner.session.update(|session| {
            session.current_user = Some(user.clone());
            true
        });
        self.follow_scope();
        let _ = self.update_user_status(&user.id, true).await;
        Some(user)
    }
}

// =============================================================================
// STATE ACCESS
// =============================================================================

impl ChatService {
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.session.with(|session| session.current_user.clone())
    }

    #[must_use]
    pub fn selected_partner(&self) -> Option<User> {
        self.inner.session.with(|session| session.selected_partner.clone())
    }

    #[must_use]
    pub fn is_private_chat(&self) -> bool {
        self.inner.session.with(SessionState::is_private_chat)
    }

    #[must_use]
    pub fn session(&self) -> SessionState {
        self.inner.session.get()
    }

    /// Message scope derived from the current session.
    #[must_use]
    pub fn scope(&self) -> ChatScope {
        self.inner.session.with(SessionState::scope)
    }

    /// Subscribe to the published roster without touching the watcher.
    #[must_use]
    pub fn subscribe_users(&self) -> Subscription<Vec<User>> {
        self.inner.users.subscribe()
    }

    /// Subscribe to the whole session: current user and partner together.
    #[must_use]
    pub fn subscribe_session(&self) -> Subscription<SessionState> {
        self.inner.session.subscribe()
    }

    #[must_use]
    pub fn subscribe_current_user(&self) -> Subscription<Option<User>, SessionState> {
        self.inner.session.subscribe_map(|session| session.current_user.clone())
    }

    #[must_use]
    pub fn subscribe_selected_partner(&self) -> Subscription<Option<User>, SessionState> {
        self.inner.session.subscribe_map(|session| session.selected_partner.clone())
    }

    #[must_use]
    pub fn subscribe_private_chat(&self) -> Subscription<bool, SessionState> {
        self.inner.session.subscribe_map(SessionState::is_private_chat)
    }

    /// Subscribe to published messages without touching the watcher.
    #[must_use]
    pub fn subscribe_messages(&self) -> Subscription<Vec<Message>> {
        self.inner.messages.subscribe()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn decode_user(doc: &Document) -> Result<User, ChatError> {
    User::from_document(doc).map_err(|e| ChatError::Decode {
        collection: USERS_COLLECTION.to_owned(),
        id: doc.id.clone(),
        message: e.to_string(),
    })
}

fn decode_message(doc: &Document) -> Result<Message, ChatError> {
    Message::from_document(doc).map_err(|e| ChatError::Decode {
        collection: MESSAGES_COLLECTION.to_owned(),
        id: doc.id.clone(),
        message: e.to_string(),
    })
}
