//! Input guards for the message composer and the login form.

#[cfg(test)]
#[path = "composer_test.rs"]
mod composer_test;

/// Draft message plus in-flight flag.
///
/// A send is started with [`MessageComposer::begin_send`] and must be closed
/// with [`MessageComposer::finish_send`]; the draft survives a failed send so
/// the user can retry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageComposer {
    draft: String,
    sending: bool,
}

impl MessageComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Start a send. Returns the draft as typed, or `None` when it is blank
    /// or another send is still in flight.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.sending || self.draft.trim().is_empty() {
            return None;
        }
        self.sending = true;
        Some(self.draft.clone())
    }

    /// Close the in-flight send, clearing the draft on success.
    pub fn finish_send(&mut self, succeeded: bool) {
        self.sending = false;
        if succeeded {
            self.draft.clear();
        }
    }
}

/// Login name field plus in-flight flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    name: String,
    submitting: bool,
}

impl LoginForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Start a login. Returns the trimmed name, or `None` when it is blank or
    /// a login is already running.
    pub fn begin_submit(&mut self) -> Option<String> {
        let trimmed = self.name.trim();
        if self.submitting || trimmed.is_empty() {
            return None;
        }
        let trimmed = trimmed.to_owned();
        self.submitting = true;
        Some(trimmed)
    }

    /// Close the running login. The field is cleared whatever the outcome.
    pub fn finish_submit(&mut self) {
        self.submitting = false;
        self.name.clear();
    }
}
