use super::*;

// =============================================================
// MessageComposer
// =============================================================

#[test]
fn blank_draft_is_not_sent() {
    let mut composer = MessageComposer::new();
    composer.set_draft("   \n");
    assert_eq!(composer.begin_send(), None);
    assert!(!composer.is_sending());
}

#[test]
fn draft_is_sent_as_typed() {
    let mut composer = MessageComposer::new();
    composer.set_draft("  hi there ");
    assert_eq!(composer.begin_send().as_deref(), Some("  hi there "));
    assert!(composer.is_sending());
}

#[test]
fn second_send_while_busy_is_rejected() {
    let mut composer = MessageComposer::new();
    composer.set_draft("hi");
    assert!(composer.begin_send().is_some());
    assert_eq!(composer.begin_send(), None);
}

#[test]
fn success_clears_draft() {
    let mut composer = MessageComposer::new();
    composer.set_draft("hi");
    composer.begin_send();
    composer.finish_send(true);
    assert_eq!(composer.draft(), "");
    assert!(!composer.is_sending());
}

#[test]
fn failure_keeps_draft_for_retry() {
    let mut composer = MessageComposer::new();
    composer.set_draft("hi");
    composer.begin_send();
    composer.finish_send(false);
    assert_eq!(composer.draft(), "hi");
    assert_eq!(composer.begin_send().as_deref(), Some("hi"));
}

// =============================================================
// LoginForm
// =============================================================

#[test]
fn login_trims_name() {
    let mut form = LoginForm::new();
    form.set_name("  Alice ");
    assert_eq!(form.begin_submit().as_deref(), Some("Alice"));
    assert!(form.is_submitting());
}

#[test]
fn login_rejects_blank_name() {
    let mut form = LoginForm::new();
    form.set_name("  ");
    assert_eq!(form.begin_submit(), None);
}

#[test]
fn login_rejects_concurrent_submit() {
    let mut form = LoginForm::new();
    form.set_name("Alice");
    form.begin_submit();
    assert_eq!(form.begin_submit(), None);
}

#[test]
fn login_clears_field_after_attempt() {
    let mut form = LoginForm::new();
    form.set_name("Alice");
    form.begin_submit();
    form.finish_submit();
    assert_eq!(form.name(), "");
    assert!(!form.is_submitting());
}
