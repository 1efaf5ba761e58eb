use super::*;

#[test]
fn blank_lines_are_empty() {
    assert_eq!(parse_input(""), Input::Empty);
    assert_eq!(parse_input("   \n"), Input::Empty);
}

#[test]
fn plain_text_is_sent_as_typed() {
    assert_eq!(parse_input("  hello there \n"), Input::Send("  hello there ".to_owned()));
}

#[test]
fn login_takes_rest_of_line() {
    assert_eq!(parse_input("/login  Mary Ann "), Input::Login("Mary Ann".to_owned()));
}

#[test]
fn login_without_name_is_invalid() {
    assert_eq!(parse_input("/login"), Input::Invalid("usage: /login NAME".to_owned()));
    assert_eq!(parse_input("/login   "), Input::Invalid("usage: /login NAME".to_owned()));
}

#[test]
fn dm_takes_partner_name() {
    assert_eq!(parse_input("/dm Bob"), Input::Direct("Bob".to_owned()));
    assert!(matches!(parse_input("/dm"), Input::Invalid(_)));
}

#[test]
fn argument_free_commands() {
    assert_eq!(parse_input("/users"), Input::Users);
    assert_eq!(parse_input("/public"), Input::Public);
    assert_eq!(parse_input("/logout"), Input::Logout);
    assert_eq!(parse_input("/help"), Input::Help);
    assert_eq!(parse_input("/quit"), Input::Quit);
    assert_eq!(parse_input("/exit"), Input::Quit);
}

#[test]
fn unknown_command_is_invalid() {
    let Input::Invalid(message) = parse_input("/dance now") else {
        panic!("expected invalid input");
    };
    assert!(message.contains("/dance"));
}
