//! Interactive line parsing.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

/// One line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Login(String),
    Users,
    Direct(String),
    Public,
    Logout,
    Help,
    Quit,
    /// Anything that is not a command is a message, kept as typed.
    Send(String),
    Empty,
    /// A `/command` that needs an argument it did not get, or is unknown.
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  /login NAME   log in (creates the user on first login)
  /users        list online users
  /dm NAME      chat privately with NAME
  /public       back to the public chat
  /logout       log out
  /help         show this help
  /quit         leave (stays logged in)
anything else is sent as a message";

#[must_use]
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Send(line.trim_end_matches(['\r', '\n']).to_owned());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match (name, arg) {
        ("login", "") => Input::Invalid("usage: /login NAME".to_owned()),
        ("login", name) => Input::Login(name.to_owned()),
        ("dm", "") => Input::Invalid("usage: /dm NAME".to_owned()),
        ("dm", name) => Input::Direct(name.to_owned()),
        ("users", _) => Input::Users,
        ("public", _) => Input::Public,
        ("logout", _) => Input::Logout,
        ("help", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        (other, _) => Input::Invalid(format!("unknown command /{other}; try /help")),
    }
}
