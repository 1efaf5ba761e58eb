mod input;
mod render;

use std::io;
use std::time::Duration;

use chatline::config::{ChatConfig, ConfigError};
use chatline::net::store::StoreError;
use chatline::net::types::{Message, User};
use chatline::services::chat::{ChatError, ChatService};
use chatline::state::composer::{LoginForm, MessageComposer};
use chatline::state::observable::Subscription;
use chatline::view;
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;

use crate::input::{HELP, Input, parse_input};
use crate::render::{MessagePrinter, format_banner, format_roster, presence_changes};

/// How long one-shot commands wait for the first live snapshot.
const SNAPSHOT_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("no user named {0}")]
    UnknownUser(String),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "chatline", about = "Public and private chat over a shared document store")]
struct Cli {
    /// Document store backend: `memory` or `firestore`.
    #[arg(long, env = "CHATLINE_STORE")]
    store: Option<String>,

    #[arg(long, env = "FIRESTORE_PROJECT_ID")]
    project: Option<String>,

    #[arg(long, env = "FIRESTORE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Session identity file; an empty value keeps the session in memory.
    #[arg(long, env = "CHATLINE_SESSION_FILE")]
    session_file: Option<String>,

    /// Log filter level written to stderr.
    #[arg(long, env = "CHATLINE_LOG", default_value = "warn")]
    log_level: Level,

    /// Shorthand for `--log-level debug`.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (default).
    Chat,
    /// Print the roster as JSON.
    Users,
    /// Log in and send one message.
    Send(SendArgs),
    /// Print a conversation as JSON.
    History(HistoryArgs),
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Sender name; logs in as this user.
    #[arg(long = "as")]
    as_user: String,

    /// Private recipient; omit for the public chat.
    #[arg(long)]
    to: Option<String>,

    text: String,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// View a private conversation as this user.
    #[arg(long = "as", requires = "with")]
    as_user: Option<String>,

    /// Partner of the private conversation.
    #[arg(long, requires = "as_user")]
    with: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { cli.log_level };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&cli)?;
    let service = ChatService::new(config.open_store()?, config.open_storage());

    let result = match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&service).await,
        Command::Users => run_users(&service).await,
        Command::Send(args) => run_send(&service, args).await,
        Command::History(args) => run_history(&service, args).await,
    };
    service.shutdown();
    result
}

/// Flags win over the environment; clap already folded the environment into
/// the flags it knows about.
fn load_config(cli: &Cli) -> Result<ChatConfig, ConfigError> {
    ChatConfig::from_lookup(|key| {
        let flag = match key {
            "CHATLINE_STORE" => cli.store.clone(),
            "FIRESTORE_PROJECT_ID" => cli.project.clone(),
            "FIRESTORE_API_KEY" => cli.api_key.clone(),
            "CHATLINE_SESSION_FILE" => cli.session_file.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    })
}

// =============================================================================
// INTERACTIVE CHAT
// =============================================================================

async fn run_chat(service: &ChatService) -> Result<(), CliError> {
    if let Some(user) = service.start().await {
        println!("welcome back, {}", user.name);
    } else {
        println!("log in with /login NAME (type /help for commands)");
    }
    print_banner(service);

    let roster_printer = tokio::spawn(print_presence(service.watch_users()));
    let message_printer = tokio::spawn(print_messages(service.clone(), service.watch_messages()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut login = LoginForm::new();
    let mut composer = MessageComposer::new();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Invalid(message) => println!("{message}"),
            Input::Users => {
                let entries = view::online_roster(&service.users(), service.current_user().as_ref());
                for row in format_roster(&entries) {
                    println!("{row}");
                }
            }
            Input::Login(name) => {
                login.set_name(name);
                if let Some(name) = login.begin_submit() {
                    match service.add_user(&name).await {
                        Ok(outcome) if outcome.created => println!("welcome, {}", outcome.user.name),
                        Ok(outcome) => println!("welcome back, {}", outcome.user.name),
                        Err(err) => println!("login failed: {err}"),
                    }
                    login.finish_submit();
                }
            }
            Input::Direct(name) => {
                if service.current_user().is_none() {
                    println!("log in first with /login NAME");
                } else if let Some(partner) = find_user(&service.users(), &name) {
                    service.select_partner(Some(partner));
                    print_banner(service);
                } else {
                    println!("no user named {name}");
                }
            }
            Input::Public => {
                service.select_partner(None);
                print_banner(service);
            }
            Input::Logout => {
                service.logout().await;
                println!("logged out");
            }
            Input::Send(text) => {
                let Some(me) = service.current_user() else {
                    println!("log in first with /login NAME");
                    continue;
                };
                composer.set_draft(text);
                if let Some(text) = composer.begin_send() {
                    let sent = service.send_message(&text, &me.name).await;
                    if let Err(err) = &sent {
                        println!("send failed: {err}");
                    }
                    composer.finish_send(sent.is_ok());
                }
            }
        }
    }

    roster_printer.abort();
    message_printer.abort();
    Ok(())
}

fn print_banner(service: &ChatService) {
    let partner = service.selected_partner();
    let info = view::chat_info(partner.as_ref());
    for row in format_banner(&info, &view::input_placeholder(partner.as_ref())) {
        println!("{row}");
    }
}

async fn print_presence(mut roster: Subscription<Vec<User>>) {
    let mut previous = roster.current();
    while let Some(next) = roster.changed().await {
        for notice in presence_changes(&previous, &next) {
            println!("{notice}");
        }
        previous = next;
    }
}

async fn print_messages(service: ChatService, mut messages: Subscription<Vec<Message>>) {
    let mut printer = MessagePrinter::new();
    while let Some(snapshot) = messages.changed().await {
        let partner = service.selected_partner();
        let viewer = service.current_user();
        let lines = view::message_lines(&snapshot, viewer.as_ref());
        let title = view::header_title(partner.as_ref());
        let notice = view::empty_state(partner.as_ref());
        for row in printer.render(&title, &lines, &notice) {
            println!("{row}");
        }
    }
}

fn find_user(users: &[User], name: &str) -> Option<User> {
    users.iter().find(|u| u.name == name).cloned()
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

async fn run_users(service: &ChatService) -> Result<(), CliError> {
    let users = first_snapshot(service.watch_users()).await;
    print_json(&serde_json::to_value(users)?)
}

async fn run_send(service: &ChatService, args: SendArgs) -> Result<(), CliError> {
    let login = service.add_user(&args.as_user).await?;
    if let Some(to) = &args.to {
        let users = first_snapshot(service.watch_users()).await;
        let partner = find_user(&users, to).ok_or_else(|| CliError::UnknownUser(to.clone()))?;
        service.select_partner(Some(partner));
    }
    let target = service.session().send_target();
    let id = service.send_message(&args.text, &login.user.name).await?;
    print_json(&json!({
        "id": id,
        "sender": login.user.name,
        "receiver": target.receiver,
        "isPrivate": target.is_private,
    }))
}

async fn run_history(service: &ChatService, args: HistoryArgs) -> Result<(), CliError> {
    if let (Some(me), Some(with)) = (&args.as_user, &args.with) {
        service.add_user(me).await?;
        let users = first_snapshot(service.watch_users()).await;
        let partner = find_user(&users, with).ok_or_else(|| CliError::UnknownUser(with.clone()))?;
        service.select_partner(Some(partner));
    }
    let messages = first_snapshot(service.watch_messages()).await;
    print_json(&serde_json::to_value(messages)?)
}

/// Wait for the watcher's first snapshot, falling back to whatever is
/// published when none arrives in time.
async fn first_snapshot<T: Clone>(mut sub: Subscription<T>) -> T {
    match tokio::time::timeout(SNAPSHOT_WAIT, sub.changed()).await {
        Ok(Some(value)) => value,
        _ => sub.current(),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
