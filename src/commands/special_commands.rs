//! Special commands parser for interactive chat mode
//!
//! Special commands manage the conversation instead of being sent to the
//! query service. They are prefixed with `/`, matched case-insensitively,
//! and take at most one argument (a session ID).

use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Save the current conversation and start a new one
    NewChat,

    /// List stored sessions grouped by day
    ShowHistory,

    /// Make a stored session the active one and replay it
    Load(String),

    /// Delete a stored session
    Delete(String),

    /// Delete every stored session
    ClearHistory,

    /// Collapse or expand the history sidebar
    ToggleSidebar,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a question
    None,
}

/// Parse user input into a special command
///
/// Input that does not start with `/` is a question, except for the bare
/// words `exit` and `quit`.
///
/// # Examples
///
/// ```
/// use ragdesk::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/load 01J0ABC").unwrap(),
///     SpecialCommand::Load("01J0ABC".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    match (command.as_str(), argument) {
        ("/new", _) => Ok(SpecialCommand::NewChat),
        ("/history", _) => Ok(SpecialCommand::ShowHistory),
        ("/clear", _) => Ok(SpecialCommand::ClearHistory),
        ("/sidebar", _) => Ok(SpecialCommand::ToggleSidebar),
        ("/help" | "/?", _) => Ok(SpecialCommand::Help),
        ("/exit" | "/quit" | "exit" | "quit", _) => Ok(SpecialCommand::Exit),

        // Session IDs keep their original case
        ("/load", Some(id)) => Ok(SpecialCommand::Load(id.to_string())),
        ("/delete", Some(id)) => Ok(SpecialCommand::Delete(id.to_string())),
        ("/load" | "/delete", None) => Err(CommandError::MissingArgument {
            command: command.clone(),
            usage: format!("{} <session-id>", command),
        }),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the special commands help text
pub fn print_help() {
    println!();
    println!("{}", "Special commands:".bold());
    println!("  {}            Save this conversation and start a new one", "/new".cyan());
    println!("  {}        List stored conversations", "/history".cyan());
    println!("  {}      Resume a stored conversation", "/load <id>".cyan());
    println!("  {}    Delete a stored conversation", "/delete <id>".cyan());
    println!("  {}          Delete every stored conversation", "/clear".cyan());
    println!("  {}        Collapse or expand the history sidebar", "/sidebar".cyan());
    println!("  {}           Show this help", "/help".cyan());
    println!("  {}           Leave the chat", "/exit".cyan());
    println!();
    println!("Anything else is sent as a question.");
    println!();
}
