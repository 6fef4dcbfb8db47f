//! Interactive chat mode handler.
//!
//! Builds a [`ChatClient`] on top of the durable history and the query
//! service, then runs a readline loop that sends questions and handles
//! special commands.

use super::history::print_history;
use super::prefs::sidebar_label;
use super::special_commands::{parse_special_command, print_help, SpecialCommand};
use super::{open_storage, print_message, print_session};
use crate::api::HttpQueryClient;
use crate::chat::ChatClient;
use crate::config::Config;
use crate::error::{Result, RagdeskError};
use crate::preferences::Preferences;
use crate::session::{SessionId, SessionStore};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

fn build_client(config: &Config) -> Result<(ChatClient, Preferences)> {
    let storage = open_storage(config)?;
    let store = SessionStore::from_config(storage.clone(), &config.history);
    let api = Arc::new(HttpQueryClient::from_config(&config.services)?);
    let client = ChatClient::from_config(store, api, &config.history);
    Ok((client, Preferences::new(storage)))
}

fn resume(client: &mut ChatClient, id: &str) -> Result<()> {
    let id = SessionId::from(id);
    if !client.store_mut().resume_session(&id) {
        return Err(RagdeskError::NotFound(format!("Session {}", id)).into());
    }
    Ok(())
}

/// Ask one question and print the answer
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `question` - Question text
/// * `session` - Stored session to continue instead of starting a new one
pub async fn run_ask(config: Config, question: String, session: Option<String>) -> Result<()> {
    let (mut client, _) = build_client(&config)?;
    if let Some(id) = &session {
        resume(&mut client, id)?;
    }

    let answer = client.ask(&question).await?;
    print_message(&answer);
    println!(
        "{}",
        format!("Session: {}", client.store().current_id()).dimmed()
    );
    Ok(())
}

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `resume_id` - Stored session to resume
pub async fn run_chat(config: Config, resume_id: Option<String>) -> Result<()> {
    tracing::info!("Starting interactive chat mode");

    let (mut client, prefs) = build_client(&config)?;
    let mut rl = DefaultEditor::new()?;

    print_welcome_banner(&config);

    if let Some(id) = &resume_id {
        resume(&mut client, id)?;
        print_session(client.store().current_session());
    }

    if !prefs.sidebar_collapsed() {
        print_history(&client.store().load_history());
    }

    loop {
        match rl.readline(&format!("{} ", "ragdesk>".bold().cyan())) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}\n", e.to_string().red());
                        continue;
                    }
                };

                match command {
                    SpecialCommand::NewChat => {
                        let id = client.store_mut().start_session();
                        println!("{}\n", format!("Started new chat {}", id).green());
                    }
                    SpecialCommand::ShowHistory => print_history(&client.store().load_history()),
                    SpecialCommand::Load(id) => match resume(&mut client, &id) {
                        Ok(()) => print_session(client.store().current_session()),
                        Err(e) => eprintln!("{}\n", e.to_string().red()),
                    },
                    SpecialCommand::Delete(id) => {
                        let id = SessionId::from(id);
                        match client.store_mut().delete_session(&id) {
                            Ok(()) => println!("{}\n", format!("Deleted session {}", id).green()),
                            Err(e) => eprintln!("{}\n", format!("Error: {:#}", e).red()),
                        }
                    }
                    SpecialCommand::ClearHistory => match client.store_mut().clear_all() {
                        Ok(()) => println!("{}\n", "Chat history cleared.".green()),
                        Err(e) => eprintln!("{}\n", format!("Error: {:#}", e).red()),
                    },
                    SpecialCommand::ToggleSidebar => match prefs.toggle_sidebar() {
                        Ok(collapsed) => {
                            println!("{}\n", sidebar_label(collapsed));
                            if !collapsed {
                                print_history(&client.store().load_history());
                            }
                        }
                        Err(e) => eprintln!("{}\n", format!("Error: {:#}", e).red()),
                    },
                    SpecialCommand::Help => print_help(),
                    SpecialCommand::Exit => break,
                    SpecialCommand::None => match client.ask(trimmed).await {
                        Ok(answer) => {
                            println!();
                            print_message(&answer);
                            println!();
                        }
                        Err(e) => {
                            if let Some(last) = client.store().messages().last() {
                                print_message(last);
                            }
                            eprintln!("{}\n", format!("Error: {:#}", e).red());
                        }
                    },
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_welcome_banner(config: &Config) {
    println!();
    println!("{}", "ragdesk - ask your documents".bold());
    println!(
        "{}",
        format!("Query service: {}", config.services.query_url).dimmed()
    );
    println!("Type {} for commands.", "/help".cyan());
    println!();
}
