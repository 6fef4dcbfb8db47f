use super::{open_storage, print_session};
use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::{Result, RagdeskError};
use crate::session::{group_by_recency, SessionId, SessionStore, SessionSummary};
use chrono::Local;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let mut store = SessionStore::from_config(open_storage(config)?, &config.history);

    match command {
        HistoryCommand::List => print_history(&store.load_history()),
        HistoryCommand::Show { id } => {
            let session = store
                .load_session(&SessionId::from(id.as_str()))
                .ok_or_else(|| RagdeskError::NotFound(format!("Session {}", id)))?;
            print_session(&session);
        }
        HistoryCommand::Delete { id } => {
            let id = SessionId::from(id);
            if store.load_session(&id).is_none() {
                return Err(RagdeskError::NotFound(format!("Session {}", id)).into());
            }
            store.delete_session(&id)?;
            println!("{}", format!("Deleted session {}", id).green());
        }
        HistoryCommand::Clear => {
            store.clear_all()?;
            println!("{}", "Chat history cleared.".green());
        }
    }

    Ok(())
}

/// Print sessions as tables grouped into Today / Yesterday / Older
pub(crate) fn print_history(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("{}", "No chat history yet.".yellow());
        return;
    }

    let groups = group_by_recency(sessions.iter().cloned(), &Local::now());
    for (label, items) in groups.labeled() {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(prettytable::row![
            "ID".bold(),
            "Title".bold(),
            "Messages".bold(),
            "Last Updated".bold()
        ]);

        for session in items {
            let updated = session
                .updated_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            table.add_row(prettytable::row![
                session.id.as_str().cyan(),
                session.title,
                session.message_count,
                updated
            ]);
        }

        println!("\n{}", label.bold());
        table.printstd();
    }

    println!();
    println!(
        "Use {} to continue a session.",
        "ragdesk chat --resume <ID>".cyan()
    );
    println!();
}
