use super::open_storage;
use crate::cli::PrefsCommand;
use crate::config::Config;
use crate::error::Result;
use crate::preferences::Preferences;
use colored::Colorize;

/// Handle preference commands
pub fn handle_prefs(config: &Config, command: PrefsCommand) -> Result<()> {
    let prefs = Preferences::new(open_storage(config)?);

    match command {
        PrefsCommand::Show => {
            println!("sidebar_collapsed: {}", prefs.sidebar_collapsed());
        }
        PrefsCommand::ToggleSidebar => {
            let collapsed = prefs.toggle_sidebar()?;
            println!("{}", sidebar_label(collapsed).green());
        }
    }

    Ok(())
}

pub(crate) fn sidebar_label(collapsed: bool) -> &'static str {
    if collapsed {
        "Sidebar collapsed"
    } else {
        "Sidebar expanded"
    }
}
