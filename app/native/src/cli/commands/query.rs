//! `aegis query`: read window manager state without a running daemon.

use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::output;
use crate::config::AegisConfig;
use crate::error::AegisError;
use crate::state::icons::project_icons;
use crate::state::{BundleIconResolver, Space, Window, WindowIcon};
use crate::yabai::{Gateway, YabaiGateway};

/// Longest title shown in the windows table.
const TITLE_COLUMN_WIDTH: usize = 40;

/// Query subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum QueryCommands {
    /// List spaces in Mission Control order.
    #[command(after_long_help = r#"Examples:
  aegis query spaces          # Table of all spaces
  aegis query --json spaces   # Output as JSON"#)]
    Spaces,

    /// List windows.
    ///
    /// Dialogs, sheets and other non-standard windows are hidden unless
    /// --all is given.
    #[command(after_long_help = r#"Examples:
  aegis query windows             # Regular windows on every space
  aegis query windows --space 2   # Windows on space 2
  aegis query windows --all       # Include dialogs and sheets"#)]
    Windows {
        /// Only show windows on this space.
        #[arg(long, value_parser = super::types::parse_space_index)]
        space: Option<u32>,

        /// Include non-standard windows.
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Show the icon strip projection (one entry per regular window).
    Icons {
        /// Only show icons for windows on this space.
        #[arg(long, value_parser = super::types::parse_space_index)]
        space: Option<u32>,
    },
}

/// Runs a query and prints the result.
///
/// # Errors
///
/// Returns an error when the window manager cannot be queried.
pub async fn execute(
    command: &QueryCommands,
    json: bool,
    gateway: &YabaiGateway,
    config: &AegisConfig,
) -> Result<(), AegisError> {
    match command {
        QueryCommands::Spaces => {
            let spaces = gateway.list_spaces().await?;
            render(&spaces, json, print_spaces)
        }
        QueryCommands::Windows { space, all } => {
            let windows: Vec<Window> = gateway
                .list_windows(*space)
                .await?
                .into_iter()
                .filter(|window| *all || window.is_displayable())
                .collect();
            render(&windows, json, print_windows)
        }
        QueryCommands::Icons { space } => {
            let windows = gateway.list_windows(*space).await?;
            let mut resolver = BundleIconResolver::from_config(&config.icons);
            let icons = project_icons(&windows, &mut resolver, &config.icons);
            render(&icons, json, print_icons)
        }
    }
}

fn render<T: Serialize>(items: &[T], json: bool, table: fn(&[T])) -> Result<(), AegisError> {
    if json {
        output::print_highlighted_json(&serde_json::to_value(items)?);
    } else {
        table(items);
    }
    Ok(())
}

fn print_spaces(spaces: &[Space]) {
    #[derive(Tabled)]
    struct SpaceRow {
        #[tabled(rename = "Index")]
        index: u32,
        #[tabled(rename = "Label")]
        label: String,
        #[tabled(rename = "Kind")]
        kind: &'static str,
        #[tabled(rename = "Display")]
        display: u32,
        #[tabled(rename = "Windows")]
        windows: usize,
        #[tabled(rename = "Focused")]
        focused: String,
        #[tabled(rename = "Visible")]
        visible: String,
    }

    let rows = spaces
        .iter()
        .map(|space| SpaceRow {
            index: space.index,
            label: space.label.clone().unwrap_or_else(|| "-".dimmed().to_string()),
            kind: space.kind.as_str(),
            display: space.display,
            windows: space.windows.len(),
            focused: output::format_bool(space.is_focused),
            visible: output::format_bool(space.is_visible),
        })
        .collect();

    output::print_table("Spaces", rows);
}

fn print_windows(windows: &[Window]) {
    #[derive(Tabled)]
    struct WindowRow {
        #[tabled(rename = "ID")]
        id: u64,
        #[tabled(rename = "App")]
        app: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Space")]
        space: u32,
        #[tabled(rename = "Stack")]
        stack: String,
        #[tabled(rename = "Focused")]
        focused: String,
        #[tabled(rename = "Floating")]
        floating: String,
    }

    let rows = windows
        .iter()
        .map(|window| WindowRow {
            id: window.id,
            app: window.app.clone(),
            title: output::truncate(&window.title, TITLE_COLUMN_WIDTH),
            space: window.space,
            stack: if window.is_stacked() { window.stack_index.to_string() } else { "-".to_string() },
            focused: output::format_bool(window.is_focused),
            floating: output::format_bool(window.is_floating),
        })
        .collect();

    output::print_table("Windows", rows);
}

fn print_icons(icons: &[WindowIcon]) {
    #[derive(Tabled)]
    struct IconRow {
        #[tabled(rename = "Window")]
        id: u64,
        #[tabled(rename = "App")]
        app: String,
        #[tabled(rename = "Label width")]
        label_width: String,
        #[tabled(rename = "Bundle")]
        bundle: String,
    }

    let rows = icons
        .iter()
        .map(|icon| IconRow {
            id: icon.id(),
            app: icon.icon.app.clone(),
            label_width: format!("{:.0}", icon.label_width),
            bundle: icon.icon.bundle_path.as_ref().map_or_else(
                || "not found".yellow().to_string(),
                |path| path.display().to_string(),
            ),
        })
        .collect();

    output::print_table("Icons", rows);
}
