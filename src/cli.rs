use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stampdesk", version, about = "Terminal link board and stamp calendar")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a project store in the current directory
    Init,
    /// List columns and their rows
    List {
        /// Show a single column (1-based)
        #[arg(long)]
        column: Option<usize>,
    },
    /// Append a row to a column
    Add {
        /// Column number (1-based)
        column: usize,
        /// Row text
        text: String,
        /// Attach a link to the new row
        #[arg(long)]
        link: Option<String>,
    },
    /// Replace a row's text
    Edit {
        /// Column number (1-based)
        column: usize,
        /// Row number (1-based)
        row: usize,
        /// New text
        text: String,
    },
    /// Delete a row
    Remove {
        /// Column number (1-based)
        column: usize,
        /// Row number (1-based)
        row: usize,
    },
    /// Set or clear a row's link
    Link {
        /// Column number (1-based)
        column: usize,
        /// Row number (1-based)
        row: usize,
        /// Link target (omit together with --clear to remove)
        url: Option<String>,
        /// Remove the row's link
        #[arg(long)]
        clear: bool,
    },
    /// Move a row to a new position within its column
    Move {
        /// Column number (1-based)
        column: usize,
        /// Current row number (1-based)
        from: usize,
        /// Target row number (1-based)
        to: usize,
    },
    /// Rename a column
    Retitle {
        /// Column number (1-based)
        column: usize,
        /// New title
        title: String,
    },
    /// Open a row's link with the system opener
    Open {
        /// Column number (1-based)
        column: usize,
        /// Row number (1-based)
        row: usize,
    },
    /// Toggle the stamp for a date
    Stamp {
        /// Date as Y-M-D (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Print a month's stamp calendar
    Calendar {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },
    /// Launch the interactive TUI
    Tui,
}
