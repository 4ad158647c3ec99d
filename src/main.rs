mod action;
mod calendar;
mod cli;
mod commands;
mod drag;
mod model;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::List { column } => commands::list(column),
        cli::Command::Add { column, text, link } => commands::add(column, text, link),
        cli::Command::Edit { column, row, text } => commands::edit(column, row, text),
        cli::Command::Remove { column, row } => commands::remove(column, row),
        cli::Command::Link {
            column,
            row,
            url,
            clear,
        } => commands::link(column, row, url, clear),
        cli::Command::Move { column, from, to } => commands::mv(column, from, to),
        cli::Command::Retitle { column, title } => commands::retitle(column, title),
        cli::Command::Open { column, row } => commands::open_link(column, row),
        cli::Command::Stamp { date } => commands::stamp(date),
        cli::Command::Calendar { year, month } => commands::calendar(year, month),
        cli::Command::Tui => commands::tui(),
    }
}
