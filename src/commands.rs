use crate::action::{self, Action};
use crate::calendar::{self, date_key, Stamps};
use crate::model::{Board, BoardError};
use crate::storage::{
    cleanup_old_stamps, init_project_store, load_board, load_stamps, locate_store, save_board,
    save_stamps, StoreLocation, StoreScope,
};
use crate::ui;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::env;

pub fn init() -> Result<()> {
    let location = init_project_store()?;
    println!("Initialized store at {}", location.dir.display());
    Ok(())
}

pub fn list(column: Option<usize>) -> Result<()> {
    let store = open_store()?;
    println!(
        "Store: {} ({})",
        store.location.dir.display(),
        scope_label(store.location.scope)
    );
    let filter = column.map(index).transpose()?;
    for (idx, col) in store.board.columns.iter().enumerate() {
        if let Some(only) = filter {
            if idx != only {
                continue;
            }
        }
        println!("{}. {}", idx + 1, col.title);
        if col.rows.is_empty() {
            println!("  (empty)");
        }
        for (row_idx, row) in col.rows.iter().enumerate() {
            match &row.link {
                Some(link) => println!("  {}. {} -> {}", row_idx + 1, row.text, link),
                None => println!("  {}. {}", row_idx + 1, row.text),
            }
        }
        println!();
    }
    Ok(())
}

pub fn add(column: usize, text: String, link: Option<String>) -> Result<()> {
    let column = index(column)?;
    mutate(Action::AddRow {
        column,
        text,
        link: link.unwrap_or_default(),
    })?;
    println!("Added row to column {}", column + 1);
    Ok(())
}

pub fn edit(column: usize, row: usize, text: String) -> Result<()> {
    mutate(Action::EditText {
        column: index(column)?,
        row: index(row)?,
        text,
    })?;
    println!("Updated row {} in column {}", row, column);
    Ok(())
}

pub fn remove(column: usize, row: usize) -> Result<()> {
    mutate(Action::RemoveRow {
        column: index(column)?,
        row: index(row)?,
    })?;
    println!("Removed row {} from column {}", row, column);
    Ok(())
}

pub fn link(column: usize, row: usize, url: Option<String>, clear: bool) -> Result<()> {
    if clear {
        mutate(Action::ClearLink {
            column: index(column)?,
            row: index(row)?,
        })?;
        println!("Cleared link on row {} in column {}", row, column);
        return Ok(());
    }
    let url = url.ok_or_else(|| anyhow!("provide a URL, or --clear to remove the link"))?;
    if url.is_empty() {
        bail!("link target must not be empty");
    }
    mutate(Action::SetLink {
        column: index(column)?,
        row: index(row)?,
        url: url.clone(),
    })?;
    println!("Linked row {} in column {} to {}", row, column, url);
    Ok(())
}

pub fn mv(column: usize, from: usize, to: usize) -> Result<()> {
    mutate(Action::MoveRow {
        column: index(column)?,
        from: index(from)?,
        to: index(to)?,
    })?;
    println!("Moved row {} to position {} in column {}", from, to, column);
    Ok(())
}

pub fn retitle(column: usize, title: String) -> Result<()> {
    mutate(Action::SetTitle {
        column: index(column)?,
        title: title.clone(),
    })?;
    println!("Renamed column {} to {}", column, title);
    Ok(())
}

pub fn open_link(column: usize, row: usize) -> Result<()> {
    let column = index(column)?;
    let row = index(row)?;
    let store = open_store()?;
    let target = store.board.row(column, row)?;
    let url = target
        .link
        .as_deref()
        .ok_or(BoardError::LinkMissing { column, row })?;
    open::that(url).with_context(|| format!("opening {}", url))?;
    println!("Opened {}", url);
    Ok(())
}

pub fn stamp(date: Option<String>) -> Result<()> {
    let key = match date {
        Some(raw) => parse_date_key(&raw)?,
        None => {
            let today = Local::now().date_naive();
            date_key(today.year(), today.month(), today.day())
        }
    };
    let cwd = env::current_dir()?;
    let location = locate_store(&cwd)?;
    cleanup_old_stamps(&location, Local::now().date_naive())?;
    let mut board = load_board(&location);
    let mut stamps = load_stamps(&location);
    let dirty = action::apply(
        &mut board,
        &mut stamps,
        Action::ToggleStamp { key: key.clone() },
    )?;
    if dirty.stamps {
        save_stamps(&location, &stamps)?;
    }
    if stamps.is_stamped(&key) {
        println!("Stamped {}", key);
    } else {
        println!("Unstamped {}", key);
    }
    Ok(())
}

pub fn calendar(year: Option<i32>, month: Option<u32>) -> Result<()> {
    let today = Local::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());

    let store = open_store()?;
    cleanup_old_stamps(&store.location, today)?;
    let stamps = load_stamps(&store.location);
    let grid = calendar::month_grid(year, month, today, &stamps)
        .ok_or_else(|| anyhow!("invalid month {}-{}", year, month))?;

    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    let stamped = grid.days.iter().filter(|cell| cell.stamped).count();
    println!("{:^42}", format!("{} - {} stamped", title, stamped));
    for heading in ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"] {
        print!("{:>6}", heading);
    }
    println!();

    let mut line = String::new();
    let mut weekday = 0;
    for _ in 0..grid.leading {
        line.push_str("      ");
        weekday += 1;
    }
    for cell in &grid.days {
        let mut text = cell.day.to_string();
        if cell.stamped {
            text.push('*');
        }
        if cell.today {
            text = format!("[{}]", text);
        }
        line.push_str(&format!("{:>6}", text));
        weekday += 1;
        if weekday == 7 {
            println!("{}", line);
            line.clear();
            weekday = 0;
        }
    }
    if !line.is_empty() {
        println!("{}", line);
    }
    Ok(())
}

pub fn tui() -> Result<()> {
    let store = open_store()?;
    cleanup_old_stamps(&store.location, Local::now().date_naive())?;
    ui::run(store.board, store.location)
}

struct Store {
    location: StoreLocation,
    board: Board,
    stamps: Stamps,
}

fn open_store() -> Result<Store> {
    let cwd = env::current_dir()?;
    let location = locate_store(&cwd)?;
    let board = load_board(&location);
    let stamps = load_stamps(&location);
    Ok(Store {
        location,
        board,
        stamps,
    })
}

fn mutate(action: Action) -> Result<Store> {
    let mut store = open_store()?;
    let dirty = action::apply(&mut store.board, &mut store.stamps, action)?;
    if dirty.board {
        save_board(&store.location, &store.board)?;
    }
    if dirty.stamps {
        save_stamps(&store.location, &store.stamps)?;
    }
    Ok(store)
}

fn index(one_based: usize) -> Result<usize> {
    one_based
        .checked_sub(1)
        .ok_or_else(|| anyhow!("column and row numbers are 1-based"))
}

fn scope_label(scope: StoreScope) -> &'static str {
    match scope {
        StoreScope::Project => "project",
        StoreScope::Global => "global",
    }
}

/// Accepts `Y-M-D` with or without zero-padding and re-derives the
/// canonical unpadded storage key.
fn parse_date_key(raw: &str) -> Result<String> {
    let parts: Vec<&str> = raw.trim().split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        bail!("invalid date (use Y-M-D): {}", raw);
    };
    let year: i32 = year.parse().with_context(|| format!("invalid year in {}", raw))?;
    let month: u32 = month.parse().with_context(|| format!("invalid month in {}", raw))?;
    let day: u32 = day.parse().with_context(|| format!("invalid day in {}", raw))?;
    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        bail!("no such date: {}", raw);
    }
    Ok(date_key(year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_key_parse_normalizes_padding() {
        assert_eq!(parse_date_key("2025-04-07").unwrap(), "2025-4-7");
        assert_eq!(parse_date_key("2025-12-31").unwrap(), "2025-12-31");
    }

    #[test]
    fn date_key_parse_rejects_garbage() {
        assert!(parse_date_key("2025-13-1").is_err());
        assert!(parse_date_key("2025-2-30").is_err());
        assert!(parse_date_key("soon").is_err());
    }

    #[test]
    fn cli_indexes_are_one_based() {
        assert_eq!(index(1).unwrap(), 0);
        assert!(index(0).is_err());
    }
}
