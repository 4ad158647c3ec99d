use crate::calendar::{self, Stamps};
use crate::model::{Board, Row};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const BOARD_FILE: &str = "board.json";
const STAMP_FILE: &str = "stamps.json";
const PROJECT_DIR: &str = ".stampdesk";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub dir: PathBuf,
    pub scope: StoreScope,
}

impl StoreLocation {
    pub fn board_path(&self) -> PathBuf {
        self.dir.join(BOARD_FILE)
    }

    pub fn stamp_path(&self) -> PathBuf {
        self.dir.join(STAMP_FILE)
    }
}

/// On-disk shape of one column. `link` is a plain string, empty when the
/// row has none.
#[derive(Debug, Serialize, Deserialize)]
struct StoredColumn {
    title: String,
    rows: Vec<StoredRow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    text: String,
    #[serde(default)]
    link: String,
}

pub fn init_project_store() -> Result<StoreLocation> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .stampdesk directory")?;
    let location = StoreLocation {
        dir,
        scope: StoreScope::Project,
    };
    if !location.board_path().exists() {
        save_board(&location, &Board::default_layout())?;
    }
    Ok(location)
}

pub fn locate_store(start: &Path) -> Result<StoreLocation> {
    if let Some(dir) = find_project_store(start) {
        return Ok(StoreLocation {
            dir,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        dir: global_store_dir()?,
        scope: StoreScope::Global,
    })
}

/// Restores the board from its record, overlaying stored columns onto the
/// default layout by position index. Stored columns beyond the layout are
/// ignored; layout columns without a stored entry keep their defaults. A
/// missing or unparsable record leaves the defaults untouched.
pub fn load_board(location: &StoreLocation) -> Board {
    let mut board = Board::default_layout();
    let Some(stored) = read_record::<Vec<StoredColumn>>(&location.board_path()) else {
        return board;
    };
    for (column, data) in board.columns.iter_mut().zip(stored) {
        column.title = data.title;
        column.rows = data
            .rows
            .into_iter()
            .map(|row| Row::new(row.text, row.link))
            .collect();
    }
    board
}

/// Writes the whole column store as one record. No validation: every value,
/// including empty text, is stored as-is.
pub fn save_board(location: &StoreLocation, board: &Board) -> Result<()> {
    let stored: Vec<StoredColumn> = board
        .columns
        .iter()
        .map(|column| StoredColumn {
            title: column.title.clone(),
            rows: column
                .rows
                .iter()
                .map(|row| StoredRow {
                    text: row.text.clone(),
                    link: row.link.clone().unwrap_or_default(),
                })
                .collect(),
        })
        .collect();
    write_record(&location.board_path(), &stored).context("saving board")
}

/// A missing or unparsable stamp record reads as empty.
pub fn load_stamps(location: &StoreLocation) -> Stamps {
    read_record(&location.stamp_path()).unwrap_or_default()
}

pub fn save_stamps(location: &StoreLocation, stamps: &Stamps) -> Result<()> {
    write_record(&location.stamp_path(), stamps).context("saving stamps")
}

/// January-only sweep, run once per process start: rewrites the stamp
/// record keeping only the current and previous year. Outside January the
/// record is left untouched. Returns whether any entries were dropped.
pub fn cleanup_old_stamps(location: &StoreLocation, today: NaiveDate) -> Result<bool> {
    let Some(cutoff) = calendar::cleanup_cutoff(today) else {
        return Ok(false);
    };
    let mut stamps = load_stamps(location);
    let removed = stamps.retain_from_year(cutoff);
    save_stamps(location, &stamps)?;
    Ok(removed)
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "stampdesk").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::date_key;

    fn temp_store() -> (tempfile::TempDir, StoreLocation) {
        let tmp = tempfile::tempdir().unwrap();
        let location = StoreLocation {
            dir: tmp.path().join(PROJECT_DIR),
            scope: StoreScope::Project,
        };
        (tmp, location)
    }

    // --- board record ---

    #[test]
    fn board_round_trips_titles_texts_and_links_in_order() {
        let (_tmp, location) = temp_store();
        let mut board = Board::default_layout();
        board.columns[0].title = "Reading".into();
        board.columns[0].rows = vec![
            Row::new("rust book", "https://doc.rust-lang.org/book/"),
            Row::new("plain row", ""),
        ];
        board.columns[2].rows = vec![Row::new("", "")];
        save_board(&location, &board).unwrap();

        assert_eq!(load_board(&location), board);
    }

    #[test]
    fn save_is_idempotent() {
        let (_tmp, location) = temp_store();
        let mut board = Board::default_layout();
        board.columns[1].rows.push(Row::new("x", "https://x"));
        save_board(&location, &board).unwrap();
        let first = fs::read(location.board_path()).unwrap();
        save_board(&location, &board).unwrap();
        assert_eq!(fs::read(location.board_path()).unwrap(), first);
    }

    #[test]
    fn missing_record_keeps_default_layout() {
        let (_tmp, location) = temp_store();
        assert_eq!(load_board(&location), Board::default_layout());
    }

    #[test]
    fn malformed_record_keeps_default_layout() {
        let (_tmp, location) = temp_store();
        fs::create_dir_all(&location.dir).unwrap();
        fs::write(location.board_path(), "not json {{{").unwrap();
        assert_eq!(load_board(&location), Board::default_layout());
    }

    #[test]
    fn extra_stored_columns_are_ignored() {
        let (_tmp, location) = temp_store();
        fs::create_dir_all(&location.dir).unwrap();
        let four_columns: Vec<StoredColumn> = (0..4)
            .map(|i| StoredColumn {
                title: format!("col {}", i),
                rows: vec![StoredRow {
                    text: format!("row {}", i),
                    link: String::new(),
                }],
            })
            .collect();
        fs::write(
            location.board_path(),
            serde_json::to_string(&four_columns).unwrap(),
        )
        .unwrap();

        let board = load_board(&location);
        assert_eq!(board.columns.len(), 3);
        assert_eq!(board.columns[2].title, "col 2");
    }

    #[test]
    fn short_record_leaves_remaining_columns_at_default() {
        let (_tmp, location) = temp_store();
        fs::create_dir_all(&location.dir).unwrap();
        let one_column = vec![StoredColumn {
            title: "only".into(),
            rows: Vec::new(),
        }];
        fs::write(
            location.board_path(),
            serde_json::to_string(&one_column).unwrap(),
        )
        .unwrap();

        let board = load_board(&location);
        assert_eq!(board.columns[0].title, "only");
        assert_eq!(board.columns[1], Board::default_layout().columns[1]);
        assert_eq!(board.columns[2], Board::default_layout().columns[2]);
    }

    #[test]
    fn link_field_defaults_when_absent_from_record() {
        let (_tmp, location) = temp_store();
        fs::create_dir_all(&location.dir).unwrap();
        fs::write(
            location.board_path(),
            r#"[{"title":"t","rows":[{"text":"no link field"}]}]"#,
        )
        .unwrap();
        assert_eq!(load_board(&location).columns[0].rows[0].link, None);
    }

    // --- stamp record ---

    #[test]
    fn stamps_round_trip() {
        let (_tmp, location) = temp_store();
        let mut stamps = Stamps::default();
        stamps.toggle(&date_key(2025, 4, 7));
        stamps.toggle(&date_key(2025, 12, 31));
        save_stamps(&location, &stamps).unwrap();
        assert_eq!(load_stamps(&location), stamps);
    }

    #[test]
    fn malformed_stamp_record_reads_empty() {
        let (_tmp, location) = temp_store();
        fs::create_dir_all(&location.dir).unwrap();
        fs::write(location.stamp_path(), "[1, 2, 3]").unwrap();
        assert!(load_stamps(&location).is_empty());
    }

    // --- cleanup sweep ---

    #[test]
    fn january_sweep_rewrites_record() {
        let (_tmp, location) = temp_store();
        let mut stamps = Stamps::default();
        for year in [2021, 2024, 2025] {
            stamps.toggle(&date_key(year, 5, 5));
        }
        save_stamps(&location, &stamps).unwrap();

        let removed = cleanup_old_stamps(
            &location,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        )
        .unwrap();
        assert!(removed);
        let reloaded = load_stamps(&location);
        assert_eq!(reloaded.len(), 2);
        assert!(!reloaded.is_stamped(&date_key(2021, 5, 5)));
    }

    #[test]
    fn sweep_outside_january_leaves_record_alone() {
        let (_tmp, location) = temp_store();
        let mut stamps = Stamps::default();
        stamps.toggle(&date_key(2019, 5, 5));
        save_stamps(&location, &stamps).unwrap();
        let before = fs::read(location.stamp_path()).unwrap();

        let removed = cleanup_old_stamps(
            &location,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        )
        .unwrap();
        assert!(!removed);
        assert_eq!(fs::read(location.stamp_path()).unwrap(), before);
    }

    // --- discovery ---

    #[test]
    fn project_store_is_found_from_nested_directory() {
        let (tmp, location) = temp_store();
        fs::create_dir_all(&location.dir).unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let found = locate_store(&nested).unwrap();
        assert_eq!(found.scope, StoreScope::Project);
        assert_eq!(found.dir, location.dir);
    }
}
