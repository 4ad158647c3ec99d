//! User actions and the reducer that applies them to the state model.
//!
//! Both the CLI and the TUI funnel their mutations through [`apply`], which
//! reports the state slices that must be flushed to storage afterwards.

use crate::calendar::Stamps;
use crate::model::{Board, BoardError, Row};

#[derive(Debug, Clone)]
pub enum Action {
    SetTitle { column: usize, title: String },
    AddRow { column: usize, text: String, link: String },
    EditText { column: usize, row: usize, text: String },
    SetLink { column: usize, row: usize, url: String },
    ClearLink { column: usize, row: usize },
    RemoveRow { column: usize, row: usize },
    MoveRow { column: usize, from: usize, to: usize },
    ToggleStamp { key: String },
}

/// Which persisted records an action touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    pub board: bool,
    pub stamps: bool,
}

impl Dirty {
    const BOARD: Dirty = Dirty {
        board: true,
        stamps: false,
    };
    const STAMPS: Dirty = Dirty {
        board: false,
        stamps: true,
    };
    const NONE: Dirty = Dirty {
        board: false,
        stamps: false,
    };

    pub fn any(&self) -> bool {
        self.board || self.stamps
    }
}

pub fn apply(board: &mut Board, stamps: &mut Stamps, action: Action) -> Result<Dirty, BoardError> {
    match action {
        Action::SetTitle { column, title } => {
            board.set_title(column, title)?;
            Ok(Dirty::BOARD)
        }
        Action::AddRow { column, text, link } => {
            board.add_row(column, Row::new(text, link))?;
            Ok(Dirty::BOARD)
        }
        Action::EditText { column, row, text } => {
            board.edit_text(column, row, text)?;
            Ok(Dirty::BOARD)
        }
        Action::SetLink { column, row, url } => {
            // An empty entry means the prompt was cancelled or left blank:
            // no mutation, no persistence.
            if url.is_empty() {
                board.row(column, row)?;
                return Ok(Dirty::NONE);
            }
            board.set_link(column, row, url)?;
            Ok(Dirty::BOARD)
        }
        Action::ClearLink { column, row } => {
            board.clear_link(column, row)?;
            Ok(Dirty::BOARD)
        }
        Action::RemoveRow { column, row } => {
            board.remove_row(column, row)?;
            Ok(Dirty::BOARD)
        }
        Action::MoveRow { column, from, to } => {
            board.move_row(column, from, to)?;
            Ok(Dirty::BOARD)
        }
        Action::ToggleStamp { key } => {
            stamps.toggle(&key);
            Ok(Dirty::STAMPS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::date_key;

    fn fixtures() -> (Board, Stamps) {
        let mut board = Board::default_layout();
        board.columns[0].rows.push(Row::new("first", ""));
        (board, Stamps::default())
    }

    #[test]
    fn board_actions_mark_only_the_board_dirty() {
        let (mut board, mut stamps) = fixtures();
        let dirty = apply(
            &mut board,
            &mut stamps,
            Action::AddRow {
                column: 1,
                text: "hello".into(),
                link: String::new(),
            },
        )
        .unwrap();
        assert_eq!(dirty, Dirty::BOARD);
        assert_eq!(board.columns[1].rows.len(), 1);
        assert!(stamps.is_empty());
    }

    #[test]
    fn empty_link_entry_is_a_no_op() {
        let (mut board, mut stamps) = fixtures();
        let dirty = apply(
            &mut board,
            &mut stamps,
            Action::SetLink {
                column: 0,
                row: 0,
                url: String::new(),
            },
        )
        .unwrap();
        assert!(!dirty.any());
        assert_eq!(board.columns[0].rows[0].link, None);
    }

    #[test]
    fn set_link_persists_and_marks_row_openable() {
        let (mut board, mut stamps) = fixtures();
        let dirty = apply(
            &mut board,
            &mut stamps,
            Action::SetLink {
                column: 0,
                row: 0,
                url: "https://example.com".into(),
            },
        )
        .unwrap();
        assert_eq!(dirty, Dirty::BOARD);
        assert_eq!(
            board.columns[0].rows[0].link.as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn toggle_stamp_marks_only_stamps_dirty() {
        let (mut board, mut stamps) = fixtures();
        let key = date_key(2025, 4, 7);
        let dirty = apply(
            &mut board,
            &mut stamps,
            Action::ToggleStamp { key: key.clone() },
        )
        .unwrap();
        assert_eq!(dirty, Dirty::STAMPS);
        assert!(stamps.is_stamped(&key));
    }

    #[test]
    fn out_of_range_action_is_an_error_not_a_mutation() {
        let (mut board, mut stamps) = fixtures();
        let before = board.clone();
        let result = apply(
            &mut board,
            &mut stamps,
            Action::RemoveRow { column: 0, row: 9 },
        );
        assert!(result.is_err());
        assert_eq!(board, before);
    }
}
