/// One editable board entry. Identity is positional: a row is addressed by
/// its index within its column, and reordering changes that identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub text: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub rows: Vec<Row>,
}

/// The column store backing the board widget. The column count is fixed by
/// the default layout at startup; only titles, row contents and row order
/// mutate afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub columns: Vec<Column>,
}

#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("no column {0}")]
    ColumnOutOfRange(usize),
    #[error("no row {row} in column {column}")]
    RowOutOfRange { column: usize, row: usize },
    #[error("row {row} in column {column} has no link")]
    LinkMissing { column: usize, row: usize },
}

impl Row {
    /// `link` is kept only when non-empty; an empty string means "no link",
    /// matching the persisted wire shape.
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        let link = link.into();
        Row {
            text: text.into(),
            link: if link.is_empty() { None } else { Some(link) },
        }
    }

}

impl Board {
    pub fn default_layout() -> Self {
        Board {
            columns: vec![
                Column {
                    title: "Today".into(),
                    rows: Vec::new(),
                },
                Column {
                    title: "Notes".into(),
                    rows: Vec::new(),
                },
                Column {
                    title: "Links".into(),
                    rows: Vec::new(),
                },
            ],
        }
    }

    pub fn column(&self, index: usize) -> Result<&Column, BoardError> {
        self.columns
            .get(index)
            .ok_or(BoardError::ColumnOutOfRange(index))
    }

    pub fn column_mut(&mut self, index: usize) -> Result<&mut Column, BoardError> {
        self.columns
            .get_mut(index)
            .ok_or(BoardError::ColumnOutOfRange(index))
    }

    pub fn row(&self, column: usize, row: usize) -> Result<&Row, BoardError> {
        self.column(column)?
            .rows
            .get(row)
            .ok_or(BoardError::RowOutOfRange { column, row })
    }

    pub fn set_title(&mut self, column: usize, title: String) -> Result<(), BoardError> {
        self.column_mut(column)?.title = title;
        Ok(())
    }

    /// Appends a row and returns its index.
    pub fn add_row(&mut self, column: usize, row: Row) -> Result<usize, BoardError> {
        let rows = &mut self.column_mut(column)?.rows;
        rows.push(row);
        Ok(rows.len() - 1)
    }

    pub fn edit_text(&mut self, column: usize, row: usize, text: String) -> Result<(), BoardError> {
        self.row_mut(column, row)?.text = text;
        Ok(())
    }

    pub fn set_link(&mut self, column: usize, row: usize, url: String) -> Result<(), BoardError> {
        self.row_mut(column, row)?.link = Some(url);
        Ok(())
    }

    pub fn clear_link(&mut self, column: usize, row: usize) -> Result<(), BoardError> {
        self.row_mut(column, row)?.link = None;
        Ok(())
    }

    pub fn remove_row(&mut self, column: usize, row: usize) -> Result<Row, BoardError> {
        let rows = &mut self.column_mut(column)?.rows;
        if row >= rows.len() {
            return Err(BoardError::RowOutOfRange { column, row });
        }
        Ok(rows.remove(row))
    }

    /// Reorders within one column: removes the row at `from`, then inserts it
    /// at `to` in the shortened list. `to` may equal the new end index.
    pub fn move_row(&mut self, column: usize, from: usize, to: usize) -> Result<(), BoardError> {
        let rows = &mut self.column_mut(column)?.rows;
        if from >= rows.len() {
            return Err(BoardError::RowOutOfRange { column, row: from });
        }
        let moved = rows.remove(from);
        let to = to.min(rows.len());
        rows.insert(to, moved);
        Ok(())
    }

    fn row_mut(&mut self, column: usize, row: usize) -> Result<&mut Row, BoardError> {
        self.column_mut(column)?
            .rows
            .get_mut(row)
            .ok_or(BoardError::RowOutOfRange { column, row })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_rows(texts: &[&str]) -> Board {
        let mut board = Board::default_layout();
        for text in texts {
            board.columns[0].rows.push(Row::new(*text, ""));
        }
        board
    }

    #[test]
    fn empty_link_becomes_none() {
        assert_eq!(Row::new("a", "").link, None);
        assert_eq!(Row::new("a", "https://x").link.as_deref(), Some("https://x"));
    }

    #[test]
    fn move_row_forward_and_back() {
        let mut board = board_with_rows(&["a", "b", "c", "d"]);
        board.move_row(0, 0, 2).unwrap();
        let texts: Vec<_> = board.columns[0].rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["b", "c", "a", "d"]);

        board.move_row(0, 2, 0).unwrap();
        let texts: Vec<_> = board.columns[0].rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
    }

    #[test]
    fn move_row_to_end_clamps() {
        let mut board = board_with_rows(&["a", "b", "c"]);
        board.move_row(0, 0, 99).unwrap();
        let texts: Vec<_> = board.columns[0].rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["b", "c", "a"]);
    }

    #[test]
    fn out_of_range_reports_typed_errors() {
        let mut board = board_with_rows(&["a"]);
        assert!(matches!(
            board.edit_text(7, 0, "x".into()),
            Err(BoardError::ColumnOutOfRange(7))
        ));
        assert!(matches!(
            board.remove_row(0, 5),
            Err(BoardError::RowOutOfRange { column: 0, row: 5 })
        ));
    }
}
