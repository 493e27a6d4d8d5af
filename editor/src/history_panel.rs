use std::fmt;

use tessel_core::undo::{UndoHistory, UndoWorld};

/// One row of the history panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRow {
    /// Would be re-applied by redo.
    Redo(String),
    /// Marker between the two stacks.
    Current,
    /// Would be reverted by undo.
    Undo(String),
}

impl fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRow::Redo(label) => write!(f, "REDO {label}"),
            HistoryRow::Current => f.write_str("▸ current"),
            HistoryRow::Undo(label) => write!(f, "UNDO {label}"),
        }
    }
}

/// Snapshot of the undo/redo history for display.
///
/// Rows run top to bottom: redo entries with the next-to-redo closest to the
/// marker, the current marker, then undo entries most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPanel {
    pub undo_count: usize,
    pub redo_count: usize,
    pub rows: Vec<HistoryRow>,
}

impl HistoryPanel {
    pub fn new<W: UndoWorld>(history: &UndoHistory<W>) -> Self {
        let redo: Vec<&str> = history.redo_labels().collect();
        let rows = redo
            .iter()
            .rev()
            .map(|label| HistoryRow::Redo((*label).to_owned()))
            .chain(std::iter::once(HistoryRow::Current))
            .chain(history.undo_labels().map(|label| HistoryRow::Undo(label.to_owned())))
            .collect();
        Self {
            undo_count: history.undo_count(),
            redo_count: history.redo_count(),
            rows,
        }
    }
}

impl fmt::Display for HistoryPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Undo: {} | Redo: {}", self.undo_count, self.redo_count)?;
        for row in &self.rows {
            writeln!(f, "  {row}")?;
        }
        Ok(())
    }
}
