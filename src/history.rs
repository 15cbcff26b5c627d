use std::collections::VecDeque;

/// Maximum number of steps that can be undone.
pub const HISTORY_CAPACITY: usize = 100;

/// Everything needed to undo one step, captured before the step mutates
/// memory. A step only writes `dst` and PC (derived registers follow from
/// the operands), so restoring those two cells inverts it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub pc_before: i32,
    pub instr: i32,
    pub src: usize,
    pub dst: usize,
    pub value_src: i32,
    /// Destination cell value before the move.
    pub value_dst: i32,
    /// Read and write pointers as published before the step.
    pub pointers_before: (Option<usize>, Option<usize>),
}

/// Bounded undo buffer. When full, the oldest entry is evicted before a
/// new one is pushed.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove and return the most recent entry.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
