//! Optional structured recording of parser entries/exits.
//!
//! This is this crate's whole observability story (see `SPEC_FULL.md` §2):
//! rather than depend on a logging crate, the teacher's own pattern — plain
//! value types threaded through an explicit context, no ambient globals —
//! is carried over and specialized into a small trace format with its own
//! renderer.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::position::Position;

/// One opened-then-closed (or still-open) parser invocation.
#[derive(Clone, Debug)]
pub struct TraceEntry {
    pub parser_name: String,
    pub start_pos: Position,
    pub end_pos: Option<Position>,
    pub success: Option<bool>,
    pub depth: usize,
    pub value_preview: Option<String>,
    pub error_preview: Option<String>,
    pub elapsed: Option<Duration>,
}

/// Records a depth-first trace of parser invocations, up to a configured
/// cap. Not thread-safe (it's `RefCell`-backed, per spec §5: one collector
/// per parse, never shared across concurrent parses).
pub struct TraceCollector {
    entries: RefCell<Vec<TraceEntry>>,
    depth: RefCell<usize>,
    max_entries: usize,
    // Parallel stack of open-entry indices and their start times, so `exit`
    // can compute elapsed time and patch the matching `enter`.
    open: RefCell<Vec<(usize, Instant)>>,
}

impl TraceCollector {
    /// Creates a collector that silently drops entries past `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        TraceCollector {
            entries: RefCell::new(Vec::new()),
            depth: RefCell::new(0),
            max_entries,
            open: RefCell::new(Vec::new()),
        }
    }

    /// Records entry into `name` at `pos`, incrementing depth.
    pub fn enter(&self, name: &str, pos: &Position) {
        let mut entries = self.entries.borrow_mut();
        if entries.len() >= self.max_entries {
            // Still track depth so a dropped subtree doesn't desync
            // `exit`'s depth bookkeeping, but record no entry.
            *self.depth.borrow_mut() += 1;
            self.open.borrow_mut().push((usize::MAX, Instant::now()));
            return;
        }
        let depth = *self.depth.borrow();
        let index = entries.len();
        entries.push(TraceEntry {
            parser_name: name.to_string(),
            start_pos: pos.clone(),
            end_pos: None,
            success: None,
            depth,
            value_preview: None,
            error_preview: None,
            elapsed: None,
        });
        drop(entries);
        self.open.borrow_mut().push((index, Instant::now()));
        *self.depth.borrow_mut() += 1;
    }

    /// Records exit from the most recently entered (still-open) call,
    /// decrementing depth. `preview` is the value or error description,
    /// depending on `success`.
    pub fn exit(&self, end_pos: &Position, success: bool, preview: Option<String>) {
        *self.depth.borrow_mut() -= 1;
        let Some((index, started)) = self.open.borrow_mut().pop() else {
            return;
        };
        if index == usize::MAX {
            return; // this entry was dropped at `enter` time
        }
        let elapsed = started.elapsed();
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.get_mut(index) {
            entry.end_pos = Some(end_pos.clone());
            entry.success = Some(success);
            entry.elapsed = Some(elapsed);
            if success {
                entry.value_preview = preview;
            } else {
                entry.error_preview = preview;
            }
        }
    }

    /// Every recorded entry, in the order they were opened.
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.borrow().clone()
    }

    /// Renders the trace as an indented, human-readable multi-line report.
    pub fn to_report(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.borrow().iter() {
            let indent = "  ".repeat(entry.depth);
            let glyph = match entry.success {
                Some(true) => "\u{2713}", // check mark
                Some(false) => "\u{2717}", // cross mark
                None => "?",
            };
            out.push_str(&indent);
            out.push_str(glyph);
            out.push(' ');
            out.push_str(&entry.parser_name);
            out.push_str(&format!(" @ {}", entry.start_pos));
            if let Some(end) = &entry.end_pos {
                out.push_str(&format!(" -> {}", end));
            }
            if let Some(preview) = entry.value_preview.as_ref().or(entry.error_preview.as_ref()) {
                out.push_str(&format!(" [{}]", preview));
            }
            if let Some(elapsed) = entry.elapsed {
                out.push_str(&format!(" ({:?})", elapsed));
            }
            out.push('\n');
        }
        out
    }
}
