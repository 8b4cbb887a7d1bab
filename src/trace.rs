//! An optional, structured record of every expression attempted during a
//! match, requested separately from the match itself (§4.5, §6). Building
//! the tree is cheap enough to leave enabled unconditionally once a caller
//! asks for it; when nobody asks, [`crate::state::EvalState::trace`] stays
//! `None` and no entries are ever allocated.

/// One attempted expression: where it was tried, how it was described, and
/// whether it succeeded. `end_pos` is `None` for a failed attempt.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub pos: usize,
    pub descriptor: String,
    pub success: bool,
    pub end_pos: Option<usize>,
    pub children: Vec<TraceEntry>,
}

/// Accumulates [`TraceEntry`] nodes as evaluation descends and unwinds.
/// `enter`/`exit` calls must nest exactly like the `eval` calls they
/// accompany.
pub struct TraceBuilder {
    stack: Vec<(usize, String, Vec<TraceEntry>)>,
    root: Vec<TraceEntry>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self { stack: Vec::new(), root: Vec::new() }
    }

    pub fn enter(&mut self, pos: usize, descriptor: impl Into<String>) {
        self.stack.push((pos, descriptor.into(), Vec::new()));
    }

    pub fn exit(&mut self, success: bool, end_pos: Option<usize>) {
        let (pos, descriptor, children) =
            self.stack.pop().expect("trace enter/exit calls must be balanced");
        let entry = TraceEntry { pos, descriptor, success, end_pos, children };
        match self.stack.last_mut() {
            Some((_, _, kids)) => kids.push(entry),
            None => self.root.push(entry),
        }
    }

    /// Discards the most recently completed child of the current frame.
    /// Used when seed growth throws away a growth pass that failed to
    /// advance past the last committed attempt (§4.3): that attempt should
    /// not appear in the trace as a sibling failure of the rule it belongs
    /// to, since from the caller's point of view the rule simply succeeded
    /// with the previously committed result.
    pub fn drop_last_child(&mut self) {
        match self.stack.last_mut() {
            Some((_, _, kids)) => {
                kids.pop();
            }
            None => {
                self.root.pop();
            }
        }
    }

    pub fn finish(mut self) -> Option<TraceEntry> {
        self.root.pop()
    }
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
