use crate::grammar::Grammar;
use crate::node::Node;
use crate::stream::InputStream;
use crate::trace::TraceBuilder;
use crate::util::Log;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

/// A completed memoization entry: packrat's whole reason for existing. `None`
/// records a memoized *failure* at this position, so a second attempt can
/// skip straight to "no" without re-running the body (§4.3, §5 I-MEMO).
#[derive(Clone)]
pub struct MemoRec {
    pub value: Option<Node>,
    pub end_pos: usize,
}

/// Bookkeeping shared by every rule application currently growing the same
/// left-recursive seed: the rule keys "involved" in the recursion (Warth et
/// al.'s `involvedSet`) — every application between a reentrant call and the
/// original activation it reentered. An involved application is never the
/// head of its own growth loop; it must be recomputed fresh on every pass
/// of whichever application *is* the head (§4.3's third case).
#[derive(Default)]
pub struct HeadInfo {
    pub involved: HashSet<String>,
}

/// The in-progress record installed the first time a rule application is
/// seen recursing into itself at the same position. `seed` starts as the
/// failed placeholder and is replaced every time a growth pass advances
/// further than the last committed attempt.
pub struct LrRecord {
    pub seed: Option<Node>,
    pub seed_end_pos: usize,
    pub head: Option<Rc<RefCell<HeadInfo>>>,
}

/// What a rule-at-position slot in the memo table currently holds: either a
/// recursion still being grown, or a finished, replayable result.
pub enum MemoSlot {
    InProgress(Rc<RefCell<LrRecord>>),
    Done(MemoRec),
}

/// Per-position memo state, scoped to one [`crate::stream::InputStream`]
/// frame.
#[derive(Default)]
pub struct PosInfo {
    pub slots: HashMap<String, MemoSlot>,
}

/// One nested level of matching: its own stream and its own memo table,
/// restarting position numbering at zero. `Arr`/`Str`/`Obj` each push one of
/// these and pop it back off regardless of match outcome (§4.1).
pub struct StreamFrame {
    pub stream: InputStream,
    pub pos_infos: HashMap<usize, PosInfo>,
}

impl StreamFrame {
    fn new(stream: InputStream) -> Self {
        Self { stream, pos_infos: HashMap::new() }
    }
}

/// An entry on the application stack: which memo key is being evaluated,
/// at which position, and (if the activation turns out to be recursive)
/// the record collecting the growing seed.
struct AppStackEntry {
    key: String,
    pos: usize,
    lr: Rc<RefCell<LrRecord>>,
}

/// All mutable state threaded through a single top-level match attempt:
/// the stream stack, the bindings stack shared across every nesting level,
/// sticky syntactic/lexical context, the rightmost-failure tracker, and the
/// application stack used for left-recursion detection.
pub struct EvalState<'g> {
    pub grammar: &'g Grammar,
    frames: Vec<StreamFrame>,
    pub bindings: Vec<Node>,
    pub syntactic: bool,
    suppress_depth: u32,
    pub failure_pos: usize,
    pub failure_expected: BTreeSet<String>,
    app_stack: Vec<AppStackEntry>,
    pub log: Log<&'static str>,
    pub trace: Option<TraceBuilder>,
}

impl<'g> EvalState<'g> {
    pub fn new(grammar: &'g Grammar, stream: InputStream, log: Log<&'static str>) -> Self {
        Self {
            grammar,
            frames: vec![StreamFrame::new(stream)],
            bindings: Vec::new(),
            syntactic: false,
            suppress_depth: 0,
            failure_pos: 0,
            failure_expected: BTreeSet::new(),
            app_stack: Vec::new(),
            log,
            trace: None,
        }
    }

    fn frame(&self) -> &StreamFrame {
        self.frames.last().expect("stream stack is never empty")
    }

    fn frame_mut(&mut self) -> &mut StreamFrame {
        self.frames.last_mut().expect("stream stack is never empty")
    }

    pub fn pos(&self) -> usize {
        self.frame().stream.pos()
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.frame_mut().stream.set_pos(pos);
    }

    pub fn stream_len(&self) -> usize {
        self.frame().stream.len()
    }

    pub fn at_end(&self) -> bool {
        self.frame().stream.at_end()
    }

    pub fn peek(&self) -> Option<crate::stream::Atom> {
        self.frame().stream.peek().cloned()
    }

    pub fn next_atom(&mut self) -> Option<crate::stream::Atom> {
        self.frame_mut().stream.next()
    }

    pub fn interval(&self, start: usize) -> crate::stream::Interval {
        self.frame().stream.interval(start)
    }

    /// Pushes a fresh nested stream (for `Arr`/`Str`/`Obj`); the bindings
    /// stack is left untouched since it is shared across all nesting
    /// levels.
    pub fn push_stream(&mut self, stream: InputStream) {
        self.frames.push(StreamFrame::new(stream));
    }

    pub fn pop_stream(&mut self) {
        self.frames.pop().expect("push_stream/pop_stream must be balanced");
    }

    pub fn pos_info_mut(&mut self, pos: usize) -> &mut PosInfo {
        self.frame_mut().pos_infos.entry(pos).or_default()
    }

    /// Records a candidate failure for the §7 diagnostic: keeps only the
    /// rightmost position seen, accumulating descriptors when a new failure
    /// ties the current rightmost one and discarding older, shallower
    /// failures otherwise.
    pub fn record_failure(&mut self, pos: usize, descriptor: impl Into<String>) {
        if self.suppress_depth > 0 {
            return;
        }
        match pos.cmp(&self.failure_pos) {
            std::cmp::Ordering::Greater => {
                self.failure_pos = pos;
                self.failure_expected.clear();
                self.failure_expected.insert(descriptor.into());
            }
            std::cmp::Ordering::Equal => {
                self.failure_expected.insert(descriptor.into());
            }
            std::cmp::Ordering::Less => {}
        }
    }

    /// `Not`/`Lookahead` probe without wanting their inner failures to
    /// pollute the outer diagnostic (§4.1's "`Not` swallows the probe's
    /// failure trail").
    pub fn begin_suppress_failures(&mut self) {
        self.suppress_depth += 1;
    }

    pub fn end_suppress_failures(&mut self) {
        self.suppress_depth -= 1;
    }

    pub fn push_application(&mut self, key: String, pos: usize, lr: Rc<RefCell<LrRecord>>) {
        self.app_stack.push(AppStackEntry { key, pos, lr });
    }

    pub fn pop_application(&mut self) {
        self.app_stack.pop().expect("push_application/pop_application must be balanced");
    }

    /// Walks the application stack from the top down to (but excluding) the
    /// entry for `key`/`pos` — the original activation being reentered —
    /// installing `head` on every frame in between and recording their rule
    /// keys as involved in the recursion (Warth et al.'s `setupLR`). The
    /// original activation itself is left off `involved`: it is the head,
    /// not a rule merely caught up in its growth.
    pub fn setup_lr(&mut self, key: &str, pos: usize, head: &Rc<RefCell<HeadInfo>>) {
        for entry in self.app_stack.iter().rev() {
            if entry.key == key && entry.pos == pos {
                break;
            }
            head.borrow_mut().involved.insert(entry.key.clone());
            entry.lr.borrow_mut().head = Some(Rc::clone(head));
        }
    }
}
