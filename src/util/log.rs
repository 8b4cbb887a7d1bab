use std::fmt::{Display, Formatter};

/// Verbosity level for the in-house evaluation logger.
///
/// Mirrors the teacher-library convention of a single ordered enum gating
/// `eprintln!` diagnostics, rather than pulling in a tracing framework: this
/// crate's "logging" is a developer aid confined to debug builds, entirely
/// distinct from the structured [`Trace`](crate::trace::Trace) artifact a
/// caller can request as part of a match.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<T: Display> Log<T> {
    #[cfg_attr(not(debug_assertions), allow(unused_variables))]
    pub fn log_entry(&self, rule_name: &str, pos: usize) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Default(()).order() {
            eprintln!("[{}; enter]: {} at {}", self, rule_name, pos);
        }
    }

    #[cfg_attr(not(debug_assertions), allow(unused_variables))]
    pub fn log_success(&self, rule_name: &str, pos: usize, end_pos: usize) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Success(()).order() {
            eprintln!("[{}; success]: {} {}-{}", self, rule_name, pos, end_pos);
        }
    }

    #[cfg_attr(not(debug_assertions), allow(unused_variables))]
    pub fn log_failure(&self, rule_name: &str, pos: usize) {
        #[cfg(debug_assertions)]
        if self.order() >= Log::Result(()).order() {
            eprintln!("[{}; failure]: {} at {}", self, rule_name, pos);
        }
    }
}
