use std::collections::HashSet;

use crate::matcher::normalize;
use crate::types::WindowIdentity;

/// Which windows the engine may act on.
///
/// Entries are normalized once at construction; blank entries are dropped.
/// An empty process set or an empty title list imposes no constraint, so a
/// policy built from two empty lists allows every window.
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicy {
    processes: HashSet<String>,
    title_fragments: Vec<String>,
}

impl AllowListPolicy {
    pub fn new<P, T>(processes: &[P], title_fragments: &[T]) -> Self
    where
        P: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            processes: processes
                .iter()
                .map(|p| normalize(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
            title_fragments: title_fragments
                .iter()
                .map(|t| normalize(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_allowed(&self, window: &WindowIdentity) -> bool {
        if !self.processes.is_empty() && !self.processes.contains(&normalize(&window.process_name)) {
            return false;
        }

        if !self.title_fragments.is_empty() {
            let title = normalize(&window.title);
            if !self.title_fragments.iter().any(|f| title.contains(f.as_str())) {
                return false;
            }
        }

        true
    }

    pub fn allows_everything(&self) -> bool {
        self.processes.is_empty() && self.title_fragments.is_empty()
    }
}
