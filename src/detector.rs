use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::extractor::Project;
use crate::state::{PriorState, SeenSet};

pub const UNKNOWN_PROJECT: &str = "Unknown Project";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Baseline recorded; nothing is announced.
    FirstRun,
    NoChange,
    NewProjects(Vec<String>),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Fetch,
    Parse,
    StateWrite,
    Panicked,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Fetch => "fetch error",
            SkipReason::Parse => "parse error",
            SkipReason::StateWrite => "state write error",
            SkipReason::Panicked => "cycle panicked",
        };
        f.write_str(reason)
    }
}

/// Diff the current page against the prior seen set.
///
/// The returned set is always `prior ∪ current`: ids that vanish from the
/// page stay remembered, so the set never shrinks.
pub fn detect(current: &[Project], prior: PriorState) -> (CycleOutcome, SeenSet) {
    // last write wins when an id repeats within one page
    let name_by_id: HashMap<&str, &str> = current
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    let mut new_ids: Vec<&str> = Vec::new();
    let mut queued = HashSet::new();
    for project in current {
        let id = project.id.as_str();
        if !prior.seen.contains(id) && queued.insert(id) {
            new_ids.push(id);
        }
    }

    let mut updated = prior.seen;
    updated.extend(current.iter().map(|p| p.id.clone()));

    let outcome = if prior.first_run {
        CycleOutcome::FirstRun
    } else if !new_ids.is_empty() {
        let names = new_ids
            .iter()
            .map(|id| name_by_id.get(id).copied().unwrap_or(UNKNOWN_PROJECT).to_string())
            .collect();
        CycleOutcome::NewProjects(names)
    } else {
        CycleOutcome::NoChange
    };

    (outcome, updated)
}
