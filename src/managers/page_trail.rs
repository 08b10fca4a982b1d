//! Coordinator-side mirror of a surface's back/forward list.
//!
//! The engine only knows synthesized pages as `about:blank` or `data:` URLs.
//! The trail remembers what each history entry actually showed (a reserved
//! page, or the URL an error page stands in for) so that traversing back to
//! one restores the right address and the right refresh behavior.
//!
//! Operations the coordinator issues are announced with [`PageTrail::expect_load`]
//! and [`PageTrail::expect_step`]; engine commits consume those expectations in
//! order. Commits nobody announced (link clicks) are treated as new loads.

use std::collections::VecDeque;

use crate::types::url::{is_synthetic_engine_url, ResolvedUrl};

/// What one history entry showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// The URL the chrome displays for the entry.
    pub display: String,
    /// The reserved page rendered in place, if any.
    pub page: Option<ResolvedUrl>,
}

impl PageRecord {
    pub fn network(url: &str) -> Self {
        Self {
            display: url.to_string(),
            page: None,
        }
    }

    pub fn reserved(page: ResolvedUrl) -> Self {
        Self {
            display: page.display_url().to_string(),
            page: Some(page),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Back,
    Forward,
    Reload,
}

#[derive(Debug, Clone)]
enum Expected {
    /// A network load; the record comes from the committed URL.
    Network,
    /// Synthesized HTML for a known record.
    Synthesized(PageRecord),
    Step(Step),
}

#[derive(Debug, Clone, Default)]
pub struct PageTrail {
    records: Vec<PageRecord>,
    cursor: usize,
    expected: VecDeque<Expected>,
}

impl PageTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a load the engine accepted. `None` for network loads,
    /// the record for synthesized HTML.
    pub fn expect_load(&mut self, record: Option<PageRecord>) {
        self.expected.push_back(match record {
            Some(r) => Expected::Synthesized(r),
            None => Expected::Network,
        });
    }

    pub fn expect_step(&mut self, step: Step) {
        self.expected.push_back(Expected::Step(step));
    }

    /// A network load gave up before committing.
    pub fn load_failed(&mut self) {
        if let Some(pos) = self.expected.iter().position(|e| matches!(e, Expected::Network)) {
            self.expected.remove(pos);
        }
    }

    /// Record an engine commit of `engine_url` and return what the entry shows.
    /// `current` is used for synthesized content nobody announced.
    pub fn on_commit(&mut self, engine_url: &str, current: &PageRecord) -> PageRecord {
        let synthetic = is_synthetic_engine_url(engine_url);
        match self.expected.pop_front() {
            Some(Expected::Synthesized(record)) => self.push(record),
            Some(Expected::Step(step)) => {
                match step {
                    Step::Back => self.cursor = self.cursor.saturating_sub(1),
                    Step::Forward => {
                        self.cursor = (self.cursor + 1).min(self.records.len().saturating_sub(1))
                    }
                    Step::Reload => {}
                }
                if self.cursor >= self.records.len() {
                    return self.push(PageRecord::network(engine_url));
                }
                if !synthetic {
                    // Redirects land on another URL than the one recorded.
                    self.records[self.cursor] = PageRecord::network(engine_url);
                }
                self.records[self.cursor].clone()
            }
            Some(Expected::Network) | None if synthetic => self.push(current.clone()),
            Some(Expected::Network) | None => self.push(PageRecord::network(engine_url)),
        }
    }

    /// The surface moved to `url` without any notification reaching us.
    pub fn record_untracked(&mut self, url: &str) {
        self.push(PageRecord::network(url));
    }

    pub fn current(&self) -> Option<&PageRecord> {
        self.records.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, record: PageRecord) -> PageRecord {
        if !self.records.is_empty() {
            self.records.truncate(self.cursor + 1);
        }
        self.records.push(record.clone());
        self.cursor = self.records.len() - 1;
        record
    }
}
