//! Outline set ownership across asynchronous rebuilds.

use country_data::CountryCollection;
use settings::Locale;

use crate::outline::{OutlineBuilder, OutlineSet};

/// Issued when a rebuild starts; only the newest ticket may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RebuildTicket(u64);

impl RebuildTicket {
    /// Generation the rebuilt [`OutlineSet`] must carry.
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Work order for one rebuild; `Send` so it can run off the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildJob {
    pub ticket: RebuildTicket,
    pub locale: Locale,
}

impl RebuildJob {
    pub fn run(self, collection: &CountryCollection) -> OutlineSet {
        OutlineBuilder::new(self.locale).build(collection, self.ticket.generation())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RebuildTracker {
    latest: u64,
}

impl RebuildTracker {
    pub fn begin(&mut self) -> RebuildTicket {
        self.latest += 1;
        RebuildTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RebuildTicket) -> bool {
        ticket.0 == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

/// Holds the live outline set and swaps in rebuilt ones.
#[derive(Debug, Clone)]
pub struct OutlineRegistry {
    current: OutlineSet,
    tracker: RebuildTracker,
}

impl OutlineRegistry {
    pub fn new(locale: Locale) -> Self {
        Self {
            current: OutlineSet::empty(0, locale),
            tracker: RebuildTracker::default(),
        }
    }

    pub fn current(&self) -> &OutlineSet {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut OutlineSet {
        &mut self.current
    }

    /// Start a rebuild. Any rebuild started earlier becomes stale.
    pub fn begin_rebuild(&mut self) -> RebuildTicket {
        let ticket = self.tracker.begin();
        tracing::debug!(generation = ticket.generation(), "outline rebuild started");
        ticket
    }

    pub fn is_pending(&self) -> bool {
        self.tracker.latest() != self.current.generation()
    }

    /// Apply a finished rebuild. Returns `false` and drops `set` when a newer
    /// rebuild has been started since `ticket` was issued.
    pub fn complete(&mut self, ticket: RebuildTicket, set: OutlineSet) -> bool {
        if !self.tracker.is_current(ticket) || set.generation() != ticket.generation() {
            tracing::debug!(
                generation = ticket.generation(),
                latest = self.tracker.latest(),
                "discarding stale outline rebuild"
            );
            return false;
        }
        tracing::debug!(
            generation = ticket.generation(),
            outlines = set.len(),
            segments = set.segment_count(),
            "applying outline rebuild"
        );
        self.current = set;
        true
    }
}
