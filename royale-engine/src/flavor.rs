//! Templated flavor lines for two-actor encounters and deaths.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::FLAVOR_HISTORY_CAPACITY;
use crate::rng::RandomSource;

const FALLBACK_NORMAL: &str = "{1} and {2} cross paths, exchange a wary glance, and move on.";
const FALLBACK_DEATH: &str = "{2} has been eliminated by {1}.";

/// Template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlavorKind {
    #[default]
    Normal,
    Death,
}

/// A flavor template with `{1}` and `{2}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorEvent {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: FlavorKind,
}

impl FlavorEvent {
    #[must_use]
    pub fn new(text: impl Into<String>, kind: FlavorKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Substitute actor names into the template.
    #[must_use]
    pub fn render(&self, first: &str, second: &str) -> String {
        render_template(&self.text, first, second)
    }
}

fn render_template(text: &str, first: &str, second: &str) -> String {
    text.replace("{1}", first).replace("{2}", second)
}

/// Bounded FIFO of recently used template texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorHistory {
    capacity: usize,
    recent: VecDeque<String>,
}

impl Default for FlavorHistory {
    fn default() -> Self {
        Self::with_capacity(FLAVOR_HISTORY_CAPACITY)
    }
}

impl FlavorHistory {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            recent: VecDeque::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.recent.iter().any(|seen| seen == text)
    }

    /// Record a template, evicting the oldest entry once full.
    pub fn remember(&mut self, text: &str) {
        if self.capacity == 0 {
            return;
        }
        if let Some(pos) = self.recent.iter().position(|seen| seen == text) {
            self.recent.remove(pos);
        }
        while self.recent.len() >= self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(text.to_string());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

/// All flavor templates available to a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlavorDeck {
    pub events: Vec<FlavorEvent>,
}

impl FlavorDeck {
    #[must_use]
    pub const fn new(events: Vec<FlavorEvent>) -> Self {
        Self { events }
    }

    #[must_use]
    pub fn count(&self, kind: FlavorKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    /// Render a line of `kind`, avoiding recently used templates where possible.
    ///
    /// Falls back to a built-in template when the deck has none of that kind.
    pub fn line(
        &self,
        kind: FlavorKind,
        first: &str,
        second: &str,
        history: &mut FlavorHistory,
        rng: &mut dyn RandomSource,
    ) -> String {
        let candidates: Vec<&FlavorEvent> = self
            .events
            .iter()
            .filter(|event| event.kind == kind)
            .collect();
        let fresh: Vec<&FlavorEvent> = candidates
            .iter()
            .copied()
            .filter(|event| !history.contains(&event.text))
            .collect();
        let pool = if fresh.is_empty() { &candidates } else { &fresh };

        match rng.pick_index(pool.len()).map(|idx| pool[idx]) {
            Some(event) => {
                history.remember(&event.text);
                event.render(first, second)
            }
            None => {
                let fallback = match kind {
                    FlavorKind::Normal => FALLBACK_NORMAL,
                    FlavorKind::Death => FALLBACK_DEATH,
                };
                render_template(fallback, first, second)
            }
        }
    }
}
