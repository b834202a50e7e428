//! Aging stages and stage sequences.
//!
//! A stage is the visual/material identity of a block -- in host terms,
//! the name of the skin painted on it. The empty name is the block's base
//! material (no skin), which is what a protective stage with no successor
//! reveals when it is stripped.

use serde::{Deserialize, Serialize};

/// The identity of a single aging stage (a block skin name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    /// Create a stage identity from a skin name. Surrounding whitespace is
    /// trimmed; an empty name is the base stage.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.len() == name.len() {
            Self(name)
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// The base stage: bare material with no aging skin applied.
    pub const fn base() -> Self {
        Self(String::new())
    }

    /// Whether this is the base stage.
    pub fn is_base(&self) -> bool {
        self.0.is_empty()
    }

    /// The skin name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the skin name contains `needle`. The base stage contains
    /// nothing, and an empty needle matches nothing.
    pub fn contains(&self, needle: &str) -> bool {
        !needle.is_empty() && self.0.contains(needle)
    }
}

impl core::fmt::Display for StageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_base() {
            f.write_str("<base>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for StageId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StageId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Where a block sits in a [`StageSequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStep<'a> {
    /// The block can move on to the given stage.
    Advance(&'a StageId),
    /// The block already carries the terminal stage.
    Terminal,
}

/// An ordered, non-empty sequence of aging stages. The last element is the
/// terminal stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSequence {
    stages: Vec<StageId>,
}

impl StageSequence {
    /// Build a sequence. Base-stage entries are dropped (a block cannot age
    /// *into* bare material); returns `None` if nothing remains.
    pub fn new(stages: impl IntoIterator<Item = StageId>) -> Option<Self> {
        let stages: Vec<StageId> = stages.into_iter().filter(|s| !s.is_base()).collect();
        if stages.is_empty() { None } else { Some(Self { stages }) }
    }

    /// Build a sequence, substituting `fallback` when `stages` yields no
    /// usable entry.
    pub fn with_fallback(
        stages: impl IntoIterator<Item = StageId>,
        fallback: impl IntoIterator<Item = StageId>,
    ) -> Option<Self> {
        Self::new(stages).or_else(|| Self::new(fallback))
    }

    /// The stages in order.
    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    /// Number of stages (always at least one).
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The terminal (last) stage. `None` only if the non-empty invariant
    /// has been broken.
    pub fn terminal(&self) -> Option<&StageId> {
        self.stages.last()
    }

    /// Position of `stage` in the sequence, if listed.
    pub fn position(&self, stage: &StageId) -> Option<usize> {
        self.stages.iter().position(|s| s == stage)
    }

    /// Resolve the step for a block currently carrying `current`. A block
    /// whose stage is not listed (including the base stage) sits before the
    /// first stage.
    pub fn step_from(&self, current: &StageId) -> Option<StageStep<'_>> {
        let next_index = match self.position(current) {
            Some(index) => index.checked_add(1)?,
            None => 0,
        };
        match self.stages.get(next_index) {
            Some(next) => Some(StageStep::Advance(next)),
            None if next_index == self.stages.len() => Some(StageStep::Terminal),
            None => None,
        }
    }
}
