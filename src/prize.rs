//! Event prize-tier collaborator.
//!
//! The event catalog is external to the core: all the engine needs is
//! a way to turn `(event id, rank)` into a point amount. [`PrizeTable`]
//! is the in-memory implementation used by the batch front-end and the
//! tests.

use crate::error::{Result, RewardsError};
use std::collections::HashMap;

/// Read-only source of prize amounts, keyed by event id and rank.
pub trait PrizeSource {
    /// Points awarded for finishing at `rank` in `event_id`, if the
    /// event and rank exist.
    fn prize_points(&self, event_id: &str, rank: u32) -> Option<i64>;
}

/// A prize tier within an event: 1 = first place, and so on.
#[derive(Debug, Clone)]
pub struct PrizeTier {
    pub rank: u32,
    pub points: i64,
}

impl PrizeTier {
    /// Ranks run 1..=5 and points 1..=10_000.
    pub fn new(rank: u32, points: i64) -> Result<Self> {
        if !(1..=5).contains(&rank) {
            return Err(RewardsError::invalid(format!(
                "prize rank must be between 1 and 5, got {rank}"
            )));
        }
        if !(1..=10_000).contains(&points) {
            return Err(RewardsError::invalid(format!(
                "prize points must be between 1 and 10000, got {points}"
            )));
        }
        Ok(PrizeTier { rank, points })
    }
}

/// In-memory prize table: event id (case-insensitive) -> rank -> points.
#[derive(Debug, Default)]
pub struct PrizeTable {
    events: HashMap<String, HashMap<u32, i64>>,
}

impl PrizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event's prize tiers. Duplicate ranks within one
    /// event are rejected.
    pub fn add_event(&mut self, event_id: &str, tiers: Vec<PrizeTier>) -> Result<()> {
        let event_id = normalize_event_id(event_id);
        if event_id.is_empty() {
            return Err(RewardsError::invalid("event id is required"));
        }
        if self.events.contains_key(&event_id) {
            return Err(RewardsError::conflict(format!(
                "event {event_id} already registered"
            )));
        }

        let mut by_rank = HashMap::new();
        for tier in tiers {
            if by_rank.insert(tier.rank, tier.points).is_some() {
                return Err(RewardsError::invalid(format!(
                    "duplicate prize rank {} for event {event_id}",
                    tier.rank
                )));
            }
        }
        self.events.insert(event_id, by_rank);
        Ok(())
    }
}

impl PrizeSource for PrizeTable {
    fn prize_points(&self, event_id: &str, rank: u32) -> Option<i64> {
        self.events
            .get(&normalize_event_id(event_id))
            .and_then(|tiers| tiers.get(&rank))
            .copied()
    }
}

fn normalize_event_id(event_id: &str) -> String {
    event_id.trim().to_uppercase()
}
