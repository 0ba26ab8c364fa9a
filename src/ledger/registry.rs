//! Registry of known mice
//!
//! Insertion-ordered, keyed by normalized name. Names seen in race lanes but
//! missing from the leaderboard are collected as unregistered and never
//! promoted to mice.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::core::{normalize_name, Mouse, Race};
use crate::error::{Error, Result};
use crate::models::MouseRecord;

#[derive(Debug, Default)]
pub struct MouseRegistry {
    mice: Vec<Mouse>,
    index: HashMap<String, usize>,
    unregistered: BTreeSet<String>,
}

impl MouseRegistry {
    /// Build the registry from leaderboard records, in record order
    pub fn from_records(records: &[MouseRecord], lane_count: usize) -> Result<Self> {
        let mut registry = Self::default();
        for record in records {
            let mouse = Mouse::new(record, lane_count)?;
            if registry.index.contains_key(&mouse.name) {
                return Err(Error::DuplicateParticipant(mouse.name));
            }
            registry.index.insert(mouse.name.clone(), registry.mice.len());
            registry.mice.push(mouse);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&Mouse> {
        self.index
            .get(&normalize_name(name))
            .map(|&idx| &self.mice[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mouse> {
        self.mice.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.mice.iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.mice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mice.is_empty()
    }

    /// Lane names with no leaderboard entry
    pub fn unregistered(&self) -> &BTreeSet<String> {
        &self.unregistered
    }

    /// Record every unknown lane name of a race; true when all lanes are known
    pub(crate) fn note_unregistered(&mut self, race: &Race) -> bool {
        let mut all_known = true;
        for name in &race.lanes {
            if !self.index.contains_key(name) {
                self.unregistered.insert(name.clone());
                all_known = false;
            }
        }
        all_known
    }

    /// Append a race to every registered mouse in its lanes
    pub(crate) fn record_race(&mut self, race: &Arc<Race>) -> Result<()> {
        self.note_unregistered(race);
        for name in &race.lanes {
            if let Some(&idx) = self.index.get(name) {
                self.mice[idx].append_race(Arc::clone(race))?;
            }
        }
        Ok(())
    }
}
