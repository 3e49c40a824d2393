use crate::error::SimError;
use crate::geometry::Position;
use crate::pixel::Pixel;
use crate::species::Species;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Report row for one species.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesSummary {
    pub count: u32,
    pub generation: u32,
    pub mass: u32,
    pub lineage_depth: usize,
    pub body: Vec<(Position, Pixel)>,
}

#[derive(Debug, Clone)]
pub struct SpeciesCount {
    pub species: Arc<Species>,
    pub count: u32,
}

impl SpeciesCount {
    pub fn summary(&self) -> SpeciesSummary {
        SpeciesSummary {
            count: self.count,
            generation: self.species.generation(),
            mass: self.species.mass(),
            lineage_depth: self.species.lineage_depth(),
            body: self
                .species
                .body()
                .iter()
                .map(|(position, pixel)| (*position, *pixel))
                .collect(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    species: Arc<Species>,
    count: u32,
    first_seen: u64,
}

/// Live-organism count per species, keyed by genome identity rather than content.
///
/// Holding the `Arc` keeps every tracked genome alive, so its address is a stable key.
#[derive(Debug, Default)]
pub struct TopSpecies {
    entries: HashMap<usize, Entry>,
    next_sequence: u64,
}

fn key(species: &Arc<Species>) -> usize {
    Arc::as_ptr(species) as usize
}

impl TopSpecies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_species(&mut self, species: &Arc<Species>) {
        let sequence = self.next_sequence;
        let entry = self.entries.entry(key(species)).or_insert_with(|| Entry {
            species: Arc::clone(species),
            count: 0,
            first_seen: sequence,
        });
        if entry.first_seen == sequence {
            self.next_sequence += 1;
        }
        entry.count += 1;
    }

    pub fn remove_species(&mut self, species: &Arc<Species>) -> Result<(), SimError> {
        let key = key(species);
        let Some(entry) = self.entries.get_mut(&key) else {
            return Err(SimError::UntrackedSpecies {
                generation: species.generation(),
            });
        };
        entry.count -= 1;
        if entry.count == 0 {
            self.entries.remove(&key);
        }
        Ok(())
    }

    pub fn count_of(&self, species: &Arc<Species>) -> u32 {
        self.entries
            .get(&key(species))
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    /// The `n` most populous species; ties go to the species seen first.
    pub fn top(&self, n: usize) -> Vec<SpeciesCount> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        entries
            .into_iter()
            .take(n)
            .map(|entry| SpeciesCount {
                species: Arc::clone(&entry.species),
                count: entry.count,
            })
            .collect()
    }

    /// Sum of all counts; equals the live population when the world is consistent.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|entry| entry.count as u64).sum()
    }

    /// Distinct tracked species.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
