use crate::error::SimError;
use crate::geometry::Position;
use crate::organism::{Organism, OrganismId};
use crate::pixel::Pixel;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// One unit of edible matter on a cell: inert food when `owner` is `None`, otherwise
/// the body cell of a live organism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Victim {
    pub pixel: Pixel,
    pub owner: Option<OrganismId>,
}

impl Victim {
    pub fn food(pixel: Pixel) -> Self {
        Victim { pixel, owner: None }
    }

    pub fn cell(pixel: Pixel, owner: OrganismId) -> Self {
        Victim {
            pixel,
            owner: Some(owner),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.owner.is_some()
    }
}

/// Spatial multiset of victims on a torus.
///
/// Every position handed in is wrapped first, so callers can pass raw body offsets.
/// Counts never sit at zero and cells never sit empty. Victims within a cell iterate
/// in a fixed order, so seeded worlds replay identically.
#[derive(Debug, Clone)]
pub struct VictimMap {
    cells: HashMap<Position, BTreeMap<Victim, u32>>,
    width: i32,
    height: i32,
}

impl VictimMap {
    pub fn new(width: i32, height: i32) -> Self {
        VictimMap {
            cells: HashMap::new(),
            width,
            height,
        }
    }

    pub fn wrap(&self, position: Position) -> Position {
        position.wrap(self.width, self.height)
    }

    pub fn victims_at(&self, position: Position) -> Option<&BTreeMap<Victim, u32>> {
        self.cells.get(&self.wrap(position))
    }

    pub fn count(&self, position: Position, victim: &Victim) -> u32 {
        self.victims_at(position)
            .and_then(|victims| victims.get(victim))
            .copied()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Position, &BTreeMap<Victim, u32>)> {
        self.cells.iter()
    }

    /// Occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Victim units summed over every cell.
    pub fn unit_count(&self) -> u64 {
        self.cells
            .values()
            .flat_map(|victims| victims.values())
            .map(|count| *count as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn add_victim(&mut self, position: Position, victim: Victim) {
        let position = self.wrap(position);
        *self
            .cells
            .entry(position)
            .or_default()
            .entry(victim)
            .or_insert(0) += 1;
    }

    /// Removes a single unit.
    pub fn remove_victim(&mut self, position: Position, victim: &Victim) -> Result<(), SimError> {
        self.remove_units(position, victim, 1).map(|_| ())
    }

    /// Removes every unit of `victim` at the cell and returns how many there were.
    pub fn take_all(&mut self, position: Position, victim: &Victim) -> Result<u32, SimError> {
        self.remove_units(position, victim, u32::MAX)
    }

    fn remove_units(
        &mut self,
        position: Position,
        victim: &Victim,
        limit: u32,
    ) -> Result<u32, SimError> {
        let position = self.wrap(position);
        let Entry::Occupied(mut cell) = self.cells.entry(position) else {
            return Err(SimError::UntrackedVictim { position });
        };

        let victims = cell.get_mut();
        let Some(count) = victims.get_mut(victim) else {
            return Err(SimError::UntrackedVictim { position });
        };

        let removed = (*count).min(limit);
        *count -= removed;
        if *count == 0 {
            victims.remove(victim);
        }
        if victims.is_empty() {
            cell.remove();
        }
        Ok(removed)
    }

    pub fn add_organism(&mut self, id: OrganismId, organism: &Organism) {
        for (position, pixel) in organism.absolute_cells() {
            self.add_victim(position, Victim::cell(pixel, id));
        }
    }

    pub fn remove_organism(&mut self, id: OrganismId, organism: &Organism) -> Result<(), SimError> {
        for (position, pixel) in organism.absolute_cells() {
            self.remove_victim(position, &Victim::cell(pixel, id))
                .map_err(|_| SimError::OrganismNotIndexed {
                    position: self.wrap(position),
                })?;
        }
        Ok(())
    }

    /// Drops inert, decayed copies of the organism's body cells where they lie.
    pub fn turn_into_food(&mut self, organism: &Organism, decay: f64) {
        for (position, pixel) in organism.absolute_cells() {
            self.add_victim(position, Victim::food(pixel.to_food(decay)));
        }
    }

    /// Every victim unit within Chebyshev `radius` of `center`, keyed by offset from it.
    ///
    /// On a torus narrower than the scan window each cell is still visited once: the
    /// window is cut to one full lap per axis.
    pub fn visible_from(&self, center: Position, radius: i32) -> Vec<(Position, Pixel)> {
        let (left, right) = lap_span(radius, self.width);
        let (up, down) = lap_span(radius, self.height);
        let mut visible = Vec::new();
        for dy in -up..=down {
            for dx in -left..=right {
                let offset = Position::new(dx, dy);
                let Some(victims) = self.victims_at(offset.absolute_from(center)) else {
                    continue;
                };
                for (victim, count) in victims {
                    for _ in 0..*count {
                        visible.push((offset, victim.pixel));
                    }
                }
            }
        }
        visible
    }
}

/// Offsets `(behind, ahead)` covering at most `extent` distinct cells around a point.
fn lap_span(radius: i32, extent: i32) -> (i32, i32) {
    let behind = radius.min((extent - 1) / 2);
    let ahead = radius.min(extent / 2);
    (behind, ahead)
}
