use crate::behaviour::{Behaviour, BehaviourTable};
use crate::config::MutationRates;
use crate::error::SimError;
use crate::geometry::{Direction, Position};
use crate::pixel::{Channel, Pixel};
use crate::random::{chance, random_int};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Immutable genome shared by every organism of the species.
///
/// The parent link is weak: once no organism or tracker holds the parent it is
/// dropped, and lineage queries simply stop there.
#[derive(Debug, Clone)]
pub struct Species {
    generation: u32,
    parent: Option<Weak<Species>>,
    body: BTreeMap<Position, Pixel>,
    behaviours: BehaviourTable,
}

impl Species {
    /// Founder with a single body cell at the origin and a neutral behaviour table.
    pub fn from_pixel(pixel: Pixel) -> Self {
        let mut body = BTreeMap::new();
        body.insert(Position::ORIGIN, pixel);
        Species {
            generation: 0,
            parent: None,
            body,
            behaviours: BehaviourTable::uniform(Behaviour::default()),
        }
    }

    /// Founder with an explicit body and behaviour table.
    pub fn new(
        body: BTreeMap<Position, Pixel>,
        behaviours: BehaviourTable,
    ) -> Result<Self, SimError> {
        if body.is_empty() {
            return Err(SimError::InvalidConfig(
                "a species needs at least one body cell".to_string(),
            ));
        }
        Ok(Species {
            generation: 0,
            parent: None,
            body,
            behaviours,
        })
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn parent(&self) -> Option<Arc<Species>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Number of ancestors still reachable through the weak parent chain.
    pub fn lineage_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(ancestor) = current {
            depth += 1;
            current = ancestor.parent();
        }
        depth
    }

    pub fn body(&self) -> &BTreeMap<Position, Pixel> {
        &self.body
    }

    pub fn behaviours(&self) -> &BehaviourTable {
        &self.behaviours
    }

    pub fn behaviour(&self, channel: Channel, direction: Direction) -> &Behaviour {
        self.behaviours.get(channel, direction)
    }

    pub fn mass(&self) -> u32 {
        self.body.values().map(Pixel::mass).sum()
    }

    /// Genome for an offspring. Usually the parent itself; with probability
    /// `rates.species` a new child species one generation further down, carrying
    /// whichever of the independent mutations fired.
    ///
    /// Rates outside 0..=1 are clamped; NaN counts as 0.
    pub fn mutate<R: Rng + ?Sized>(
        self: &Arc<Self>,
        rates: &MutationRates,
        rng: &mut R,
    ) -> Arc<Species> {
        if !chance(rng, rates.species) {
            return Arc::clone(self);
        }

        let mut child = Species {
            generation: self.generation + 1,
            parent: Some(Arc::downgrade(self)),
            body: self.body.clone(),
            behaviours: self.behaviours,
        };

        let behaviour = chance(rng, rates.behaviour);
        if behaviour {
            child.behaviours = child.behaviours.mutate(rates, rng);
        }

        let pixel = chance(rng, rates.pixel);
        if pixel {
            let index = random_int(rng, child.body.len() as u32) as usize;
            if let Some(cell) = child.body.values_mut().nth(index) {
                *cell = cell.mutate(rates, rng);
            }
        }

        // Body-size draw is reserved; it changes nothing yet.
        chance(rng, rates.body_size);

        trace!(
            generation = child.generation,
            behaviour, pixel, "new species from reproduction"
        );
        Arc::new(child)
    }
}
