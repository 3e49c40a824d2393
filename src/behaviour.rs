use crate::config::MutationRates;
use crate::geometry::Direction;
use crate::pixel::Channel;
use crate::random::random_number_between;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How strongly one channel pulls an organism in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    pub base_attraction: f64,
    pub distance_coefficient: f64,
}

impl Default for Behaviour {
    fn default() -> Self {
        Behaviour {
            base_attraction: 0.0,
            distance_coefficient: 1.0,
        }
    }
}

impl Behaviour {
    pub fn new(base_attraction: f64, distance_coefficient: f64) -> Self {
        Behaviour {
            base_attraction,
            distance_coefficient,
        }
    }

    /// `intensity * base_attraction * distance^distance_coefficient`
    pub fn attraction(&self, intensity: f64, distance: f64) -> f64 {
        intensity * self.base_attraction * distance.powf(self.distance_coefficient)
    }

    pub fn mutate<R: Rng + ?Sized>(&self, rates: &MutationRates, rng: &mut R) -> Behaviour {
        let attraction_noise = rates.base_attraction_noise;
        let coefficient_noise = rates.distance_coefficient_noise;
        Behaviour {
            base_attraction: self.base_attraction
                + random_number_between(rng, -attraction_noise, attraction_noise),
            distance_coefficient: self.distance_coefficient
                + random_number_between(rng, -coefficient_noise, coefficient_noise),
        }
    }
}

/// One behaviour per (channel, cardinal direction).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BehaviourTable {
    entries: [[Behaviour; 4]; 3],
}

impl BehaviourTable {
    pub fn uniform(behaviour: Behaviour) -> Self {
        BehaviourTable {
            entries: [[behaviour; 4]; 3],
        }
    }

    pub fn get(&self, channel: Channel, direction: Direction) -> &Behaviour {
        &self.entries[channel.index()][direction.index()]
    }

    pub fn set(&mut self, channel: Channel, direction: Direction, behaviour: Behaviour) {
        self.entries[channel.index()][direction.index()] = behaviour;
    }

    /// Every entry replaced by its mutated form.
    pub fn mutate<R: Rng + ?Sized>(&self, rates: &MutationRates, rng: &mut R) -> Self {
        let mut table = *self;
        for row in table.entries.iter_mut() {
            for behaviour in row.iter_mut() {
                *behaviour = behaviour.mutate(rates, rng);
            }
        }
        table
    }
}
