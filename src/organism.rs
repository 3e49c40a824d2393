use crate::config::{MutationRates, SimulationConfig};
use crate::error::SimError;
use crate::geometry::{Direction, Position};
use crate::pixel::{Channel, Pixel};
use crate::random::weighted_random;
use crate::species::Species;
use rand::Rng;
use slotmap::new_key_type;
use std::sync::Arc;

new_key_type! {
    /// Stable handle for an organism in the world arena.
    pub struct OrganismId;
}

/// Tunables for the movement decision, lifted out of `SimulationConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementParams {
    pub base_score: f64,
    pub momentum_bonus: f64,
    pub movement_cost: f64,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            base_score: 1.0,
            momentum_bonus: 5.0,
            movement_cost: 0.005,
        }
    }
}

impl From<&SimulationConfig> for MovementParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            base_score: config.base_score,
            momentum_bonus: config.momentum_bonus,
            movement_cost: config.movement_cost,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Organism {
    // ===== Individual state =====
    position: Position,
    food: f64,
    previous_direction: Option<Direction>,

    // ===== Inherited =====
    species: Arc<Species>,
}

impl Organism {
    pub fn new(species: Arc<Species>, position: Position, food: f64) -> Self {
        Organism {
            position,
            food,
            previous_direction: None,
            species,
        }
    }

    pub fn species(&self) -> &Arc<Species> {
        &self.species
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn food(&self) -> f64 {
        self.food
    }

    pub fn add_food(&mut self, amount: f64) {
        self.food += amount;
    }

    pub fn previous_direction(&self) -> Option<Direction> {
        self.previous_direction
    }

    pub fn is_starving(&self) -> bool {
        self.food < 0.0
    }

    pub fn fullness_percent(&self) -> f64 {
        100.0 * self.food / self.species.mass() as f64
    }

    /// Body cells translated to the organism's position (not wrapped).
    pub fn absolute_cells(&self) -> impl Iterator<Item = (Position, Pixel)> + '_ {
        self.species
            .body()
            .iter()
            .map(move |(offset, pixel)| (offset.absolute_from(self.position), *pixel))
    }

    /// Per-direction scores in `Direction::CARDINALS` order.
    ///
    /// `visible` holds victim pixels keyed by position relative to this organism.
    pub fn attraction_scores(
        &self,
        visible: &[(Position, Pixel)],
        params: &MovementParams,
    ) -> [f64; 4] {
        let mut scores = [params.base_score; 4];
        if let Some(previous) = self.previous_direction {
            scores[previous.index()] += params.momentum_bonus;
        }

        for (relative, pixel) in visible {
            for direction in Direction::CARDINALS {
                if !relative.is_positioned(direction, Position::ORIGIN) {
                    continue;
                }
                let distance = relative.distance_from(Position::ORIGIN, direction) as f64;
                for channel in Channel::ALL {
                    let contribution = self
                        .species
                        .behaviour(channel, direction)
                        .attraction(pixel.intensity(channel) as f64, distance);
                    // 0^negative and friends
                    if contribution.is_finite() {
                        scores[direction.index()] += contribution;
                    }
                }
            }
        }

        scores
    }

    /// Picks a direction from the attraction scores, steps one cell that way and pays
    /// the movement cost. The caller wraps the new position onto the torus.
    pub fn move_towards<R: Rng + ?Sized>(
        &mut self,
        visible: &[(Position, Pixel)],
        params: &MovementParams,
        rng: &mut R,
    ) -> Result<Direction, SimError> {
        let scores = self.attraction_scores(visible, params);
        let options: Vec<(f64, Direction)> = Direction::CARDINALS
            .iter()
            .map(|direction| (scores[direction.index()], *direction))
            .collect();
        let direction = weighted_random(rng, &options)?;

        self.previous_direction = Some(direction);
        self.position = self.position.plus_direction(direction);
        self.food -= self.species.mass() as f64 * params.movement_cost;
        Ok(direction)
    }

    /// Splits off a child once food exceeds the species mass: the parent keeps half,
    /// the child starts with the same half and a possibly mutated genome.
    pub fn try_reproduce<R: Rng + ?Sized>(
        &mut self,
        rates: &MutationRates,
        rng: &mut R,
    ) -> Option<Organism> {
        if self.food <= self.species.mass() as f64 {
            return None;
        }

        self.food /= 2.0;
        Some(Organism::new(
            self.species.mutate(rates, rng),
            self.position,
            self.food,
        ))
    }
}
