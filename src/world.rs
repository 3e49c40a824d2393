use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::geometry::Position;
use crate::organism::{MovementParams, Organism, OrganismId};
use crate::pixel::{Channel, Pixel};
use crate::random::random_int;
use crate::species::Species;
use crate::top_species::{SpeciesCount, TopSpecies};
use crate::victim_map::{Victim, VictimMap};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use slotmap::SlotMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// What happened during one call to `World::update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub time: u64,
    pub starved: u32,
    pub eaten: u32,
    pub births: u32,
    pub food_injected: u32,
}

pub struct World {
    config: SimulationConfig,
    movement: MovementParams,
    organisms: SlotMap<OrganismId, Organism>,
    victims: VictimMap,
    top_species: TopSpecies,
    rng: ChaCha8Rng,
    seed: u64,
    time: u64,
}

impl World {
    /// Empty world: no organisms, no food.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        info!(
            width = config.world_width,
            height = config.world_height,
            seed,
            "created world"
        );
        Ok(World {
            movement: MovementParams::from(&config),
            victims: VictimMap::new(config.world_width, config.world_height),
            organisms: SlotMap::with_key(),
            top_species: TopSpecies::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            time: 0,
            config,
        })
    }

    /// World seeded with the configured founders and initial food.
    pub fn spawn(config: SimulationConfig, seed: u64) -> Result<Self, SimError> {
        let mut world = World::new(config, seed)?;
        world.add_organisms(
            world.config.initial_organism_count,
            world.config.founder_channel,
        );
        world.add_food(world.config.initial_food_count, world.config.food_channel);
        Ok(world)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn organisms(&self) -> impl Iterator<Item = (OrganismId, &Organism)> {
        self.organisms.iter()
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms.get(id)
    }

    pub fn organism_count(&self) -> usize {
        self.organisms.len()
    }

    pub fn victims(&self) -> &VictimMap {
        &self.victims
    }

    pub fn species_counts(&self) -> &TopSpecies {
        &self.top_species
    }

    pub fn top_species(&self, n: usize) -> Vec<SpeciesCount> {
        self.top_species.top(n)
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            random_int(&mut self.rng, self.config.world_width as u32) as i32,
            random_int(&mut self.rng, self.config.world_height as u32) as i32,
        )
    }

    /// Adds `count` founders of one fresh single-pixel species coloured on `channel`.
    /// Each starts with a fifth of its mass as food.
    pub fn add_organisms(&mut self, count: usize, channel: Channel) {
        let species = Arc::new(Species::from_pixel(Pixel::single(
            channel,
            self.config.founder_intensity,
            true,
        )));
        let food = (species.mass() / 5) as f64;
        for _ in 0..count {
            let position = self.random_position();
            self.insert_organism(Organism::new(Arc::clone(&species), position, food));
        }
        debug!(count, ?channel, "added organisms");
    }

    /// Scatters `count` food pixels coloured on `channel` at random cells.
    pub fn add_food(&mut self, count: usize, channel: Channel) {
        let pixel = Pixel::single(channel, self.config.food_intensity, false);
        for _ in 0..count {
            let position = self.random_position();
            self.victims.add_victim(position, Victim::food(pixel));
        }
        debug!(count, ?channel, "added food");
    }

    /// Drops one food unit at an exact cell.
    pub fn place_food(&mut self, position: Position, pixel: Pixel) {
        self.victims.add_victim(position, Victim::food(pixel));
    }

    /// Registers an organism in the arena, the spatial index and the species counts.
    pub fn insert_organism(&mut self, mut organism: Organism) -> OrganismId {
        organism.set_position(self.victims.wrap(organism.position()));
        self.top_species.add_species(organism.species());
        let id = self.organisms.insert(organism);
        self.victims.add_organism(id, &self.organisms[id]);
        id
    }

    /// Takes an organism out of every container. `None` if it is already gone.
    fn remove_organism(&mut self, id: OrganismId) -> Result<Option<Organism>, SimError> {
        let Some(organism) = self.organisms.remove(id) else {
            return Ok(None);
        };
        self.victims.remove_organism(id, &organism)?;
        self.top_species.remove_species(organism.species())?;
        Ok(Some(organism))
    }

    /// Advances the world by one tick.
    ///
    /// Organisms alive at the start of the tick act once each, in arena order. Children
    /// born during the tick first act on the next one. An organism eaten earlier in the
    /// tick is skipped.
    pub fn update(&mut self) -> Result<TickSummary, SimError> {
        let mut summary = TickSummary::default();
        let ids: Vec<OrganismId> = self.organisms.keys().collect();

        for id in ids {
            self.step_organism(id, &mut summary)?;
        }

        self.time += 1;
        summary.time = self.time;

        let interval = self.config.food_interval;
        if interval > 0 && self.time % interval == 0 {
            let count = self.config.food_per_injection;
            self.add_food(count, self.config.food_channel);
            summary.food_injected = count as u32;
        }

        trace!(?summary, population = self.organisms.len(), "tick complete");
        Ok(summary)
    }

    fn step_organism(&mut self, id: OrganismId, summary: &mut TickSummary) -> Result<(), SimError> {
        let Some(organism) = self.organisms.get(id) else {
            return Ok(());
        };

        if organism.is_starving() {
            if let Some(corpse) = self.remove_organism(id)? {
                self.victims.turn_into_food(&corpse, self.config.corpse_decay);
                debug!(?id, position = %corpse.position(), "organism starved");
                summary.starved += 1;
            }
            return Ok(());
        }

        // Out of the index while it looks around, so it never sees itself.
        self.victims.remove_organism(id, organism)?;
        let visible = self
            .victims
            .visible_from(organism.position(), self.config.vision_radius);

        let organism = &mut self.organisms[id];
        organism.move_towards(&visible, &self.movement, &mut self.rng)?;
        organism.set_position(self.victims.wrap(organism.position()));
        self.victims.add_organism(id, organism);

        self.resolve_predation(id, summary)?;

        let Some(organism) = self.organisms.get_mut(id) else {
            return Ok(());
        };
        if let Some(child) = organism.try_reproduce(&self.config.mutation, &mut self.rng) {
            let generation = child.species().generation();
            let child_id = self.insert_organism(child);
            trace!(parent = ?id, child = ?child_id, generation, "organism reproduced");
            summary.births += 1;
        }
        Ok(())
    }

    /// Eats every victim sharing a cell with the organism's body whose dominant
    /// channel loses to the organism's intensity on the predator channel.
    fn resolve_predation(
        &mut self,
        id: OrganismId,
        summary: &mut TickSummary,
    ) -> Result<(), SimError> {
        let Some(organism) = self.organisms.get(id) else {
            return Ok(());
        };
        let cells: Vec<(Position, Pixel)> = organism.absolute_cells().collect();

        for (position, own_pixel) in cells {
            let candidates: Vec<Victim> = match self.victims.victims_at(position) {
                Some(victims) => victims.keys().copied().collect(),
                None => continue,
            };

            for victim in candidates {
                if victim.owner == Some(id) {
                    continue;
                }
                let victim_channel = victim.pixel.dominant_channel();
                let victim_value = victim.pixel.intensity(victim_channel);
                let predator_value = own_pixel.intensity(victim_channel.predator());
                if predator_value <= victim_value {
                    continue;
                }

                let units = self.victims.count(position, &victim);
                if units == 0 {
                    continue;
                }

                let gained = match victim.owner {
                    Some(prey_id) => {
                        let Some(prey) = self.remove_organism(prey_id)? else {
                            continue;
                        };
                        debug!(predator = ?id, prey = ?prey_id, %position, "organism eaten");
                        summary.eaten += 1;
                        units as f64 * prey.species().mass() as f64
                    }
                    None => {
                        let units = self.victims.take_all(position, &victim)?;
                        units as f64 * victim.pixel.mass() as f64
                    }
                };

                if let Some(organism) = self.organisms.get_mut(id) {
                    organism.add_food(gained);
                }
            }
        }
        Ok(())
    }

    /// Audits the spatial index and species counts against the organism arena.
    ///
    /// Every body cell of every organism must be indexed at its wrapped position, the
    /// index must hold no other live cells, and species counts must sum to the
    /// population.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        let organisms: Vec<(OrganismId, &Organism)> = self.organisms.iter().collect();
        let victims = &self.victims;

        organisms.par_iter().try_for_each(|(id, organism)| {
            for (position, pixel) in organism.absolute_cells() {
                if victims.count(position, &Victim::cell(pixel, *id)) == 0 {
                    return Err(SimError::OrganismNotIndexed {
                        position: victims.wrap(position),
                    });
                }
            }
            Ok(())
        })?;

        let expected_cells: u64 = organisms
            .iter()
            .map(|(_, organism)| organism.species().body().len() as u64)
            .sum();
        let indexed_cells: u64 = victims
            .iter()
            .flat_map(|(_, cell)| cell.iter())
            .filter(|(victim, _)| victim.is_alive())
            .map(|(_, count)| *count as u64)
            .sum();
        if indexed_cells != expected_cells {
            return Err(SimError::Desync(format!(
                "{indexed_cells} live cells indexed for {expected_cells} body cells"
            )));
        }

        let tracked = self.top_species.total();
        if tracked != organisms.len() as u64 {
            return Err(SimError::Desync(format!(
                "species counts sum to {tracked} for {} organisms",
                organisms.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::BehaviourTable;
    use std::collections::BTreeMap;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            world_width: 20,
            world_height: 20,
            initial_organism_count: 0,
            initial_food_count: 0,
            food_interval: 0,
            ..SimulationConfig::default()
        }
    }

    fn species(pixel: Pixel) -> Arc<Species> {
        Arc::new(Species::from_pixel(pixel))
    }

    #[test]
    fn test_spawn_seeds_population() {
        let world = World::spawn(SimulationConfig::demo(), 7).unwrap();
        let config = SimulationConfig::demo();
        assert_eq!(world.organism_count(), config.initial_organism_count);
        assert_eq!(
            world.victims().unit_count(),
            (config.initial_organism_count + config.initial_food_count) as u64
        );
        for (_, organism) in world.organisms() {
            assert_eq!(organism.food(), 36.0);
        }
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            world_width: 0,
            ..SimulationConfig::default()
        };
        assert!(World::new(config, 1).is_err());
    }

    #[test]
    fn test_insert_wraps_position() {
        let mut world = World::new(quiet_config(), 1).unwrap();
        let id = world.insert_organism(Organism::new(
            species(Pixel::new(180, 0, 0, true)),
            Position::new(-1, 25),
            10.0,
        ));
        assert_eq!(world.organism(id).unwrap().position(), Position::new(19, 5));
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_starved_organism_becomes_food() {
        let mut world = World::new(quiet_config(), 2).unwrap();
        let id = world.insert_organism(Organism::new(
            species(Pixel::new(181, 0, 0, true)),
            Position::new(4, 4),
            -1.0,
        ));

        let summary = world.update().unwrap();
        assert_eq!(summary.starved, 1);
        assert!(world.organism(id).is_none());
        assert!(world.species_counts().is_empty());
        assert_eq!(
            world
                .victims()
                .count(Position::new(4, 4), &Victim::food(Pixel::new(90, 0, 0, false))),
            1
        );
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_predator_eats_live_organism() {
        let mut world = World::new(quiet_config(), 3).unwrap();
        // Blue body cell beside a red one: blue preys on red.
        let mut body = BTreeMap::new();
        body.insert(Position::new(0, 0), Pixel::new(0, 0, 200, true));
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx != 0 || dy != 0 {
                    body.insert(Position::new(dx, dy), Pixel::new(0, 0, 200, true));
                }
            }
        }
        let predator_species = Arc::new(Species::new(body, BehaviourTable::default()).unwrap());
        let predator = world.insert_organism(Organism::new(
            predator_species,
            Position::new(10, 10),
            1000.0,
        ));
        // Whatever step the predator takes, its 3x3 body covers the prey's cell.
        let prey_species = species(Pixel::new(100, 0, 0, true));
        let prey = world.insert_organism(Organism::new(
            Arc::clone(&prey_species),
            Position::new(10, 10),
            5.0,
        ));

        let food_before = world.organism(predator).unwrap().food();
        world.step_organism(predator, &mut TickSummary::default()).unwrap();

        assert!(world.organism(prey).is_none());
        assert_eq!(world.species_counts().count_of(&prey_species), 0);
        let predator_food = world.organism(predator).unwrap().food();
        let move_cost = 9.0 * 200.0 * 0.005;
        assert!((predator_food - (food_before - move_cost + 100.0)).abs() < 1e-9);
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_eaten_prey_loses_whole_body_and_its_turn() {
        let mut world = World::new(quiet_config(), 4).unwrap();
        let mut predator_body = BTreeMap::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                predator_body.insert(Position::new(dx, dy), Pixel::new(0, 0, 200, true));
            }
        }
        let predator_species =
            Arc::new(Species::new(predator_body, BehaviourTable::default()).unwrap());
        let predator = world.insert_organism(Organism::new(
            predator_species,
            Position::new(10, 10),
            1000.0,
        ));

        // Only the prey's origin cell can fall under the predator after one step.
        let mut prey_body = BTreeMap::new();
        for x in [0, 3, 4] {
            prey_body.insert(Position::new(x, 0), Pixel::new(100, 0, 0, true));
        }
        let prey_species = Arc::new(Species::new(prey_body, BehaviourTable::default()).unwrap());
        let prey = world.insert_organism(Organism::new(
            Arc::clone(&prey_species),
            Position::new(10, 10),
            5.0,
        ));

        let summary = world.update().unwrap();

        assert_eq!(summary.eaten, 1);
        assert_eq!(summary.starved, 0);
        assert_eq!(summary.births, 0);
        assert!(world.organism(prey).is_none());
        assert_eq!(world.organism_count(), 1);
        assert_eq!(world.species_counts().count_of(&prey_species), 0);
        assert!(
            world
                .victims()
                .iter()
                .flat_map(|(_, victims)| victims.keys())
                .all(|victim| victim.owner != Some(prey))
        );
        let move_cost = 9.0 * 200.0 * 0.005;
        let predator_food = world.organism(predator).unwrap().food();
        assert!((predator_food - (1000.0 - move_cost + 300.0)).abs() < 1e-9);
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_reproduction_registers_child() {
        let mut world = World::new(quiet_config(), 5).unwrap();
        let parent_species = species(Pixel::new(100, 0, 0, true));
        world.insert_organism(Organism::new(
            Arc::clone(&parent_species),
            Position::new(0, 0),
            300.0,
        ));

        let summary = world.update().unwrap();
        assert_eq!(summary.births, 1);
        assert_eq!(world.organism_count(), 2);
        assert_eq!(world.species_counts().total(), 2);
        let foods: Vec<f64> = world.organisms().map(|(_, o)| o.food()).collect();
        assert_eq!(foods[0], foods[1]);
        world.check_invariants().unwrap();
    }

    #[test]
    fn test_food_injection_schedule() {
        let config = SimulationConfig {
            food_interval: 3,
            food_per_injection: 4,
            ..quiet_config()
        };
        let mut world = World::new(config, 6).unwrap();
        let mut injected = Vec::new();
        for _ in 0..6 {
            injected.push(world.update().unwrap().food_injected);
        }
        assert_eq!(injected, vec![0, 0, 4, 0, 0, 4]);
        assert_eq!(world.time(), 6);
        assert_eq!(world.victims().unit_count(), 8);
    }

    #[test]
    fn test_long_run_keeps_invariants() {
        let mut world = World::spawn(SimulationConfig::demo(), 8).unwrap();
        for _ in 0..200 {
            world.update().unwrap();
            world.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_same_seed_replays() {
        let run = |seed| {
            let mut world = World::spawn(SimulationConfig::demo(), seed).unwrap();
            for _ in 0..50 {
                world.update().unwrap();
            }
            let mut positions: Vec<(Position, u64)> = world
                .organisms()
                .map(|(_, o)| (o.position(), o.food().to_bits()))
                .collect();
            positions.sort();
            positions
        };
        assert_eq!(run(9), run(9));
    }
}
