use crate::geometry::Position;
use thiserror::Error;

/// Failures surfaced by the simulation.
///
/// Everything except `InvalidConfig`, `Io` and `Json` means the spatial index or the
/// species counts no longer agree with the organism arena. Callers should stop the
/// world rather than keep ticking.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
    #[error("organism body cell at {position} is not indexed")]
    OrganismNotIndexed { position: Position },
    #[error("no victim to remove at {position}")]
    UntrackedVictim { position: Position },
    #[error("species (generation {generation}) is not tracked")]
    UntrackedSpecies { generation: u32 },
    #[error("world state out of sync: {0}")]
    Desync(String),
    #[error("weighted selection ran out of options")]
    SelectionExhausted,
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}
