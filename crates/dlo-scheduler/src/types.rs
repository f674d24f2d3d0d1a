use dlo_memories::Memory;
use serde::Serialize;

/// Tally of one delivery cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Memories that matched the due query.
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Another writer moved the memory on before this cycle recorded it.
    pub superseded: usize,
    /// Send attempted but the outcome could not be written; the memory
    /// stays `scheduled` and is picked up again next cycle.
    pub unrecorded: usize,
}

/// Result of a manual send.
#[derive(Debug, Clone, Serialize)]
pub struct SendNowReport {
    /// Whether the transport accepted the message.
    pub delivered: bool,
    /// False when a concurrent writer changed the status first, in which
    /// case `memory` shows that writer's result.
    pub recorded: bool,
    /// The memory as stored after the attempt.
    pub memory: Memory,
}
