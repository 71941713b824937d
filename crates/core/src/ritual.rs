//! Ritual stages — the fixed, cyclic sequence the stage motor walks.
//!
//! Stages are purely cosmetic: the motor activates each in order, holds it
//! for its duration, and wraps around forever until stopped.

/// One named phase of the ritual cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RitualStage {
    /// Display name
    pub name: &'static str,

    /// One-line description shown under the banner
    pub description: &'static str,

    /// How long the stage stays active, in seconds
    pub duration_secs: u64,
}

/// The fixed stage table. Ordering and durations are part of the contract:
/// with durations [23, 37, 61, 42, 10] the cycle returns to stage 0 at
/// t = 173s.
pub const RITUAL_STAGES: [RitualStage; 5] = [
    RitualStage {
        name: "Stage I - INITIATION",
        description: "The First Unknowing. Detach from presuppositions.",
        duration_secs: 23,
    },
    RitualStage {
        name: "Stage II - PARADOXICAL ASCENT",
        description: "Embrace contradiction. Hold opposing concepts until they dissolve.",
        duration_secs: 37,
    },
    RitualStage {
        name: "Stage III - DISSOLUTION (Ø)",
        description: "The cognitive scaffold weakens. Subject and object blur.",
        duration_secs: 61,
    },
    RitualStage {
        name: "Stage IV - NIHILTHEOGENESIS",
        description: "From the absence of foundation, a new perception arises.",
        duration_secs: 42,
    },
    RitualStage {
        name: "Stage V - ETERNAL REWRITE",
        description: "The cycle concludes and immediately restarts. The process is the destination.",
        duration_secs: 10,
    },
];
