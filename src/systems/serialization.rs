//! Serialization utilities for simulation state.

use crate::error::{SimError, SimResult};
use crate::world::Snapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &Snapshot) -> SimResult<Vec<u8>> {
    serde_json::to_vec(snapshot).map_err(SimError::Snapshot)
}

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> SimResult<String> {
    serde_json::to_string(snapshot).map_err(SimError::Snapshot)
}

/// Serialize a snapshot to an indented JSON string.
pub fn snapshot_to_json_pretty(snapshot: &Snapshot) -> SimResult<String> {
    serde_json::to_string_pretty(snapshot).map_err(SimError::Snapshot)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> SimResult<Snapshot> {
    serde_json::from_slice(data).map_err(SimError::Snapshot)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> SimResult<Snapshot> {
    serde_json::from_str(data).map_err(SimError::Snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::SingularityPhase;
    use crate::world::{BeeSnapshot, EffectSnapshot};

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = Snapshot {
            tick: 42,
            elapsed_ms: 700.0,
            score: 35,
            bees: vec![BeeSnapshot {
                id: 1,
                x: 10.0,
                y: 20.0,
                state: "return".to_string(),
                health: 3.0,
                health_max: 3.0,
                cargo: 5.0,
                frozen_ms: 0.0,
                stunned_ms: 0.0,
                wing_phase: 1.0,
                bob_phase: 0.5,
            }],
            effects: vec![EffectSnapshot::Singularity {
                x: 100.0,
                y: 100.0,
                radius: 180.0,
                phase: SingularityPhase::Active,
            }],
            ..Default::default()
        };

        let json = snapshot_to_json_string(&snapshot).unwrap();
        assert!(json.contains("\"kind\":\"Singularity\""));
        let restored = snapshot_from_json_string(&json).unwrap();

        assert_eq!(restored.tick, 42);
        assert_eq!(restored.score, 35);
        assert_eq!(restored.bees, snapshot.bees);
        assert_eq!(restored.effects, snapshot.effects);
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let err = snapshot_from_json(b"{\"tick\": \"soon\"}").unwrap_err();
        assert!(matches!(err, SimError::Snapshot(_)));
    }
}
