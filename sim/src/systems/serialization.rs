//! Serialization utilities for simulation state.

use crate::world::Snapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{PlanetSnapshot, ShipSnapshot};

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = Snapshot {
            tick: 42,
            time: 1.4,
            ships: vec![ShipSnapshot {
                id: 7,
                faction: "Enemy".to_string(),
                x: -0.3,
                y: 0.3,
                angle: 45.0,
                health: 8,
                health_max: 10,
                alive: true,
                moving: false,
                weapon_cooldown: 0.5,
                ai_state: Some("Engage".to_string()),
            }],
            planets: vec![PlanetSnapshot {
                id: 1,
                faction: "Player".to_string(),
                x: -0.5,
                y: 0.0,
                radius: 0.15,
                health: 100,
                health_max: 100,
                alive: true,
                build_queue: 2,
                build_progress: Some(0.25),
            }],
            score: 30,
            enemies_killed: 3,
            ..Default::default()
        };

        let json = snapshot_to_json_string(&snapshot).unwrap();
        let restored = snapshot_from_json_string(&json).unwrap();

        assert_eq!(restored.tick, 42);
        assert_eq!(restored.ships.len(), 1);
        assert_eq!(restored.ships[0].ai_state.as_deref(), Some("Engage"));
        assert_eq!(restored.planets[0].build_queue, 2);
        assert_eq!(restored.score, 30);

        let bytes = snapshot_to_json(&snapshot).unwrap();
        assert_eq!(snapshot_from_json(&bytes).unwrap().enemies_killed, 3);
    }
}
