//! Cached state encoding.

use serde::{Serialize, Deserialize};

use crate::error::StoreError;
use crate::game::state::GameState;

/// Encoding used for state in the hot cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateCodec {
    /// serde_json, readable in the cache
    #[default]
    Json,
    /// bincode, compact
    Bincode,
}

impl StateCodec {
    /// Parse a codec name (`json` or `bincode`, case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(StateCodec::Json),
            "bincode" => Some(StateCodec::Bincode),
            _ => None,
        }
    }

    /// Encode a state.
    pub fn encode(self, state: &GameState) -> Result<Vec<u8>, StoreError> {
        match self {
            StateCodec::Json => serde_json::to_vec(state).map_err(|e| StoreError::Encode(e.to_string())),
            StateCodec::Bincode => bincode::serialize(state).map_err(|e| StoreError::Encode(e.to_string())),
        }
    }

    /// Decode a state.
    pub fn decode(self, bytes: &[u8]) -> Result<GameState, String> {
        match self {
            StateCodec::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            StateCodec::Bincode => bincode::deserialize(bytes).map_err(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::placement::FleetPlacer;
    use crate::game::state::{Board, GameId, PlayerId, PlayerState};

    fn sample() -> GameState {
        let mut rng = DeterministicRng::new(5);
        let placer = FleetPlacer::default();
        let a = PlayerState::new(PlayerId::new([1; 16]), Board::with_ships(placer.place_fleet(&mut rng).unwrap()));
        let b = PlayerState::new(PlayerId::new([2; 16]), Board::with_ships(placer.place_fleet(&mut rng).unwrap()));
        GameState::new(GameId::new([3; 16]), "room", a, b)
    }

    #[test]
    fn test_both_codecs_preserve_state() {
        let state = sample();
        for codec in [StateCodec::Json, StateCodec::Bincode] {
            let bytes = codec.encode(&state).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), state, "{:?}", codec);
        }
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(StateCodec::Json.decode(b"{not json").is_err());
        assert!(StateCodec::Bincode.decode(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(StateCodec::from_name("JSON"), Some(StateCodec::Json));
        assert_eq!(StateCodec::from_name(" bincode "), Some(StateCodec::Bincode));
        assert_eq!(StateCodec::from_name("yaml"), None);
    }
}
