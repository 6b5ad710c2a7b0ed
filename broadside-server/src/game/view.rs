//! Fog-of-War Projection
//!
//! Shapes a [`GameState`] into what one player may see. The opponent's
//! active ships never appear; the opponent side is built only from the
//! viewer's own attack ledger and the opponent's sunk ships.

use serde::{Serialize, Deserialize};

use crate::core::coord::Coord;
use crate::error::GameError;
use crate::game::rules::SunkShip;
use crate::game::state::{GameId, GamePhase, GameState, PlayerId, Ship, ShipId, ShipKind};

/// One of the viewer's own ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnShipView {
    /// Ship id (needed to move it).
    pub ship_id: ShipId,
    /// Kind.
    pub kind: ShipKind,
    /// Current cells.
    pub cells: Vec<Coord>,
    /// Damage, relative to `cells`.
    pub hit_indices: Vec<usize>,
    /// Sunk flag.
    pub sunk: bool,
}

impl From<&Ship> for OwnShipView {
    fn from(ship: &Ship) -> Self {
        Self {
            ship_id: ship.id,
            kind: ship.kind,
            cells: ship.cells.clone(),
            hit_indices: ship.hit_indices.iter().copied().collect(),
            sunk: ship.sunk,
        }
    }
}

/// The viewer's own board, unredacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnBoardView {
    /// Active ships followed by sunk ships.
    pub ships: Vec<OwnShipView>,
    /// Cells the opponent has hit.
    pub hits: Vec<Coord>,
    /// Always empty.
    pub misses: Vec<Coord>,
}

/// What the viewer knows about the opponent's board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentBoardView {
    /// Opponent id.
    pub player_id: PlayerId,
    /// The viewer's attacks that hit.
    pub hits: Vec<Coord>,
    /// The viewer's attacks that missed.
    pub misses: Vec<Coord>,
    /// Opponent ships already sunk, with their final cells.
    pub sunk_ships: Vec<SunkShip>,
}

/// Redacted per-player view of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Game id.
    pub game_id: GameId,
    /// Room id.
    pub room_id: String,
    /// Who this view is for.
    pub viewer_id: PlayerId,
    /// Current turn.
    pub turn: u32,
    /// Whose move it is.
    pub current_player_id: PlayerId,
    /// State version the view was built from.
    pub state_version: u64,
    /// Lifecycle phase.
    pub phase: GamePhase,
    /// Winner, once decided.
    pub winner_player_id: Option<PlayerId>,
    /// Viewer's board.
    pub my_board: OwnBoardView,
    /// Opponent's board, fogged.
    pub opponent_board: OpponentBoardView,
}

impl PlayerView {
    /// Is it the viewer's move?
    pub fn is_my_turn(&self) -> bool {
        self.phase == GamePhase::Active && self.current_player_id == self.viewer_id
    }
}

/// Project `state` for `viewer`.
pub fn project(state: &GameState, viewer: &PlayerId) -> Result<PlayerView, GameError> {
    let seat = state.seat_of(viewer).ok_or(GameError::UnknownPlayer {
        game_id: state.game_id,
        player_id: *viewer,
    })?;
    let me = state.seat(seat);
    let them = state.seat(seat.other());

    let my_board = OwnBoardView {
        ships: me
            .board
            .ships
            .iter()
            .chain(me.board.sunk_ships.iter())
            .map(OwnShipView::from)
            .collect(),
        hits: me.board.hits.clone(),
        misses: me.board.misses.clone(),
    };

    let opponent_board = OpponentBoardView {
        player_id: them.player_id,
        hits: me.board.attacks_by_me_hits.clone(),
        misses: me.board.attacks_by_me_misses.clone(),
        sunk_ships: them.board.sunk_ships.iter().map(SunkShip::from).collect(),
    };

    Ok(PlayerView {
        game_id: state.game_id,
        room_id: state.room_id.clone(),
        viewer_id: *viewer,
        turn: state.turn,
        current_player_id: state.current_player_id,
        state_version: state.state_version,
        phase: state.phase(),
        winner_player_id: state.winner_player_id,
        my_board,
        opponent_board,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::action::{AttackAction, ShipMoveAction};
    use crate::game::placement::FleetPlacer;
    use crate::game::rules::{advance_turn, attack, move_ship};
    use crate::game::state::{Board, PlayerState};
    use proptest::prelude::*;

    const A: PlayerId = PlayerId::new([1; 16]);
    const B: PlayerId = PlayerId::new([2; 16]);

    fn placed_game(seed: u64) -> GameState {
        let mut rng = DeterministicRng::new(seed);
        let placer = FleetPlacer::default();
        let a = Board::with_ships(placer.place_fleet(&mut rng).unwrap());
        let b = Board::with_ships(placer.place_fleet(&mut rng).unwrap());
        GameState::new(GameId::new([7; 16]), "room-7", PlayerState::new(A, a), PlayerState::new(B, b))
    }

    #[test]
    fn test_fresh_view_metadata() {
        let state = placed_game(3);
        let view = project(&state, &B).unwrap();

        assert_eq!(view.viewer_id, B);
        assert_eq!(view.room_id, "room-7");
        assert_eq!(view.turn, 1);
        assert_eq!(view.current_player_id, A);
        assert!(!view.is_my_turn());
        assert_eq!(view.my_board.ships.len(), 5);
        assert_eq!(view.opponent_board.player_id, A);
        assert!(view.opponent_board.hits.is_empty());
        assert!(view.opponent_board.sunk_ships.is_empty());
        assert_eq!(view.winner_player_id, None);
    }

    #[test]
    fn test_unknown_viewer_is_a_fault() {
        let state = placed_game(3);
        let err = project(&state, &PlayerId::new([5; 16])).unwrap_err();
        assert!(matches!(err, GameError::UnknownPlayer { .. }));
    }

    #[test]
    fn test_sunk_ship_becomes_visible() {
        let mut state = placed_game(11);
        let destroyer = state.seat(crate::game::state::Seat::Second).board.ships[4].clone();

        for cell in &destroyer.cells {
            let action = AttackAction::new("x", state.turn, *cell);
            attack(&mut state, &A, &action);
        }

        let view = project(&state, &A).unwrap();
        assert_eq!(view.opponent_board.sunk_ships.len(), 1);
        assert_eq!(view.opponent_board.sunk_ships[0].cells, destroyer.cells);
        assert_eq!(view.opponent_board.hits.len(), 2);

        // Owner still sees it, flagged sunk
        let owner = project(&state, &B).unwrap();
        let own = owner.my_board.ships.iter().find(|s| s.ship_id == destroyer.id).unwrap();
        assert!(own.sunk);
        assert_eq!(owner.my_board.hits.len(), 2);
    }

    proptest! {
        /// No cell of an unsunk opponent ship ever appears in a view,
        /// except where the viewer's own attack already hit it. Ships
        /// move between attacks.
        #[test]
        fn prop_fog_of_war(
            seed in any::<u64>(),
            ops in prop::collection::vec((any::<bool>(), 0usize..5, 0i32..10, 0i32..10, any::<bool>()), 0..100),
        ) {
            let mut state = placed_game(seed);
            for (moving, ship, row, col, horizontal) in ops {
                if state.is_ended() {
                    break;
                }
                let who = state.current_player_id;
                let target = Coord::new(row, col);
                let ships = &state.seat(state.current_seat()).board.ships;
                let applied = if moving {
                    let id = ships[ship % ships.len()].id;
                    let mv = ShipMoveAction::new("m", state.turn, id, target, horizontal);
                    move_ship(&mut state, &who, &mv).is_success()
                } else {
                    let action = AttackAction::new("x", state.turn, target);
                    attack(&mut state, &who, &action).is_success()
                };
                if applied && !state.is_ended() {
                    advance_turn(&mut state);
                }
            }

            for viewer in [A, B] {
                let view = project(&state, &viewer).unwrap();
                let opponent = state.opponent_of(&viewer).unwrap();
                let me = state.player(&viewer).unwrap();

                prop_assert!(view.my_board.misses.is_empty());
                for ship in &opponent.board.ships {
                    for cell in &ship.cells {
                        prop_assert!(!view.opponent_board.sunk_ships.iter().any(|s| s.cells.contains(cell)));
                        if view.opponent_board.hits.contains(cell) {
                            prop_assert!(me.board.attacks_by_me_hits.contains(cell));
                        }
                    }
                }
                prop_assert_eq!(&view.opponent_board.hits, &me.board.attacks_by_me_hits);
                prop_assert_eq!(&view.opponent_board.misses, &me.board.attacks_by_me_misses);
            }
        }
    }
}
