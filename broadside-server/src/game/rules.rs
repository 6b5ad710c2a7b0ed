//! Action Validation and Transitions
//!
//! Pure functions over [`GameState`]. No storage, no clock: given the
//! same state and action they always produce the same result.
//!
//! Validation runs in a fixed order and the first failure wins:
//!
//! ```text
//! attack:    NOT_YOUR_TURN -> INVALID_TURN_NUMBER -> GAME_ENDED -> OUT_OF_BOUNDS
//! move_ship: NOT_YOUR_TURN -> INVALID_TURN_NUMBER -> GAME_ENDED
//!            -> SHIP_NOT_FOUND | SHIP_ALREADY_SUNK -> OUT_OF_BOUNDS
//!            -> OVERLAPS_WITH_OTHER_SHIP
//! ```

use serde::{Serialize, Deserialize};

use crate::core::coord::Coord;
use crate::game::action::{AttackAction, ShipMoveAction};
use crate::game::state::{GameState, PlayerId, Seat, Ship, ShipId, ShipKind};

// =============================================================================
// REJECTIONS AND OUTCOMES
// =============================================================================

/// Expected rule violations. Safe to show to the acting player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    /// Actor is not the current player.
    #[error("not your turn")]
    NotYourTurn,
    /// Action was built for a different turn.
    #[error("invalid turn number")]
    InvalidTurnNumber,
    /// Game already has a winner.
    #[error("game has ended")]
    GameEnded,
    /// Target or new ship cells leave the board.
    #[error("out of bounds")]
    OutOfBounds,
    /// No active ship with that id.
    #[error("ship not found")]
    ShipNotFound,
    /// The ship is sunk and cannot move.
    #[error("ship already sunk")]
    ShipAlreadySunk,
    /// New position collides with another of your ships, afloat or sunk.
    #[error("overlaps with other ship")]
    OverlapsWithOtherShip,
}

impl Rejection {
    /// Wire code.
    pub fn code(self) -> &'static str {
        match self {
            Rejection::NotYourTurn => "NOT_YOUR_TURN",
            Rejection::InvalidTurnNumber => "INVALID_TURN_NUMBER",
            Rejection::GameEnded => "GAME_ENDED",
            Rejection::OutOfBounds => "OUT_OF_BOUNDS",
            Rejection::ShipNotFound => "SHIP_NOT_FOUND",
            Rejection::ShipAlreadySunk => "SHIP_ALREADY_SUNK",
            Rejection::OverlapsWithOtherShip => "OVERLAPS_WITH_OTHER_SHIP",
        }
    }
}

/// Result of an action: applied, or rejected with a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    /// The action was valid and took effect.
    Applied(T),
    /// The action broke a rule; nothing changed.
    Rejected(Rejection),
}

impl<T> ActionOutcome<T> {
    /// Did the action take effect?
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            ActionOutcome::Applied(_) => None,
            ActionOutcome::Rejected(r) => Some(*r),
        }
    }

    /// Map the applied value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionOutcome<U> {
        match self {
            ActionOutcome::Applied(v) => ActionOutcome::Applied(f(v)),
            ActionOutcome::Rejected(r) => ActionOutcome::Rejected(r),
        }
    }
}

impl<T> From<Result<T, Rejection>> for ActionOutcome<T> {
    fn from(result: Result<T, Rejection>) -> Self {
        match result {
            Ok(v) => ActionOutcome::Applied(v),
            Err(r) => ActionOutcome::Rejected(r),
        }
    }
}

/// Descriptor of a ship that just sank. Its cells are public from now on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunkShip {
    /// Ship id.
    pub ship_id: ShipId,
    /// Kind.
    pub kind: ShipKind,
    /// Length.
    pub length: usize,
    /// Final resting cells.
    pub cells: Vec<Coord>,
}

impl From<&Ship> for SunkShip {
    fn from(ship: &Ship) -> Self {
        Self {
            ship_id: ship.id,
            kind: ship.kind,
            length: ship.kind.length(),
            cells: ship.cells.clone(),
        }
    }
}

/// Outcome of an applied attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Attacked cell.
    pub target: Coord,
    /// Did it hit an active ship?
    pub is_hit: bool,
    /// Ship sunk by this attack.
    pub sunk_ship: Option<SunkShip>,
    /// Set when this attack ended the game.
    pub winner: Option<PlayerId>,
}

impl AttackOutcome {
    /// Did this attack end the game?
    pub fn game_ended(&self) -> bool {
        self.winner.is_some()
    }
}

/// Outcome of an applied ship move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Moved ship.
    pub ship_id: ShipId,
    /// Kind.
    pub kind: ShipKind,
    /// New cells.
    pub cells: Vec<Coord>,
    /// Preserved damage, relative to `cells`.
    pub hit_indices: Vec<usize>,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Checks shared by every action. Returns the actor's seat.
fn check_turn(state: &GameState, actor: &PlayerId, turn_number: u32) -> Result<Seat, Rejection> {
    if *actor != state.current_player_id {
        return Err(Rejection::NotYourTurn);
    }
    if turn_number != state.turn {
        return Err(Rejection::InvalidTurnNumber);
    }
    if state.is_ended() {
        return Err(Rejection::GameEnded);
    }
    state.seat_of(actor).ok_or(Rejection::NotYourTurn)
}

/// Validate an attack. Re-attacking a cell is allowed.
pub fn validate_attack(state: &GameState, attacker: &PlayerId, action: &AttackAction) -> Result<Seat, Rejection> {
    let seat = check_turn(state, attacker, action.turn_number)?;
    if !action.target.is_on_board() {
        return Err(Rejection::OutOfBounds);
    }
    Ok(seat)
}

/// A validated move: who, which ship, where to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMove {
    /// Mover's seat.
    pub seat: Seat,
    /// Index into the mover's active ships.
    pub ship_index: usize,
    /// Cells at the new position.
    pub new_cells: Vec<Coord>,
}

/// Validate a ship move.
pub fn validate_move(state: &GameState, player: &PlayerId, action: &ShipMoveAction) -> Result<ValidMove, Rejection> {
    let seat = check_turn(state, player, action.turn_number)?;
    let board = &state.seat(seat).board;

    let ship_index = match board.active_ship_index(action.ship_id) {
        Some(i) => i,
        None if board.is_sunk_ship(action.ship_id) => return Err(Rejection::ShipAlreadySunk),
        None => return Err(Rejection::ShipNotFound),
    };
    let ship = &board.ships[ship_index];
    if ship.sunk {
        return Err(Rejection::ShipAlreadySunk);
    }

    let new_cells = action.new_origin.run(ship.kind.length(), action.is_horizontal);
    if !new_cells.iter().all(|c| c.is_on_board()) {
        return Err(Rejection::OutOfBounds);
    }

    // Sunk wrecks keep their cells: the opponent sees them
    let overlaps = board
        .ships
        .iter()
        .chain(board.sunk_ships.iter())
        .filter(|other| other.id != ship.id)
        .any(|other| other.cells.iter().any(|c| new_cells.contains(c)));
    if overlaps {
        return Err(Rejection::OverlapsWithOtherShip);
    }

    Ok(ValidMove { seat, ship_index, new_cells })
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Apply a validated attack from `seat` at `target`.
pub fn apply_attack(state: &mut GameState, seat: Seat, target: Coord) -> AttackOutcome {
    let (attacker, defender) = state.pair_mut(seat);
    let attacker_id = attacker.player_id;

    let Some(index) = defender.board.active_ship_at(target) else {
        // The defender's board is never told about a miss
        attacker.board.record_attack_outcome(target, false);
        return AttackOutcome { target, is_hit: false, sunk_ship: None, winner: None };
    };

    defender.board.record_hit_received(target);
    attacker.board.record_attack_outcome(target, true);

    let ship = &mut defender.board.ships[index];
    let relative = ship.index_of(target).unwrap_or_default();
    let sunk_ship = if ship.mark_hit(relative) {
        let retired = defender.board.retire_ship(index);
        Some(SunkShip::from(&retired))
    } else {
        None
    };

    let winner = defender.board.fleet_destroyed().then_some(attacker_id);
    if winner.is_some() {
        state.winner_player_id = winner;
    }

    AttackOutcome { target, is_hit: true, sunk_ship, winner }
}

/// Apply a validated move. Damage follows the ship to its new cells.
pub fn apply_move(state: &mut GameState, valid: ValidMove) -> MoveOutcome {
    let board = &mut state.players[valid.seat.index()].board;

    let old_damaged = board.ships[valid.ship_index].damaged_cells();
    board.hits.retain(|c| !old_damaged.contains(c));

    let ship = &mut board.ships[valid.ship_index];
    ship.cells = valid.new_cells;
    let new_damaged = ship.damaged_cells();
    let outcome = MoveOutcome {
        ship_id: ship.id,
        kind: ship.kind,
        cells: ship.cells.clone(),
        hit_indices: ship.hit_indices.iter().copied().collect(),
    };

    for cell in new_damaged {
        board.record_hit_received(cell);
    }

    outcome
}

/// Validate and apply an attack.
pub fn attack(state: &mut GameState, attacker: &PlayerId, action: &AttackAction) -> ActionOutcome<AttackOutcome> {
    validate_attack(state, attacker, action)
        .map(|seat| apply_attack(state, seat, action.target))
        .into()
}

/// Validate and apply a ship move.
pub fn move_ship(state: &mut GameState, player: &PlayerId, action: &ShipMoveAction) -> ActionOutcome<MoveOutcome> {
    validate_move(state, player, action)
        .map(|valid| apply_move(state, valid))
        .into()
}

/// Hand the move to the other seat: next turn, new version.
pub fn advance_turn(state: &mut GameState) {
    let next = state.current_seat().other();
    state.current_player_id = state.seat(next).player_id;
    state.turn += 1;
    state.state_version += 1;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Board, GameId, PlayerState};
    use proptest::prelude::*;

    const A: PlayerId = PlayerId::new([1; 16]);
    const B: PlayerId = PlayerId::new([2; 16]);

    fn ship(tag: u8, kind: ShipKind, origin: Coord, horizontal: bool) -> Ship {
        Ship::new(ShipId([tag; 16]), kind, origin.run(kind.length(), horizontal))
    }

    /// A: carrier on row 0, destroyer at (2,0)-(2,1).
    /// B: destroyer at (5,5)-(5,6), cruiser at (7,0)-(9,0).
    fn fixture() -> GameState {
        let a = Board::with_ships(vec![
            ship(10, ShipKind::Carrier, Coord::new(0, 0), true),
            ship(11, ShipKind::Destroyer, Coord::new(2, 0), true),
        ]);
        let b = Board::with_ships(vec![
            ship(20, ShipKind::Destroyer, Coord::new(5, 5), true),
            ship(21, ShipKind::Cruiser, Coord::new(7, 0), false),
        ]);
        GameState::new(GameId::new([9; 16]), "room", PlayerState::new(A, a), PlayerState::new(B, b))
    }

    fn fire(state: &mut GameState, who: PlayerId, row: i32, col: i32) -> ActionOutcome<AttackOutcome> {
        let action = AttackAction::new("x", state.turn, Coord::new(row, col));
        attack(state, &who, &action)
    }

    #[test]
    fn test_rejection_order() {
        let mut state = fixture();

        // Wrong player AND wrong turn: turn ownership is checked first
        let action = AttackAction::new("x", 7, Coord::new(20, 20));
        assert_eq!(attack(&mut state, &B, &action).rejection(), Some(Rejection::NotYourTurn));

        // Right player, wrong turn, off board: turn number first
        assert_eq!(attack(&mut state, &A, &action).rejection(), Some(Rejection::InvalidTurnNumber));

        let action = AttackAction::new("x", 1, Coord::new(10, 0));
        assert_eq!(attack(&mut state, &A, &action).rejection(), Some(Rejection::OutOfBounds));

        let action = AttackAction::new("x", 1, Coord::new(0, -1));
        assert_eq!(attack(&mut state, &A, &action).rejection(), Some(Rejection::OutOfBounds));

        // Nothing changed
        assert_eq!(state, fixture());
    }

    #[test]
    fn test_stranger_is_not_their_turn() {
        let mut state = fixture();
        let stranger = PlayerId::new([3; 16]);
        let action = AttackAction::new("x", 1, Coord::new(0, 0));
        assert_eq!(attack(&mut state, &stranger, &action).rejection(), Some(Rejection::NotYourTurn));
    }

    #[test]
    fn test_miss_is_only_recorded_by_attacker() {
        let mut state = fixture();

        let ActionOutcome::Applied(outcome) = fire(&mut state, A, 0, 0) else {
            panic!("expected applied attack");
        };
        assert!(!outcome.is_hit);
        assert_eq!(outcome.target, Coord::new(0, 0));

        let a = &state.seat(Seat::First).board;
        let b = &state.seat(Seat::Second).board;
        assert_eq!(a.attacks_by_me_misses, vec![Coord::new(0, 0)]);
        assert!(a.attacks_by_me_hits.is_empty());
        assert!(b.hits.is_empty());
        assert!(b.misses.is_empty());
    }

    #[test]
    fn test_re_attack_is_allowed_and_ledger_is_stable() {
        let mut state = fixture();
        fire(&mut state, A, 0, 0);
        let before = state.clone();

        let outcome = fire(&mut state, A, 0, 0);
        assert!(outcome.is_success());
        assert_eq!(state, before);
    }

    #[test]
    fn test_hit_then_sink_then_win() {
        let mut state = fixture();

        let ActionOutcome::Applied(first) = fire(&mut state, A, 5, 6) else { panic!() };
        assert!(first.is_hit);
        assert!(first.sunk_ship.is_none());
        assert_eq!(state.seat(Seat::Second).board.hits, vec![Coord::new(5, 6)]);
        assert_eq!(state.seat(Seat::Second).board.ships[0].hit_indices.iter().copied().collect::<Vec<_>>(), vec![1]);

        let ActionOutcome::Applied(second) = fire(&mut state, A, 5, 5) else { panic!() };
        let sunk = second.sunk_ship.as_ref().expect("destroyer should sink");
        assert_eq!(sunk.kind, ShipKind::Destroyer);
        assert_eq!(sunk.length, 2);
        assert_eq!(sunk.cells, vec![Coord::new(5, 5), Coord::new(5, 6)]);
        assert!(!second.game_ended());

        let b = &state.seat(Seat::Second).board;
        assert_eq!(b.ships.len(), 1);
        assert_eq!(b.sunk_ships.len(), 1);
        assert!(b.sunk_ships[0].sunk);

        // Sunk cells are no longer active: firing there again is a miss
        let ActionOutcome::Applied(again) = fire(&mut state, A, 5, 5) else { panic!() };
        assert!(!again.is_hit);
        let a = &state.seat(Seat::First).board;
        assert!(a.attacks_by_me_misses.contains(&Coord::new(5, 5)));
        assert!(!a.attacks_by_me_hits.contains(&Coord::new(5, 5)));

        fire(&mut state, A, 7, 0);
        fire(&mut state, A, 8, 0);
        let ActionOutcome::Applied(last) = fire(&mut state, A, 9, 0) else { panic!() };
        assert_eq!(last.winner, Some(A));
        assert_eq!(state.winner_player_id, Some(A));
        assert!(state.is_ended());

        // Terminal
        assert_eq!(fire(&mut state, A, 0, 0).rejection(), Some(Rejection::GameEnded));
        let mv = ShipMoveAction::new("m", state.turn, ShipId([11; 16]), Coord::new(4, 0), true);
        assert_eq!(move_ship(&mut state, &A, &mv).rejection(), Some(Rejection::GameEnded));
    }

    #[test]
    fn test_move_validation() {
        let mut state = fixture();
        let destroyer = ShipId([11; 16]);

        let unknown = ShipMoveAction::new("m", 1, ShipId([99; 16]), Coord::new(4, 0), true);
        assert_eq!(move_ship(&mut state, &A, &unknown).rejection(), Some(Rejection::ShipNotFound));

        // Opponent's ship is not yours
        let theirs = ShipMoveAction::new("m", 1, ShipId([20; 16]), Coord::new(4, 0), true);
        assert_eq!(move_ship(&mut state, &A, &theirs).rejection(), Some(Rejection::ShipNotFound));

        let off = ShipMoveAction::new("m", 1, destroyer, Coord::new(9, 9), true);
        assert_eq!(move_ship(&mut state, &A, &off).rejection(), Some(Rejection::OutOfBounds));

        let onto_carrier = ShipMoveAction::new("m", 1, destroyer, Coord::new(0, 3), false);
        assert_eq!(move_ship(&mut state, &A, &onto_carrier).rejection(), Some(Rejection::OverlapsWithOtherShip));

        // Overlapping its own old cells is fine
        let shuffle = ShipMoveAction::new("m", 1, destroyer, Coord::new(2, 1), true);
        assert!(move_ship(&mut state, &A, &shuffle).is_success());
    }

    #[test]
    fn test_sunk_ship_cannot_move() {
        let mut state = fixture();
        fire(&mut state, A, 5, 5);
        fire(&mut state, A, 5, 6);
        advance_turn(&mut state);

        let mv = ShipMoveAction::new("m", state.turn, ShipId([20; 16]), Coord::new(0, 0), true);
        assert_eq!(move_ship(&mut state, &B, &mv).rejection(), Some(Rejection::ShipAlreadySunk));
    }

    #[test]
    fn test_move_onto_own_wreck_is_rejected() {
        let mut state = fixture();
        fire(&mut state, A, 5, 5);
        fire(&mut state, A, 5, 6);
        advance_turn(&mut state);

        // Cruiser onto the sunk destroyer's cells
        let cruiser = ShipId([21; 16]);
        let mv = ShipMoveAction::new("m", state.turn, cruiser, Coord::new(5, 4), true);
        let before = state.clone();
        assert_eq!(move_ship(&mut state, &B, &mv).rejection(), Some(Rejection::OverlapsWithOtherShip));
        assert_eq!(state, before);

        // Next to the wreck is fine, and the wreck's hit markers stay
        let mv = ShipMoveAction::new("m", state.turn, cruiser, Coord::new(4, 5), true);
        assert!(move_ship(&mut state, &B, &mv).is_success());
        let b = &state.seat(Seat::Second).board;
        assert!(b.hits.contains(&Coord::new(5, 5)));
        assert!(b.hits.contains(&Coord::new(5, 6)));
    }

    #[test]
    fn test_move_carries_damage() {
        let mut state = fixture();
        fire(&mut state, A, 7, 0);
        fire(&mut state, A, 9, 0);
        advance_turn(&mut state);

        let cruiser = ShipId([21; 16]);
        let mv = ShipMoveAction::new("m", state.turn, cruiser, Coord::new(3, 4), true);
        let ActionOutcome::Applied(outcome) = move_ship(&mut state, &B, &mv) else { panic!() };

        assert_eq!(outcome.cells, vec![Coord::new(3, 4), Coord::new(3, 5), Coord::new(3, 6)]);
        assert_eq!(outcome.hit_indices, vec![0, 2]);

        let b = &state.seat(Seat::Second).board;
        let mut hits = b.hits.clone();
        hits.sort();
        assert_eq!(hits, vec![Coord::new(3, 4), Coord::new(3, 6)]);

        // Attacker's ledger is not rewritten by the move
        assert_eq!(
            state.seat(Seat::First).board.attacks_by_me_hits,
            vec![Coord::new(7, 0), Coord::new(9, 0)]
        );
        assert_eq!(state.current_player_id, B);
        assert!(!state.is_ended());
    }

    #[test]
    fn test_advance_turn() {
        let mut state = fixture();
        advance_turn(&mut state);
        assert_eq!((state.turn, state.current_player_id, state.state_version), (2, B, 2));
        advance_turn(&mut state);
        assert_eq!((state.turn, state.current_player_id, state.state_version), (3, A, 3));
    }

    #[test]
    fn test_rejection_codes_match_serde() {
        for r in [
            Rejection::NotYourTurn,
            Rejection::InvalidTurnNumber,
            Rejection::GameEnded,
            Rejection::OutOfBounds,
            Rejection::ShipNotFound,
            Rejection::ShipAlreadySunk,
            Rejection::OverlapsWithOtherShip,
        ] {
            assert_eq!(serde_json::to_value(r).unwrap(), r.code());
        }
    }

    /// One random step for the current player: a move when `kind == 0`,
    /// otherwise an attack. Returns whether it applied.
    fn step(state: &mut GameState, (kind, ship, row, col, horizontal): (u8, usize, i32, i32, bool)) -> bool {
        let who = state.current_player_id;
        let target = Coord::new(row, col);
        let ships = &state.seat(state.current_seat()).board.ships;
        if kind == 0 && !ships.is_empty() {
            let id = ships[ship % ships.len()].id;
            let mv = ShipMoveAction::new("m", state.turn, id, target, horizontal);
            move_ship(state, &who, &mv).is_success()
        } else {
            fire(state, who, row, col).is_success()
        }
    }

    proptest! {
        /// Random attacks and moves: misses stay empty, ledgers are
        /// disjoint, sunk ships are never active, ships never share a
        /// cell with each other or a wreck, `hits` is exactly the damaged
        /// cells, turn/version only grow.
        #[test]
        fn prop_action_invariants(
            ops in prop::collection::vec((0u8..3, 0usize..5, 0i32..10, 0i32..10, any::<bool>()), 1..150),
        ) {
            let mut state = fixture();
            let mut last = (state.turn, state.state_version);

            for op in ops {
                let attacking = op.0 != 0;
                let applied = step(&mut state, op);
                if state.is_ended() {
                    break;
                }
                if attacking {
                    prop_assert!(applied);
                }
                if !applied {
                    continue;
                }
                advance_turn(&mut state);
                prop_assert_eq!(state.turn, last.0 + 1);
                prop_assert!(state.state_version > last.1);
                last = (state.turn, state.state_version);
            }

            for player in &state.players {
                let board = &player.board;
                prop_assert!(board.misses.is_empty());
                for c in &board.attacks_by_me_hits {
                    prop_assert!(!board.attacks_by_me_misses.contains(c));
                }
                for s in &board.ships {
                    prop_assert!(!s.sunk);
                    prop_assert!(s.hit_indices.len() < s.cells.len());
                }
                for s in &board.sunk_ships {
                    prop_assert!(s.sunk);
                    prop_assert_eq!(s.hit_indices.len(), s.cells.len());
                    prop_assert!(!board.ships.iter().any(|a| a.id == s.id));
                }

                let all: Vec<&Ship> = board.ships.iter().chain(board.sunk_ships.iter()).collect();
                let mut occupied: Vec<Coord> = all.iter().flat_map(|s| s.cells.clone()).collect();
                let total = occupied.len();
                occupied.sort();
                occupied.dedup();
                prop_assert_eq!(occupied.len(), total);

                let mut damaged: Vec<Coord> = all.iter().flat_map(|s| s.damaged_cells()).collect();
                damaged.sort();
                let mut hits = board.hits.clone();
                hits.sort();
                prop_assert_eq!(hits, damaged);
            }
        }
    }
}
