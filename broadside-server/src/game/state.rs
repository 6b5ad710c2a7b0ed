//! Game State Definitions
//!
//! All state types for a match. The two players live in an explicit
//! ordered pair (`Seat::First`, `Seat::Second`) so "the other player"
//! never depends on map iteration order.

use std::collections::BTreeSet;
use std::fmt;
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use crate::core::coord::Coord;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord for deterministic ordering in maps and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Derive a stable PlayerId from an authenticated subject string.
    ///
    /// The transport layer authenticates users; the engine only needs a
    /// fixed-width id, so the subject is hashed down to 16 bytes.
    pub fn from_subject(subject: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"broadside-player:");
        hasher.update(subject.as_bytes());
        let hash = hasher.finalize();

        let mut id = [0u8; 16];
        id.copy_from_slice(&hash[..16]);
        Self(id)
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

/// Unique game identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub [u8; 16]);

impl GameId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_bytes(self.0))
    }
}

/// Opaque ship token, unique within a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShipId(pub [u8; 16]);

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_bytes(self.0))
    }
}

// =============================================================================
// SHIPS
// =============================================================================

/// The five fleet kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ShipKind {
    /// Length 5
    Carrier = 0,
    /// Length 4
    Battleship = 1,
    /// Length 3
    Cruiser = 2,
    /// Length 3
    Submarine = 3,
    /// Length 2
    Destroyer = 4,
}

impl ShipKind {
    /// The fixed fleet every player starts with, in placement order.
    pub const FLEET: [ShipKind; 5] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Cruiser,
        ShipKind::Submarine,
        ShipKind::Destroyer,
    ];

    /// Number of cells this kind occupies.
    #[inline]
    pub fn length(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser | ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }
}

/// A ship on a player's board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Unique ship id
    pub id: ShipId,

    /// Fleet kind (fixes the length)
    pub kind: ShipKind,

    /// Occupied cells, bow first
    pub cells: Vec<Coord>,

    /// Damaged positions relative to `cells` (survive repositioning)
    pub hit_indices: BTreeSet<usize>,

    /// Cached: every index is damaged
    pub sunk: bool,
}

impl Ship {
    /// Create an undamaged ship.
    pub fn new(id: ShipId, kind: ShipKind, cells: Vec<Coord>) -> Self {
        Self {
            id,
            kind,
            cells,
            hit_indices: BTreeSet::new(),
            sunk: false,
        }
    }

    /// Position of `cell` within this ship, if it is one of its cells.
    pub fn index_of(&self, cell: Coord) -> Option<usize> {
        self.cells.iter().position(|c| *c == cell)
    }

    /// Does the ship cover `cell`?
    #[inline]
    pub fn occupies(&self, cell: Coord) -> bool {
        self.cells.contains(&cell)
    }

    /// Mark a relative index as damaged and refresh the sunk flag.
    ///
    /// Returns true if this hit sank the ship.
    pub fn mark_hit(&mut self, index: usize) -> bool {
        if index < self.cells.len() {
            self.hit_indices.insert(index);
        }
        let was_sunk = self.sunk;
        self.sunk = self.is_fully_damaged();
        self.sunk && !was_sunk
    }

    /// All cells damaged?
    pub fn is_fully_damaged(&self) -> bool {
        !self.cells.is_empty() && self.hit_indices.len() >= self.cells.len()
    }

    /// Absolute coordinates of the damaged cells at the current position.
    pub fn damaged_cells(&self) -> Vec<Coord> {
        self.hit_indices
            .iter()
            .filter_map(|&i| self.cells.get(i).copied())
            .collect()
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// One player's board and private attack ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Active (unsunk) ships
    pub ships: Vec<Ship>,

    /// Sunk ships, moved here the instant they sink
    pub sunk_ships: Vec<Ship>,

    /// Cells of this board hit by the opponent (owner-only)
    pub hits: Vec<Coord>,

    /// Never populated: the defender must not learn where the attacker missed
    pub misses: Vec<Coord>,

    /// Latest outcome ledger of the owner's own attacks: hits
    pub attacks_by_me_hits: Vec<Coord>,

    /// Latest outcome ledger of the owner's own attacks: misses
    pub attacks_by_me_misses: Vec<Coord>,
}

impl Board {
    /// Board with a freshly placed fleet.
    pub fn with_ships(ships: Vec<Ship>) -> Self {
        Self {
            ships,
            ..Self::default()
        }
    }

    /// Index into `ships` of the active ship covering `cell`.
    pub fn active_ship_at(&self, cell: Coord) -> Option<usize> {
        self.ships.iter().position(|s| s.occupies(cell))
    }

    /// Index into `ships` of the active ship with this id.
    pub fn active_ship_index(&self, id: ShipId) -> Option<usize> {
        self.ships.iter().position(|s| s.id == id)
    }

    /// Is `id` one of this board's sunk ships?
    pub fn is_sunk_ship(&self, id: ShipId) -> bool {
        self.sunk_ships.iter().any(|s| s.id == id)
    }

    /// Record a hit received on this board (deduplicated).
    pub fn record_hit_received(&mut self, cell: Coord) {
        if !self.hits.contains(&cell) {
            self.hits.push(cell);
        }
    }

    /// Record the outcome of one of the owner's attacks.
    ///
    /// The ledger keeps only the latest outcome per coordinate.
    pub fn record_attack_outcome(&mut self, target: Coord, is_hit: bool) {
        self.attacks_by_me_hits.retain(|c| *c != target);
        self.attacks_by_me_misses.retain(|c| *c != target);
        if is_hit {
            self.attacks_by_me_hits.push(target);
        } else {
            self.attacks_by_me_misses.push(target);
        }
    }

    /// Move the ship at `index` from `ships` to `sunk_ships`.
    pub fn retire_ship(&mut self, index: usize) -> Ship {
        let ship = self.ships.remove(index);
        self.sunk_ships.push(ship.clone());
        ship
    }

    /// Every ship still afloat?
    pub fn fleet_destroyed(&self) -> bool {
        self.ships.is_empty()
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single player in the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player id
    pub player_id: PlayerId,

    /// Owned board
    pub board: Board,
}

impl PlayerState {
    /// Create a player with the given board.
    pub fn new(player_id: PlayerId, board: Board) -> Self {
        Self { player_id, board }
    }
}

/// One of the two seats at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    /// Moves first
    First,
    /// Moves second
    Second,
}

impl Seat {
    /// The opposing seat.
    #[inline]
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Index into the player pair.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Lifecycle phase. One-way: `Active -> Ended`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Accepting actions
    Active,
    /// Winner decided, immutable
    Ended,
}

/// Complete state of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Game identifier
    pub game_id: GameId,

    /// Room the game was started from
    pub room_id: String,

    /// Turn counter (starts at 1)
    pub turn: u32,

    /// Whose move it is
    pub current_player_id: PlayerId,

    /// Exactly two players, in seat order
    pub players: [PlayerState; 2],

    /// Set once, on the single terminal win
    pub winner_player_id: Option<PlayerId>,

    /// Bumped on every committed mutation
    pub state_version: u64,
}

impl GameState {
    /// Create a new game. The first seat moves first.
    pub fn new(game_id: GameId, room_id: impl Into<String>, first: PlayerState, second: PlayerState) -> Self {
        Self {
            game_id,
            room_id: room_id.into(),
            turn: 1,
            current_player_id: first.player_id,
            players: [first, second],
            winner_player_id: None,
            state_version: 1,
        }
    }

    /// Seat of a player, if they are in this game.
    pub fn seat_of(&self, id: &PlayerId) -> Option<Seat> {
        if self.players[0].player_id == *id {
            Some(Seat::First)
        } else if self.players[1].player_id == *id {
            Some(Seat::Second)
        } else {
            None
        }
    }

    /// Player in a seat.
    pub fn seat(&self, seat: Seat) -> &PlayerState {
        &self.players[seat.index()]
    }

    /// Get a player by ID.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.seat_of(id).map(|s| self.seat(s))
    }

    /// The opponent of a player.
    pub fn opponent_of(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.seat_of(id).map(|s| self.seat(s.other()))
    }

    /// Both players mutably: `(seat, seat.other())`.
    pub fn pair_mut(&mut self, seat: Seat) -> (&mut PlayerState, &mut PlayerState) {
        let (first, second) = self.players.split_at_mut(1);
        match seat {
            Seat::First => (&mut first[0], &mut second[0]),
            Seat::Second => (&mut second[0], &mut first[0]),
        }
    }

    /// Seat whose move it is.
    pub fn current_seat(&self) -> Seat {
        self.seat_of(&self.current_player_id).unwrap_or(Seat::First)
    }

    /// Check if the game has ended.
    pub fn is_ended(&self) -> bool {
        self.winner_player_id.is_some()
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        if self.is_ended() {
            GamePhase::Ended
        } else {
            GamePhase::Active
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
