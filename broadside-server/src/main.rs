//! Broadside Game Server
//!
//! Runs a demo match against the in-memory collaborators, then shows
//! snapshot recovery after the hot cache is wiped.

use anyhow::{bail, Context};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use broadside::{
    game::events::EventType,
    service::{ActionResponse, Recipient},
    AttackAction, Coord, DeterministicRng, EngineConfig, GameId, GameService, PlayerId, BOARD_SIZE,
    SNAPSHOT_INTERVAL, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let config = EngineConfig::from_env();
    info!("Broadside Server v{}", VERSION);
    info!(
        "Board: {}x{}, snapshot every {} turns, codec {:?}",
        BOARD_SIZE, BOARD_SIZE, config.snapshot_interval, config.state_codec
    );

    demo_match(&config).await?;
    demo_recovery(&config).await?;
    Ok(())
}

/// Every cell of the board in a seeded random order.
fn firing_order(seed: u64) -> Vec<Coord> {
    let mut cells: Vec<Coord> = (0..BOARD_SIZE)
        .flat_map(|r| (0..BOARD_SIZE).map(move |c| Coord::new(r, c)))
        .collect();
    let mut rng = DeterministicRng::new(seed);
    for i in (1..cells.len()).rev() {
        let j = rng.next_int(i as u32 + 1) as usize;
        cells.swap(i, j);
    }
    cells
}

/// Two simulated players fire until one fleet is gone.
async fn demo_match(config: &EngineConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let (service, backends) = GameService::in_memory(config);
    let mut rx = backends.broadcaster.subscribe();

    let alice = PlayerId::from_subject("alice");
    let bob = PlayerId::from_subject("bob");
    let state = service.create_game("demo-room", alice, bob).await?;
    let game_id = state.game_id;
    info!("Game {} created in room {}", game_id, state.room_id);

    let orders = [firing_order(1), firing_order(2)];
    let mut shots = [0usize; 2];

    loop {
        let state = service.engine().load(&game_id).await?;
        if state.is_ended() {
            break;
        }

        let seat = state.current_seat().index();
        let Some(target) = orders[seat].get(shots[seat]).copied() else {
            bail!("player {} ran out of cells without a winner", seat);
        };
        shots[seat] += 1;

        let shooter = state.current_player_id;
        let action = AttackAction::new(format!("{}-{}", shooter.short(), shots[seat]), state.turn, target);
        match service.submit_attack(&game_id, &shooter, &action).await? {
            ActionResponse::Applied { outcome, .. } => {
                if let Some(sunk) = &outcome.sunk_ship {
                    info!("Turn {}: {} sank a {:?} at {}", state.turn, shooter.short(), sunk.kind, target);
                }
            }
            other => warn!("Unexpected response: {:?}", other),
        }
    }

    // Replaying the same action id is a no-op
    let state = service.engine().load(&game_id).await?;
    let replay = AttackAction::new(format!("{}-1", alice.short()), 1, Coord::new(0, 0));
    if let ActionResponse::Duplicate { view } = service.submit_attack(&game_id, &alice, &replay).await? {
        info!("Replayed action ignored, view still at turn {}", view.turn);
    }

    let winner = state.winner_player_id.context("game ended without a winner")?;
    let view = service.view(&game_id, &winner).await?;
    info!("=== Match Results ===");
    info!("Winner: {} after {} turns", winner.short(), state.turn);
    info!(
        "Winner sank {} ships with {} hits and {} misses",
        view.opponent_board.sunk_ships.len(),
        view.opponent_board.hits.len(),
        view.opponent_board.misses.len()
    );

    let events = service.events_after(&game_id, 0, usize::MAX).await?;
    info!("Journaled events: {}", events.len());

    let mut room_updates = 0;
    loop {
        match rx.try_recv() {
            Ok(delivery) => {
                if matches!(delivery.to, Recipient::Topic(_))
                    && delivery.notification.event_type == EventType::StateUpdated
                {
                    room_updates += 1;
                }
            }
            Err(TryRecvError::Lagged(skipped)) => warn!("Notification receiver lagged by {}", skipped),
            Err(_) => break,
        }
    }
    info!("Room notifications: {} state updates", room_updates);

    Ok(())
}

/// Lose the cache mid-game and resume from the last snapshot.
async fn demo_recovery(config: &EngineConfig) -> anyhow::Result<()> {
    info!("=== Snapshot Recovery ===");

    let (service, backends) = GameService::in_memory(config);
    let a = PlayerId::from_subject("carol");
    let b = PlayerId::from_subject("dave");
    let game_id = GameId::random();
    service.create_game_with(game_id, "recovery-room", a, b, Some(7)).await?;

    let orders = [firing_order(3), firing_order(4)];
    let target_turn = SNAPSHOT_INTERVAL + 2;

    for turn in 1..target_turn {
        let state = service.engine().load(&game_id).await?;
        let seat = state.current_seat().index();
        let action = AttackAction::new(format!("r{}", turn), turn, orders[seat][turn as usize]);
        service.submit_attack(&game_id, &state.current_player_id, &action).await?;
    }

    let before = service.engine().load(&game_id).await?;
    backends.cache.clear().await;
    let after = service.engine().load(&game_id).await?;

    info!(
        "Cache wiped at turn {}; resumed at turn {} (snapshots at {:?})",
        before.turn,
        after.turn,
        backends.durable.snapshot_turns(&game_id).await
    );
    Ok(())
}
