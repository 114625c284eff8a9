//! Runs a host and a member in one process, wired through the
//! in-memory transport, and logs everything the session layer asks of
//! the game. Useful for eyeballing the full message flow:
//!
//! ```text
//! RUST_LOG=debug cargo run -p loopback
//! ```

use runeveil::{GameHooks, PeerId, PlayerColor, SessionCoordinator, Severity};
use runeveil_transport::MemoryHub;
use tracing_subscriber::EnvFilter;

/// A stand-in game that logs every hook call and walks its avatar in a
/// straight line.
struct DemoGame {
    name: &'static str,
    x: f32,
    experience: f32,
}

impl DemoGame {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            x: 0.0,
            experience: 0.0,
        }
    }
}

impl GameHooks for DemoGame {
    fn player_position(&self) -> Option<[f32; 3]> {
        Some([self.x, 0.0, 0.0])
    }

    fn player_yaw(&self) -> Option<f32> {
        Some(0.0)
    }

    fn player_animation(&self) -> Option<String> {
        Some("run".to_string())
    }

    fn enemy_snapshot(&self) -> Option<Vec<u8>> {
        Some(vec![1, 2, 3])
    }

    fn apply_enemy_snapshot(&mut self, snapshot: &[u8]) {
        tracing::debug!(game = self.name, bytes = snapshot.len(), "enemy snapshot applied");
    }

    fn apply_enemy_damage(&mut self, enemy_id: Option<&str>, amount: f32) {
        tracing::info!(game = self.name, ?enemy_id, amount, "enemy damaged");
    }

    fn add_experience(&mut self, amount: f32) {
        self.experience += amount;
        tracing::info!(game = self.name, amount, total = self.experience, "experience gained");
    }

    fn start_game(&mut self, resume: bool) {
        tracing::info!(game = self.name, resume, "game started");
    }

    fn show_notification(&mut self, text: &str, severity: Severity) {
        tracing::info!(game = self.name, ?severity, "notification: {text}");
    }

    fn set_connection_status(&mut self, status: &str) {
        tracing::info!(game = self.name, status, "connection status");
    }

    fn player_list_add(&mut self, peer: &PeerId, color: PlayerColor) {
        tracing::info!(game = self.name, %peer, %color, "player joined the list");
    }

    fn player_list_remove(&mut self, peer: &PeerId) {
        tracing::info!(game = self.name, %peer, "player left the list");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), runeveil::RuneveilError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let hub = MemoryHub::default();
    let mut host_game = DemoGame::new("host");
    let mut member_game = DemoGame::new("member");

    let mut host = SessionCoordinator::new(hub.transport());
    let room = host.host_game().await?;
    tracing::info!(%room, "hosting");

    let mut member = SessionCoordinator::new(hub.transport());
    member.join_game(room.as_str()).await?;
    tracing::info!("member joined");

    host.update(0.0, &mut host_game);
    host.start_game(&mut host_game)?;

    // A couple of seconds of simulated frames.
    let dt = 1.0 / 60.0;
    for frame in 0..120 {
        host_game.x += 0.05;
        member_game.x -= 0.05;

        host.update(dt, &mut host_game);
        member.update(dt, &mut member_game);

        if frame == 30 {
            member.cast_skill("fireball", 1, None);
        }
        if frame == 60 {
            member.report_damage(40.0, Some("enemy-1".to_string()));
        }
        if frame == 61 {
            host.share_experience(100.0, "enemy-1", &mut host_game)?;
        }

        tokio::time::sleep(std::time::Duration::from_millis(16)).await;
    }

    tracing::info!(
        proxies = host.proxies().len(),
        peers = host.peer_count(),
        "demo finished"
    );
    member.leave_game(&mut member_game);
    host.update(dt, &mut host_game);
    host.leave_game(&mut host_game);
    Ok(())
}
