//! The seam between the session layer and the game.

use runeveil_netplay::Severity;
use runeveil_protocol::PlayerColor;
use runeveil_transport::PeerId;

/// Callbacks the embedding game provides to the session layer.
///
/// Every method has a no-op default so a game (or a test double) only
/// implements what it cares about. The coordinator calls these from
/// [`crate::SessionCoordinator::update`], always on the caller's
/// thread.
pub trait GameHooks {
    // -----------------------------------------------------------------
    // Local player state, read each frame
    // -----------------------------------------------------------------

    /// The local player's world position, if an avatar exists yet.
    fn player_position(&self) -> Option<[f32; 3]> {
        None
    }

    /// The local player's yaw in radians.
    fn player_yaw(&self) -> Option<f32> {
        None
    }

    /// The local player's current animation clip name.
    fn player_animation(&self) -> Option<String> {
        None
    }

    /// The local player's equipped character model, if any.
    fn player_model(&self) -> Option<String> {
        None
    }

    // -----------------------------------------------------------------
    // Enemy state (host authority)
    // -----------------------------------------------------------------

    /// Host side: an opaque snapshot of all enemies for broadcast.
    fn enemy_snapshot(&self) -> Option<Vec<u8>> {
        None
    }

    /// Member side: applies an enemy snapshot received from the host.
    fn apply_enemy_snapshot(&mut self, _snapshot: &[u8]) {}

    /// Host side: applies damage a member dealt to one of our enemies.
    fn apply_enemy_damage(&mut self, _enemy_id: Option<&str>, _amount: f32) {}

    /// Member side: drops every host-driven enemy before local
    /// authority resumes.
    fn remove_all_enemies(&mut self) {}

    /// Hand enemy spawning back to the local game, after the host
    /// authority goes away.
    fn enable_local_spawning(&mut self) {}

    // -----------------------------------------------------------------
    // Gameplay effects
    // -----------------------------------------------------------------

    /// Credits shared experience to the local player.
    fn add_experience(&mut self, _amount: f32) {}

    // -----------------------------------------------------------------
    // Lifecycle and UI
    // -----------------------------------------------------------------

    /// Marks the game-state machine running.
    fn set_running(&mut self) {}

    /// Marks the game-state machine paused.
    fn set_paused(&mut self) {}

    /// The session's game began, or resumed for a late joiner.
    fn start_game(&mut self, _resume: bool) {}

    fn show_game_hud(&mut self) {}

    fn show_main_menu(&mut self) {}

    fn show_notification(&mut self, _text: &str, _severity: Severity) {}

    fn set_connection_status(&mut self, _status: &str) {}

    fn player_list_add(&mut self, _peer: &PeerId, _color: PlayerColor) {}

    fn player_list_remove(&mut self, _peer: &PeerId) {}
}
