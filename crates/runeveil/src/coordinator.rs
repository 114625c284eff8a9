//! The session coordinator: one object the game talks to.

use runeveil_netplay::{ConnState, ConnectionManager, NetConfig, NetError, NetEvent, Severity};
use runeveil_protocol::{InputFrame, PlayerSnapshot};
use runeveil_replica::ProxySet;
use runeveil_transport::{PeerId, Transport};

use crate::error::RuneveilError;
use crate::hooks::GameHooks;

/// Drives a whole multiplayer session: transport, connection manager,
/// and remote player proxies, glued to the game through [`GameHooks`].
///
/// The game calls [`host_game`](Self::host_game) or
/// [`join_game`](Self::join_game) once, then
/// [`update`](Self::update) every frame. All networking happens inside
/// `update`; nothing here spawns tasks or threads.
pub struct SessionCoordinator<T: Transport> {
    transport: T,
    config: NetConfig,
    manager: ConnectionManager<T::Session>,
    proxies: ProxySet,
}

impl<T: Transport> SessionCoordinator<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, NetConfig::default())
    }

    pub fn with_config(transport: T, config: NetConfig) -> Self {
        let manager = ConnectionManager::new(config.clone());
        Self {
            transport,
            config,
            manager,
            proxies: ProxySet::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Session lifecycle
    // ---------------------------------------------------------------------

    /// Opens the transport and starts hosting. Returns the room code
    /// other players join with (the host's own peer id).
    pub async fn host_game(&mut self) -> Result<PeerId, RuneveilError> {
        let id = self
            .transport
            .open()
            .await
            .map_err(|e| RuneveilError::Transport(e.to_string()))?;
        self.transport
            .listen()
            .map_err(|e| RuneveilError::Transport(e.to_string()))?;
        self.manager.start_hosting(id.clone());
        Ok(id)
    }

    /// Opens the transport and joins the session hosted under `room`.
    ///
    /// Gives up after the configured connect timeout; on any failure the
    /// coordinator stays idle and can try again.
    pub async fn join_game(&mut self, room: &str) -> Result<(), RuneveilError> {
        let id = self
            .transport
            .open()
            .await
            .map_err(|e| RuneveilError::Transport(e.to_string()))?;
        let session = tokio::time::timeout(self.config.connect_timeout, self.transport.connect(room))
            .await
            .map_err(|_| NetError::ConnectTimeout)?
            .map_err(|e| RuneveilError::Transport(e.to_string()))?;
        self.manager.start_member(id, session);
        Ok(())
    }

    /// Host only: starts the game for every connected player.
    pub fn start_game<G: GameHooks>(&mut self, game: &mut G) -> Result<(), RuneveilError> {
        self.manager.broadcast_start()?;
        game.set_running();
        game.start_game(false);
        game.show_game_hud();
        Ok(())
    }

    /// Leaves the current session. A host announces its departure so
    /// members can continue solo.
    pub fn leave_game<G: GameHooks>(&mut self, game: &mut G) {
        self.manager.leave(&mut self.proxies);
        game.enable_local_spawning();
        game.set_paused();
        game.show_main_menu();
        game.set_connection_status("Offline");
    }

    /// Host only: removes a player from the session.
    pub fn kick_player(&mut self, peer: &PeerId) -> Result<(), RuneveilError> {
        self.manager.kick(peer, &mut self.proxies)?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Outbound gameplay
    // ---------------------------------------------------------------------

    /// Announces a local skill cast to the other players.
    pub fn cast_skill(&mut self, skill_name: &str, variant: u32, target_enemy_id: Option<String>) {
        self.manager.cast_skill(skill_name, variant, target_enemy_id);
    }

    /// Reports damage the local player dealt to an enemy.
    pub fn report_damage(&mut self, amount: f32, enemy_id: Option<String>) {
        self.manager.report_damage(amount, enemy_id);
    }

    /// Host only: splits kill experience across all players, crediting
    /// the host's share straight through the hooks.
    pub fn share_experience<G: GameHooks>(
        &mut self,
        amount: f32,
        enemy_id: &str,
        game: &mut G,
    ) -> Result<(), RuneveilError> {
        let local_share = self.manager.share_experience(amount, enemy_id)?;
        game.add_experience(local_share);
        Ok(())
    }

    /// Member only: forwards the local input frame to the host.
    pub fn send_input(&mut self, input: InputFrame) {
        self.manager.send_input(input);
    }

    // ---------------------------------------------------------------------
    // Frame update
    // ---------------------------------------------------------------------

    /// Advances the whole session by one frame.
    ///
    /// Smooths proxies, accepts inbound sessions, pumps every session's
    /// messages, sends or broadcasts our own state, and finally replays
    /// everything that happened into the game's hooks.
    pub fn update<G: GameHooks>(&mut self, dt: f32, game: &mut G) {
        self.proxies.tick(dt);

        while let Some(session) = self.transport.poll_accept() {
            self.manager.accept_session(session, &mut self.proxies);
        }

        self.manager.pump(&mut self.proxies);

        match self.manager.state() {
            ConnState::Connected => {
                if self.manager.game_running() {
                    // No avatar yet (loading, death screen): skip the
                    // sample silently rather than send a bogus one.
                    if let Some(snapshot) = Self::local_snapshot(game) {
                        self.manager.send_position(snapshot);
                    }
                }
            }
            ConnState::Hosting => {
                let enemies = game.enemy_snapshot().unwrap_or_default();
                self.manager
                    .try_broadcast(Self::local_snapshot(game), enemies, &self.proxies);
            }
            _ => {}
        }

        for event in self.manager.drain_events() {
            self.apply_event(event, game);
        }
    }

    fn local_snapshot<G: GameHooks>(game: &G) -> Option<PlayerSnapshot> {
        let position = game.player_position()?;
        let rotation = game.player_yaw()?;
        let animation = game.player_animation()?;
        Some(PlayerSnapshot {
            position,
            rotation,
            animation,
            model_id: game.player_model(),
        })
    }

    fn apply_event<G: GameHooks>(&mut self, event: NetEvent, game: &mut G) {
        match event {
            NetEvent::PeerJoined { peer, color } => {
                game.player_list_add(&peer, color);
                game.show_notification("A player joined the party", Severity::Info);
            }
            NetEvent::PeerLeft { peer } => {
                game.player_list_remove(&peer);
                game.show_notification("A player left the party", Severity::Info);
            }
            NetEvent::Welcome { message } => {
                game.set_connection_status("Connected");
                game.show_notification(&message, Severity::Info);
            }
            NetEvent::GameStarted => {
                game.set_running();
                game.start_game(true);
                game.show_game_hud();
            }
            NetEvent::HostLeft => {
                game.show_notification("The host left the game", Severity::Warn);
                game.remove_all_enemies();
                game.enable_local_spawning();
                game.set_connection_status("Offline");
            }
            NetEvent::Kicked => {
                game.show_notification("You were removed from the game", Severity::Error);
                game.remove_all_enemies();
                game.enable_local_spawning();
                game.set_connection_status("Offline");
            }
            NetEvent::DamageDealt {
                amount, enemy_id, ..
            } => {
                game.apply_enemy_damage(enemy_id.as_deref(), amount);
            }
            NetEvent::ExperienceShared { amount } => {
                game.add_experience(amount);
            }
            NetEvent::EnemyState(snapshot) => {
                game.apply_enemy_snapshot(&snapshot);
            }
            NetEvent::SessionError { peer, message } => {
                tracing::warn!(%peer, message, "session error surfaced to game");
                game.show_notification("Connection problem with a player", Severity::Warn);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Whether a session (hosting or joined) is live.
    pub fn is_active(&self) -> bool {
        self.manager.is_active()
    }

    pub fn is_host(&self) -> bool {
        self.manager.is_host()
    }

    pub fn state(&self) -> ConnState {
        self.manager.state()
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.manager.local_id()
    }

    /// The remote player proxies, for rendering.
    pub fn proxies(&self) -> &ProxySet {
        &self.proxies
    }

    /// Host only: the latest input frame received from `peer`.
    pub fn latest_input(&self, peer: &PeerId) -> Option<&InputFrame> {
        self.manager.latest_input(peer)
    }

    pub fn peer_count(&self) -> usize {
        self.manager.peer_count()
    }
}
