//! The connection manager: peer registry, relay, and broadcast.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use runeveil_protocol::{AnyCodec, Codec, InputFrame, Message, PlayerColor, PlayerSnapshot};
use runeveil_replica::ProxySet;
use runeveil_transport::{PeerId, Session, SessionEvent};

use crate::colors::ColorTable;
use crate::config::NetConfig;
use crate::error::NetError;
use crate::event::NetEvent;

/// Where this manager sits in a session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// No session. Hosting or joining can begin.
    Idle,
    /// We are the session authority.
    Hosting,
    /// We are a member with one session to the host.
    Connected,
    /// The session ended out from under us (kick, host loss).
    Disconnected,
}

/// Owns every peer session for one side of a multiplayer session.
///
/// On the host the registry holds one entry per member; on a member it
/// holds exactly the host session. The manager keeps three views of its
/// peers in lockstep: the session registry, the color table, and the
/// caller's [`ProxySet`]; a peer appears in all of them or none.
pub struct ConnectionManager<S: Session> {
    config: NetConfig,
    state: ConnState,
    local_id: Option<PeerId>,
    local_color: Option<PlayerColor>,
    sessions: HashMap<PeerId, S>,
    colors: ColorTable,
    inputs: HashMap<PeerId, InputFrame>,
    codec: AnyCodec,
    game_running: bool,
    last_broadcast: Option<Instant>,
    events: VecDeque<NetEvent>,
}

impl<S: Session> ConnectionManager<S> {
    pub fn new(config: NetConfig) -> Self {
        let colors = ColorTable::new(config.palette.clone());
        Self {
            config,
            state: ConnState::Idle,
            local_id: None,
            local_color: None,
            sessions: HashMap::new(),
            colors,
            inputs: HashMap::new(),
            codec: AnyCodec::negotiated(),
            game_running: false,
            last_broadcast: None,
            events: VecDeque::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Takes the host role. The host claims the first palette color.
    pub fn start_hosting(&mut self, local_id: PeerId) {
        let color = self.colors.assign(&local_id);
        tracing::info!(peer = %local_id, %color, "hosting session");
        self.local_id = Some(local_id);
        self.local_color = Some(color);
        self.state = ConnState::Hosting;
    }

    /// Takes the member role with an established session to the host.
    pub fn start_member(&mut self, local_id: PeerId, session: S) {
        tracing::info!(peer = %local_id, host = %session.peer_id(), "joined session");
        self.local_id = Some(local_id);
        self.sessions.insert(session.peer_id().clone(), session);
        self.state = ConnState::Connected;
    }

    /// Host only: registers a freshly accepted member session.
    ///
    /// Greets the joiner (welcome, current color table, and the start
    /// signal if the game is already running), announces them to every
    /// other member, and creates their proxy.
    pub fn accept_session(&mut self, session: S, proxies: &mut ProxySet) {
        if self.state != ConnState::Hosting {
            tracing::warn!("ignoring inbound session: not hosting");
            return;
        }
        let peer = session.peer_id().clone();
        let color = self.colors.assign(&peer);
        tracing::info!(%peer, %color, "member accepted");

        self.send_to(
            &session,
            &Message::Welcome {
                message: self.config.welcome_message.clone(),
            },
        );
        self.send_to(
            &session,
            &Message::PlayerColors {
                colors: self.colors.snapshot(),
            },
        );
        if self.game_running {
            // Late joiner: the game is already underway.
            self.send_to(&session, &Message::StartGame);
        }

        let joined = Message::PlayerJoined {
            player_id: peer.clone(),
            player_color: color,
        };
        self.send_all(&joined);

        self.sessions.insert(peer.clone(), session);
        proxies.create(&peer, Some(color));
        self.events.push_back(NetEvent::PeerJoined { peer, color });
    }

    /// Leaves the session voluntarily.
    ///
    /// A departing host tells every member first so they can carry on
    /// solo instead of waiting out a dead connection.
    pub fn leave(&mut self, proxies: &mut ProxySet) {
        if self.state == ConnState::Hosting {
            self.send_all(&Message::HostLeft);
        }
        for session in self.sessions.values_mut() {
            session.close();
        }
        tracing::info!(peers = self.sessions.len(), "left session");
        self.sessions.clear();
        self.colors.clear();
        self.inputs.clear();
        proxies.remove_all();
        self.local_color = None;
        self.game_running = false;
        self.last_broadcast = None;
        self.state = ConnState::Idle;
    }

    /// Host only: removes `peer` from the session.
    ///
    /// The target is told it left (its own id in a `playerLeft`), then
    /// everyone else is notified through the normal disconnect path.
    pub fn kick(&mut self, peer: &PeerId, proxies: &mut ProxySet) -> Result<(), NetError> {
        if self.state != ConnState::Hosting {
            return Err(NetError::NotHost);
        }
        if !self.sessions.contains_key(peer) {
            return Err(NetError::UnknownPeer(peer.to_string()));
        }
        tracing::info!(%peer, "kicking member");
        if let Some(session) = self.sessions.get(peer) {
            self.send_to(
                session,
                &Message::PlayerLeft {
                    player_id: peer.clone(),
                },
            );
        }
        self.disconnect_peer(peer, proxies);
        Ok(())
    }

    /// Removes a peer from every registry. Idempotent: a second call
    /// for the same peer (close event racing an explicit kick) is a
    /// no-op, so departure is announced exactly once.
    pub fn disconnect_peer(&mut self, peer: &PeerId, proxies: &mut ProxySet) {
        let Some(mut session) = self.sessions.remove(peer) else {
            return;
        };
        session.close();
        self.colors.release(peer);
        self.inputs.remove(peer);
        proxies.remove(peer);
        tracing::info!(%peer, remaining = self.sessions.len(), "peer disconnected");

        if self.state == ConnState::Hosting {
            self.send_all(&Message::PlayerLeft {
                player_id: peer.clone(),
            });
        }
        self.events.push_back(NetEvent::PeerLeft { peer: peer.clone() });
    }

    // ---------------------------------------------------------------------
    // Frame pump
    // ---------------------------------------------------------------------

    /// Drains every session's pending events and dispatches them.
    /// Called once per frame.
    pub fn pump(&mut self, proxies: &mut ProxySet) {
        // Collect first: the handlers below mutate the registry.
        let mut inbound: Vec<(PeerId, SessionEvent)> = Vec::new();
        for (peer, session) in self.sessions.iter_mut() {
            while let Some(event) = session.poll_event() {
                inbound.push((peer.clone(), event));
            }
        }

        for (peer, event) in inbound {
            match event {
                SessionEvent::Data(bytes) => self.handle_data(&peer, &bytes, proxies),
                SessionEvent::Closed => self.handle_closed(&peer, proxies),
                SessionEvent::Error(message) => {
                    tracing::warn!(%peer, message, "session error");
                    self.events
                        .push_back(NetEvent::SessionError { peer, message });
                }
            }
        }
    }

    fn handle_data(&mut self, peer: &PeerId, bytes: &[u8], proxies: &mut ProxySet) {
        let message: Message = match self.codec.decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(%peer, error = %err, "dropping undecodable message");
                return;
            }
        };
        match self.state {
            ConnState::Hosting => self.handle_host_message(peer, message, proxies),
            ConnState::Connected => self.handle_member_message(peer, message, proxies),
            _ => {
                tracing::debug!(%peer, kind = message.kind(), "message outside a session, dropped")
            }
        }
    }

    fn handle_closed(&mut self, peer: &PeerId, proxies: &mut ProxySet) {
        match self.state {
            ConnState::Hosting => self.disconnect_peer(peer, proxies),
            ConnState::Connected => {
                // The host vanished without a hostLeft. Same recovery:
                // keep playing solo.
                tracing::warn!(host = %peer, "connection to host lost");
                self.end_member_session(proxies);
                self.events.push_back(NetEvent::HostLeft);
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------------
    // Inbound dispatch, host side
    // ---------------------------------------------------------------------

    fn handle_host_message(&mut self, peer: &PeerId, message: Message, proxies: &mut ProxySet) {
        match message {
            Message::PlayerPosition(snapshot) => {
                proxies.update(
                    peer,
                    snapshot.position,
                    snapshot.rotation,
                    &snapshot.animation,
                    snapshot.model_id.as_deref(),
                );
            }
            Message::SkillCast {
                skill_name,
                variant,
                target_enemy_id,
                ..
            } => {
                // Stamp the originator: the sender's claim is ignored so
                // a member cannot cast in someone else's name.
                proxies.set_animation(peer, &skill_name);
                let stamped = Message::SkillCast {
                    skill_name,
                    player_id: peer.clone(),
                    variant,
                    target_enemy_id,
                };
                self.send_except(peer, &stamped);
            }
            Message::PlayerDamage { amount, enemy_id } => {
                proxies.apply_damage(peer, amount);
                self.send_except(peer, &Message::PlayerDamage { amount, enemy_id: enemy_id.clone() });
                self.events.push_back(NetEvent::DamageDealt {
                    peer: Some(peer.clone()),
                    amount,
                    enemy_id,
                });
            }
            Message::PlayerInput { input } => {
                self.inputs.insert(peer.clone(), input);
            }
            other => {
                tracing::debug!(%peer, kind = other.kind(), "unexpected message for host, dropped");
            }
        }
    }

    // ---------------------------------------------------------------------
    // Inbound dispatch, member side
    // ---------------------------------------------------------------------

    fn handle_member_message(&mut self, peer: &PeerId, message: Message, proxies: &mut ProxySet) {
        match message {
            Message::Welcome { message } => {
                self.events.push_back(NetEvent::Welcome { message });
            }
            Message::GameState { players, enemies } => {
                for (id, snapshot) in players {
                    if Some(&id) == self.local_id.as_ref() {
                        continue;
                    }
                    proxies.update(
                        &id,
                        snapshot.position,
                        snapshot.rotation,
                        &snapshot.animation,
                        snapshot.model_id.as_deref(),
                    );
                }
                if !enemies.is_empty() {
                    self.events.push_back(NetEvent::EnemyState(enemies));
                }
            }
            Message::StartGame => {
                self.game_running = true;
                self.events.push_back(NetEvent::GameStarted);
            }
            Message::PlayerJoined {
                player_id,
                player_color,
            } => {
                if Some(&player_id) == self.local_id.as_ref() {
                    return;
                }
                proxies.create(&player_id, Some(player_color));
                self.events.push_back(NetEvent::PeerJoined {
                    peer: player_id,
                    color: player_color,
                });
            }
            Message::PlayerLeft { player_id } => {
                if Some(&player_id) == self.local_id.as_ref() {
                    // Our own id in a playerLeft is the kick signal.
                    tracing::info!("kicked from session");
                    self.end_member_session(proxies);
                    self.events.push_back(NetEvent::Kicked);
                } else {
                    proxies.remove(&player_id);
                    self.events.push_back(NetEvent::PeerLeft { peer: player_id });
                }
            }
            Message::PlayerColors { colors } => {
                if let Some(local) = &self.local_id {
                    if let Some(color) = colors.get(local) {
                        self.local_color = Some(*color);
                    }
                }
                for (id, color) in &colors {
                    proxies.set_color(id, *color);
                }
                self.colors.apply(colors);
            }
            Message::SkillCast {
                skill_name,
                player_id,
                ..
            } => {
                if Some(&player_id) != self.local_id.as_ref() {
                    proxies.set_animation(&player_id, &skill_name);
                }
            }
            Message::HostLeft => {
                tracing::info!(host = %peer, "host left the session");
                self.end_member_session(proxies);
                self.events.push_back(NetEvent::HostLeft);
            }
            Message::PlayerDamage { amount, .. } => {
                // Relayed damage carries no originator, so there is no
                // proxy to flash. The enemy state catches up on the next
                // snapshot.
                tracing::trace!(%peer, amount, "relayed damage, no originator");
            }
            Message::ShareExperience {
                amount,
                enemy_id,
                player_count,
            } => {
                let share = amount / player_count.max(1) as f32;
                tracing::debug!(enemy = %enemy_id, share, "experience shared");
                self.events
                    .push_back(NetEvent::ExperienceShared { amount: share });
            }
            other => {
                tracing::debug!(%peer, kind = other.kind(), "unexpected message for member, dropped");
            }
        }
    }

    /// Tears down the member's session state after a kick or host loss.
    /// The game itself keeps running; only the networked parts go away.
    fn end_member_session(&mut self, proxies: &mut ProxySet) {
        for session in self.sessions.values_mut() {
            session.close();
        }
        self.sessions.clear();
        self.colors.clear();
        self.inputs.clear();
        proxies.remove_all();
        self.state = ConnState::Disconnected;
    }

    // ---------------------------------------------------------------------
    // Outbound operations
    // ---------------------------------------------------------------------

    /// Host only: broadcasts the full game state, at most once per
    /// configured interval. Calls between ticks are silently skipped;
    /// returns whether a broadcast went out.
    ///
    /// `local` is the host player's own snapshot; pass `None` to omit
    /// the host entry (e.g. before the host avatar exists).
    pub fn try_broadcast(
        &mut self,
        local: Option<PlayerSnapshot>,
        enemies: Vec<u8>,
        proxies: &ProxySet,
    ) -> bool {
        if self.state != ConnState::Hosting || self.sessions.is_empty() {
            return false;
        }
        let now = Instant::now();
        if let Some(last) = self.last_broadcast {
            if now.duration_since(last) < self.config.broadcast_interval {
                return false;
            }
        }
        self.last_broadcast = Some(now);

        let mut players: HashMap<PeerId, PlayerSnapshot> = HashMap::new();
        if let (Some(id), Some(snapshot)) = (self.local_id.clone(), local) {
            players.insert(id, snapshot);
        }
        for proxy in proxies.iter() {
            players.insert(
                proxy.peer.clone(),
                PlayerSnapshot {
                    position: proxy.target_position,
                    rotation: proxy.target_yaw,
                    animation: proxy.animation.clone(),
                    model_id: proxy.model_id.clone(),
                },
            );
        }
        self.send_all(&Message::GameState { players, enemies });
        true
    }

    /// Host only: starts the game for everyone.
    pub fn broadcast_start(&mut self) -> Result<(), NetError> {
        if self.state != ConnState::Hosting {
            return Err(NetError::NotHost);
        }
        tracing::info!(peers = self.sessions.len(), "starting game");
        self.game_running = true;
        self.send_all(&Message::StartGame);
        Ok(())
    }

    /// Member only: sends the local player's transform sample upstream.
    pub fn send_position(&mut self, snapshot: PlayerSnapshot) {
        if self.state != ConnState::Connected {
            return;
        }
        self.send_all(&Message::PlayerPosition(snapshot));
    }

    /// Member only: sends the latest input frame upstream.
    pub fn send_input(&mut self, input: InputFrame) {
        if self.state != ConnState::Connected {
            return;
        }
        self.send_all(&Message::PlayerInput { input });
    }

    /// Announces a skill cast. A member sends it to the host for relay;
    /// the host broadcasts straight to every member.
    pub fn cast_skill(
        &mut self,
        skill_name: &str,
        variant: u32,
        target_enemy_id: Option<String>,
    ) {
        let Some(local) = self.local_id.clone() else {
            return;
        };
        let message = Message::SkillCast {
            skill_name: skill_name.to_string(),
            player_id: local,
            variant,
            target_enemy_id,
        };
        match self.state {
            ConnState::Hosting | ConnState::Connected => self.send_all(&message),
            _ => {}
        }
    }

    /// Announces damage dealt to an enemy. A member reports to the host;
    /// the host broadcasts to members so their copies can react.
    pub fn report_damage(&mut self, amount: f32, enemy_id: Option<String>) {
        match self.state {
            ConnState::Hosting | ConnState::Connected => {
                self.send_all(&Message::PlayerDamage { amount, enemy_id });
            }
            _ => {}
        }
    }

    /// Host only: splits `amount` of experience across every player and
    /// returns the host's own share.
    pub fn share_experience(&mut self, amount: f32, enemy_id: &str) -> Result<f32, NetError> {
        if self.state != ConnState::Hosting {
            return Err(NetError::NotHost);
        }
        let player_count = (self.sessions.len() + 1) as u32;
        self.send_all(&Message::ShareExperience {
            amount,
            enemy_id: enemy_id.to_string(),
            player_count,
        });
        Ok(amount / player_count as f32)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Hands back everything that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        std::mem::take(&mut self.events).into()
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn is_host(&self) -> bool {
        self.state == ConnState::Hosting
    }

    /// Whether a session (either role) is currently live.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ConnState::Hosting | ConnState::Connected)
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    /// The local player's assigned color, once known.
    pub fn local_color(&self) -> Option<PlayerColor> {
        self.local_color
    }

    pub fn peer_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn game_running(&self) -> bool {
        self.game_running
    }

    /// Host only: the most recent input frame received from `peer`.
    pub fn latest_input(&self, peer: &PeerId) -> Option<&InputFrame> {
        self.inputs.get(peer)
    }

    // ---------------------------------------------------------------------
    // Send helpers
    // ---------------------------------------------------------------------

    /// Encodes a message, logging and swallowing encoder failures: a
    /// malformed outbound message must never take the session down.
    fn encode(&self, message: &Message) -> Option<Vec<u8>> {
        match self.codec.encode(message) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::error!(kind = message.kind(), error = %err, "failed to encode message");
                None
            }
        }
    }

    fn send_to(&self, session: &S, message: &Message) {
        if let Some(bytes) = self.encode(message) {
            session.send(&bytes);
        }
    }

    fn send_all(&self, message: &Message) {
        if let Some(bytes) = self.encode(message) {
            for session in self.sessions.values() {
                session.send(&bytes);
            }
        }
    }

    fn send_except(&self, skip: &PeerId, message: &Message) {
        if let Some(bytes) = self.encode(message) {
            for (peer, session) in &self.sessions {
                if peer != skip {
                    session.send(&bytes);
                }
            }
        }
    }
}
