//! Proxy storage and the per-frame reconciliation tick.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use runeveil_protocol::PlayerColor;
use runeveil_transport::PeerId;

/// How long a proxy's hit feedback stays lit, in seconds.
const HIT_FLASH_SECS: f32 = 0.25;

/// Color used for a proxy observed before its color assignment arrived.
/// Replaced as soon as a `playerJoined` or `playerColors` message lands.
const UNASSIGNED_COLOR: PlayerColor = PlayerColor(0x9e9e9e);

/// The local stand-in for one remote player.
///
/// `position`/`yaw` are what the renderer should draw this frame;
/// `target_position`/`target_yaw` are the last received sample.
#[derive(Debug, Clone)]
pub struct RemotePlayerProxy {
    /// Identity of the remote player this proxy mirrors.
    pub peer: PeerId,
    /// Assigned display color.
    pub color: PlayerColor,
    /// Smoothed, render-facing position.
    pub position: [f32; 3],
    /// Smoothed, render-facing yaw in radians.
    pub yaw: f32,
    /// Last received position sample.
    pub target_position: [f32; 3],
    /// Last received yaw sample.
    pub target_yaw: f32,
    /// Name of the animation clip the remote player is in.
    pub animation: String,
    /// Equipped character model, when known.
    pub model_id: Option<String>,
    /// Remaining hit-feedback time in seconds; zero when idle.
    pub hit_flash: f32,
}

impl RemotePlayerProxy {
    fn new(peer: PeerId, color: PlayerColor) -> Self {
        Self {
            peer,
            color,
            position: [0.0; 3],
            yaw: 0.0,
            target_position: [0.0; 3],
            target_yaw: 0.0,
            animation: "idle".to_string(),
            model_id: None,
            hit_flash: 0.0,
        }
    }
}

/// All remote player proxies for one session.
pub struct ProxySet {
    proxies: HashMap<PeerId, RemotePlayerProxy>,
    /// Exponential smoothing rate (per second). Higher snaps harder.
    smoothing: f32,
}

impl Default for ProxySet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxySet {
    /// Creates an empty set with the default smoothing rate.
    pub fn new() -> Self {
        Self {
            proxies: HashMap::new(),
            smoothing: 12.0,
        }
    }

    /// Creates a proxy for `peer`, keeping the existing one if present.
    ///
    /// Pass `None` for the color when the assignment has not arrived yet.
    pub fn create(&mut self, peer: &PeerId, color: Option<PlayerColor>) {
        if let Some(existing) = self.proxies.get_mut(peer) {
            if let Some(color) = color {
                existing.color = color;
            }
            return;
        }
        tracing::debug!(%peer, "remote player proxy created");
        self.proxies.insert(
            peer.clone(),
            RemotePlayerProxy::new(peer.clone(), color.unwrap_or(UNASSIGNED_COLOR)),
        );
    }

    /// Applies a received transform sample. Creates the proxy on first
    /// use; a brand-new proxy snaps straight to the sample instead of
    /// easing in from the origin.
    pub fn update(
        &mut self,
        peer: &PeerId,
        position: [f32; 3],
        yaw: f32,
        animation: &str,
        model_id: Option<&str>,
    ) {
        let created = !self.proxies.contains_key(peer);
        let proxy = self.proxies.entry(peer.clone()).or_insert_with(|| {
            tracing::debug!(%peer, "remote player proxy created");
            RemotePlayerProxy::new(peer.clone(), UNASSIGNED_COLOR)
        });

        proxy.target_position = position;
        proxy.target_yaw = yaw;
        if created {
            proxy.position = position;
            proxy.yaw = yaw;
        }
        if proxy.animation != animation {
            proxy.animation = animation.to_string();
        }
        if let Some(model) = model_id {
            if proxy.model_id.as_deref() != Some(model) {
                proxy.model_id = Some(model.to_string());
            }
        }
    }

    /// Overrides a proxy's animation clip, e.g. for a skill cast. The
    /// next transform sample takes over again.
    pub fn set_animation(&mut self, peer: &PeerId, animation: &str) {
        if let Some(proxy) = self.proxies.get_mut(peer) {
            proxy.animation = animation.to_string();
        }
    }

    /// Updates a proxy's assigned color.
    pub fn set_color(&mut self, peer: &PeerId, color: PlayerColor) {
        if let Some(proxy) = self.proxies.get_mut(peer) {
            proxy.color = color;
        }
    }

    /// Lights the hit-feedback timer on `peer`'s proxy.
    pub fn apply_damage(&mut self, peer: &PeerId, amount: f32) {
        if let Some(proxy) = self.proxies.get_mut(peer) {
            proxy.hit_flash = HIT_FLASH_SECS;
            tracing::trace!(%peer, amount, "proxy hit feedback");
        }
    }

    /// Removes `peer`'s proxy. Returns whether one existed; removing an
    /// already-absent proxy is a no-op, keeping disconnect idempotent.
    pub fn remove(&mut self, peer: &PeerId) -> bool {
        let removed = self.proxies.remove(peer).is_some();
        if removed {
            tracing::debug!(%peer, "remote player proxy removed");
        }
        removed
    }

    /// Drops every proxy. Used when the session itself ends.
    pub fn remove_all(&mut self) {
        if !self.proxies.is_empty() {
            tracing::debug!(count = self.proxies.len(), "removing all proxies");
            self.proxies.clear();
        }
    }

    /// Advances smoothing and timers by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let t = (dt * self.smoothing).clamp(0.0, 1.0);
        for proxy in self.proxies.values_mut() {
            for axis in 0..3 {
                proxy.position[axis] +=
                    (proxy.target_position[axis] - proxy.position[axis]) * t;
            }
            // Shortest-arc yaw easing so 350° → 10° doesn't spin the
            // long way round.
            let mut delta = proxy.target_yaw - proxy.yaw;
            delta = (delta + PI).rem_euclid(TAU) - PI;
            proxy.yaw += delta * t;

            proxy.hit_flash = (proxy.hit_flash - dt).max(0.0);
        }
    }

    /// Looks up one proxy.
    pub fn get(&self, peer: &PeerId) -> Option<&RemotePlayerProxy> {
        self.proxies.get(peer)
    }

    /// Whether a proxy exists for `peer`.
    pub fn contains(&self, peer: &PeerId) -> bool {
        self.proxies.contains_key(peer)
    }

    /// Iterates over all proxies.
    pub fn iter(&self) -> impl Iterator<Item = &RemotePlayerProxy> {
        self.proxies.values()
    }

    /// The set of peers with proxies.
    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.proxies.keys()
    }

    /// Number of proxies.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(s: &str) -> PeerId {
        PeerId::from(s)
    }

    #[test]
    fn test_update_creates_proxy_on_first_use() {
        let mut set = ProxySet::new();

        set.update(&peer("m1"), [1.0, 0.0, 2.0], 0.5, "walk", Some("knight"));

        let proxy = set.get(&peer("m1")).expect("proxy should exist");
        assert_eq!(proxy.target_position, [1.0, 0.0, 2.0]);
        assert_eq!(proxy.target_yaw, 0.5);
        assert_eq!(proxy.animation, "walk");
        assert_eq!(proxy.model_id.as_deref(), Some("knight"));
    }

    #[test]
    fn test_update_first_sample_snaps_instead_of_easing() {
        // A freshly observed player should appear where they are,
        // not glide in from the world origin.
        let mut set = ProxySet::new();

        set.update(&peer("m1"), [50.0, 0.0, -20.0], 1.0, "idle", None);

        let proxy = set.get(&peer("m1")).unwrap();
        assert_eq!(proxy.position, [50.0, 0.0, -20.0]);
        assert_eq!(proxy.yaw, 1.0);
    }

    #[test]
    fn test_update_last_write_wins() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [1.0, 0.0, 0.0], 0.1, "walk", None);
        set.update(&peer("m1"), [2.0, 0.0, 0.0], 0.2, "run", None);
        set.update(&peer("m1"), [3.0, 0.0, 0.0], 0.3, "idle", None);

        let proxy = set.get(&peer("m1")).unwrap();
        assert_eq!(proxy.target_position, [3.0, 0.0, 0.0]);
        assert_eq!(proxy.target_yaw, 0.3);
        assert_eq!(proxy.animation, "idle");
    }

    #[test]
    fn test_create_assigns_color_and_keeps_existing_state() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [5.0, 0.0, 5.0], 0.0, "walk", None);

        // A later create (e.g. from a playerJoined message) must not
        // reset the transform, only fill in the color.
        set.create(&peer("m1"), Some(PlayerColor(0xff0000)));

        let proxy = set.get(&peer("m1")).unwrap();
        assert_eq!(proxy.color, PlayerColor(0xff0000));
        assert_eq!(proxy.target_position, [5.0, 0.0, 5.0]);
    }

    #[test]
    fn test_tick_eases_position_toward_target() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [0.0; 3], 0.0, "idle", None);
        set.update(&peer("m1"), [10.0, 0.0, 0.0], 0.0, "idle", None);

        let before = set.get(&peer("m1")).unwrap().position[0];
        set.tick(1.0 / 60.0);
        let after = set.get(&peer("m1")).unwrap().position[0];

        assert!(after > before, "should move toward the target");
        assert!(after < 10.0, "should not overshoot in one small step");

        // Given enough ticks it converges.
        for _ in 0..300 {
            set.tick(1.0 / 60.0);
        }
        let settled = set.get(&peer("m1")).unwrap().position[0];
        assert!((settled - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_tick_yaw_takes_shortest_arc() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [0.0; 3], 0.0, "idle", None);
        // Force the rendered yaw near +PI, then target just past -PI.
        set.update(&peer("m1"), [0.0; 3], 3.0, "idle", None);
        for _ in 0..300 {
            set.tick(1.0 / 60.0);
        }
        set.update(&peer("m1"), [0.0; 3], -3.0, "idle", None);
        set.tick(1.0 / 60.0);

        let proxy = set.get(&peer("m1")).unwrap();
        // Shortest arc from 3.0 to -3.0 goes *up* through PI, so the
        // first step must increase yaw, not swing down through zero.
        assert!(proxy.yaw > 3.0);
    }

    #[test]
    fn test_apply_damage_lights_and_decays_hit_flash() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [0.0; 3], 0.0, "idle", None);

        set.apply_damage(&peer("m1"), 12.0);
        assert!(set.get(&peer("m1")).unwrap().hit_flash > 0.0);

        for _ in 0..60 {
            set.tick(1.0 / 60.0);
        }
        assert_eq!(set.get(&peer("m1")).unwrap().hit_flash, 0.0);
    }

    #[test]
    fn test_apply_damage_unknown_peer_is_noop() {
        let mut set = ProxySet::new();
        set.apply_damage(&peer("ghost"), 5.0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [0.0; 3], 0.0, "idle", None);

        assert!(set.remove(&peer("m1")));
        assert!(!set.remove(&peer("m1")));
        assert!(set.get(&peer("m1")).is_none());
    }

    #[test]
    fn test_remove_all_clears_every_proxy() {
        let mut set = ProxySet::new();
        set.update(&peer("m1"), [0.0; 3], 0.0, "idle", None);
        set.update(&peer("m2"), [0.0; 3], 0.0, "idle", None);
        assert_eq!(set.len(), 2);

        set.remove_all();

        assert!(set.is_empty());
    }
}
