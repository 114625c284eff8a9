//! End-to-end tests for the connection manager over the in-memory
//! transport: a real host and real members exchanging encoded messages.

use runeveil_netplay::{ConnState, ConnectionManager, NetConfig, NetEvent};
use runeveil_protocol::PlayerSnapshot;
use runeveil_replica::ProxySet;
use runeveil_transport::{MemoryHub, MemorySession, MemoryTransport, PeerId, Transport};

struct Side {
    id: PeerId,
    transport: MemoryTransport,
    mgr: ConnectionManager<MemorySession>,
    proxies: ProxySet,
}

impl Side {
    fn pump(&mut self) {
        self.mgr.pump(&mut self.proxies);
    }

    fn events(&mut self) -> Vec<NetEvent> {
        self.mgr.drain_events()
    }

    /// Host-side broadcast, working around the manager and proxy set
    /// living in separate fields of this test harness.
    fn broadcast(&mut self, local: Option<PlayerSnapshot>, enemies: Vec<u8>) -> bool {
        let proxies = std::mem::take(&mut self.proxies);
        let sent = self.mgr.try_broadcast(local, enemies, &proxies);
        self.proxies = proxies;
        sent
    }

    fn kick(&mut self, peer: &PeerId) -> Result<(), runeveil_netplay::NetError> {
        let mut proxies = std::mem::take(&mut self.proxies);
        let result = self.mgr.kick(peer, &mut proxies);
        self.proxies = proxies;
        result
    }

    fn disconnect(&mut self, peer: &PeerId) {
        let mut proxies = std::mem::take(&mut self.proxies);
        self.mgr.disconnect_peer(peer, &mut proxies);
        self.proxies = proxies;
    }
}

async fn host(hub: &MemoryHub) -> Side {
    let mut transport = hub.transport();
    let id = transport.open().await.unwrap();
    transport.listen().unwrap();
    let mut mgr = ConnectionManager::new(NetConfig::default());
    mgr.start_hosting(id.clone());
    Side {
        id,
        transport,
        mgr,
        proxies: ProxySet::new(),
    }
}

async fn join(hub: &MemoryHub, host: &mut Side) -> Side {
    let mut transport = hub.transport();
    let id = transport.open().await.unwrap();
    let session = transport.connect(host.id.as_str()).await.unwrap();
    let mut mgr = ConnectionManager::new(NetConfig::default());
    mgr.start_member(id.clone(), session);

    let inbound = host
        .transport
        .poll_accept()
        .expect("host should see the inbound session");
    let mut proxies = std::mem::take(&mut host.proxies);
    host.mgr.accept_session(inbound, &mut proxies);
    host.proxies = proxies;

    Side {
        id,
        transport,
        mgr,
        proxies: ProxySet::new(),
    }
}

fn snapshot(x: f32) -> PlayerSnapshot {
    PlayerSnapshot {
        position: [x, 0.0, 0.0],
        rotation: 0.0,
        animation: "run".to_string(),
        model_id: None,
    }
}

// =========================================================================
// Join flow
// =========================================================================

#[tokio::test]
async fn test_accept_session_greets_joiner() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;

    m1.pump();
    let events = m1.events();

    assert!(
        events.iter().any(|e| matches!(e, NetEvent::Welcome { .. })),
        "joiner should be welcomed, got {events:?}"
    );
    assert!(m1.mgr.local_color().is_some(), "color table should arrive");
}

#[tokio::test]
async fn test_accept_session_announces_to_existing_members() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    m1.pump();
    m1.events();

    let m2 = join(&hub, &mut h).await;

    m1.pump();
    let events = m1.events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, NetEvent::PeerJoined { peer, .. } if *peer == m2.id)),
        "existing member should learn about the joiner"
    );
    assert!(m1.proxies.contains(&m2.id));
}

#[tokio::test]
async fn test_host_tracks_one_proxy_and_event_per_member() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let m1 = join(&hub, &mut h).await;
    let m2 = join(&hub, &mut h).await;

    assert_eq!(h.mgr.peer_count(), 2);
    assert!(h.proxies.contains(&m1.id));
    assert!(h.proxies.contains(&m2.id));

    let joined: Vec<_> = h
        .events()
        .into_iter()
        .filter(|e| matches!(e, NetEvent::PeerJoined { .. }))
        .collect();
    assert_eq!(joined.len(), 2);
}

#[tokio::test]
async fn test_assigned_colors_differ_across_players() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    let mut m2 = join(&hub, &mut h).await;
    m1.pump();
    m2.pump();

    let host_color = h.mgr.local_color().unwrap();
    let c1 = m1.mgr.local_color().unwrap();
    let c2 = m2.mgr.local_color().unwrap();

    assert_ne!(host_color, c1);
    assert_ne!(host_color, c2);
    assert_ne!(c1, c2);
}

#[tokio::test]
async fn test_late_joiner_receives_start_signal() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    h.mgr.broadcast_start().unwrap();

    let mut late = join(&hub, &mut h).await;
    late.pump();

    assert!(
        late.events()
            .iter()
            .any(|e| matches!(e, NetEvent::GameStarted)),
        "joining a running game should start it immediately"
    );
    assert!(late.mgr.game_running());
}

// =========================================================================
// Position and relay
// =========================================================================

#[tokio::test]
async fn test_member_position_reaches_host_proxy_last_write_wins() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;

    m1.mgr.send_position(snapshot(1.0));
    m1.mgr.send_position(snapshot(7.0));
    h.pump();

    let proxy = h.proxies.get(&m1.id).expect("host should track m1");
    assert_eq!(proxy.target_position, [7.0, 0.0, 0.0]);
    assert_eq!(proxy.animation, "run");
}

#[tokio::test]
async fn test_skill_cast_relayed_to_others_but_not_echoed() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    let mut m2 = join(&hub, &mut h).await;
    for side in [&mut m1, &mut m2] {
        side.pump();
        side.events();
    }

    m1.mgr.cast_skill("fireball", 2, Some("enemy-7".to_string()));
    h.pump();
    m1.pump();
    m2.pump();

    // The host plays the cast on the caster's proxy.
    assert_eq!(h.proxies.get(&m1.id).unwrap().animation, "fireball");
    // The other member sees it under the caster's id.
    assert_eq!(m2.proxies.get(&m1.id).unwrap().animation, "fireball");
    // The caster does not get its own cast back.
    assert!(!m1.proxies.contains(&m1.id));
}

#[tokio::test]
async fn test_member_damage_flashes_proxy_and_surfaces_event() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    h.events();

    m1.mgr.report_damage(25.0, Some("enemy-3".to_string()));
    h.pump();

    assert!(h.proxies.get(&m1.id).unwrap().hit_flash > 0.0);
    let events = h.events();
    assert!(events.iter().any(|e| matches!(
        e,
        NetEvent::DamageDealt { peer: Some(peer), amount, .. }
            if *peer == m1.id && *amount == 25.0
    )));
}

// =========================================================================
// Broadcast
// =========================================================================

#[tokio::test]
async fn test_broadcast_is_throttled() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;

    assert!(h.broadcast(Some(snapshot(1.0)), vec![1]));
    assert!(!h.broadcast(Some(snapshot(2.0)), vec![2]));

    m1.pump();
    let enemy_updates: Vec<_> = m1
        .events()
        .into_iter()
        .filter(|e| matches!(e, NetEvent::EnemyState(_)))
        .collect();
    assert_eq!(
        enemy_updates.len(),
        1,
        "second broadcast inside the window must be dropped"
    );
}

#[tokio::test]
async fn test_broadcast_carries_host_but_skips_receiver() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    let mut m2 = join(&hub, &mut h).await;

    // Host learns m2's position, then broadcasts everything.
    m2.mgr.send_position(snapshot(9.0));
    h.pump();
    h.broadcast(Some(snapshot(4.0)), Vec::new());

    m1.pump();
    assert_eq!(
        m1.proxies.get(&h.id).unwrap().target_position,
        [4.0, 0.0, 0.0]
    );
    assert_eq!(
        m1.proxies.get(&m2.id).unwrap().target_position,
        [9.0, 0.0, 0.0]
    );
    assert!(
        !m1.proxies.contains(&m1.id),
        "a member must not proxy its own player"
    );
}

#[tokio::test]
async fn test_broadcast_without_host_snapshot_omits_host_entry() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;

    h.broadcast(None, Vec::new());

    m1.pump();
    assert!(!m1.proxies.contains(&h.id));
}

// =========================================================================
// Departures
// =========================================================================

#[tokio::test]
async fn test_kick_removes_target_and_notifies_everyone() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    let mut m2 = join(&hub, &mut h).await;
    for side in [&mut m1, &mut m2] {
        side.pump();
        side.events();
    }
    h.events();

    h.kick(&m1.id).unwrap();

    m1.pump();
    assert!(m1.events().iter().any(|e| matches!(e, NetEvent::Kicked)));
    assert_eq!(m1.mgr.state(), ConnState::Disconnected);
    assert!(m1.proxies.is_empty());

    m2.pump();
    assert!(
        m2.events()
            .iter()
            .any(|e| matches!(e, NetEvent::PeerLeft { peer } if *peer == m1.id))
    );
    assert!(!m2.proxies.contains(&m1.id));

    assert_eq!(h.mgr.peer_count(), 1);
    assert!(!h.proxies.contains(&m1.id));
}

#[tokio::test]
async fn test_kick_unknown_peer_fails() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;

    assert!(h.kick(&PeerId::from("nobody")).is_err());
}

#[tokio::test]
async fn test_disconnect_peer_is_idempotent() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let m1 = join(&hub, &mut h).await;
    h.events();

    h.disconnect(&m1.id);
    h.disconnect(&m1.id);

    let left: Vec<_> = h
        .events()
        .into_iter()
        .filter(|e| matches!(e, NetEvent::PeerLeft { .. }))
        .collect();
    assert_eq!(left.len(), 1, "departure must be announced exactly once");
}

#[tokio::test]
async fn test_member_leaving_is_detected_by_host() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    h.events();

    m1.mgr.leave(&mut m1.proxies);
    h.pump();

    assert_eq!(h.mgr.peer_count(), 0);
    assert!(
        h.events()
            .iter()
            .any(|e| matches!(e, NetEvent::PeerLeft { peer } if *peer == m1.id))
    );
}

#[tokio::test]
async fn test_host_leaving_lets_members_continue_solo() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    m1.pump();
    m1.events();

    h.mgr.leave(&mut h.proxies);
    m1.pump();

    assert!(m1.events().iter().any(|e| matches!(e, NetEvent::HostLeft)));
    assert_eq!(m1.mgr.state(), ConnState::Disconnected);
    assert!(m1.proxies.is_empty());
    assert_eq!(h.mgr.state(), ConnState::Idle);
}

// =========================================================================
// Experience
// =========================================================================

#[tokio::test]
async fn test_share_experience_splits_across_all_players() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;
    let mut m2 = join(&hub, &mut h).await;
    for side in [&mut m1, &mut m2] {
        side.pump();
        side.events();
    }

    let host_share = h.mgr.share_experience(90.0, "enemy-1").unwrap();
    assert_eq!(host_share, 30.0);

    for side in [&mut m1, &mut m2] {
        side.pump();
        let events = side.events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, NetEvent::ExperienceShared { amount } if *amount == 30.0)),
            "each member should receive an equal share, got {events:?}"
        );
    }
}

#[tokio::test]
async fn test_share_experience_requires_host_role() {
    let hub = MemoryHub::default();
    let mut h = host(&hub).await;
    let mut m1 = join(&hub, &mut h).await;

    assert!(m1.mgr.share_experience(10.0, "enemy-1").is_err());
    assert!(h.mgr.share_experience(10.0, "enemy-1").is_ok());
}
