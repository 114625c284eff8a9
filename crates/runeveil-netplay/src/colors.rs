//! Player color assignment.
//!
//! The host owns the table; members only mirror it from `playerColors`
//! messages. Assignment is deterministic while palette entries remain:
//! the first unused entry, in palette order, so the host always gets
//! the first color and reconnecting players fill the earliest gap.

use std::collections::HashMap;

use rand::Rng;
use runeveil_protocol::PlayerColor;
use runeveil_transport::PeerId;

/// Tracks which player holds which palette color.
#[derive(Debug, Clone)]
pub struct ColorTable {
    palette: Vec<PlayerColor>,
    assigned: HashMap<PeerId, PlayerColor>,
}

impl ColorTable {
    pub fn new(palette: Vec<PlayerColor>) -> Self {
        Self {
            palette,
            assigned: HashMap::new(),
        }
    }

    /// Assigns a color to `peer` and returns it.
    ///
    /// Picks the first palette entry no current player holds. When the
    /// palette is exhausted, reuses a random entry rather than failing,
    /// so an oversized lobby still gets everyone colored.
    pub fn assign(&mut self, peer: &PeerId) -> PlayerColor {
        if let Some(existing) = self.assigned.get(peer) {
            return *existing;
        }
        if self.palette.is_empty() {
            tracing::warn!("empty color palette, assigning white");
            let color = PlayerColor(0xffffff);
            self.assigned.insert(peer.clone(), color);
            return color;
        }
        let color = self
            .palette
            .iter()
            .find(|c| !self.assigned.values().any(|used| used == *c))
            .copied()
            .unwrap_or_else(|| {
                let idx = rand::rng().random_range(0..self.palette.len());
                tracing::warn!(
                    players = self.assigned.len(),
                    "color palette exhausted, reusing a random entry"
                );
                self.palette[idx]
            });
        self.assigned.insert(peer.clone(), color);
        color
    }

    /// Returns `peer`'s color to the pool.
    pub fn release(&mut self, peer: &PeerId) -> Option<PlayerColor> {
        self.assigned.remove(peer)
    }

    /// Looks up `peer`'s current color.
    pub fn get(&self, peer: &PeerId) -> Option<PlayerColor> {
        self.assigned.get(peer).copied()
    }

    /// The full assignment map, for a `playerColors` broadcast.
    pub fn snapshot(&self) -> HashMap<PeerId, PlayerColor> {
        self.assigned.clone()
    }

    /// Replaces the table with a received assignment map (member side).
    pub fn apply(&mut self, colors: HashMap<PeerId, PlayerColor>) {
        self.assigned = colors;
    }

    /// Forgets every assignment.
    pub fn clear(&mut self) {
        self.assigned.clear();
    }
}

// =========================================================================
// Tests
// =========================================================================
