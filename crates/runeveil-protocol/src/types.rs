//! The wire message catalogue.
//!
//! Every application message between peers is one of the twelve kinds
//! below. On the wire, a message is the pair `[tag, {fields}]`: a small
//! integer tag identifying the kind, followed by a map of that kind's
//! fields under their camelCase wire names. The tag table is a frozen
//! contract shared with deployed clients; renumbering a kind is a
//! protocol break, which is why [`Message`] carries hand-written serde
//! impls instead of a derive that could drift.
//!
//! The rotation in position payloads is yaw only. Pitch and roll are
//! never synchronized, so the wire schema stores a single scalar instead
//! of a full three-axis rotation, a deliberate lossy reduction.

use std::collections::HashMap;
use std::fmt;

use runeveil_transport::PeerId;
use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Wire tags
// ---------------------------------------------------------------------------

/// Binary tags, one per message kind. Frozen; see the module docs.
mod tag {
    pub const WELCOME: u8 = 0;
    pub const GAME_STATE: u8 = 1;
    pub const START_GAME: u8 = 2;
    pub const PLAYER_JOINED: u8 = 3;
    pub const PLAYER_LEFT: u8 = 4;
    pub const PLAYER_COLORS: u8 = 5;
    pub const SKILL_CAST: u8 = 6;
    pub const PLAYER_INPUT: u8 = 7;
    pub const PLAYER_POSITION: u8 = 8;
    pub const HOST_LEFT: u8 = 9;
    pub const PLAYER_DAMAGE: u8 = 10;
    pub const SHARE_EXPERIENCE: u8 = 11;
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// A player's assigned display color, packed 0xRRGGBB.
///
/// Serializes as the bare integer (`#[serde(transparent)]`), matching the
/// wire contract where colors are plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerColor(pub u32);

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// One player's synchronized transform: position, yaw, animation, and the
/// equipped character model. This is both the `playerPosition` payload and
/// the per-player entry inside a `gameState` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// World position as a compact 3-element array.
    pub position: [f32; 3],
    /// Yaw in radians. The only synchronized rotation axis.
    pub rotation: f32,
    /// Name of the currently playing animation clip.
    pub animation: String,
    /// Equipped character model id. Omitted on the wire when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

/// One frame of a member's raw input, forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFrame {
    pub move_x: f32,
    pub move_z: f32,
    pub jump: bool,
    pub attack: bool,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single application message. Closed set; the dispatcher matches
/// exhaustively per role, so adding a kind is a compile-checked change.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Host → new member: greeting text shown as a notification.
    Welcome { message: String },
    /// Host → members: the authoritative full snapshot. `players` maps
    /// every known peer (including the host) to its transform; `enemies`
    /// is the enemy subsystem's opaque blob.
    GameState {
        players: HashMap<PeerId, PlayerSnapshot>,
        enemies: Vec<u8>,
    },
    /// Host → members: enter gameplay now.
    StartGame,
    /// Host → members: a new peer joined and this is its color.
    PlayerJoined {
        player_id: PeerId,
        player_color: PlayerColor,
    },
    /// Host → members: a peer left. A member receiving its *own* id here
    /// has been kicked.
    PlayerLeft { player_id: PeerId },
    /// Host → one member: the full color table, sent on join so every
    /// peer shares the host's view.
    PlayerColors {
        colors: HashMap<PeerId, PlayerColor>,
    },
    /// Member → host, then relayed host → other members. The host stamps
    /// `player_id` with the true originator before relaying.
    SkillCast {
        skill_name: String,
        player_id: PeerId,
        variant: u32,
        target_enemy_id: Option<String>,
    },
    /// Member → host: latest raw input frame.
    PlayerInput { input: InputFrame },
    /// Member → host: the member's own transform.
    PlayerPosition(PlayerSnapshot),
    /// Host → members: the host is leaving; the session is over.
    HostLeft,
    /// Member → host, relayed to other members: the sender dealt
    /// `amount` damage to enemy `enemy_id`.
    PlayerDamage { amount: f32, enemy_id: Option<String> },
    /// Host → members: split `amount` experience among `player_count`
    /// players for the kill of `enemy_id`.
    ShareExperience {
        amount: f32,
        enemy_id: String,
        player_count: u32,
    },
}

impl Message {
    /// The kind's binary wire tag.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Welcome { .. } => tag::WELCOME,
            Self::GameState { .. } => tag::GAME_STATE,
            Self::StartGame => tag::START_GAME,
            Self::PlayerJoined { .. } => tag::PLAYER_JOINED,
            Self::PlayerLeft { .. } => tag::PLAYER_LEFT,
            Self::PlayerColors { .. } => tag::PLAYER_COLORS,
            Self::SkillCast { .. } => tag::SKILL_CAST,
            Self::PlayerInput { .. } => tag::PLAYER_INPUT,
            Self::PlayerPosition(_) => tag::PLAYER_POSITION,
            Self::HostLeft => tag::HOST_LEFT,
            Self::PlayerDamage { .. } => tag::PLAYER_DAMAGE,
            Self::ShareExperience { .. } => tag::SHARE_EXPERIENCE,
        }
    }

    /// The kind's textual name, used in logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::GameState { .. } => "gameState",
            Self::StartGame => "startGame",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::PlayerColors { .. } => "playerColors",
            Self::SkillCast { .. } => "skillCast",
            Self::PlayerInput { .. } => "playerInput",
            Self::PlayerPosition(_) => "playerPosition",
            Self::HostLeft => "hostLeft",
            Self::PlayerDamage { .. } => "playerDamage",
            Self::ShareExperience { .. } => "shareExperience",
        }
    }
}

// ---------------------------------------------------------------------------
// Field schemas
// ---------------------------------------------------------------------------

// One struct per kind, holding exactly the fields of that kind's wire
// schema under their camelCase names. The manual Serialize/Deserialize
// impls below project Message variants through these, so anything not in
// the schema cannot leak onto the wire.

#[derive(Serialize, Deserialize)]
struct WelcomeFields {
    message: String,
}

#[derive(Serialize, Deserialize)]
struct GameStateFields {
    players: HashMap<PeerId, PlayerSnapshot>,
    enemies: Vec<u8>,
}

/// Kinds with an empty schema ship an empty map as their fields element.
#[derive(Serialize, Deserialize)]
struct EmptyFields {}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerJoinedFields {
    player_id: PeerId,
    player_color: PlayerColor,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerLeftFields {
    player_id: PeerId,
}

#[derive(Serialize, Deserialize)]
struct PlayerColorsFields {
    colors: HashMap<PeerId, PlayerColor>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkillCastFields {
    skill_name: String,
    player_id: PeerId,
    variant: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_enemy_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PlayerInputFields {
    input: InputFrame,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerDamageFields {
    amount: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enemy_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareExperienceFields {
    amount: f32,
    enemy_id: String,
    player_count: u32,
}

// ---------------------------------------------------------------------------
// Serde impls: [tag, {fields}]
// ---------------------------------------------------------------------------

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.tag())?;
        match self {
            Self::Welcome { message } => pair.serialize_element(&WelcomeFields {
                message: message.clone(),
            })?,
            Self::GameState { players, enemies } => {
                pair.serialize_element(&GameStateFields {
                    players: players.clone(),
                    enemies: enemies.clone(),
                })?
            }
            Self::StartGame | Self::HostLeft => {
                pair.serialize_element(&EmptyFields {})?
            }
            Self::PlayerJoined {
                player_id,
                player_color,
            } => pair.serialize_element(&PlayerJoinedFields {
                player_id: player_id.clone(),
                player_color: *player_color,
            })?,
            Self::PlayerLeft { player_id } => {
                pair.serialize_element(&PlayerLeftFields {
                    player_id: player_id.clone(),
                })?
            }
            Self::PlayerColors { colors } => {
                pair.serialize_element(&PlayerColorsFields {
                    colors: colors.clone(),
                })?
            }
            Self::SkillCast {
                skill_name,
                player_id,
                variant,
                target_enemy_id,
            } => pair.serialize_element(&SkillCastFields {
                skill_name: skill_name.clone(),
                player_id: player_id.clone(),
                variant: *variant,
                target_enemy_id: target_enemy_id.clone(),
            })?,
            Self::PlayerInput { input } => {
                pair.serialize_element(&PlayerInputFields { input: *input })?
            }
            Self::PlayerPosition(snapshot) => pair.serialize_element(snapshot)?,
            Self::PlayerDamage { amount, enemy_id } => {
                pair.serialize_element(&PlayerDamageFields {
                    amount: *amount,
                    enemy_id: enemy_id.clone(),
                })?
            }
            Self::ShareExperience {
                amount,
                enemy_id,
                player_count,
            } => pair.serialize_element(&ShareExperienceFields {
                amount: *amount,
                enemy_id: enemy_id.clone(),
                player_count: *player_count,
            })?,
        }
        pair.end()
    }
}

/// Pulls the fields element out of the pair, failing if it is absent.
fn fields<'de, A, F>(seq: &mut A) -> Result<F, A::Error>
where
    A: SeqAccess<'de>,
    F: Deserialize<'de>,
{
    seq.next_element::<F>()?
        .ok_or_else(|| A::Error::custom("message pair is missing its fields"))
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairVisitor;

        impl<'de> Visitor<'de> for PairVisitor {
            type Value = Message;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a [tag, fields] message pair")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Message, A::Error> {
                let msg_tag: u8 = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::custom("message pair is missing its tag"))?;

                Ok(match msg_tag {
                    tag::WELCOME => {
                        let f: WelcomeFields = fields(&mut seq)?;
                        Message::Welcome { message: f.message }
                    }
                    tag::GAME_STATE => {
                        let f: GameStateFields = fields(&mut seq)?;
                        Message::GameState {
                            players: f.players,
                            enemies: f.enemies,
                        }
                    }
                    tag::START_GAME => {
                        let _: EmptyFields = fields(&mut seq)?;
                        Message::StartGame
                    }
                    tag::PLAYER_JOINED => {
                        let f: PlayerJoinedFields = fields(&mut seq)?;
                        Message::PlayerJoined {
                            player_id: f.player_id,
                            player_color: f.player_color,
                        }
                    }
                    tag::PLAYER_LEFT => {
                        let f: PlayerLeftFields = fields(&mut seq)?;
                        Message::PlayerLeft {
                            player_id: f.player_id,
                        }
                    }
                    tag::PLAYER_COLORS => {
                        let f: PlayerColorsFields = fields(&mut seq)?;
                        Message::PlayerColors { colors: f.colors }
                    }
                    tag::SKILL_CAST => {
                        let f: SkillCastFields = fields(&mut seq)?;
                        Message::SkillCast {
                            skill_name: f.skill_name,
                            player_id: f.player_id,
                            variant: f.variant,
                            target_enemy_id: f.target_enemy_id,
                        }
                    }
                    tag::PLAYER_INPUT => {
                        let f: PlayerInputFields = fields(&mut seq)?;
                        Message::PlayerInput { input: f.input }
                    }
                    tag::PLAYER_POSITION => {
                        let snapshot: PlayerSnapshot = fields(&mut seq)?;
                        Message::PlayerPosition(snapshot)
                    }
                    tag::HOST_LEFT => {
                        let _: EmptyFields = fields(&mut seq)?;
                        Message::HostLeft
                    }
                    tag::PLAYER_DAMAGE => {
                        let f: PlayerDamageFields = fields(&mut seq)?;
                        Message::PlayerDamage {
                            amount: f.amount,
                            enemy_id: f.enemy_id,
                        }
                    }
                    tag::SHARE_EXPERIENCE => {
                        let f: ShareExperienceFields = fields(&mut seq)?;
                        Message::ShareExperience {
                            amount: f.amount,
                            enemy_id: f.enemy_id,
                            player_count: f.player_count,
                        }
                    }
                    other => {
                        return Err(A::Error::custom(format!(
                            "unknown message tag {other}"
                        )));
                    }
                })
            }
        }

        deserializer.deserialize_tuple(2, PairVisitor)
    }
}

// =========================================================================
// Tests
// =========================================================================
