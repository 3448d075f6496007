use super::profile::UNSET;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportKind {
    #[default]
    Unknown,
    Pvp,
    Barbarian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    /// Horizontal half of the report paper the side occupies, normalized
    pub fn x_range(&self) -> (f64, f64) {
        match self {
            Side::Attacker => (0.0, 0.5),
            Side::Defender => (0.5, 1.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Side::Attacker => "Attacker",
            Side::Defender => "Defender",
        }
    }
}

/// Canonical commander or NPC boss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommanderEntry {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "default_rarity")]
    pub rarity: String,
    #[serde(default = "default_expertise")]
    pub expertise: String,
}

fn default_rarity() -> String {
    "Legendary".to_string()
}

fn default_expertise() -> String {
    "Mixed".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PveDetails {
    pub damage_received_percentage: f64,
    pub entity_level: i64,
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSide {
    pub governor_name: String,
    pub alliance_tag: String,
    pub is_npc: bool,
    pub primary_commander: Option<CommanderEntry>,
    pub secondary_commander: Option<CommanderEntry>,
    pub total_units: i64,
    pub healed: i64,
    pub dead: i64,
    pub severely_wounded: i64,
    pub slightly_wounded: i64,
    pub remaining: i64,
    pub kill_points: i64,
    pub watchtower_damage: i64,
    pub pve: Option<PveDetails>,
}

impl Default for BattleSide {
    fn default() -> Self {
        Self {
            governor_name: UNSET.to_string(),
            alliance_tag: UNSET.to_string(),
            is_npc: false,
            primary_commander: None,
            secondary_commander: None,
            total_units: 0,
            healed: 0,
            dead: 0,
            severely_wounded: 0,
            slightly_wounded: 0,
            remaining: 0,
            kill_points: 0,
            watchtower_damage: 0,
            pve: None,
        }
    }
}

impl BattleSide {
    /// Left side of the troop equation: everything that entered the fight
    pub fn expected_units(&self) -> i64 {
        self.total_units + self.healed
    }

    /// Right side of the troop equation: every way a unit can leave it
    pub fn accounted_units(&self) -> i64 {
        self.dead + self.severely_wounded + self.slightly_wounded + self.remaining + self.watchtower_damage
    }

    /// Troop arithmetic balances within one unit
    pub fn is_valid(&self) -> bool {
        self.total_units > 0 && (self.expected_units() - self.accounted_units()).abs() <= 1
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BattleReport {
    pub kind: ReportKind,
    pub attacker: BattleSide,
    pub defender: BattleSide,
    pub timestamp: Option<NaiveDate>,
    pub map_coordinates: Option<String>,
}

impl BattleReport {
    pub fn side(&self, side: Side) -> &BattleSide {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Barbarian defenders carry no troop ledger, so only the attacker counts
    pub fn is_mathematically_sound(&self) -> bool {
        self.attacker.is_valid() && (self.kind == ReportKind::Barbarian || self.defender.is_valid())
    }
}
