use serde::{Deserialize, Serialize};

/// Placeholder for any text field that could not be read
pub const UNSET: &str = "--";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorProfile {
    pub id: i64,
    pub name: String,
    pub alliance_tag: String,
    pub alliance_name: String,
    pub power: i64,
    pub kill_points: i64,
    pub civilization: String,
    pub successful_read: bool,
}

impl Default for GovernorProfile {
    fn default() -> Self {
        Self {
            id: 0,
            name: UNSET.to_string(),
            alliance_tag: UNSET.to_string(),
            alliance_name: UNSET.to_string(),
            power: 0,
            kill_points: 0,
            civilization: UNSET.to_string(),
            successful_read: false,
        }
    }
}

impl GovernorProfile {
    /// Every field the re-acquisition hunts can fill is present
    pub fn is_complete(&self) -> bool {
        self.id > 0 && self.power > 0 && self.name != UNSET && self.civilization != UNSET
    }
}
