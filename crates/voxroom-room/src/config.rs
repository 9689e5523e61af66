//! Room configuration.

use serde::{Deserialize, Serialize};
use voxroom_service::AttributeSetConfig;

/// Settings applied to rooms created by this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Number of speaker seats in a new room. Fixed for the room's lifetime.
    pub seat_num: u32,

    /// Whether attributes this user publishes are removed when they leave.
    pub delete_attributes_on_owner_left: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            seat_num: 8,
            delete_attributes_on_owner_left: true,
        }
    }
}

impl RoomConfig {
    /// Largest supported seat table.
    pub const MAX_SEAT_NUM: u32 = 64;

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// `seat_num` of 0 falls back to the default; anything above
    /// [`Self::MAX_SEAT_NUM`] is clamped.
    pub fn validated(mut self) -> Self {
        if self.seat_num == 0 {
            tracing::warn!("seat_num is 0, using default");
            self.seat_num = Self::default().seat_num;
        } else if self.seat_num > Self::MAX_SEAT_NUM {
            tracing::warn!(
                seat_num = self.seat_num,
                max = Self::MAX_SEAT_NUM,
                "seat_num exceeds maximum, clamping"
            );
            self.seat_num = Self::MAX_SEAT_NUM;
        }
        self
    }

    /// Flags for publishing room state through the signaling service.
    ///
    /// Local publishes never force-overwrite another member's keys.
    pub fn attribute_set_config(&self) -> AttributeSetConfig {
        AttributeSetConfig {
            delete_after_owner_left: self.delete_attributes_on_owner_left,
            force: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.seat_num, 8);
        assert!(config.delete_attributes_on_owner_left);
    }

    #[test]
    fn test_validated_fixes_zero_and_clamps() {
        let zero = RoomConfig { seat_num: 0, ..RoomConfig::default() }.validated();
        assert_eq!(zero.seat_num, 8);

        let huge = RoomConfig { seat_num: 1000, ..RoomConfig::default() }.validated();
        assert_eq!(huge.seat_num, RoomConfig::MAX_SEAT_NUM);
    }

    #[test]
    fn test_attribute_set_config_never_forces() {
        let cfg = RoomConfig::default().attribute_set_config();
        assert!(cfg.delete_after_owner_left);
        assert!(!cfg.force);
    }

    #[test]
    fn test_room_config_deserializes_from_json() {
        let config: RoomConfig =
            serde_json::from_str(r#"{"seat_num":4,"delete_attributes_on_owner_left":false}"#)
                .unwrap();
        assert_eq!(config.seat_num, 4);
        assert!(!config.attribute_set_config().delete_after_owner_left);
    }
}
