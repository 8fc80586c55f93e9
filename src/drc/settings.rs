//! Rule check settings
//!
//! All lengths are integer nanometres; a value of zero disables the
//! corresponding check.

use serde::{Deserialize, Serialize};

use crate::geometry::UnsignedLength;

/// Which slot shapes a fabricator accepts, from most to least restrictive
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum AllowedSlots {
    /// only round drills
    None,
    /// straight slots with a single segment
    SingleSegmentStraight,
    /// straight slots with any number of segments
    MultiSegmentStraight,
    /// any slot including curved ones
    #[default]
    Any,
}

/// Parameters of one design rule check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDesignRuleCheckSettings {
    pub min_copper_width: UnsignedLength,
    pub min_copper_copper_clearance: UnsignedLength,
    pub min_copper_board_clearance: UnsignedLength,
    pub min_copper_npth_clearance: UnsignedLength,
    pub min_drill_drill_clearance: UnsignedLength,
    pub min_drill_board_clearance: UnsignedLength,
    pub min_pth_annular_ring: UnsignedLength,
    pub min_npth_drill_diameter: UnsignedLength,
    pub min_pth_drill_diameter: UnsignedLength,
    pub min_npth_slot_width: UnsignedLength,
    pub min_pth_slot_width: UnsignedLength,
    pub allowed_npth_slots: AllowedSlots,
    pub allowed_pth_slots: AllowedSlots,
    pub min_outline_tool_diameter: UnsignedLength,
}

impl Default for BoardDesignRuleCheckSettings {
    fn default() -> Self {
        BoardDesignRuleCheckSettings {
            min_copper_width: UnsignedLength::ZERO,
            min_copper_copper_clearance: UnsignedLength::ZERO,
            min_copper_board_clearance: UnsignedLength::ZERO,
            min_copper_npth_clearance: UnsignedLength::ZERO,
            min_drill_drill_clearance: UnsignedLength::ZERO,
            min_drill_board_clearance: UnsignedLength::ZERO,
            min_pth_annular_ring: UnsignedLength::ZERO,
            min_npth_drill_diameter: UnsignedLength::ZERO,
            min_pth_drill_diameter: UnsignedLength::ZERO,
            min_npth_slot_width: UnsignedLength::ZERO,
            min_pth_slot_width: UnsignedLength::ZERO,
            allowed_npth_slots: AllowedSlots::Any,
            allowed_pth_slots: AllowedSlots::Any,
            min_outline_tool_diameter: UnsignedLength::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_slots_ordering() {
        assert!(AllowedSlots::None < AllowedSlots::SingleSegmentStraight);
        assert!(AllowedSlots::SingleSegmentStraight < AllowedSlots::MultiSegmentStraight);
        assert!(AllowedSlots::MultiSegmentStraight < AllowedSlots::Any);
    }

    #[test]
    fn test_default_disables_every_check() {
        let settings = BoardDesignRuleCheckSettings::default();
        assert!(settings.min_copper_width.is_zero());
        assert!(settings.min_copper_copper_clearance.is_zero());
        assert_eq!(settings.allowed_pth_slots, AllowedSlots::Any);
    }

    #[test]
    fn test_settings_serde_round_trip() {
        let settings = BoardDesignRuleCheckSettings {
            min_copper_width: UnsignedLength::clamped(crate::geometry::Length::new(150_000)),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: BoardDesignRuleCheckSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
