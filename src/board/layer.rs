//! Board layer and stackup model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A board layer identifier. Inner copper indexing is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    TopCopper,
    InnerCopper(u8),
    BotCopper,
    TopStopMask,
    BotStopMask,
    TopSolderPaste,
    BotSolderPaste,
    TopSilkscreen,
    BotSilkscreen,
    TopCourtyard,
    BotCourtyard,
    TopDocumentation,
    BotDocumentation,
    TopPlacement,
    BotPlacement,
    BoardOutlines,
}

impl Layer {
    pub fn is_copper(self) -> bool {
        matches!(
            self,
            Layer::TopCopper | Layer::InnerCopper(_) | Layer::BotCopper
        )
    }

    pub fn is_stop_mask(self) -> bool {
        matches!(self, Layer::TopStopMask | Layer::BotStopMask)
    }

    pub fn is_inner_copper(self, index: u8) -> bool {
        self == Layer::InnerCopper(index)
    }

    /// The 1-based inner copper layer, `None` when the stackup has fewer
    /// inner layers
    pub fn inner_copper(index: u8, inner_count: u8) -> Option<Layer> {
        if index >= 1 && index <= inner_count {
            Some(Layer::InnerCopper(index))
        } else {
            None
        }
    }

    /// Top and bottom swap under mirroring; inner copper and the board
    /// outline map to themselves
    pub fn mirrored(self) -> Layer {
        match self {
            Layer::TopCopper => Layer::BotCopper,
            Layer::BotCopper => Layer::TopCopper,
            Layer::TopStopMask => Layer::BotStopMask,
            Layer::BotStopMask => Layer::TopStopMask,
            Layer::TopSolderPaste => Layer::BotSolderPaste,
            Layer::BotSolderPaste => Layer::TopSolderPaste,
            Layer::TopSilkscreen => Layer::BotSilkscreen,
            Layer::BotSilkscreen => Layer::TopSilkscreen,
            Layer::TopCourtyard => Layer::BotCourtyard,
            Layer::BotCourtyard => Layer::TopCourtyard,
            Layer::TopDocumentation => Layer::BotDocumentation,
            Layer::BotDocumentation => Layer::TopDocumentation,
            Layer::TopPlacement => Layer::BotPlacement,
            Layer::BotPlacement => Layer::TopPlacement,
            other => other,
        }
    }

    /// Stable identifier used in approval keys and reports
    pub fn id(self) -> String {
        match self {
            Layer::TopCopper => "top_cu".into(),
            Layer::InnerCopper(i) => format!("in{}_cu", i),
            Layer::BotCopper => "bot_cu".into(),
            Layer::TopStopMask => "top_stop_mask".into(),
            Layer::BotStopMask => "bot_stop_mask".into(),
            Layer::TopSolderPaste => "top_solder_paste".into(),
            Layer::BotSolderPaste => "bot_solder_paste".into(),
            Layer::TopSilkscreen => "top_legend".into(),
            Layer::BotSilkscreen => "bot_legend".into(),
            Layer::TopCourtyard => "top_courtyard".into(),
            Layer::BotCourtyard => "bot_courtyard".into(),
            Layer::TopDocumentation => "top_documentation".into(),
            Layer::BotDocumentation => "bot_documentation".into(),
            Layer::TopPlacement => "top_placement".into(),
            Layer::BotPlacement => "bot_placement".into(),
            Layer::BoardOutlines => "brd_outlines".into(),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copper_predicates() {
        assert!(Layer::TopCopper.is_copper());
        assert!(Layer::InnerCopper(3).is_copper());
        assert!(!Layer::TopStopMask.is_copper());
        assert!(Layer::BotStopMask.is_stop_mask());
        assert!(Layer::InnerCopper(2).is_inner_copper(2));
        assert!(!Layer::InnerCopper(2).is_inner_copper(1));
    }

    #[test]
    fn test_inner_copper_bounds() {
        assert_eq!(Layer::inner_copper(1, 2), Some(Layer::InnerCopper(1)));
        assert_eq!(Layer::inner_copper(2, 2), Some(Layer::InnerCopper(2)));
        assert_eq!(Layer::inner_copper(3, 2), None);
        assert_eq!(Layer::inner_copper(0, 2), None);
    }

    #[test]
    fn test_mirroring() {
        assert_eq!(Layer::TopCopper.mirrored(), Layer::BotCopper);
        assert_eq!(Layer::BotCourtyard.mirrored(), Layer::TopCourtyard);
        assert_eq!(Layer::BoardOutlines.mirrored(), Layer::BoardOutlines);
        assert_eq!(Layer::InnerCopper(1).mirrored(), Layer::InnerCopper(1));
        for layer in [Layer::TopCopper, Layer::TopStopMask, Layer::TopPlacement] {
            assert_eq!(layer.mirrored().mirrored(), layer);
        }
    }

    #[test]
    fn test_ids_unique() {
        let layers = [
            Layer::TopCopper,
            Layer::InnerCopper(1),
            Layer::BotCopper,
            Layer::TopStopMask,
            Layer::BoardOutlines,
        ];
        let ids: std::collections::HashSet<String> = layers.iter().map(|l| l.id()).collect();
        assert_eq!(ids.len(), layers.len());
    }
}
