//! Cue identifiers for the presentation layer
//!
//! The engine never plays audio itself; it names the cue and the presentation
//! layer maps it to a sound and/or visual effect.

use serde::{Deserialize, Serialize};

use crate::sim::{EffectKind, FunItem};

/// Sound/visual cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Coin collected (by touch or magnet)
    CoinCollect,
    /// Hazard touched the actor
    HazardHit,
    /// Magnet window opened
    MagnetOn,
    /// Growth booster window opened
    GrowthOn,
    /// Fun-mode cosmetic items, one cue each
    HappyCat,
    Nugget,
    SadCat,
    Jiafei,
    Neilong,
}

impl SoundCue {
    /// Cue fired when an effect resolves
    pub fn for_effect(effect: EffectKind) -> Self {
        match effect {
            EffectKind::CollectCoin => SoundCue::CoinCollect,
            EffectKind::HitHazard => SoundCue::HazardHit,
            EffectKind::ActivateMagnet => SoundCue::MagnetOn,
            EffectKind::ActivateGrowth => SoundCue::GrowthOn,
            EffectKind::Cosmetic(item) => Self::for_fun_item(item),
        }
    }

    pub fn for_fun_item(item: FunItem) -> Self {
        match item {
            FunItem::HappyCat => SoundCue::HappyCat,
            FunItem::Nugget => SoundCue::Nugget,
            FunItem::SadCat => SoundCue::SadCat,
            FunItem::Jiafei => SoundCue::Jiafei,
            FunItem::Neilong => SoundCue::Neilong,
        }
    }

    /// Asset name the presentation layer resolves to a sound resource
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundCue::CoinCollect => "coin",
            SoundCue::HazardHit => "popo",
            SoundCue::MagnetOn => "magnet",
            SoundCue::GrowthOn => "growth",
            SoundCue::HappyCat => "happycat",
            SoundCue::Nugget => "gedagedgadao",
            SoundCue::SadCat => "mewomewo",
            SoundCue::Jiafei => "jiafei",
            SoundCue::Neilong => "neilong",
        }
    }
}
