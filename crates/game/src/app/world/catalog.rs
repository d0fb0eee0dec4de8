//! Static item tables: materials, puzzle objects and potions.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum MaterialType {
    MouseWhisker,
    Gunpowder,
    MorningDew,
    Coin,
    Firewood,
    AntiDote,
    Hushroom,
    GhostTears,
    GravityStone,
    TransmutersDraught,
    Feather,
    FireSalts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Effect {
    Transmuted,
    Smaller,
    Strong,
    Ephemeral,
    Metallic,
    Wooden,
    Reversed,
    Relaxed,
    Incorporeal,
    Heavy,
    Hovering,
    Hot,
}

impl Effect {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Transmuted => "transmuted",
            Self::Smaller => "smaller",
            Self::Strong => "strong",
            Self::Ephemeral => "ephemeral",
            Self::Metallic => "metallic",
            Self::Wooden => "wooden",
            Self::Reversed => "reversed",
            Self::Relaxed => "relaxed",
            Self::Incorporeal => "incorporeal",
            Self::Heavy => "heavy",
            Self::Hovering => "hovering",
            Self::Hot => "hot",
        }
    }
}

#[derive(Debug)]
pub(crate) struct MaterialInfo {
    pub(crate) name: &'static str,
    pub(crate) effect: Effect,
    pub(crate) description: &'static str,
    /// Seconds in the cauldron before the material is ready.
    pub(crate) brew_time: f32,
    /// Seconds in the cauldron after which the material is spoiled.
    pub(crate) expire_time: f32,
}

impl MaterialType {
    pub(crate) const ALL: [MaterialType; 12] = [
        Self::MouseWhisker,
        Self::Gunpowder,
        Self::MorningDew,
        Self::Coin,
        Self::Firewood,
        Self::AntiDote,
        Self::Hushroom,
        Self::GhostTears,
        Self::GravityStone,
        Self::TransmutersDraught,
        Self::Feather,
        Self::FireSalts,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            Self::MouseWhisker => "mouse-whisker",
            Self::Gunpowder => "gunpowder",
            Self::MorningDew => "morning-dew",
            Self::Coin => "coin",
            Self::Firewood => "firewood",
            Self::AntiDote => "anti-dote",
            Self::Hushroom => "hushroom",
            Self::GhostTears => "ghost-tears",
            Self::GravityStone => "gravity-stone",
            Self::TransmutersDraught => "transmuters-draught",
            Self::Feather => "feather",
            Self::FireSalts => "fire-salts",
        }
    }

    pub(crate) fn info(self) -> &'static MaterialInfo {
        match self {
            Self::MouseWhisker => &MaterialInfo {
                name: "Mouse Whisker",
                effect: Effect::Smaller,
                description: "Mice use these to tell whether a hole is big enough to squeeze through. This one fell off on its own.",
                brew_time: 2.0,
                expire_time: 12.0,
            },
            Self::Gunpowder => &MaterialInfo {
                name: "Gunpowder",
                effect: Effect::Strong,
                description: "Sulfur, saltpeter and charcoal. There is a great deal of power stored in here, so be careful.",
                brew_time: 1.0,
                expire_time: 6.0,
            },
            Self::MorningDew => &MaterialInfo {
                name: "Morning Dew",
                effect: Effect::Ephemeral,
                description: "Water that condensed on the leaves overnight. It will evaporate before long!",
                brew_time: 1.0,
                expire_time: 8.0,
            },
            Self::Coin => &MaterialInfo {
                name: "Coins",
                effect: Effect::Metallic,
                description: "Old coins worth exactly the metal they are made of. Hard, tough and shiny.",
                brew_time: 4.0,
                expire_time: 30.0,
            },
            Self::Firewood => &MaterialInfo {
                name: "Firewood",
                effect: Effect::Wooden,
                description: "Dry dead wood: lightweight, rigid and quite flammable.",
                brew_time: 3.0,
                expire_time: 20.0,
            },
            Self::AntiDote => &MaterialInfo {
                name: "Anti-dote",
                effect: Effect::Reversed,
                description: "emit emas eht ta thgil dna yvaeh sleef ti ,gnibmun dna ycips sllems ffuts sihT",
                brew_time: 2.0,
                expire_time: 10.0,
            },
            Self::Hushroom => &MaterialInfo {
                name: "Hushroom",
                effect: Effect::Relaxed,
                description: "This little mushroom wilts if exposed to bright lights or loud sounds.",
                brew_time: 3.0,
                expire_time: 15.0,
            },
            Self::GhostTears => &MaterialInfo {
                name: "Ghost Tears",
                effect: Effect::Incorporeal,
                description: "Ghosts get sad sometimes too. You should never make a ghost cry, but the tears can be collected.",
                brew_time: 2.0,
                expire_time: 9.0,
            },
            Self::GravityStone => &MaterialInfo {
                name: "Gravity Stone",
                effect: Effect::Heavy,
                description: "A very heavy and very slippery rock. Watch your toes!",
                brew_time: 5.0,
                expire_time: 30.0,
            },
            Self::TransmutersDraught => &MaterialInfo {
                name: "Transmuter's Draught",
                effect: Effect::Transmuted,
                description: "Alchemists use this to turn one substance into another.",
                brew_time: 2.0,
                expire_time: 14.0,
            },
            Self::Feather => &MaterialInfo {
                name: "Feather",
                effect: Effect::Hovering,
                description: "Light enough to drift on a sigh.",
                brew_time: 1.0,
                expire_time: 10.0,
            },
            Self::FireSalts => &MaterialInfo {
                name: "Fire Salts",
                effect: Effect::Hot,
                description: "Warm to the touch, and getting warmer.",
                brew_time: 2.0,
                expire_time: 8.0,
            },
        }
    }

    pub(crate) fn name(self) -> &'static str {
        self.info().name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PuzzleObjectType {
    Key,
    SmallKey,
    BigKey,
    BrokenRadio,
    FixedRadio,
    HotGravityStone,
    HotFloatingGravityStone,
}

impl PuzzleObjectType {
    pub(crate) fn key(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::SmallKey => "small-key",
            Self::BigKey => "big-key",
            Self::BrokenRadio => "broken-radio",
            Self::FixedRadio => "fixed-radio",
            Self::HotGravityStone => "hot-gravity-stone",
            Self::HotFloatingGravityStone => "hot-floating-gravity-stone",
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Key => "Key",
            Self::SmallKey => "Small Key",
            Self::BigKey => "Big Key",
            Self::BrokenRadio => "Broken Radio",
            Self::FixedRadio => "Fixed Radio",
            Self::HotGravityStone => "Hot Gravity Stone",
            Self::HotFloatingGravityStone => "Hot Floating Gravity Stone",
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            Self::Key => "A plain key with a loop and a couple of teeth.",
            Self::SmallKey => "A key small enough for a mouse's front door.",
            Self::BigKey => "A key so large it needs both hands.",
            Self::BrokenRadio => "The ghost's radio. The insides are rotten wood.",
            Self::FixedRadio => "The ghost's radio, with shiny new metal insides. It hums!",
            Self::HotGravityStone => "Still very heavy, and now very hot.",
            Self::HotFloatingGravityStone => "Hot, heavy, and somehow floating anyway.",
        }
    }

    pub(crate) fn is_key(self) -> bool {
        matches!(self, Self::Key | Self::SmallKey | Self::BigKey)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PotionType {
    Ensmallening,
    Embiggening,
    TempTransmutationMetal,
    TempTransmutationWood,
    Energy,
    PhoenixFeather,
    Ghostly,
}

#[derive(Debug)]
pub(crate) struct PotionInfo {
    pub(crate) name: &'static str,
    pub(crate) recipe: &'static [MaterialType],
    /// What the potion works on, if anything.
    pub(crate) apply_to: Option<ItemRef>,
    pub(crate) turns_into: Option<ItemRef>,
}

impl PotionType {
    pub(crate) const ALL: [PotionType; 7] = [
        Self::Ensmallening,
        Self::Embiggening,
        Self::TempTransmutationMetal,
        Self::TempTransmutationWood,
        Self::Energy,
        Self::PhoenixFeather,
        Self::Ghostly,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            Self::Ensmallening => "ensmallening",
            Self::Embiggening => "embiggening",
            Self::TempTransmutationMetal => "temp-transmutation-metal",
            Self::TempTransmutationWood => "temp-transmutation-wood",
            Self::Energy => "energy",
            Self::PhoenixFeather => "phoenix-feather",
            Self::Ghostly => "ghostly",
        }
    }

    pub(crate) fn info(self) -> &'static PotionInfo {
        use MaterialType as M;
        match self {
            Self::Ensmallening => &PotionInfo {
                name: "Potion of Ensmallening",
                recipe: &[M::MouseWhisker],
                apply_to: Some(ItemRef::PuzzleObject(PuzzleObjectType::Key)),
                turns_into: Some(ItemRef::PuzzleObject(PuzzleObjectType::SmallKey)),
            },
            Self::Embiggening => &PotionInfo {
                name: "Potion of Embiggening",
                recipe: &[M::MouseWhisker, M::AntiDote],
                apply_to: Some(ItemRef::PuzzleObject(PuzzleObjectType::Key)),
                turns_into: Some(ItemRef::PuzzleObject(PuzzleObjectType::BigKey)),
            },
            Self::TempTransmutationMetal => &PotionInfo {
                name: "Temporary Potion of Metal Transmutation",
                recipe: &[M::TransmutersDraught, M::Coin, M::MorningDew],
                apply_to: Some(ItemRef::PuzzleObject(PuzzleObjectType::BrokenRadio)),
                turns_into: Some(ItemRef::PuzzleObject(PuzzleObjectType::FixedRadio)),
            },
            Self::TempTransmutationWood => &PotionInfo {
                name: "Temporary Potion of Wood Transmutation",
                recipe: &[M::TransmutersDraught, M::Firewood, M::MorningDew],
                apply_to: Some(ItemRef::Material(M::Coin)),
                turns_into: Some(ItemRef::Material(M::Firewood)),
            },
            Self::Energy => &PotionInfo {
                name: "Potion of Energy",
                recipe: &[M::Hushroom, M::AntiDote],
                apply_to: None,
                turns_into: None,
            },
            Self::PhoenixFeather => &PotionInfo {
                name: "Phoenix Feather Potion",
                recipe: &[M::Feather, M::Gunpowder, M::FireSalts],
                apply_to: None,
                turns_into: None,
            },
            Self::Ghostly => &PotionInfo {
                name: "Ghostly Potion",
                recipe: &[M::AntiDote, M::GhostTears, M::MorningDew],
                apply_to: Some(ItemRef::PuzzleObject(PuzzleObjectType::HotGravityStone)),
                turns_into: Some(ItemRef::PuzzleObject(
                    PuzzleObjectType::HotFloatingGravityStone,
                )),
            },
        }
    }

    pub(crate) fn name(self) -> &'static str {
        self.info().name
    }
}

/// Finds the potion whose recipe is exactly `ingredients`, ignoring order.
pub(crate) fn find_recipe(ingredients: &[MaterialType]) -> Option<PotionType> {
    let mut wanted: Vec<&'static str> = ingredients.iter().map(|m| m.key()).collect();
    wanted.sort_unstable();
    PotionType::ALL.into_iter().find(|potion| {
        let mut recipe: Vec<&'static str> = potion.info().recipe.iter().map(|m| m.key()).collect();
        recipe.sort_unstable();
        recipe == wanted
    })
}

/// Anything that can sit in the player's pockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum ItemRef {
    Material(MaterialType),
    PuzzleObject(PuzzleObjectType),
    Potion(PotionType),
}

impl ItemRef {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Material(material) => material.name(),
            Self::PuzzleObject(object) => object.name(),
            Self::Potion(potion) => potion.name(),
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            Self::Material(material) => material.info().description,
            Self::PuzzleObject(object) => object.description(),
            Self::Potion(_) => "Drink responsibly. Or pour it on something.",
        }
    }

    /// Item-window trait labels.
    pub(crate) fn traits(self) -> Vec<&'static str> {
        match self {
            Self::Material(material) => vec![material.info().effect.as_str()],
            Self::PuzzleObject(_) | Self::Potion(_) => Vec::new(),
        }
    }

    pub(crate) fn image_url(self) -> String {
        match self {
            Self::Material(material) => format!("items/{}.png", material.key()),
            Self::PuzzleObject(object) => format!("items/{}.png", object.key()),
            Self::Potion(_) => "items/potion.png".to_string(),
        }
    }

    /// Every item the catalog knows about, for icon preloading.
    pub(crate) fn all() -> Vec<ItemRef> {
        let objects = [
            PuzzleObjectType::Key,
            PuzzleObjectType::SmallKey,
            PuzzleObjectType::BigKey,
            PuzzleObjectType::BrokenRadio,
            PuzzleObjectType::FixedRadio,
            PuzzleObjectType::HotGravityStone,
            PuzzleObjectType::HotFloatingGravityStone,
        ];
        MaterialType::ALL
            .into_iter()
            .map(Self::Material)
            .chain(objects.into_iter().map(Self::PuzzleObject))
            .chain(PotionType::ALL.into_iter().map(Self::Potion))
            .collect()
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_keys_match_serde_names() {
        for material in MaterialType::ALL {
            let json = serde_json::to_value(material).expect("serialize material");
            assert_eq!(json, serde_json::Value::String(material.key().to_string()));
        }
    }

    #[test]
    fn recipe_lookup_ignores_ingredient_order() {
        let found = find_recipe(&[
            MaterialType::MorningDew,
            MaterialType::Coin,
            MaterialType::TransmutersDraught,
        ]);
        assert_eq!(found, Some(PotionType::TempTransmutationMetal));
    }

    #[test]
    fn recipe_lookup_requires_exact_ingredient_list() {
        assert_eq!(
            find_recipe(&[MaterialType::MouseWhisker, MaterialType::Coin]),
            None
        );
        assert_eq!(
            find_recipe(&[MaterialType::MouseWhisker]),
            Some(PotionType::Ensmallening)
        );
    }

    #[test]
    fn brew_windows_open_before_they_close() {
        for material in MaterialType::ALL {
            let info = material.info();
            assert!(info.brew_time < info.expire_time, "{}", info.name);
        }
    }

    #[test]
    fn item_ref_serializes_with_kind_tag() {
        let json = serde_json::to_value(ItemRef::PuzzleObject(PuzzleObjectType::HotGravityStone))
            .expect("serialize item");
        assert_eq!(json, serde_json::json!({"puzzleObject": "hot-gravity-stone"}));
    }
}
