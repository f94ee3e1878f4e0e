//! Configuration-dependent meaning of rule flags.
//!
//! The same flag can make a rule a location under one set of options and an
//! event or a disposed rule under another. [`FlagTable`] computes that mapping
//! once per configuration; classification is then a table lookup.

use crate::options::{ClassPreference, Options, WorldEvil};
use crate::types::{CompiledRule, Flag, Flags};

/// What a flag contributes to a rule under the active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagCode {
    /// The rule is an obtainable item.
    Item,
    /// The rule is a placed location.
    Location,
    /// The rule is one of a numbered bank of locations.
    MultiLocation,
    /// The rule does not exist in this configuration.
    Dispose,
    /// The rule is collected into a capability table.
    Bucket,
}

/// The derived role of one rule. A rule that is neither a location nor an
/// item is an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleClass {
    pub location: bool,
    pub item: bool,
    pub disposed: bool,
}

impl RuleClass {
    #[must_use]
    pub fn is_event(self) -> bool {
        !self.location && !self.item
    }
}

/// The codes `flag` yields under `options`.
#[must_use]
pub fn codes_for(flag: Flag, options: &Options) -> Vec<FlagCode> {
    use FlagCode::{Bucket, Dispose, Item, Location, MultiLocation};

    let when = |on: bool, code: FlagCode| if on { vec![code] } else { Vec::new() };
    let location_or_dispose = |on: bool| vec![if on { Location } else { Dispose }];

    match flag {
        Flag::Location => vec![Location],
        Flag::Item => vec![Item],
        Flag::Achievement => location_or_dispose(options.normal_achievements),
        Flag::Early => location_or_dispose(options.early_achievements),
        Flag::Grindy => location_or_dispose(options.grindy_achievements),
        Flag::Fishing => location_or_dispose(options.fishing_achievements),
        Flag::Chest => when(options.chest_loot, MultiLocation),
        Flag::ChestItem => when(options.chest_loot, Item),
        Flag::Orb => when(options.orb_loot, MultiLocation),
        Flag::OrbItem => when(options.orb_loot, Item),
        Flag::CommonEnemy => when(options.enemy_common_drops > 0, MultiLocation),
        Flag::CommonEnemyItem => when(options.enemy_common_drops > 0, Item),
        Flag::RareEnemy => when(options.enemy_rare_drops > 0, MultiLocation),
        Flag::RareEnemyItem => when(options.enemy_rare_drops > 0, Item),
        Flag::InvasionEnemy => when(options.enemy_invasion_drops > 0, MultiLocation),
        Flag::InvasionEnemyItem => when(options.enemy_invasion_drops > 0, Item),
        Flag::MinibossEnemy => when(options.enemy_miniboss_drops > 0, MultiLocation),
        Flag::MinibossEnemyItem => when(options.enemy_miniboss_drops > 0, Item),
        Flag::Shop => when(options.shop_loot, MultiLocation),
        Flag::ShopItem => when(options.shop_loot, Item),
        Flag::Npc if options.randomize_npcs => vec![Location, Item, Bucket],
        Flag::Guide if options.randomize_guide => vec![Item, Bucket],
        Flag::Goal
        | Flag::Npc
        | Flag::Guide
        | Flag::Slime
        | Flag::Pet
        | Flag::Pickaxe
        | Flag::Hammer
        | Flag::Minions
        | Flag::ArmorMinions
        | Flag::MechBoss
        | Flag::FinalBoss
        | Flag::Vanity => vec![Bucket],
        Flag::Getfixedboi => when(!options.getfixedboi, Dispose),
        Flag::NotGetfixedboi => when(options.getfixedboi, Dispose),
        Flag::Calamity => when(!options.calamity, Dispose),
        Flag::NotCalamity => when(options.calamity, Dispose),
        Flag::NotCalamityGetfixedboi => {
            when(options.calamity || !options.getfixedboi, Dispose)
        }
        Flag::BiomeLock => when(options.biome_locks, Item),
        Flag::NotBiomeLock => when(!options.biome_locks, Item),
        Flag::WeatherLock => when(options.weather_locks, Item),
        Flag::GrapplingHook => when(options.grappling_hook, Item),
        Flag::Melee
        | Flag::Ranged
        | Flag::Magic
        | Flag::Summoning
        | Flag::WeaponPower
        | Flag::ArmorPower
        | Flag::AccessoryPower => Vec::new(),
        Flag::Corruption => when(options.world_evil == WorldEvil::Crimson, Dispose),
        Flag::Crimson => when(options.world_evil == WorldEvil::Corruption, Dispose),
        Flag::Journey => when(!options.journey_mode, Item),
    }
}

/// Whether the class-preference filter admits a rule with these flags.
/// Rules without any class flag always pass.
#[must_use]
pub fn class_acceptable(flags: &Flags, preference: ClassPreference) -> bool {
    if !flags.iter().any(|(flag, _)| flag.is_class()) {
        return true;
    }
    match preference {
        ClassPreference::Disabled => true,
        ClassPreference::Melee => flags.contains(Flag::Melee),
        ClassPreference::Ranged => flags.contains(Flag::Ranged),
        ClassPreference::Magic => flags.contains(Flag::Magic),
        ClassPreference::Summoning => flags.contains(Flag::Summoning),
    }
}

/// Per-configuration lookup from flag to codes.
#[derive(Debug, Clone)]
pub struct FlagTable {
    codes: Vec<Vec<FlagCode>>,
    preference: ClassPreference,
    /// Enabled copy count for each multi-location flag, indexed like `codes`.
    limits: Vec<Option<u32>>,
}

impl FlagTable {
    #[must_use]
    pub fn new(options: &Options) -> Self {
        let limits = Flag::ALL
            .iter()
            .map(|flag| match flag {
                Flag::CommonEnemy => Some(options.enemy_common_drops),
                Flag::RareEnemy => Some(options.enemy_rare_drops),
                Flag::InvasionEnemy => Some(options.enemy_invasion_drops),
                Flag::MinibossEnemy => Some(options.enemy_miniboss_drops),
                _ => None,
            })
            .collect();
        Self {
            codes: Flag::ALL.iter().map(|&flag| codes_for(flag, options)).collect(),
            preference: options.class_preference,
            limits,
        }
    }

    #[must_use]
    pub fn codes(&self, flag: Flag) -> &[FlagCode] {
        &self.codes[flag.index()]
    }

    #[must_use]
    pub fn class_acceptable(&self, flags: &Flags) -> bool {
        class_acceptable(flags, self.preference)
    }

    /// Derive a rule's role from its flags.
    #[must_use]
    pub fn classify(&self, rule: &CompiledRule) -> RuleClass {
        let flags = rule.flags();
        let mut class = RuleClass::default();
        let mut item = false;
        let achievement_kind = flags.contains(Flag::Early)
            || flags.contains(Flag::Grindy)
            || flags.contains(Flag::Fishing);

        for (flag, _) in flags.iter() {
            for code in self.codes(flag) {
                match code {
                    FlagCode::Location | FlagCode::MultiLocation => class.location = true,
                    FlagCode::Item => item = true,
                    FlagCode::Dispose if flag == Flag::Achievement && achievement_kind => {}
                    FlagCode::Dispose => class.disposed = true,
                    FlagCode::Bucket => {}
                }
            }
            if let (Some(limit), Some(copy)) = (self.limits[flag.index()], rule.copy()) {
                if copy > limit {
                    class.disposed = true;
                }
            }
        }

        class.item = item && self.class_acceptable(flags);
        class
    }
}
