use std::fmt;

/// The closed vocabulary of rule flags.
///
/// A flag's meaning under a given configuration is decided by
/// [`FlagTable`](crate::classify::FlagTable); this enum only names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    Location,
    Item,
    Goal,
    Early,
    Achievement,
    Chest,
    ChestItem,
    Orb,
    OrbItem,
    CommonEnemy,
    CommonEnemyItem,
    RareEnemy,
    RareEnemyItem,
    InvasionEnemy,
    InvasionEnemyItem,
    MinibossEnemy,
    MinibossEnemyItem,
    Shop,
    ShopItem,
    Grindy,
    Fishing,
    Npc,
    Guide,
    Slime,
    Pet,
    Pickaxe,
    Hammer,
    Minions,
    ArmorMinions,
    MechBoss,
    FinalBoss,
    Getfixedboi,
    NotGetfixedboi,
    Calamity,
    NotCalamity,
    NotCalamityGetfixedboi,
    BiomeLock,
    NotBiomeLock,
    WeatherLock,
    GrapplingHook,
    Melee,
    Ranged,
    Magic,
    Summoning,
    WeaponPower,
    ArmorPower,
    AccessoryPower,
    Corruption,
    Crimson,
    Vanity,
    Journey,
}

impl Flag {
    pub const ALL: [Flag; 51] = [
        Flag::Location,
        Flag::Item,
        Flag::Goal,
        Flag::Early,
        Flag::Achievement,
        Flag::Chest,
        Flag::ChestItem,
        Flag::Orb,
        Flag::OrbItem,
        Flag::CommonEnemy,
        Flag::CommonEnemyItem,
        Flag::RareEnemy,
        Flag::RareEnemyItem,
        Flag::InvasionEnemy,
        Flag::InvasionEnemyItem,
        Flag::MinibossEnemy,
        Flag::MinibossEnemyItem,
        Flag::Shop,
        Flag::ShopItem,
        Flag::Grindy,
        Flag::Fishing,
        Flag::Npc,
        Flag::Guide,
        Flag::Slime,
        Flag::Pet,
        Flag::Pickaxe,
        Flag::Hammer,
        Flag::Minions,
        Flag::ArmorMinions,
        Flag::MechBoss,
        Flag::FinalBoss,
        Flag::Getfixedboi,
        Flag::NotGetfixedboi,
        Flag::Calamity,
        Flag::NotCalamity,
        Flag::NotCalamityGetfixedboi,
        Flag::BiomeLock,
        Flag::NotBiomeLock,
        Flag::WeatherLock,
        Flag::GrapplingHook,
        Flag::Melee,
        Flag::Ranged,
        Flag::Magic,
        Flag::Summoning,
        Flag::WeaponPower,
        Flag::ArmorPower,
        Flag::AccessoryPower,
        Flag::Corruption,
        Flag::Crimson,
        Flag::Vanity,
        Flag::Journey,
    ];

    /// The flag's spelling in a rule table.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Flag::Location => "Location",
            Flag::Item => "Item",
            Flag::Goal => "Goal",
            Flag::Early => "Early",
            Flag::Achievement => "Achievement",
            Flag::Chest => "Chest",
            Flag::ChestItem => "Chest Item",
            Flag::Orb => "Orb",
            Flag::OrbItem => "Orb Item",
            Flag::CommonEnemy => "Common Enemy",
            Flag::CommonEnemyItem => "Common Enemy Item",
            Flag::RareEnemy => "Rare Enemy",
            Flag::RareEnemyItem => "Rare Enemy Item",
            Flag::InvasionEnemy => "Invasion Enemy",
            Flag::InvasionEnemyItem => "Invasion Enemy Item",
            Flag::MinibossEnemy => "Miniboss Enemy",
            Flag::MinibossEnemyItem => "Miniboss Enemy Item",
            Flag::Shop => "Shop",
            Flag::ShopItem => "Shop Item",
            Flag::Grindy => "Grindy",
            Flag::Fishing => "Fishing",
            Flag::Npc => "Npc",
            Flag::Guide => "Guide",
            Flag::Slime => "Slime",
            Flag::Pet => "Pet",
            Flag::Pickaxe => "Pickaxe",
            Flag::Hammer => "Hammer",
            Flag::Minions => "Minions",
            Flag::ArmorMinions => "Armor Minions",
            Flag::MechBoss => "Mech Boss",
            Flag::FinalBoss => "Final Boss",
            Flag::Getfixedboi => "Getfixedboi",
            Flag::NotGetfixedboi => "Not Getfixedboi",
            Flag::Calamity => "Calamity",
            Flag::NotCalamity => "Not Calamity",
            Flag::NotCalamityGetfixedboi => "Not Calamity Getfixedboi",
            Flag::BiomeLock => "Biome Lock",
            Flag::NotBiomeLock => "Not Biome Lock",
            Flag::WeatherLock => "Weather Lock",
            Flag::GrapplingHook => "Grappling Hook",
            Flag::Melee => "Melee",
            Flag::Ranged => "Ranged",
            Flag::Magic => "Magic",
            Flag::Summoning => "Summoning",
            Flag::WeaponPower => "Weapon Power",
            Flag::ArmorPower => "Armor Power",
            Flag::AccessoryPower => "Accessory Power",
            Flag::Corruption => "Corruption",
            Flag::Crimson => "Crimson",
            Flag::Vanity => "Vanity",
            Flag::Journey => "Journey",
        }
    }

    /// Look up a flag by its spelling. Returns `None` for names outside the
    /// vocabulary.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL.iter().copied().find(|flag| flag.name() == name)
    }

    /// Position of this flag in [`Flag::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Flags that turn a rule into a bank of numbered locations.
    #[must_use]
    pub fn is_multi_location(self) -> bool {
        matches!(
            self,
            Flag::Chest
                | Flag::Orb
                | Flag::CommonEnemy
                | Flag::RareEnemy
                | Flag::InvasionEnemy
                | Flag::MinibossEnemy
                | Flag::Shop
        )
    }

    /// Flags that can make a rule an obtainable item under some configuration.
    #[must_use]
    pub fn produces_item(self) -> bool {
        matches!(
            self,
            Flag::Item
                | Flag::ChestItem
                | Flag::OrbItem
                | Flag::CommonEnemyItem
                | Flag::RareEnemyItem
                | Flag::InvasionEnemyItem
                | Flag::MinibossEnemyItem
                | Flag::ShopItem
                | Flag::BiomeLock
                | Flag::NotBiomeLock
                | Flag::WeatherLock
                | Flag::GrapplingHook
        )
    }

    /// Combat class flags consulted by the class-preference filter.
    #[must_use]
    pub fn is_class(self) -> bool {
        matches!(
            self,
            Flag::Melee | Flag::Ranged | Flag::Magic | Flag::Summoning
        )
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The optional argument attached to a flag, e.g. `Pickaxe(55)` or
/// `Goal(wall_of_flesh)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    None,
    Text(String),
    Number(u64),
}

impl FlagValue {
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FlagValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::None => Ok(()),
            FlagValue::Text(s) => write!(f, "({})", super::condition::escape(s)),
            FlagValue::Number(n) => write!(f, "({n})"),
        }
    }
}

/// The flags declared on one rule, in declaration order. Each flag appears
/// at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    entries: Vec<(Flag, FlagValue)>,
}

impl Flags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag. Returns `false` (and leaves the set unchanged) if the flag
    /// was already present.
    pub fn insert(&mut self, flag: Flag, value: FlagValue) -> bool {
        if self.contains(flag) {
            return false;
        }
        self.entries.push((flag, value));
        true
    }

    #[must_use]
    pub fn contains(&self, flag: Flag) -> bool {
        self.entries.iter().any(|(f, _)| *f == flag)
    }

    #[must_use]
    pub fn get(&self, flag: Flag) -> Option<&FlagValue> {
        self.entries
            .iter()
            .find(|(f, _)| *f == flag)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Flag, &FlagValue)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (flag, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{flag}{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for flag in Flag::ALL {
            assert_eq!(Flag::from_name(flag.name()), Some(flag));
        }
    }

    #[test]
    fn index_matches_position_in_all() {
        for (i, flag) in Flag::ALL.iter().enumerate() {
            assert_eq!(flag.index(), i);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(Flag::from_name("Boss"), None);
        assert_eq!(Flag::from_name("location"), None);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut flags = Flags::new();
        assert!(flags.insert(Flag::Pickaxe, FlagValue::Number(35)));
        assert!(!flags.insert(Flag::Pickaxe, FlagValue::Number(55)));
        assert_eq!(flags.get(Flag::Pickaxe), Some(&FlagValue::Number(35)));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn display_matches_dsl_syntax() {
        let mut flags = Flags::new();
        flags.insert(Flag::Item, FlagValue::Text("Post-Golem".into()));
        flags.insert(Flag::Hammer, FlagValue::Number(80));
        flags.insert(Flag::Melee, FlagValue::None);
        assert_eq!(flags.to_string(), "Item(Post-Golem)|Hammer(80)|Melee");
    }
}
