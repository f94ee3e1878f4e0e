use std::fmt;

/// The fixed registry of functions callable with `@name` in a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `@npc(N)`: at least `N` NPCs collected.
    Npc,
    Calamity,
    BiomeLocks,
    ExtraChecks,
    Grindy,
    /// `@pickaxe(N)`: a collected pickaxe has at least `N` power.
    Pickaxe,
    /// `@hammer(N)`: a collected hammer has at least `N` power.
    Hammer,
    /// `@mech_boss(N)`: at least `N` mechanical bosses defeated.
    MechBoss,
    /// `@minions(N)`: minion capacity reaches `N`.
    Minions,
    Getfixedboi,
    /// `@gear_power(N)`: adequate weapons, armor, and accessories.
    GearPower,
    RequireBootsJumpHook,
    RequireWings,
}

impl Builtin {
    pub const ALL: [Builtin; 13] = [
        Builtin::Npc,
        Builtin::Calamity,
        Builtin::BiomeLocks,
        Builtin::ExtraChecks,
        Builtin::Grindy,
        Builtin::Pickaxe,
        Builtin::Hammer,
        Builtin::MechBoss,
        Builtin::Minions,
        Builtin::Getfixedboi,
        Builtin::GearPower,
        Builtin::RequireBootsJumpHook,
        Builtin::RequireWings,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Npc => "npc",
            Builtin::Calamity => "calamity",
            Builtin::BiomeLocks => "biome_locks",
            Builtin::ExtraChecks => "extra_checks",
            Builtin::Grindy => "grindy",
            Builtin::Pickaxe => "pickaxe",
            Builtin::Hammer => "hammer",
            Builtin::MechBoss => "mech_boss",
            Builtin::Minions => "minions",
            Builtin::Getfixedboi => "getfixedboi",
            Builtin::GearPower => "gear_power",
            Builtin::RequireBootsJumpHook => "require_boots_jump_hook",
            Builtin::RequireWings => "require_wings",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Whether the function requires an integer argument.
    #[must_use]
    pub fn takes_number(self) -> bool {
        matches!(
            self,
            Builtin::Npc
                | Builtin::Pickaxe
                | Builtin::Hammer
                | Builtin::MechBoss
                | Builtin::Minions
                | Builtin::GearPower
        )
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}
