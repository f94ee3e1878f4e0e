/// Combat class whose gear the player prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassPreference {
    #[default]
    Disabled,
    Melee,
    Ranged,
    Magic,
    Summoning,
}

/// Which evil biome the world generates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WorldEvil {
    Corruption,
    Crimson,
    #[default]
    Either,
}

/// Feature toggles for one generation session.
///
/// # Example
///
/// ```
/// use reachdsl::{ClassPreference, Options};
///
/// let options = Options::new()
///     .with_goal("wall_of_flesh")
///     .with_calamity(true)
///     .with_class_preference(ClassPreference::Ranged);
/// assert!(options.calamity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Goal to generate for. `None` selects the first goal in the table.
    pub goal: Option<String>,
    pub calamity: bool,
    pub getfixedboi: bool,
    pub biome_locks: bool,
    pub weather_locks: bool,
    pub chest_loot: bool,
    pub orb_loot: bool,
    pub shop_loot: bool,
    pub enemy_common_drops: u32,
    pub enemy_rare_drops: u32,
    pub enemy_invasion_drops: u32,
    pub enemy_miniboss_drops: u32,
    pub grappling_hook: bool,
    pub randomize_npcs: bool,
    pub randomize_guide: bool,
    pub early_achievements: bool,
    pub normal_achievements: bool,
    pub grindy_achievements: bool,
    pub fishing_achievements: bool,
    pub class_preference: ClassPreference,
    pub world_evil: WorldEvil,
    pub journey_mode: bool,
    pub require_boots_jump_hook: bool,
    pub require_wings: bool,
    pub require_optimal_gear: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            goal: None,
            calamity: false,
            getfixedboi: false,
            biome_locks: true,
            weather_locks: false,
            chest_loot: true,
            orb_loot: true,
            shop_loot: false,
            enemy_common_drops: 0,
            enemy_rare_drops: 0,
            enemy_invasion_drops: 0,
            enemy_miniboss_drops: 0,
            grappling_hook: false,
            randomize_npcs: false,
            randomize_guide: false,
            early_achievements: true,
            normal_achievements: true,
            grindy_achievements: false,
            fishing_achievements: false,
            class_preference: ClassPreference::Disabled,
            world_evil: WorldEvil::Either,
            journey_mode: false,
            require_boots_jump_hook: true,
            require_wings: true,
            require_optimal_gear: true,
        }
    }
}

macro_rules! setters {
    ($($method:ident => $field:ident: $ty:ty),* $(,)?) => {
        $(
            #[must_use]
            pub fn $method(mut self, value: $ty) -> Self {
                self.$field = value;
                self
            }
        )*
    };
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    setters! {
        with_calamity => calamity: bool,
        with_getfixedboi => getfixedboi: bool,
        with_biome_locks => biome_locks: bool,
        with_weather_locks => weather_locks: bool,
        with_chest_loot => chest_loot: bool,
        with_orb_loot => orb_loot: bool,
        with_shop_loot => shop_loot: bool,
        with_enemy_common_drops => enemy_common_drops: u32,
        with_enemy_rare_drops => enemy_rare_drops: u32,
        with_enemy_invasion_drops => enemy_invasion_drops: u32,
        with_enemy_miniboss_drops => enemy_miniboss_drops: u32,
        with_grappling_hook => grappling_hook: bool,
        with_randomize_npcs => randomize_npcs: bool,
        with_randomize_guide => randomize_guide: bool,
        with_early_achievements => early_achievements: bool,
        with_normal_achievements => normal_achievements: bool,
        with_grindy_achievements => grindy_achievements: bool,
        with_fishing_achievements => fishing_achievements: bool,
        with_class_preference => class_preference: ClassPreference,
        with_world_evil => world_evil: WorldEvil,
        with_journey_mode => journey_mode: bool,
        with_require_boots_jump_hook => require_boots_jump_hook: bool,
        with_require_wings => require_wings: bool,
        with_require_optimal_gear => require_optimal_gear: bool,
    }

    /// Whether any kind of achievement is a location.
    #[must_use]
    pub fn any_achievements(&self) -> bool {
        self.early_achievements
            || self.normal_achievements
            || self.grindy_achievements
            || self.fishing_achievements
    }

    /// Value echoed by `@extra_checks`.
    #[must_use]
    pub fn extra_checks(&self) -> bool {
        self.any_achievements() || self.chest_loot
    }
}
