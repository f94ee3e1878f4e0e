/// Prefix given to every reward's item name.
pub const REWARD_PREFIX: &str = "Reward: ";

/// A filler entry from the reward table, named with [`REWARD_PREFIX`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reward {
    pub name: String,
    /// The single flag the entry declares, e.g. `Calamity`.
    pub flag: String,
    pub line: usize,
}

/// A named fill-order bucket of rewards, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    pub name: String,
    pub rewards: Vec<String>,
}
