use std::collections::{HashMap, HashSet};

/// The collected-state oracle queried during evaluation.
///
/// Implement this for the host's own inventory type; [`Inventory`] is a
/// ready-made counting implementation.
pub trait CollectionState {
    /// Whether at least `count` copies of the item `name` are held.
    fn has(&self, name: &str, count: u64) -> bool;
}

impl<S: CollectionState + ?Sized> CollectionState for &S {
    fn has(&self, name: &str, count: u64) -> bool {
        (**self).has(name, count)
    }
}

/// A set holds one copy of each member.
impl CollectionState for HashSet<String> {
    fn has(&self, name: &str, count: u64) -> bool {
        count <= 1 && (count == 0 || self.contains(name))
    }
}

/// Item name to held count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    counts: HashMap<String, u64>,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, name: &str, count: u64) -> Self {
        self.add(name, count);
        self
    }

    pub fn add(&mut self, name: &str, count: u64) {
        let held = self.counts.entry(name.to_owned()).or_insert(0);
        *held = held.saturating_add(count);
    }

    /// Remove up to `count` copies. Returns how many were removed.
    pub fn remove(&mut self, name: &str, count: u64) -> u64 {
        let Some(held) = self.counts.get_mut(name) else {
            return 0;
        };
        let removed = count.min(*held);
        *held -= removed;
        if *held == 0 {
            self.counts.remove(name);
        }
        removed
    }

    #[must_use]
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(name, &count)| (name.as_str(), count))
    }
}

impl CollectionState for Inventory {
    fn has(&self, name: &str, count: u64) -> bool {
        self.count(name) >= count
    }
}

impl<'a> FromIterator<&'a str> for Inventory {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for name in iter {
            inventory.add(name, 1);
        }
        inventory
    }
}
