use std::collections::{BTreeSet, HashSet};

use tracing::{debug, trace};

use crate::options::Options;
use crate::types::{Builtin, CompiledCondition, CompiledKind, EvalError, Flag, Flags, Session};

/// Names the marking pass has found to be progression. Insert-only; freeze
/// into a [`Progression`] once marking is finished.
#[derive(Debug, Clone, Default)]
pub struct ProgressionSet {
    names: HashSet<String>,
}

impl ProgressionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the name was not already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_owned())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn freeze(self) -> Progression {
        Progression {
            names: self.names.into_iter().collect(),
        }
    }
}

/// The read-only result of progression marking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progression {
    names: BTreeSet<String>,
}

impl Progression {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Whether a rule seeds the marking pass on its own account.
fn is_progression_root(flags: &Flags, options: &Options) -> bool {
    let always = [
        Flag::Goal,
        Flag::Pickaxe,
        Flag::Hammer,
        Flag::MechBoss,
        Flag::FinalBoss,
    ];
    let achievements = [Flag::Npc, Flag::Minions, Flag::ArmorMinions];
    always.iter().any(|&flag| flags.contains(flag))
        || (options.any_achievements() && achievements.iter().any(|&flag| flags.contains(flag)))
}

struct Marker<'s, 't> {
    session: &'s Session<'t>,
    set: &'s mut ProgressionSet,
    walked: Vec<bool>,
}

impl Marker<'_, '_> {
    /// Mark everything a rule's conditions depend on, once per rule.
    fn walk(&mut self, idx: usize) -> Result<(), EvalError> {
        if self.walked[idx] {
            return Ok(());
        }
        self.walked[idx] = true;
        let rule = &self.session.table().rules[idx];
        trace!(rule = %rule.name, "marking conditions");
        self.mark(&rule.tree)
    }

    fn mark(&mut self, condition: &CompiledCondition) -> Result<(), EvalError> {
        match &condition.kind {
            CompiledKind::Item { rule, .. } => {
                let fresh = self.set.insert(self.session.resolved_name(*rule));
                if fresh && self.session.class_of(*rule).is_event() {
                    self.walk(*rule)?;
                }
            }
            CompiledKind::Location(rule) => {
                self.set.insert(self.session.resolved_name(*rule));
                self.walk(*rule)?;
            }
            CompiledKind::Function {
                builtin: Builtin::GearPower,
                argument,
            } => {
                let Some(crate::types::Argument::Number(n)) = argument else {
                    return Err(EvalError::BadArgument {
                        function: Builtin::GearPower.name(),
                    });
                };
                self.mark_gear(*n)?;
            }
            CompiledKind::Function { .. } => {}
            CompiledKind::Group { conditions, .. } => {
                for child in conditions {
                    self.mark(child)?;
                }
            }
        }
        Ok(())
    }

    /// Walk the first adequate group of each gear table.
    fn mark_gear(&mut self, n: u64) -> Result<(), EvalError> {
        let table = self.session.table();
        for gear in table.capabilities.power_tables() {
            let first = gear.iter().find(|&&(idx, power)| {
                power >= n
                    && self
                        .session
                        .flag_table()
                        .class_acceptable(table.flags_of(idx))
            });
            if let Some(&(idx, _)) = first {
                self.walk(idx)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn mark(session: &Session<'_>, set: &mut ProgressionSet) -> Result<(), EvalError> {
    let table = session.table();
    let before = set.len();
    let mut marker = Marker {
        session,
        set,
        walked: vec![false; table.rules.len()],
    };

    for idx in session.scope() {
        let rule = &table.rules[idx];
        let root = is_progression_root(&rule.flags, session.options());
        if root {
            marker.set.insert(rule.default_item_name());
        }
        if root || session.class_of(idx).location {
            marker.walk(idx)?;
        }
    }

    debug!(
        added = marker.set.len() - before,
        total = marker.set.len(),
        "marked progression"
    );
    Ok(())
}
