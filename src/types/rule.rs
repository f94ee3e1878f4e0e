use std::collections::BTreeSet;
use std::fmt;

use super::condition::{escape, write_joined, CompiledCondition, Condition, Operator};
use super::flag::{Flag, Flags};

/// A named node of the dependency graph, as parsed from one rule line.
///
/// Created by [`parse_rules`](crate::parse::parse_rules); resolved into a
/// [`CompiledRule`] when the table is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub flags: Flags,
    /// Top-level combinator; `None` when there are fewer than two conditions.
    pub operator: Option<Operator>,
    pub conditions: Vec<Condition>,
    /// 1-based line in the source table.
    pub line: usize,
}

impl Rule {
    /// Name of the item this rule produces when it is an item: the argument
    /// of an `Item(..)` flag, or the rule's own name. `None` when no flag on
    /// the rule can ever produce an item.
    #[must_use]
    pub fn item_name(&self) -> Option<&str> {
        if !self.flags.iter().any(|(flag, _)| flag.produces_item()) {
            return None;
        }
        Some(
            self.flags
                .get(Flag::Item)
                .and_then(|value| value.as_text())
                .unwrap_or(&self.name),
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};", escape(&self.name), self.flags)?;
        write_joined(f, self.operator, &self.conditions)?;
        f.write_str(";")
    }
}

/// A rule whose references have been resolved to table indices.
///
/// Its condition tree is stored as a single positive group carrying the
/// rule's top-level operator, so a location reference evaluates the same way
/// a nested group does.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub(crate) name: String,
    pub(crate) flags: Flags,
    pub(crate) tree: CompiledCondition,
    pub(crate) item_name: Option<String>,
    pub(crate) line: usize,
    /// Position within a multi-location bank, starting at 1.
    pub(crate) copy: Option<u32>,
}

impl CompiledRule {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    #[must_use]
    pub fn tree(&self) -> &CompiledCondition {
        &self.tree
    }

    #[must_use]
    pub fn item_name(&self) -> Option<&str> {
        self.item_name.as_deref()
    }

    /// The name used for this rule when it is handed out as an item, falling
    /// back to the rule name for events and locations.
    #[must_use]
    pub fn default_item_name(&self) -> &str {
        self.item_name.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn copy(&self) -> Option<u32> {
        self.copy
    }
}

/// A named boundary over the rule sequence plus the locations that must be
/// reached to complete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub(crate) name: String,
    pub(crate) end: usize,
    pub(crate) locations: BTreeSet<String>,
}

impl Goal {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every rule with an index below `end` is in scope for this goal.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn locations(&self) -> &BTreeSet<String> {
        &self.locations
    }
}

/// Derive a goal name from a rule name: strip ASCII punctuation, replace
/// spaces with underscores, and lowercase.
#[must_use]
pub fn goal_slug(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .map(|c| if c == ' ' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::condition::{function, item, location};
    use crate::types::flag::FlagValue;
    use crate::Argument;

    fn rule(name: &str, flags: &[(Flag, FlagValue)]) -> Rule {
        let mut set = Flags::new();
        for (flag, value) in flags {
            set.insert(*flag, value.clone());
        }
        Rule {
            name: name.to_owned(),
            flags: set,
            operator: None,
            conditions: Vec::new(),
            line: 1,
        }
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(goal_slug("Wall of Flesh!"), "wall_of_flesh");
        assert_eq!(goal_slug("Yharon, Dragon of Rebirth"), "yharon_dragon_of_rebirth");
        assert_eq!(goal_slug("Moon Lord"), "moon_lord");
    }

    #[test]
    fn item_name_prefers_flag_argument() {
        let r = rule("Golem", &[(Flag::Item, FlagValue::Text("Post-Golem".into()))]);
        assert_eq!(r.item_name(), Some("Post-Golem"));
    }

    #[test]
    fn item_name_falls_back_to_rule_name() {
        let r = rule("Hermes Boots", &[(Flag::ChestItem, FlagValue::None)]);
        assert_eq!(r.item_name(), Some("Hermes Boots"));
    }

    #[test]
    fn plain_location_has_no_item_name() {
        let r = rule("Timber!!", &[(Flag::Achievement, FlagValue::None)]);
        assert_eq!(r.item_name(), None);
    }

    #[test]
    fn display_renders_rule_line() {
        let mut r = rule("A", &[(Flag::Item, FlagValue::None)]);
        r.operator = Some(Operator::And);
        r.conditions = vec![location("B"), function("npc", Some(Argument::Number(2)))];
        assert_eq!(r.to_string(), "A;Item;#B & @npc(2);");

        let mut r = rule("Bar", &[]);
        r.conditions = vec![item("Ore").times(3)];
        assert_eq!(r.to_string(), "Bar;;Ore(3);");
    }
}
