use std::collections::BTreeSet;
use std::ops::Range;

use tracing::warn;

use super::condition::CompiledCondition;
use super::error::EvalError;
use super::flag::Flag;
use super::rule::Goal;
use super::state::CollectionState;
use super::table::RuleTable;
use crate::classify::{FlagTable, RuleClass};
use crate::options::Options;
use crate::progression::{Progression, ProgressionSet};

/// A [`RuleTable`] bound to one configuration.
///
/// Holds the selected goal, the per-configuration [`FlagTable`], and every
/// rule's derived [`RuleClass`]. Evaluation never mutates the session, so one
/// session can answer queries from several threads at once.
#[derive(Debug, Clone)]
pub struct Session<'t> {
    table: &'t RuleTable,
    options: Options,
    flag_table: FlagTable,
    classes: Vec<RuleClass>,
    goal: Option<usize>,
}

impl<'t> Session<'t> {
    pub(crate) fn new(table: &'t RuleTable, mut options: Options) -> Result<Self, EvalError> {
        let goal = match &options.goal {
            Some(name) => match table.goal_indices.get(name) {
                Some(&idx) => Some(idx),
                None => return Err(EvalError::UnknownGoal { goal: name.clone() }),
            },
            None => (!table.goals.is_empty()).then_some(0),
        };

        if let Some(idx) = goal {
            let selected = &table.goals[idx];
            let needs_calamity = selected.locations.iter().any(|location| {
                table
                    .rule(location)
                    .is_some_and(|rule| rule.flags.contains(Flag::Calamity))
            });
            if needs_calamity && !options.calamity {
                warn!(
                    goal = %selected.name,
                    "goal requires Calamity, which was disabled; enabling Calamity"
                );
                options.calamity = true;
            }
        }

        let flag_table = FlagTable::new(&options);
        let mut classes: Vec<RuleClass> = table
            .rules
            .iter()
            .map(|rule| flag_table.classify(rule))
            .collect();
        if let Some(idx) = goal {
            for location in &table.goals[idx].locations {
                if let Some(i) = table.index_of(location) {
                    classes[i].disposed = false;
                }
            }
        }

        Ok(Self {
            table,
            options,
            flag_table,
            classes,
            goal,
        })
    }

    #[must_use]
    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    /// The effective options, after any goal-driven adjustment.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn flag_table(&self) -> &FlagTable {
        &self.flag_table
    }

    /// The selected goal, or `None` when the table declares no goals.
    #[must_use]
    pub fn goal(&self) -> Option<&'t Goal> {
        self.goal.map(|idx| &self.table.goals[idx])
    }

    /// Rule indices in scope for the selected goal.
    #[must_use]
    pub fn scope(&self) -> Range<usize> {
        0..self.goal().map_or(self.table.rules.len(), Goal::end)
    }

    #[must_use]
    pub(crate) fn class_of(&self, idx: usize) -> RuleClass {
        self.classes[idx]
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<RuleClass> {
        self.table.index_of(name).map(|idx| self.classes[idx])
    }

    /// The name a rule is held under in a collection state: its item name if
    /// it is an item in this configuration, otherwise the rule name.
    #[must_use]
    pub(crate) fn resolved_name(&self, idx: usize) -> &'t str {
        let rule = &self.table.rules[idx];
        if self.classes[idx].item {
            rule.default_item_name()
        } else {
            &rule.name
        }
    }

    /// Evaluate a compiled condition against a collection state.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the tree is internally inconsistent.
    pub fn evaluate<S: CollectionState + ?Sized>(
        &self,
        condition: &CompiledCondition,
        state: &S,
    ) -> Result<bool, EvalError> {
        crate::evaluate::evaluate(self, condition, state)
    }

    /// Whether the named rule's condition tree is satisfied.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownRule`] if no rule has that name.
    pub fn can_reach<S: CollectionState + ?Sized>(
        &self,
        name: &str,
        state: &S,
    ) -> Result<bool, EvalError> {
        let idx = self.lookup(name)?;
        self.evaluate(&self.table.rules[idx].tree, state)
    }

    /// The access predicate for one rule, ready to hand to a placement
    /// algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownRule`] if no rule has that name.
    pub fn access_rule<S: CollectionState + ?Sized>(
        &self,
        name: &str,
    ) -> Result<impl Fn(&S) -> Result<bool, EvalError> + '_, EvalError> {
        let tree = &self.table.rules[self.lookup(name)?].tree;
        Ok(move |state: &S| self.evaluate(tree, state))
    }

    /// Item names that complete the selected goal.
    #[must_use]
    pub fn goal_items(&self) -> BTreeSet<&'t str> {
        let Some(goal) = self.goal() else {
            return BTreeSet::new();
        };
        goal.locations
            .iter()
            .filter_map(|location| self.table.rule(location))
            .map(|rule| rule.default_item_name())
            .collect()
    }

    /// Whether every goal item is held.
    #[must_use]
    pub fn is_complete<S: CollectionState + ?Sized>(&self, state: &S) -> bool {
        self.goal_items().iter().all(|item| state.has(item, 1))
    }

    /// A label's rewards in fill order, skipping Calamity-only rewards unless
    /// Calamity is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownLabel`] if the label is not declared.
    pub fn rewards(&self, label: &str) -> Result<Vec<&'t str>, EvalError> {
        let Some(found) = self.table.label(label) else {
            return Err(EvalError::UnknownLabel {
                label: label.to_owned(),
            });
        };
        Ok(found
            .rewards
            .iter()
            .filter(|name| {
                self.options.calamity
                    || self
                        .table
                        .reward(name)
                        .map_or(true, |reward| reward.flag != Flag::Calamity.name())
            })
            .map(String::as_str)
            .collect())
    }

    /// Run the progression marking pass into a fresh set and freeze it.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if a condition tree is internally inconsistent.
    pub fn mark_progression(&self) -> Result<Progression, EvalError> {
        let mut set = ProgressionSet::new();
        self.mark_progression_into(&mut set)?;
        Ok(set.freeze())
    }

    /// Run the progression marking pass, adding to an existing set.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if a condition tree is internally inconsistent.
    pub fn mark_progression_into(&self, set: &mut ProgressionSet) -> Result<(), EvalError> {
        crate::progression::mark(self, set)
    }

    fn lookup(&self, name: &str) -> Result<usize, EvalError> {
        self.table.index_of(name).ok_or_else(|| EvalError::UnknownRule {
            name: name.to_owned(),
        })
    }
}
