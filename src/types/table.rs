use std::collections::HashMap;
use std::fmt;

use super::condition::{CompiledCondition, Condition};
use super::error::{CompileError, EvalError};
use super::flag::Flags;
use super::reward::{Label, Reward, REWARD_PREFIX};
use super::rule::{CompiledRule, Goal, Rule};
use super::session::Session;
use crate::options::Options;
use crate::parse::{GoalMarker, ParsedRewards, ParsedRules};

/// Rules gathered into the lookup tables the evaluator's built-in functions
/// consult. Every entry is a rule index, paired with the flag's value where
/// the flag carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Capabilities {
    pub(crate) npcs: Vec<usize>,
    pub(crate) pickaxes: Vec<(usize, u64)>,
    pub(crate) hammers: Vec<(usize, u64)>,
    pub(crate) weapons: Vec<(usize, u64)>,
    pub(crate) armor: Vec<(usize, u64)>,
    pub(crate) accessories: Vec<(usize, u64)>,
    pub(crate) mech_bosses: Vec<usize>,
    pub(crate) final_bosses: Vec<usize>,
    pub(crate) armor_minions: Vec<(usize, u64)>,
    pub(crate) accessory_minions: Vec<(usize, u64)>,
}

impl Capabilities {
    /// The three gear tables `@gear_power` draws from, in check order.
    pub(crate) fn power_tables(&self) -> [&[(usize, u64)]; 3] {
        [&self.weapons, &self.armor, &self.accessories]
    }
}

/// Builder for a [`RuleTable`] assembled in code rather than parsed.
///
/// # Example
///
/// ```
/// use reachdsl::{item, Flag, FlagValue, Flags, Rule, RuleTableBuilder};
///
/// let mut flags = Flags::new();
/// flags.insert(Flag::Location, FlagValue::None);
/// let table = RuleTableBuilder::new()
///     .rule(Rule { name: "Wood".into(), flags: Flags::new(), operator: None, conditions: vec![], line: 1 })
///     .rule(Rule { name: "Workbench".into(), flags, operator: None, conditions: vec![item("Wood")], line: 2 })
///     .goal("crafting")
///     .compile()
///     .unwrap();
/// assert_eq!(table.goals()[0].end(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    rules: ParsedRules,
    rewards: ParsedRewards,
}

impl RuleTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.rules.push(rule);
        self
    }

    /// Close a goal over every rule added so far.
    #[must_use]
    pub fn goal(mut self, name: &str) -> Self {
        self.rules.goals.push(GoalMarker {
            name: name.to_owned(),
            end: self.rules.rules.len(),
            line: 0,
        });
        self
    }

    /// Start a reward label; later rewards join it.
    #[must_use]
    pub fn label(mut self, name: &str) -> Self {
        self.rewards.labels.push(Label {
            name: name.to_owned(),
            rewards: Vec::new(),
        });
        self
    }

    /// Add a reward to the most recent label. The name gets the reward
    /// prefix. A reward added before any label fails [`compile`](Self::compile)
    /// with [`CompileError::UnlabeledReward`].
    #[must_use]
    pub fn reward(mut self, name: &str, flag: &str) -> Self {
        let name = format!("{REWARD_PREFIX}{name}");
        if let Some(label) = self.rewards.labels.last_mut() {
            label.rewards.push(name.clone());
        }
        self.rewards.rewards.push(Reward {
            name,
            flag: flag.to_owned(),
            line: 0,
        });
        self
    }

    /// Validate and compile into an immutable table.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if validation fails.
    pub fn compile(self) -> Result<RuleTable, CompileError> {
        crate::compile::compile(&self.rules, &self.rewards)
    }
}

/// The compiled rule, goal, and reward tables.
///
/// Immutable after construction and safe to share across threads; wrap it in
/// an `Arc` to hand out sessions from several workers.
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) rule_indices: HashMap<String, usize>,
    pub(crate) goals: Vec<Goal>,
    pub(crate) goal_indices: HashMap<String, usize>,
    pub(crate) labels: Vec<Label>,
    pub(crate) rewards: Vec<Reward>,
    pub(crate) reward_indices: HashMap<String, usize>,
    pub(crate) capabilities: Capabilities,
}

impl RuleTable {
    /// Compile already-parsed tables.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] on a dangling reference or other semantic
    /// fault.
    pub fn from_parsed(rules: &ParsedRules, rewards: &ParsedRewards) -> Result<Self, CompileError> {
        crate::compile::compile(rules, rewards)
    }

    /// Parse and compile a rule table and a reward table.
    ///
    /// # Errors
    ///
    /// Returns [`DslError`](crate::DslError) on parse or compile failure.
    pub fn from_dsl(rules: &str, rewards: &str) -> Result<Self, crate::DslError> {
        let parsed_rules = crate::parse::parse_rules(rules)?;
        let parsed_rewards = crate::parse::parse_rewards(rewards)?;
        Ok(crate::compile::compile(&parsed_rules, &parsed_rewards)?)
    }

    /// Read both tables from disk and compile them.
    ///
    /// # Errors
    ///
    /// Returns [`DslError`](crate::DslError) on I/O, parse, or compile failure.
    pub fn from_files(
        rules: impl AsRef<std::path::Path>,
        rewards: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::DslError> {
        let rules = std::fs::read_to_string(rules)?;
        let rewards = std::fs::read_to_string(rewards)?;
        Self::from_dsl(&rules, &rewards)
    }

    /// Bind the table to one configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownGoal`] if `options.goal` names a goal the
    /// table does not declare.
    pub fn session(&self, options: Options) -> Result<Session<'_>, EvalError> {
        Session::new(self, options)
    }

    /// Compile a free-standing condition against this table, e.g. for an
    /// ad-hoc reachability query.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the condition references an unknown rule
    /// or function.
    pub fn compile_condition(&self, condition: &Condition) -> Result<CompiledCondition, CompileError> {
        crate::compile::compile_condition(condition, "query", &self.rule_indices)
    }

    /// All rules in file order, multi-location banks expanded.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&CompiledRule> {
        self.index_of(name).map(|idx| &self.rules[idx])
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.rule_indices.get(name).copied()
    }

    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[must_use]
    pub fn goal(&self, name: &str) -> Option<&Goal> {
        self.goal_indices.get(name).map(|&idx| &self.goals[idx])
    }

    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    #[must_use]
    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// Look up a reward by its full, prefixed name.
    #[must_use]
    pub fn reward(&self, name: &str) -> Option<&Reward> {
        self.reward_indices.get(name).map(|&idx| &self.rewards[idx])
    }

    /// Names of the rules a rule's condition tree references directly, in
    /// order of appearance. Returns `None` if the rule is not found.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<&str>> {
        self.rule(name).map(|rule| {
            let mut indices = Vec::new();
            crate::compile::collect_references(rule.tree(), &mut indices);
            indices
                .into_iter()
                .map(|idx| self.rules[idx].name.as_str())
                .collect()
        })
    }

    pub(crate) fn flags_of(&self, idx: usize) -> &Flags {
        &self.rules[idx].flags
    }
}

#[cfg(feature = "binary-cache")]
impl RuleTable {
    /// Serialize the compiled tables to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload so callers can tell when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize tables previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleTable({} rules, {} goals, {} labels, {} rewards)",
            self.rules.len(),
            self.goals.len(),
            self.labels.len(),
            self.rewards.len(),
        )
    }
}
