use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::parse::{ParsedRewards, ParsedRules};
use crate::types::{
    goal_slug, Argument, Builtin, Capabilities, CompileError, CompiledCondition, CompiledKind,
    CompiledRule, Condition, ConditionKind, Flag, FlagValue, Flags, Goal, Operator, Rule,
    RuleTable,
};

/// Number of numbered copies a multi-location rule expands into.
pub(crate) const MULTI_LOCATION_COPIES: u32 = 100;

const MECH_BOSS_GOAL: &str = "mechanical_bosses";
const FINAL_BOSS_GOAL: &str = "calamity_final_bosses";

/// One entry of the expanded rule sequence.
struct Expanded<'a> {
    name: String,
    flags: Flags,
    source: &'a Rule,
    copy: Option<u32>,
}

pub(crate) fn compile(
    parsed: &ParsedRules,
    rewards: &ParsedRewards,
) -> Result<RuleTable, CompileError> {
    check_goal_markers(parsed)?;
    check_labels(rewards)?;
    let (expanded, first_index, ends) = expand(&parsed.rules);
    check_duplicates(&expanded)?;

    let rule_indices: HashMap<String, usize> = expanded
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.name.clone(), i))
        .collect();

    let rules = expanded
        .iter()
        .map(|entry| {
            let tree = compile_group(
                true,
                entry.source.operator,
                &entry.source.conditions,
                &entry.name,
                &rule_indices,
            )?;
            Ok(CompiledRule {
                name: entry.name.clone(),
                flags: entry.flags.clone(),
                tree,
                item_name: entry.source.item_name().map(str::to_owned),
                line: entry.source.line,
                copy: entry.copy,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    check_items(&parsed.rules, rewards)?;
    let capabilities = collect_capabilities(&parsed.rules, &first_index)?;

    let mut goals: Vec<Goal> = parsed
        .goals
        .iter()
        .map(|marker| Goal {
            name: marker.name.clone(),
            end: ends.get(marker.end).copied().unwrap_or(expanded.len()),
            locations: BTreeSet::new(),
        })
        .collect();
    let goal_indices: HashMap<String, usize> = goals
        .iter()
        .enumerate()
        .map(|(i, goal)| (goal.name.clone(), i))
        .collect();
    assign_goal_locations(&rules, &mut goals, &goal_indices)?;

    check_cycles(&rules, &capabilities)?;

    let reward_indices = rewards
        .rewards
        .iter()
        .enumerate()
        .map(|(i, reward)| (reward.name.clone(), i))
        .collect();

    debug!(
        rules = rules.len(),
        goals = goals.len(),
        labels = rewards.labels.len(),
        rewards = rewards.rewards.len(),
        "compiled rule table"
    );

    Ok(RuleTable {
        rules,
        rule_indices,
        goals,
        goal_indices,
        labels: rewards.labels.clone(),
        rewards: rewards.rewards.clone(),
        reward_indices,
        capabilities,
    })
}

/// Expand multi-location rules into a flag-less base rule followed by
/// numbered copies that carry the flags.
///
/// Also returns, per source rule, the index of its first expanded entry, and
/// per source position (including one past the end), the matching expanded
/// position so goal boundaries can be remapped.
fn expand(rules: &[Rule]) -> (Vec<Expanded<'_>>, Vec<usize>, Vec<usize>) {
    let mut expanded = Vec::with_capacity(rules.len());
    let mut first_index = Vec::with_capacity(rules.len());
    let mut ends = Vec::with_capacity(rules.len() + 1);

    for rule in rules {
        ends.push(expanded.len());
        first_index.push(expanded.len());
        if rule.flags.iter().any(|(flag, _)| flag.is_multi_location()) {
            expanded.push(Expanded {
                name: rule.name.clone(),
                flags: Flags::new(),
                source: rule,
                copy: None,
            });
            for n in 1..=MULTI_LOCATION_COPIES {
                expanded.push(Expanded {
                    name: format!("{} {n}", rule.name),
                    flags: rule.flags.clone(),
                    source: rule,
                    copy: Some(n),
                });
            }
        } else {
            expanded.push(Expanded {
                name: rule.name.clone(),
                flags: rule.flags.clone(),
                source: rule,
                copy: None,
            });
        }
    }
    ends.push(expanded.len());

    (expanded, first_index, ends)
}

/// Goal names are unique, and each marker closes at or after the one before
/// it, within the rule list.
fn check_goal_markers(parsed: &ParsedRules) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    let mut previous_end = 0;
    for marker in &parsed.goals {
        if !seen.insert(marker.name.as_str()) {
            return Err(CompileError::DuplicateGoal {
                goal: marker.name.clone(),
            });
        }
        if marker.end > parsed.rules.len() {
            return Err(CompileError::GoalOutOfRange {
                goal: marker.name.clone(),
                end: marker.end,
            });
        }
        if marker.end < previous_end {
            return Err(CompileError::GoalOrder {
                goal: marker.name.clone(),
            });
        }
        previous_end = marker.end;
    }
    Ok(())
}

/// Label names are unique, every label entry names a declared reward, and
/// every reward belongs to a label.
fn check_labels(rewards: &ParsedRewards) -> Result<(), CompileError> {
    let declared: HashSet<&str> = rewards.rewards.iter().map(|r| r.name.as_str()).collect();
    let mut labels = HashSet::new();
    let mut labeled = HashSet::new();
    for label in &rewards.labels {
        if !labels.insert(label.name.as_str()) {
            return Err(CompileError::DuplicateLabel {
                label: label.name.clone(),
            });
        }
        for reward in &label.rewards {
            if !declared.contains(reward.as_str()) {
                return Err(CompileError::UndefinedReward {
                    label: label.name.clone(),
                    reward: reward.clone(),
                });
            }
            labeled.insert(reward.as_str());
        }
    }
    if let Some(reward) = rewards
        .rewards
        .iter()
        .find(|reward| !labeled.contains(reward.name.as_str()))
    {
        return Err(CompileError::UnlabeledReward {
            reward: reward.name.clone(),
        });
    }
    Ok(())
}

fn check_duplicates(rules: &[Expanded<'_>]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.name.as_str()) {
            return Err(CompileError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
    }
    Ok(())
}

fn compile_group(
    sign: bool,
    operator: Option<Operator>,
    conditions: &[Condition],
    rule_name: &str,
    rule_indices: &HashMap<String, usize>,
) -> Result<CompiledCondition, CompileError> {
    let conditions = conditions
        .iter()
        .map(|cond| compile_condition(cond, rule_name, rule_indices))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CompiledCondition {
        sign,
        kind: CompiledKind::Group {
            operator,
            conditions,
        },
    })
}

/// Resolve one condition against the rule table, checking every reference.
pub(crate) fn compile_condition(
    condition: &Condition,
    rule_name: &str,
    rule_indices: &HashMap<String, usize>,
) -> Result<CompiledCondition, CompileError> {
    let kind = match &condition.kind {
        ConditionKind::Item { name, quantity } => {
            let Some(&rule) = rule_indices.get(name) else {
                return Err(CompileError::UndefinedItem {
                    rule: rule_name.to_owned(),
                    reference: name.clone(),
                });
            };
            CompiledKind::Item {
                rule,
                quantity: *quantity,
            }
        }
        ConditionKind::Location(name) => {
            let Some(&rule) = rule_indices.get(name) else {
                return Err(CompileError::UndefinedLocation {
                    rule: rule_name.to_owned(),
                    reference: name.clone(),
                });
            };
            CompiledKind::Location(rule)
        }
        ConditionKind::Function { name, argument } => {
            let Some(builtin) = Builtin::from_name(name) else {
                return Err(CompileError::UndefinedFunction {
                    rule: rule_name.to_owned(),
                    function: name.clone(),
                });
            };
            if builtin.takes_number() && !matches!(argument, Some(Argument::Number(_))) {
                return Err(CompileError::BadArgument {
                    rule: rule_name.to_owned(),
                    function: name.clone(),
                });
            }
            CompiledKind::Function {
                builtin,
                argument: argument.clone(),
            }
        }
        ConditionKind::Group {
            operator,
            conditions,
        } => {
            return compile_group(
                condition.sign,
                *operator,
                conditions,
                rule_name,
                rule_indices,
            )
        }
    };
    Ok(CompiledCondition {
        sign: condition.sign,
        kind,
    })
}

/// Item names must be unique across rules and rewards.
fn check_items(rules: &[Rule], rewards: &ParsedRewards) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    let items = rules
        .iter()
        .filter_map(|rule| rule.item_name().map(|item| (item, rule.line)))
        .chain(rewards.rewards.iter().map(|r| (r.name.as_str(), r.line)));
    for (item, line) in items {
        if !seen.insert(item) {
            return Err(CompileError::DuplicateItem {
                item: item.to_owned(),
                line,
            });
        }
    }
    Ok(())
}

fn numeric_flag(rule: &Rule, flag: Flag) -> Result<Option<u64>, CompileError> {
    match rule.flags.get(flag) {
        None => Ok(None),
        Some(FlagValue::Number(n)) => Ok(Some(*n)),
        Some(_) => Err(CompileError::BadFlagValue {
            rule: rule.name.clone(),
            flag: flag.name().to_owned(),
        }),
    }
}

/// Build the capability tables from source rules, pointing at each rule's
/// first expanded entry.
fn collect_capabilities(
    rules: &[Rule],
    first_index: &[usize],
) -> Result<Capabilities, CompileError> {
    let mut caps = Capabilities::default();
    for (rule, &idx) in rules.iter().zip(first_index) {
        if rule.flags.contains(Flag::Npc) {
            caps.npcs.push(idx);
        }
        if rule.flags.contains(Flag::MechBoss) {
            caps.mech_bosses.push(idx);
        }
        if rule.flags.contains(Flag::FinalBoss) {
            caps.final_bosses.push(idx);
        }
        let valued = [
            (Flag::Pickaxe, &mut caps.pickaxes),
            (Flag::Hammer, &mut caps.hammers),
            (Flag::WeaponPower, &mut caps.weapons),
            (Flag::ArmorPower, &mut caps.armor),
            (Flag::AccessoryPower, &mut caps.accessories),
            (Flag::ArmorMinions, &mut caps.armor_minions),
            (Flag::Minions, &mut caps.accessory_minions),
        ];
        for (flag, table) in valued {
            if let Some(value) = numeric_flag(rule, flag)? {
                table.push((idx, value));
            }
        }
    }
    Ok(caps)
}

fn assign_goal_locations(
    rules: &[CompiledRule],
    goals: &mut [Goal],
    goal_indices: &HashMap<String, usize>,
) -> Result<(), CompileError> {
    for rule in rules {
        if let Some(value) = rule.flags.get(Flag::Goal) {
            let goal = match value {
                FlagValue::Text(name) => name.clone(),
                FlagValue::Number(n) => n.to_string(),
                FlagValue::None => goal_slug(&rule.name),
            };
            let Some(&idx) = goal_indices.get(&goal) else {
                return Err(CompileError::UndefinedGoal {
                    rule: rule.name.clone(),
                    goal,
                });
            };
            goals[idx].locations.insert(rule.name.clone());
        }

        let bucket = if rule.flags.contains(Flag::MechBoss) {
            goal_indices.get(MECH_BOSS_GOAL)
        } else if rule.flags.contains(Flag::FinalBoss) {
            goal_indices.get(FINAL_BOSS_GOAL)
        } else {
            None
        };
        if let Some(&idx) = bucket {
            goals[idx].locations.insert(rule.name.clone());
        }
    }
    Ok(())
}

/// Indices of every rule a tree refers to, items and locations alike.
pub(crate) fn collect_references(cond: &CompiledCondition, out: &mut Vec<usize>) {
    match &cond.kind {
        CompiledKind::Item { rule, .. } | CompiledKind::Location(rule) => out.push(*rule),
        CompiledKind::Function { .. } => {}
        CompiledKind::Group { conditions, .. } => {
            for child in conditions {
                collect_references(child, out);
            }
        }
    }
}

/// Rules whose trees evaluating `cond` descends into: location targets, and
/// every gear power group when `@gear_power` appears.
fn collect_descents(cond: &CompiledCondition, caps: &Capabilities, out: &mut Vec<usize>) {
    match &cond.kind {
        CompiledKind::Location(rule) => out.push(*rule),
        CompiledKind::Function {
            builtin: Builtin::GearPower,
            ..
        } => {
            for table in caps.power_tables() {
                out.extend(table.iter().map(|&(idx, _)| idx));
            }
        }
        CompiledKind::Item { .. } | CompiledKind::Function { .. } => {}
        CompiledKind::Group { conditions, .. } => {
            for child in conditions {
                collect_descents(child, caps, out);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

/// Reject descents that loop back on themselves, so evaluation always
/// terminates.
pub(crate) fn check_cycles(rules: &[CompiledRule], caps: &Capabilities) -> Result<(), CompileError> {
    let adj: Vec<Vec<usize>> = rules
        .iter()
        .map(|rule| {
            let mut out = Vec::new();
            collect_descents(&rule.tree, caps, &mut out);
            out
        })
        .collect();

    let mut state = vec![DfsState::Unvisited; rules.len()];
    let mut stack = Vec::new();
    for start in 0..rules.len() {
        if state[start] == DfsState::Unvisited {
            if let Some(cycle) = dfs(start, &adj, &mut state, &mut stack) {
                return Err(CompileError::CyclicDependency {
                    path: cycle
                        .into_iter()
                        .map(|idx| rules[idx].name.clone())
                        .collect(),
                });
            }
        }
    }
    Ok(())
}

fn dfs(
    node: usize,
    adj: &[Vec<usize>],
    state: &mut [DfsState],
    stack: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    state[node] = DfsState::InStack;
    stack.push(node);

    for &neighbor in &adj[node] {
        match state[neighbor] {
            DfsState::InStack => {
                let pos = stack.iter().position(|&n| n == neighbor).unwrap_or(0);
                let mut cycle = stack[pos..].to_vec();
                cycle.push(neighbor);
                return Some(cycle);
            }
            DfsState::Unvisited => {
                if let Some(cycle) = dfs(neighbor, adj, state, stack) {
                    return Some(cycle);
                }
            }
            DfsState::Done => {}
        }
    }

    stack.pop();
    state[node] = DfsState::Done;
    None
}
