//! Binary serialization and deserialization of compiled rule tables.
//!
//! This module provides a stable binary format for persisting compiled
//! [`RuleTable`](crate::RuleTable) values, so a host can skip parsing and
//! validation on later runs. The format consists of a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RDSL"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    Argument, Builtin, Capabilities, CompiledCondition, CompiledKind, CompiledRule, Flag,
    FlagValue, Flags, Goal, Label, Operator, Reward, RuleTable,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"RDSL";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleTable`](crate::RuleTable) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule table: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleTable`](crate::RuleTable) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a reachdsl binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedTable {
    metadata: TableMetadata,
    rules: Vec<SerializedRule>,
    goals: Vec<SerializedGoal>,
    labels: Vec<Label>,
    rewards: Vec<Reward>,
    capabilities: SerializedCapabilities,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableMetadata {
    rule_count: usize,
    goal_count: usize,
    reward_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    name: String,
    flags: Vec<(String, SerializedFlagValue)>,
    tree: SerializedCondition,
    item_name: Option<String>,
    line: usize,
    copy: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedFlagValue {
    None,
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedCondition {
    sign: bool,
    kind: SerializedKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedKind {
    Item { rule: usize, quantity: u64 },
    Location(usize),
    Function {
        name: String,
        argument: Option<SerializedArgument>,
    },
    Group {
        operator: Option<SerializedOperator>,
        conditions: Vec<SerializedCondition>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedArgument {
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedOperator {
    And,
    Or,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedGoal {
    name: String,
    end: usize,
    locations: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SerializedCapabilities {
    npcs: Vec<usize>,
    pickaxes: Vec<(usize, u64)>,
    hammers: Vec<(usize, u64)>,
    weapons: Vec<(usize, u64)>,
    armor: Vec<(usize, u64)>,
    accessories: Vec<(usize, u64)>,
    mech_bosses: Vec<usize>,
    final_bosses: Vec<usize>,
    armor_minions: Vec<(usize, u64)>,
    accessory_minions: Vec<(usize, u64)>,
}

// ---------------------------------------------------------------------------
// Operator and flag conversion
// ---------------------------------------------------------------------------

fn serialize_op(op: Operator) -> SerializedOperator {
    match op {
        Operator::And => SerializedOperator::And,
        Operator::Or => SerializedOperator::Or,
    }
}

fn deserialize_op(op: SerializedOperator) -> Operator {
    match op {
        SerializedOperator::And => Operator::And,
        SerializedOperator::Or => Operator::Or,
    }
}

fn serialize_flags(flags: &Flags) -> Vec<(String, SerializedFlagValue)> {
    flags
        .iter()
        .map(|(flag, value)| {
            let value = match value {
                FlagValue::None => SerializedFlagValue::None,
                FlagValue::Text(text) => SerializedFlagValue::Text(text.clone()),
                FlagValue::Number(n) => SerializedFlagValue::Number(*n),
            };
            (flag.name().to_owned(), value)
        })
        .collect()
}

fn deserialize_flags(
    rule: &str,
    entries: Vec<(String, SerializedFlagValue)>,
) -> Result<Flags, DeserializeError> {
    let mut flags = Flags::new();
    for (name, value) in entries {
        let Some(flag) = Flag::from_name(&name) else {
            return Err(DeserializeError::Validation(format!(
                "rule '{rule}' has unknown flag '{name}'"
            )));
        };
        let value = match value {
            SerializedFlagValue::None => FlagValue::None,
            SerializedFlagValue::Text(text) => FlagValue::Text(text),
            SerializedFlagValue::Number(n) => FlagValue::Number(n),
        };
        if !flags.insert(flag, value) {
            return Err(DeserializeError::Validation(format!(
                "rule '{rule}' repeats flag '{name}'"
            )));
        }
    }
    Ok(flags)
}

// ---------------------------------------------------------------------------
// Condition conversion
// ---------------------------------------------------------------------------

fn serialize_condition(condition: &CompiledCondition) -> SerializedCondition {
    let kind = match &condition.kind {
        CompiledKind::Item { rule, quantity } => SerializedKind::Item {
            rule: *rule,
            quantity: *quantity,
        },
        CompiledKind::Location(rule) => SerializedKind::Location(*rule),
        CompiledKind::Function { builtin, argument } => SerializedKind::Function {
            name: builtin.name().to_owned(),
            argument: argument.as_ref().map(|arg| match arg {
                Argument::Text(text) => SerializedArgument::Text(text.clone()),
                Argument::Number(n) => SerializedArgument::Number(*n),
            }),
        },
        CompiledKind::Group {
            operator,
            conditions,
        } => SerializedKind::Group {
            operator: operator.map(serialize_op),
            conditions: conditions.iter().map(serialize_condition).collect(),
        },
    };
    SerializedCondition {
        sign: condition.sign,
        kind,
    }
}

fn deserialize_condition(
    condition: SerializedCondition,
) -> Result<CompiledCondition, DeserializeError> {
    let kind = match condition.kind {
        SerializedKind::Item { rule, quantity } => CompiledKind::Item { rule, quantity },
        SerializedKind::Location(rule) => CompiledKind::Location(rule),
        SerializedKind::Function { name, argument } => {
            let Some(builtin) = Builtin::from_name(&name) else {
                return Err(DeserializeError::Validation(format!(
                    "unknown function '{name}'"
                )));
            };
            let argument = argument.map(|arg| match arg {
                SerializedArgument::Text(text) => Argument::Text(text),
                SerializedArgument::Number(n) => Argument::Number(n),
            });
            if builtin.takes_number() && !matches!(argument, Some(Argument::Number(_))) {
                return Err(DeserializeError::Validation(format!(
                    "function '{name}' is missing its integer argument"
                )));
            }
            CompiledKind::Function { builtin, argument }
        }
        SerializedKind::Group {
            operator,
            conditions,
        } => {
            if operator.is_none() && conditions.len() > 1 {
                return Err(DeserializeError::Validation(format!(
                    "group of {} conditions has no operator",
                    conditions.len()
                )));
            }
            CompiledKind::Group {
                operator: operator.map(deserialize_op),
                conditions: conditions
                    .into_iter()
                    .map(deserialize_condition)
                    .collect::<Result<Vec<_>, _>>()?,
            }
        }
    };
    Ok(CompiledCondition {
        sign: condition.sign,
        kind,
    })
}

// ---------------------------------------------------------------------------
// RuleTable -> SerializedTable
// ---------------------------------------------------------------------------

fn table_to_serialized(table: &RuleTable, source_text: Option<&str>) -> SerializedTable {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    let rules = table
        .rules
        .iter()
        .map(|rule| SerializedRule {
            name: rule.name.clone(),
            flags: serialize_flags(&rule.flags),
            tree: serialize_condition(&rule.tree),
            item_name: rule.item_name.clone(),
            line: rule.line,
            copy: rule.copy,
        })
        .collect();

    let goals = table
        .goals
        .iter()
        .map(|goal| SerializedGoal {
            name: goal.name.clone(),
            end: goal.end,
            locations: goal.locations.iter().cloned().collect(),
        })
        .collect();

    let caps = &table.capabilities;
    SerializedTable {
        metadata: TableMetadata {
            rule_count: table.rules.len(),
            goal_count: table.goals.len(),
            reward_count: table.rewards.len(),
            source_digest,
        },
        rules,
        goals,
        labels: table.labels.clone(),
        rewards: table.rewards.clone(),
        capabilities: SerializedCapabilities {
            npcs: caps.npcs.clone(),
            pickaxes: caps.pickaxes.clone(),
            hammers: caps.hammers.clone(),
            weapons: caps.weapons.clone(),
            armor: caps.armor.clone(),
            accessories: caps.accessories.clone(),
            mech_bosses: caps.mech_bosses.clone(),
            final_bosses: caps.final_bosses.clone(),
            armor_minions: caps.armor_minions.clone(),
            accessory_minions: caps.accessory_minions.clone(),
        },
    }
}

// ---------------------------------------------------------------------------
// SerializedTable -> RuleTable
// ---------------------------------------------------------------------------

fn serialized_to_table(ser: SerializedTable) -> Result<RuleTable, DeserializeError> {
    validate(&ser)?;

    let rules = ser
        .rules
        .into_iter()
        .map(|rule| {
            let flags = deserialize_flags(&rule.name, rule.flags)?;
            Ok(CompiledRule {
                tree: deserialize_condition(rule.tree)?,
                name: rule.name,
                flags,
                item_name: rule.item_name,
                line: rule.line,
                copy: rule.copy,
            })
        })
        .collect::<Result<Vec<_>, DeserializeError>>()?;

    let rule_indices: HashMap<String, usize> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.name.clone(), i))
        .collect();
    if rule_indices.len() != rules.len() {
        return Err(DeserializeError::Validation(
            "rule names are not unique".to_owned(),
        ));
    }

    let goals: Vec<Goal> = ser
        .goals
        .into_iter()
        .map(|goal| Goal {
            name: goal.name,
            end: goal.end,
            locations: goal.locations.into_iter().collect::<BTreeSet<_>>(),
        })
        .collect();
    for goal in &goals {
        if let Some(missing) = goal
            .locations
            .iter()
            .find(|location| !rule_indices.contains_key(*location))
        {
            return Err(DeserializeError::Validation(format!(
                "goal '{}' names unknown location '{missing}'",
                goal.name
            )));
        }
    }
    let goal_indices = goals
        .iter()
        .enumerate()
        .map(|(i, goal)| (goal.name.clone(), i))
        .collect();

    let reward_indices = ser
        .rewards
        .iter()
        .enumerate()
        .map(|(i, reward)| (reward.name.clone(), i))
        .collect();

    let caps = ser.capabilities;
    let capabilities = Capabilities {
        npcs: caps.npcs,
        pickaxes: caps.pickaxes,
        hammers: caps.hammers,
        weapons: caps.weapons,
        armor: caps.armor,
        accessories: caps.accessories,
        mech_bosses: caps.mech_bosses,
        final_bosses: caps.final_bosses,
        armor_minions: caps.armor_minions,
        accessory_minions: caps.accessory_minions,
    };

    crate::compile::check_cycles(&rules, &capabilities)
        .map_err(|err| DeserializeError::Validation(err.to_string()))?;

    Ok(RuleTable {
        rules,
        rule_indices,
        goals,
        goal_indices,
        labels: ser.labels,
        rewards: ser.rewards,
        reward_indices,
        capabilities,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedTable) -> Result<(), DeserializeError> {
    let rule_count = ser.rules.len();

    // Metadata consistency
    if ser.metadata.rule_count != rule_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count, rule_count
        )));
    }
    if ser.metadata.goal_count != ser.goals.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} goals but payload has {}",
            ser.metadata.goal_count,
            ser.goals.len()
        )));
    }
    if ser.metadata.reward_count != ser.rewards.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rewards but payload has {}",
            ser.metadata.reward_count,
            ser.rewards.len()
        )));
    }

    // Rule ref bounds in all trees
    for rule in &ser.rules {
        validate_condition(&rule.tree, rule_count)?;
    }

    // Goal boundaries must be unique, non-decreasing, and in range
    let mut goal_names = HashSet::new();
    let mut previous = 0;
    for goal in &ser.goals {
        if !goal_names.insert(goal.name.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "duplicate goal '{}'",
                goal.name
            )));
        }
        if goal.end > rule_count || goal.end < previous {
            return Err(DeserializeError::Validation(format!(
                "goal '{}' ends at {} (rules: {rule_count}, previous end: {previous})",
                goal.name, goal.end
            )));
        }
        previous = goal.end;
    }

    // Labels are unique and only list known rewards
    let mut label_names = HashSet::new();
    for label in &ser.labels {
        if !label_names.insert(label.name.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "duplicate label '{}'",
                label.name
            )));
        }
        for name in &label.rewards {
            if !ser.rewards.iter().any(|reward| &reward.name == name) {
                return Err(DeserializeError::Validation(format!(
                    "label '{}' lists unknown reward '{name}'",
                    label.name
                )));
            }
        }
    }

    // Capability entries point at rules
    let caps = &ser.capabilities;
    let indices = caps
        .npcs
        .iter()
        .chain(&caps.mech_bosses)
        .chain(&caps.final_bosses)
        .copied()
        .chain(
            [
                &caps.pickaxes,
                &caps.hammers,
                &caps.weapons,
                &caps.armor,
                &caps.accessories,
                &caps.armor_minions,
                &caps.accessory_minions,
            ]
            .into_iter()
            .flatten()
            .map(|&(idx, _)| idx),
        );
    for idx in indices {
        if idx >= rule_count {
            return Err(DeserializeError::Validation(format!(
                "capability entry {idx} out of bounds (max {rule_count})"
            )));
        }
    }

    Ok(())
}

fn validate_condition(
    condition: &SerializedCondition,
    rule_count: usize,
) -> Result<(), DeserializeError> {
    match &condition.kind {
        SerializedKind::Item { rule, .. } | SerializedKind::Location(rule) => {
            if *rule >= rule_count {
                return Err(DeserializeError::Validation(format!(
                    "rule ref {rule} out of bounds (max {rule_count})"
                )));
            }
            Ok(())
        }
        SerializedKind::Function { .. } => Ok(()),
        SerializedKind::Group { conditions, .. } => {
            for child in conditions {
                validate_condition(child, rule_count)?;
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

/// The fixed 32-byte prefix of every blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    format_version: u16,
    payload_len: u32,
    checksum: [u8; 16],
}

impl Header {
    fn for_payload(payload: &[u8]) -> Self {
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&blake3::hash(payload).as_bytes()[..16]);
        #[allow(clippy::cast_possible_truncation)] // tables stay far below 4 GiB
        let payload_len = payload.len() as u32;
        Self {
            format_version: FORMAT_VERSION,
            payload_len,
            checksum,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.format_version.to_le_bytes());
        buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&self.payload_len.to_le_bytes());
        buf.extend_from_slice(&self.checksum);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_from(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(DeserializeError::LengthMismatch {
                expected: HEADER_SIZE as u32,
                actual: bytes.len(),
            });
        };
        if &header[..4] != MAGIC {
            return Err(DeserializeError::BadMagic);
        }
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&header[16..]);
        Ok(Self {
            format_version: u16::from_le_bytes([header[4], header[5]]),
            // 6..8 engine version, 8..12 reserved
            payload_len: u32::from_le_bytes([header[12], header[13], header[14], header[15]]),
            checksum,
        })
    }
}

/// Check the header of `bytes` and return the verified payload.
fn verified_payload(bytes: &[u8]) -> Result<&[u8], DeserializeError> {
    let header = Header::read_from(bytes)?;
    if header.format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: header.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let end = HEADER_SIZE + header.payload_len as usize;
    let Some(payload) = bytes.get(HEADER_SIZE..end) else {
        return Err(DeserializeError::LengthMismatch {
            expected: header.payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    };
    if blake3::hash(payload).as_bytes()[..16] != header.checksum {
        return Err(DeserializeError::ChecksumMismatch);
    }
    Ok(payload)
}

fn decode_payload(bytes: &[u8]) -> Result<SerializedTable, DeserializeError> {
    let payload = verified_payload(bytes)?;
    let (table, _) = bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(table)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(table: &RuleTable, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
    let serialized = table_to_serialized(table, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut blob = Vec::with_capacity(HEADER_SIZE + payload.len());
    Header::for_payload(&payload).write_to(&mut blob);
    blob.extend(payload);
    Ok(blob)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleTable, DeserializeError> {
    serialized_to_table(decode_payload(bytes)?)
}

/// The BLAKE3 digest of the source text a blob was built from, if recorded.
///
/// # Errors
///
/// Returns [`DeserializeError`] if the header or payload is damaged.
pub fn source_digest(bytes: &[u8]) -> Result<Option<[u8; 32]>, DeserializeError> {
    Ok(decode_payload(bytes)?.metadata.source_digest)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
