use crate::options::Options;
use crate::types::{
    Argument, Builtin, CollectionState, CompiledCondition, CompiledKind, EvalError, Operator,
    Session,
};

/// Fold already-computed child results under a group's operator.
///
/// With no operator, an empty group holds and a single child passes through;
/// two or more children without an operator are an error.
///
/// # Errors
///
/// Returns [`EvalError::AmbiguousOperator`] for several results and no
/// operator.
pub fn combine(operator: Option<Operator>, results: &[bool]) -> Result<bool, EvalError> {
    match (operator, results) {
        (None, []) => Ok(true),
        (None, [only]) => Ok(*only),
        (None, _) => Err(EvalError::AmbiguousOperator {
            count: results.len(),
        }),
        (Some(Operator::And), _) => Ok(results.iter().all(|&r| r)),
        (Some(Operator::Or), _) => Ok(results.iter().any(|&r| r)),
    }
}

pub(crate) fn evaluate<S: CollectionState + ?Sized>(
    session: &Session<'_>,
    condition: &CompiledCondition,
    state: &S,
) -> Result<bool, EvalError> {
    let value = match &condition.kind {
        CompiledKind::Item { rule, quantity } => state.has(session.resolved_name(*rule), *quantity),
        CompiledKind::Location(rule) => {
            evaluate(session, &session.table().rules[*rule].tree, state)?
        }
        CompiledKind::Function { builtin, argument } => {
            call(session, *builtin, argument.as_ref(), state)?
        }
        CompiledKind::Group {
            operator,
            conditions,
        } => evaluate_group(session, *operator, conditions, state)?,
    };
    Ok(condition.sign == value)
}

/// Same folding as [`combine`], short-circuiting on the first decisive child.
fn evaluate_group<S: CollectionState + ?Sized>(
    session: &Session<'_>,
    operator: Option<Operator>,
    conditions: &[CompiledCondition],
    state: &S,
) -> Result<bool, EvalError> {
    match operator {
        None => match conditions {
            [] => Ok(true),
            [only] => evaluate(session, only, state),
            _ => Err(EvalError::AmbiguousOperator {
                count: conditions.len(),
            }),
        },
        Some(Operator::And) => {
            for child in conditions {
                if !evaluate(session, child, state)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Some(Operator::Or) => {
            for child in conditions {
                if evaluate(session, child, state)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn threshold(builtin: Builtin, argument: Option<&Argument>) -> Result<u64, EvalError> {
    match argument {
        Some(Argument::Number(n)) => Ok(*n),
        _ => Err(EvalError::BadArgument {
            function: builtin.name(),
        }),
    }
}

fn call<S: CollectionState + ?Sized>(
    session: &Session<'_>,
    builtin: Builtin,
    argument: Option<&Argument>,
    state: &S,
) -> Result<bool, EvalError> {
    let caps = &session.table().capabilities;
    let held = |idx: usize| state.has(session.resolved_name(idx), 1);
    let count_held = |rules: &[usize]| rules.iter().filter(|&&idx| held(idx)).count() as u64;
    let any_power = |table: &[(usize, u64)], n: u64| {
        table.iter().any(|&(idx, power)| power >= n && held(idx))
    };

    let options: &Options = session.options();
    let value = match builtin {
        Builtin::Npc => count_held(&caps.npcs) >= threshold(builtin, argument)?,
        Builtin::MechBoss => count_held(&caps.mech_bosses) >= threshold(builtin, argument)?,
        Builtin::Pickaxe => any_power(&caps.pickaxes, threshold(builtin, argument)?),
        Builtin::Hammer => any_power(&caps.hammers, threshold(builtin, argument)?),
        Builtin::Minions => {
            let n = threshold(builtin, argument)?;
            let armor = caps
                .armor_minions
                .iter()
                .filter(|&&(idx, _)| held(idx))
                .map(|&(_, bonus)| bonus.saturating_add(1))
                .fold(1, u64::max);
            let accessories = caps
                .accessory_minions
                .iter()
                .filter(|&&(idx, _)| held(idx))
                .fold(0_u64, |sum, &(_, bonus)| sum.saturating_add(bonus));
            armor.saturating_add(accessories) >= n
        }
        Builtin::GearPower => {
            let n = threshold(builtin, argument)?;
            !options.require_optimal_gear || gear_adequate(session, n, state)?
        }
        Builtin::Calamity => options.calamity,
        Builtin::BiomeLocks => options.biome_locks,
        Builtin::ExtraChecks => options.extra_checks(),
        Builtin::Grindy => options.grindy_achievements,
        Builtin::Getfixedboi => options.getfixedboi,
        Builtin::RequireBootsJumpHook => options.require_boots_jump_hook,
        Builtin::RequireWings => options.require_wings,
    };
    Ok(value)
}

/// Every gear table needs one class-acceptable group of at least `n` power
/// whose conditions hold.
fn gear_adequate<S: CollectionState + ?Sized>(
    session: &Session<'_>,
    n: u64,
    state: &S,
) -> Result<bool, EvalError> {
    let table = session.table();
    for gear in table.capabilities.power_tables() {
        let mut adequate = false;
        for &(idx, power) in gear {
            if power < n || !session.flag_table().class_acceptable(table.flags_of(idx)) {
                continue;
            }
            if evaluate(session, &table.rules[idx].tree, state)? {
                adequate = true;
                break;
            }
        }
        if !adequate {
            return Ok(false);
        }
    }
    Ok(true)
}
