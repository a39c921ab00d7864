//! Problem-data reconciliation.

use crate::error::{Result, SimlogError};
use crate::types::{ProblemData, Value};

/// Merge `incoming` into `current`.
///
/// Shared keys must hold equal values (sequences elementwise, after a length check);
/// new keys are added. All shared keys are checked before anything is inserted, so a
/// conflict leaves `current` untouched.
pub fn reconcile_problem_data(
    current: &mut Option<ProblemData>,
    incoming: Option<&ProblemData>,
) -> Result<()> {
    let Some(incoming) = incoming else {
        return Ok(());
    };
    let Some(existing) = current.as_mut() else {
        *current = Some(incoming.clone());
        return Ok(());
    };

    for (key, new_value) in incoming {
        if let Some(old_value) = existing.get(key) {
            check_same(key, old_value, new_value)?;
        }
    }
    for (key, new_value) in incoming {
        existing
            .entry(key.clone())
            .or_insert_with(|| new_value.clone());
    }
    Ok(())
}

fn check_same(key: &str, previous: &Value, incoming: &Value) -> Result<()> {
    let conflict = |index: Option<usize>, previous: String, incoming: String| {
        tracing::error!(
            target = "simlog::merge",
            key,
            index = ?index,
            previous = %previous,
            incoming = %incoming,
            "problem data doesn't match"
        );
        Err(SimlogError::ProblemDataConflict {
            key: key.to_string(),
            index,
            previous,
            incoming,
        })
    };

    match (previous, incoming) {
        (Value::Sequence(old), Value::Sequence(new)) => {
            if old.len() != new.len() {
                return conflict(
                    None,
                    format!("{} values", old.len()),
                    format!("{} values", new.len()),
                );
            }
            for (index, (a, b)) in old.iter().zip(new).enumerate() {
                if a != b {
                    return conflict(Some(index), a.to_string(), b.to_string());
                }
            }
            Ok(())
        }
        (old, new) if old == new => Ok(()),
        (old, new) => conflict(None, old.to_string(), new.to_string()),
    }
}
