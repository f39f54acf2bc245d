use crate::SplitError;
use ssv_types::{OperatorId, MAX_OPERATORS};
use std::collections::HashSet;

/// Obtains the maximum number of faulty operators a committee of this size can tolerate
pub fn get_f(operator_count: usize) -> usize {
    operator_count.saturating_sub(1) / 3
}

/// Number of shares required to reconstruct the key, `2f+1` for a `3f+1` committee
pub fn threshold(operator_count: usize) -> usize {
    operator_count - get_f(operator_count)
}

// Perform basic verification on the operator set before splitting
pub fn validate_operator_ids(operator_ids: &[OperatorId]) -> Result<(), SplitError> {
    let num_operators = operator_ids.len();

    // make sure there is a valid number of operators
    if num_operators > MAX_OPERATORS {
        return Err(SplitError::InvalidOperatorCount(format!(
            "Validator has too many operators: {}",
            num_operators
        )));
    }
    if num_operators == 0 {
        return Err(SplitError::InvalidOperatorCount(
            "Validator has no operators".to_string(),
        ));
    }

    // evaluating the polynomial at zero would reveal the secret
    if let Some(id) = operator_ids.iter().find(|id| ***id == 0) {
        return Err(SplitError::InvalidOperatorId(*id));
    }

    // make sure there are no duplicates
    let mut seen = HashSet::new();
    if let Some(id) = operator_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(SplitError::DuplicateOperator(*id));
    }

    Ok(())
}

// Verify the operator set forms a committee the network accepts for registration
pub fn validate_committee(operator_ids: &[OperatorId]) -> Result<(), SplitError> {
    validate_operator_ids(operator_ids)?;

    // make sure count is valid
    let num_operators = operator_ids.len();
    let f = get_f(num_operators);
    if (num_operators - 1) % 3 != 0 || !(1..=4).contains(&f) {
        return Err(SplitError::InvalidOperatorCount(format!(
            "Given {} operators. Cannot build a 3f+1 quorum",
            num_operators
        )));
    }

    Ok(())
}
