#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Cross-task score aggregation and the raw-to-scaled conversion table.

use std::collections::BTreeMap;

use super::TaskNumber;

/// Scaled-score values for integer raw totals `0..=16`.
///
/// This reproduces the published speaking-section conversion standard; any
/// deviation from these values is a correctness bug, not a tuning choice.
const CONVERSION_TABLE: [f64; 17] = [
    0.0, 2.0, 4.0, 6.0, 8.0, 9.0, 11.0, 13.0, 15.0, 17.0, 19.0, 21.0, 23.0, 24.0, 26.0, 28.0,
    30.0,
];

/// Converts a raw score total to the scaled score.
///
/// Integer totals index the table directly. A fractional total takes the
/// arithmetic mean of the `floor` and `floor + 1` entries when both lie in
/// the table's domain. Anything else is unresolvable: the result is `None`,
/// never an extrapolation and never zero.
pub fn convert_raw_to_toefl(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }

    if raw.fract() == 0.0 {
        return CONVERSION_TABLE.get(raw as usize).copied();
    }

    let lower = raw.floor() as usize;
    match (CONVERSION_TABLE.get(lower), CONVERSION_TABLE.get(lower + 1)) {
        (Some(below), Some(above)) => Some((below + above) / 2.0),
        _ => None,
    }
}

/// One student's totals across all tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentTotal {
    /// Sum of per-task overall scores; tasks without a record contribute
    /// zero.
    pub raw_total: f64,
    /// Scaled score derived from the conversion table, or `None` when the
    /// total falls outside its domain.
    pub scaled:    Option<f64>,
}

/// Reduces per-task overall scores into per-student totals.
///
/// A student appearing in at least one task gets a total; absence from a
/// task is a valid state (no submission) and contributes zero. The input is
/// never mutated.
pub fn aggregate(
    per_task: &BTreeMap<TaskNumber, BTreeMap<String, f64>>,
) -> BTreeMap<String, StudentTotal> {
    let mut raw_totals: BTreeMap<String, f64> = BTreeMap::new();
    for task_scores in per_task.values() {
        for (student, overall) in task_scores {
            *raw_totals.entry(student.clone()).or_insert(0.0) += overall;
        }
    }

    raw_totals
        .into_iter()
        .map(|(student, raw_total)| {
            let scaled = convert_raw_to_toefl(raw_total);
            (student, StudentTotal { raw_total, scaled })
        })
        .collect()
}
