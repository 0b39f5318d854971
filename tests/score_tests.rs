use std::collections::BTreeMap;

use viva::speaking::{TaskNumber, aggregate, convert_raw_to_toefl};

#[test]
fn conversion_table_exactness() {
    assert_eq!(convert_raw_to_toefl(0.0), Some(0.0));
    assert_eq!(convert_raw_to_toefl(5.0), Some(9.0));
    assert_eq!(convert_raw_to_toefl(6.0), Some(11.0));
    assert_eq!(convert_raw_to_toefl(13.0), Some(24.0));
    assert_eq!(convert_raw_to_toefl(16.0), Some(30.0));
}

#[test]
fn fractional_totals_interpolate_between_neighbors() {
    assert_eq!(convert_raw_to_toefl(6.5), Some(12.0));
    assert_eq!(convert_raw_to_toefl(0.5), Some(1.0));
    // Neighbors 23 and 24 average to a half-point value.
    assert_eq!(convert_raw_to_toefl(12.5), Some(23.5));
    assert_eq!(convert_raw_to_toefl(15.5), Some(29.0));
}

#[test]
fn out_of_domain_totals_are_unresolvable() {
    assert_eq!(convert_raw_to_toefl(17.0), None);
    assert_eq!(convert_raw_to_toefl(16.5), None);
    assert_eq!(convert_raw_to_toefl(-1.0), None);
    assert_eq!(convert_raw_to_toefl(-0.5), None);
    assert_eq!(convert_raw_to_toefl(f64::NAN), None);
}

#[test]
fn interpolation_does_not_assume_half_steps() {
    // Totals can carry two decimals when per-task scores land on tenths.
    assert_eq!(convert_raw_to_toefl(6.25), Some(12.0));
}

fn task(n: u8) -> TaskNumber {
    TaskNumber::new(n).expect("valid task")
}

#[test]
fn aggregation_sums_across_tasks_with_absences() {
    let mut per_task: BTreeMap<TaskNumber, BTreeMap<String, f64>> = BTreeMap::new();
    per_task.insert(task(1), BTreeMap::from([("mei".to_string(), 3.0)]));
    per_task.insert(task(2), BTreeMap::new());
    per_task.insert(task(3), BTreeMap::from([("mei".to_string(), 2.5)]));
    per_task.insert(task(4), BTreeMap::new());

    let totals = aggregate(&per_task);
    let mei = totals.get("mei").expect("mei present");
    assert_eq!(mei.raw_total, 5.5);
    // (9 + 11) / 2
    assert_eq!(mei.scaled, Some(10.0));
}

#[test]
fn aggregation_keeps_students_separate() {
    let mut per_task: BTreeMap<TaskNumber, BTreeMap<String, f64>> = BTreeMap::new();
    per_task.insert(
        task(1),
        BTreeMap::from([("ana".to_string(), 4.0), ("bo".to_string(), 1.5)]),
    );
    per_task.insert(
        task(2),
        BTreeMap::from([("ana".to_string(), 3.5), ("bo".to_string(), 2.0)]),
    );

    let totals = aggregate(&per_task);
    assert_eq!(totals.len(), 2);
    assert_eq!(totals["ana"].raw_total, 7.5);
    assert_eq!(totals["bo"].raw_total, 3.5);
}

#[test]
fn full_marks_map_to_the_table_ceiling() {
    let mut per_task: BTreeMap<TaskNumber, BTreeMap<String, f64>> = BTreeMap::new();
    for n in 1..=4 {
        per_task.insert(task(n), BTreeMap::from([("ace".to_string(), 4.0)]));
    }

    let totals = aggregate(&per_task);
    assert_eq!(totals["ace"].raw_total, 16.0);
    assert_eq!(totals["ace"].scaled, Some(30.0));
}
