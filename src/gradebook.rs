//! Gradebook report grid: marks pivoted into date columns and student rows.

use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRecord {
    pub date: NaiveDate,
    pub mark: String,
}

/// One student's entries for the selected subject, in store order.
#[derive(Debug, Clone)]
pub struct StudentMarks {
    pub label: String,
    pub entries: Vec<MarkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub label: String,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportGrid {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ReportRow>,
}

/// Display label used in the grid: last name followed by the first-name
/// initial written twice, e.g. `Ivanov I.I.`.
pub fn student_label(last_name: &str, first_name: &str) -> String {
    match first_name.chars().next() {
        Some(initial) => format!("{} {}.{}.", last_name, initial, initial),
        None => last_name.to_string(),
    }
}

/// Pivots per-student entries into a rectangular grid.
///
/// Columns are the distinct entry dates in ascending order. Each row has
/// exactly one slot per column; slots without an entry stay blank. When a
/// student has several entries on the same date, the later one wins.
pub fn build_grid(students: &[StudentMarks]) -> ReportGrid {
    let dates: Vec<NaiveDate> = students
        .iter()
        .flat_map(|s| s.entries.iter().map(|e| e.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = students
        .iter()
        .map(|s| {
            let mut marks = vec![String::new(); dates.len()];
            for entry in &s.entries {
                if let Ok(idx) = dates.binary_search(&entry.date) {
                    marks[idx] = entry.mark.clone();
                }
            }
            ReportRow {
                label: s.label.clone(),
                marks,
            }
        })
        .collect();

    ReportGrid { dates, rows }
}

/// Reads the group's students and their entries for `subject_id` and
/// pivots them. Returns an empty grid unless both ids are given.
pub fn load_grid(
    conn: &Connection,
    group_id: Option<i64>,
    subject_id: Option<i64>,
) -> rusqlite::Result<ReportGrid> {
    let (Some(group_id), Some(subject_id)) = (group_id, subject_id) else {
        return Ok(ReportGrid::default());
    };

    let mut students_stmt = conn.prepare(
        "SELECT id, last_name, first_name
         FROM students
         WHERE group_id = ?
         ORDER BY id",
    )?;
    let selected = students_stmt
        .query_map([group_id], |r| {
            let id: i64 = r.get(0)?;
            let last: String = r.get(1)?;
            let first: String = r.get(2)?;
            Ok((id, student_label(&last, &first)))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut entries_stmt = conn.prepare(
        "SELECT date, mark
         FROM gradebook
         WHERE student_id = ? AND subject_id = ?
         ORDER BY id",
    )?;
    let mut students = Vec::with_capacity(selected.len());
    for (student_id, label) in selected {
        let entries = entries_stmt
            .query_map((student_id, subject_id), |r| {
                Ok(MarkRecord {
                    date: r.get(0)?,
                    mark: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        students.push(StudentMarks { label, entries });
    }

    Ok(build_grid(&students))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    fn rec(date: &str, mark: &str) -> MarkRecord {
        MarkRecord {
            date: d(date),
            mark: mark.to_string(),
        }
    }

    fn student(label: &str, entries: Vec<MarkRecord>) -> StudentMarks {
        StudentMarks {
            label: label.to_string(),
            entries,
        }
    }

    #[test]
    fn label_repeats_first_initial() {
        assert_eq!(student_label("Ivanov", "Ivan"), "Ivanov I.I.");
        assert_eq!(student_label("Петров", "Сергей"), "Петров С.С.");
        assert_eq!(student_label("Solo", ""), "Solo");
    }

    #[test]
    fn one_marked_and_one_blank_student() {
        let grid = build_grid(&[
            student("A", vec![rec("2024-01-01", "5")]),
            student("B", vec![]),
        ]);
        assert_eq!(grid.dates, vec![d("2024-01-01")]);
        assert_eq!(
            grid.rows,
            vec![
                ReportRow {
                    label: "A".into(),
                    marks: vec!["5".into()]
                },
                ReportRow {
                    label: "B".into(),
                    marks: vec!["".into()]
                },
            ]
        );
    }

    #[test]
    fn no_entries_gives_no_columns_and_blank_rows() {
        let grid = build_grid(&[student("A", vec![]), student("B", vec![])]);
        assert!(grid.dates.is_empty());
        assert_eq!(grid.rows.len(), 2);
        assert!(grid.rows.iter().all(|r| r.marks.is_empty()));
    }

    #[test]
    fn dates_are_deduplicated_and_sorted_across_students() {
        let grid = build_grid(&[
            student("A", vec![rec("2024-03-01", "4"), rec("2024-01-15", "5")]),
            student("B", vec![rec("2024-01-15", "3"), rec("2024-02-10", "2")]),
        ]);
        assert_eq!(
            grid.dates,
            vec![d("2024-01-15"), d("2024-02-10"), d("2024-03-01")]
        );
        assert_eq!(grid.rows[0].marks, vec!["5", "", "4"]);
        assert_eq!(grid.rows[1].marks, vec!["3", "2", ""]);
    }

    #[test]
    fn duplicate_date_overwrites_slot() {
        let grid = build_grid(&[student(
            "A",
            vec![rec("2024-01-01", "3"), rec("2024-01-01", "5")],
        )]);
        assert_eq!(grid.dates.len(), 1);
        assert_eq!(grid.rows[0].marks, vec!["5"]);
    }

    #[test]
    fn build_is_deterministic() {
        let input = vec![
            student("A", vec![rec("2024-02-01", "4"), rec("2024-01-01", "5")]),
            student("B", vec![rec("2024-01-20", "3")]),
        ];
        assert_eq!(build_grid(&input), build_grid(&input));
    }
}
