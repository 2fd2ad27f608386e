use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub name: String,
    pub capacity: u32,
}

impl Classroom {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// Fill rooms in declared order up to capacity.
    #[default]
    Sequential,
    /// Split by capacity share; the last room takes the remainder.
    Proportional,
}

impl AllocationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationMode::Sequential => "sequential",
            AllocationMode::Proportional => "proportional",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sequential" | "fixed" => Some(AllocationMode::Sequential),
            "proportional" => Some(AllocationMode::Proportional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomAssignment {
    pub classroom: Classroom,
    pub student_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub rooms: Vec<RoomAssignment>,
    /// Only ever non-empty for sequential-fill when the roster exceeds total capacity.
    pub unassigned: Vec<String>,
}

impl Assignment {
    pub fn assigned_count(&self) -> usize {
        self.rooms.iter().map(|r| r.student_ids.len()).sum()
    }
}

pub fn total_capacity(classrooms: &[Classroom]) -> u64 {
    classrooms.iter().map(|c| u64::from(c.capacity)).sum()
}

pub fn validate_classrooms(classrooms: &[Classroom]) -> Result<(), PlanError> {
    if classrooms.is_empty() {
        return Err(PlanError::validation("at least one classroom is required"));
    }
    let mut names: HashSet<&str> = HashSet::new();
    for (i, c) in classrooms.iter().enumerate() {
        let name = c.name.trim();
        if name.is_empty() {
            return Err(PlanError::validation(format!(
                "classroom {} has an empty name",
                i + 1
            )));
        }
        if c.capacity == 0 {
            return Err(PlanError::validation(format!(
                "classroom {} must have a capacity of at least 1",
                name
            )));
        }
        if !names.insert(name) {
            return Err(PlanError::validation(format!(
                "duplicate classroom name: {}",
                name
            )));
        }
    }
    Ok(())
}

/// Partitions an already-shuffled roster across the classrooms.
pub fn allocate(
    roster: &[String],
    classrooms: &[Classroom],
    mode: AllocationMode,
) -> Result<Assignment, PlanError> {
    validate_classrooms(classrooms)?;
    let counts = match mode {
        AllocationMode::Sequential => sequential_counts(roster.len(), classrooms),
        AllocationMode::Proportional => proportional_counts(roster.len(), classrooms),
    };

    let mut rooms = Vec::with_capacity(classrooms.len());
    let mut index = 0usize;
    for (classroom, count) in classrooms.iter().zip(counts) {
        rooms.push(RoomAssignment {
            classroom: classroom.clone(),
            student_ids: roster[index..index + count].to_vec(),
        });
        index += count;
    }

    Ok(Assignment {
        rooms,
        unassigned: roster[index..].to_vec(),
    })
}

fn sequential_counts(n: usize, classrooms: &[Classroom]) -> Vec<usize> {
    let mut remaining = n;
    classrooms
        .iter()
        .map(|c| {
            let take = remaining.min(c.capacity as usize);
            remaining -= take;
            take
        })
        .collect()
}

/// round_half_up(n * capacity / total) in integers: floor((2 * n * capacity + total) / (2 * total)).
fn proportional_counts(n: usize, classrooms: &[Classroom]) -> Vec<usize> {
    let total = total_capacity(classrooms);
    let last = classrooms.len() - 1;
    let mut remaining = n;
    let mut counts = Vec::with_capacity(classrooms.len());
    for (i, c) in classrooms.iter().enumerate() {
        let take = if i == last {
            remaining
        } else {
            let share = (2 * n as u64 * u64::from(c.capacity) + total) / (2 * total);
            remaining.min(share as usize)
        };
        remaining -= take;
        counts.push(take);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}", 1000 + i)).collect()
    }

    #[test]
    fn sequential_leaves_overflow_unassigned() {
        let rooms = vec![Classroom::new("A", 4), Classroom::new("B", 4)];
        let a = allocate(&roster(10), &rooms, AllocationMode::Sequential).expect("allocate");
        let sizes: Vec<(&str, usize)> = a
            .rooms
            .iter()
            .map(|r| (r.classroom.name.as_str(), r.student_ids.len()))
            .collect();
        assert_eq!(sizes, vec![("A", 4), ("B", 4)]);
        assert_eq!(a.unassigned, vec!["1009", "1010"]);
    }

    #[test]
    fn sequential_under_capacity_leaves_trailing_rooms_empty() {
        let rooms = vec![
            Classroom::new("A", 3),
            Classroom::new("B", 3),
            Classroom::new("C", 3),
        ];
        let a = allocate(&roster(4), &rooms, AllocationMode::Sequential).expect("allocate");
        let sizes: Vec<usize> = a.rooms.iter().map(|r| r.student_ids.len()).collect();
        assert_eq!(sizes, vec![3, 1, 0]);
        assert!(a.unassigned.is_empty());
    }

    #[test]
    fn proportional_rounds_half_up_and_last_absorbs() {
        // 5 * 1/2 = 2.5 rounds up to 3; the last room takes the rest.
        let rooms = vec![Classroom::new("A", 10), Classroom::new("B", 10)];
        let a = allocate(&roster(5), &rooms, AllocationMode::Proportional).expect("allocate");
        assert_eq!(a.rooms[0].student_ids.len(), 3);
        assert_eq!(a.rooms[1].student_ids.len(), 2);
    }

    #[test]
    fn proportional_clamps_when_rounding_overshoots() {
        let rooms: Vec<Classroom> = (0..6).map(|i| Classroom::new(format!("R{}", i), 1)).collect();
        let a = allocate(&roster(3), &rooms, AllocationMode::Proportional).expect("allocate");
        let sizes: Vec<usize> = a.rooms.iter().map(|r| r.student_ids.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 0, 0, 0]);
        assert_eq!(a.assigned_count(), 3);
    }

    #[test]
    fn proportional_never_drops_over_capacity() {
        let rooms = vec![Classroom::new("A", 2), Classroom::new("B", 2)];
        let a = allocate(&roster(9), &rooms, AllocationMode::Proportional).expect("allocate");
        assert_eq!(a.assigned_count(), 9);
        assert!(a.unassigned.is_empty());
    }

    #[test]
    fn invalid_classrooms_are_rejected() {
        let r = roster(3);
        assert!(allocate(&r, &[], AllocationMode::Proportional).is_err());
        assert!(allocate(&r, &[Classroom::new("A", 0)], AllocationMode::Sequential).is_err());
        assert!(allocate(&r, &[Classroom::new("  ", 3)], AllocationMode::Sequential).is_err());
        let dup = vec![Classroom::new("A", 1), Classroom::new("A", 2)];
        assert!(matches!(
            allocate(&r, &dup, AllocationMode::Sequential),
            Err(PlanError::Validation(_))
        ));
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(AllocationMode::parse("Proportional"), Some(AllocationMode::Proportional));
        assert_eq!(AllocationMode::parse("fixed"), Some(AllocationMode::Sequential));
        assert_eq!(AllocationMode::parse("random"), None);
    }
}
