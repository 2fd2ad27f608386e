use proptest::prelude::*;
use seatingd::allocate::{allocate, AllocationMode, Classroom};
use seatingd::layout::{build_seat_grid, Variant};
use seatingd::plan::shuffle_roster;
use std::collections::HashSet;

fn roster(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}", 700_000 + i)).collect()
}

fn rooms(capacities: &[u32]) -> Vec<Classroom> {
    capacities
        .iter()
        .enumerate()
        .map(|(i, &c)| Classroom::new(format!("Room {}", i + 1), c))
        .collect()
}

proptest! {
    #[test]
    fn proportional_is_a_partition(n in 0usize..400, caps in prop::collection::vec(1u32..500, 1..20)) {
        let ids = roster(n);
        let a = allocate(&ids, &rooms(&caps), AllocationMode::Proportional).expect("allocate");
        prop_assert!(a.unassigned.is_empty());

        let mut placed: Vec<String> = a.rooms.iter().flat_map(|r| r.student_ids.clone()).collect();
        let unique: HashSet<&String> = placed.iter().collect();
        prop_assert_eq!(unique.len(), placed.len());
        placed.sort();
        let mut expected = ids.clone();
        expected.sort();
        prop_assert_eq!(placed, expected);
    }

    #[test]
    fn proportional_last_room_absorbs_remainder(n in 0usize..400, caps in prop::collection::vec(1u32..500, 1..20)) {
        let a = allocate(&roster(n), &rooms(&caps), AllocationMode::Proportional).expect("allocate");
        let (last, head) = a.rooms.split_last().expect("at least one room");
        let head_total: usize = head.iter().map(|r| r.student_ids.len()).sum();
        prop_assert!(head_total <= n);
        prop_assert_eq!(last.student_ids.len(), n - head_total);
    }

    #[test]
    fn sequential_respects_capacity_and_order(n in 0usize..400, caps in prop::collection::vec(1u32..60, 1..10)) {
        let ids = roster(n);
        let a = allocate(&ids, &rooms(&caps), AllocationMode::Sequential).expect("allocate");
        for (room, cap) in a.rooms.iter().zip(&caps) {
            prop_assert!(room.student_ids.len() <= *cap as usize);
        }
        let total: usize = caps.iter().map(|&c| c as usize).sum();
        prop_assert_eq!(a.unassigned.len(), n.saturating_sub(total));

        let flattened: Vec<String> = a
            .rooms
            .iter()
            .flat_map(|r| r.student_ids.clone())
            .chain(a.unassigned.clone())
            .collect();
        prop_assert_eq!(flattened, ids);
    }

    #[test]
    fn seat_grid_round_trips(n in 0usize..300, signature in any::<bool>()) {
        let ids = roster(n);
        let variant = if signature { Variant::Signature } else { Variant::Seating };
        let grid = build_seat_grid(&ids, variant);
        prop_assert_eq!(grid.rows.len(), n.div_ceil(2));
        prop_assert!(grid.rows.iter().all(|r| r.len() == grid.width()));
        prop_assert_eq!(grid.ids_in_seat_order(), ids);
    }

    #[test]
    fn shuffle_is_a_permutation(n in 0usize..200, seed in any::<u64>()) {
        let ids = roster(n);
        let mut shuffled = ids.clone();
        shuffle_roster(&mut shuffled, seed);
        let mut again = ids.clone();
        shuffle_roster(&mut again, seed);
        prop_assert_eq!(&shuffled, &again);
        shuffled.sort();
        prop_assert_eq!(shuffled, ids);
    }
}

#[test]
fn sequential_ten_into_two_rooms_of_four() {
    let a = allocate(&roster(10), &rooms(&[4, 4]), AllocationMode::Sequential).expect("allocate");
    assert_eq!(a.rooms[0].student_ids.len(), 4);
    assert_eq!(a.rooms[1].student_ids.len(), 4);
    assert_eq!(a.unassigned.len(), 2);
}

#[test]
fn seven_seats_pad_the_last_row() {
    let grid = build_seat_grid(&roster(7), Variant::Seating);
    assert_eq!(grid.rows.len(), 4);
    assert_eq!(&grid.rows[3][2..], &["".to_string(), "".to_string()]);
    assert!(grid.rows[..3].iter().all(|r| r.iter().all(|c| !c.is_empty())));
}
