use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Seating,
    Signature,
}

impl Variant {
    /// Cells per (seat, id) pair.
    pub fn pair_width(self) -> usize {
        match self {
            Variant::Seating => 2,
            Variant::Signature => 3,
        }
    }

    pub fn header(self) -> Vec<&'static str> {
        let pair: &[&'static str] = match self {
            Variant::Seating => &["Seat", "ID"],
            Variant::Signature => &["Seat", "ID", "Signature"],
        };
        pair.iter().chain(pair.iter()).copied().collect()
    }

    pub fn title(self, classroom: &str) -> String {
        match self {
            Variant::Seating => classroom.to_string(),
            Variant::Signature => format!("{} - Signature Sheet", classroom),
        }
    }
}

/// Two-column seat table for one classroom. `rows` excludes the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatGrid {
    pub variant: Variant,
    pub rows: Vec<Vec<String>>,
}

impl SeatGrid {
    pub fn header(&self) -> Vec<&'static str> {
        self.variant.header()
    }

    pub fn width(&self) -> usize {
        self.variant.pair_width() * 2
    }

    /// Column 1 top to bottom, then column 2, skipping blank cells.
    pub fn ids_in_seat_order(&self) -> Vec<String> {
        let pw = self.variant.pair_width();
        let column = |offset: usize| {
            self.rows
                .iter()
                .filter_map(move |r| r.get(offset + 1))
                .filter(|id| !id.is_empty())
                .cloned()
        };
        column(0).chain(column(pw)).collect()
    }
}

/// Seats 1..=half go down column 1, half+1..=L down column 2.
pub fn build_seat_grid(student_ids: &[String], variant: Variant) -> SeatGrid {
    let half = student_ids.len().div_ceil(2);
    let (col1, col2) = student_ids.split_at(half);

    let rows = (0..half)
        .map(|i| {
            let mut row = Vec::with_capacity(variant.pair_width() * 2);
            push_pair(&mut row, variant, Some((i + 1, &col1[i])));
            push_pair(&mut row, variant, col2.get(i).map(|id| (half + i + 1, id)));
            row
        })
        .collect();

    SeatGrid { variant, rows }
}

fn push_pair(row: &mut Vec<String>, variant: Variant, seat: Option<(usize, &String)>) {
    match seat {
        Some((n, id)) => {
            row.push(n.to_string());
            row.push(id.clone());
        }
        None => {
            row.push(String::new());
            row.push(String::new());
        }
    }
    if variant == Variant::Signature {
        row.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("S{}", i)).collect()
    }

    #[test]
    fn odd_count_pads_last_row() {
        let g = build_seat_grid(&ids(7), Variant::Seating);
        assert_eq!(g.rows.len(), 4);
        assert_eq!(g.rows[0], vec!["1", "S1", "5", "S5"]);
        assert_eq!(g.rows[2], vec!["3", "S3", "7", "S7"]);
        assert_eq!(g.rows[3], vec!["4", "S4", "", ""]);
    }

    #[test]
    fn empty_list_has_no_rows() {
        let g = build_seat_grid(&[], Variant::Signature);
        assert!(g.rows.is_empty());
        assert_eq!(g.header().len(), 6);
    }

    #[test]
    fn signature_rows_have_blank_signature_cells() {
        let g = build_seat_grid(&ids(3), Variant::Signature);
        assert_eq!(g.rows.len(), 2);
        assert_eq!(g.rows[0], vec!["1", "S1", "", "3", "S3", ""]);
        assert_eq!(g.rows[1], vec!["2", "S2", "", "", "", ""]);
        assert!(g.rows.iter().all(|r| r.len() == g.width()));
    }

    #[test]
    fn seat_order_round_trips() {
        for n in 0..12 {
            let list = ids(n);
            for variant in [Variant::Seating, Variant::Signature] {
                let g = build_seat_grid(&list, variant);
                assert_eq!(g.ids_in_seat_order(), list);
            }
        }
    }

    #[test]
    fn titles() {
        assert_eq!(Variant::Seating.title("Lab 1"), "Lab 1");
        assert_eq!(Variant::Signature.title("Lab 1"), "Lab 1 - Signature Sheet");
        assert_eq!(
            Variant::Seating.header(),
            vec!["Seat", "ID", "Seat", "ID"]
        );
    }
}
