//! Cabin seat-map helpers.
//!
//! Seats are labelled `<row><column>` with columns A-F (6 abreast) and rows
//! numbered from 1. The last row may be partial when total_seats is not a
//! multiple of 6.

pub const SEATS_PER_ROW: i64 = 6;
pub const COLUMNS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Number of rows needed to seat `total_seats` passengers.
pub fn row_count(total_seats: i64) -> i64 {
    (total_seats + SEATS_PER_ROW - 1) / SEATS_PER_ROW
}

/// Validate a seat label against the cabin layout: row in [1, row_count],
/// column one of A-F. Lowercase column letters are accepted.
pub fn is_valid_label(seat_no: &str, total_seats: i64) -> bool {
    if seat_no.len() < 2 || !seat_no.is_ascii() {
        return false;
    }
    let (row_part, col_part) = seat_no.split_at(seat_no.len() - 1);
    let row: i64 = match row_part.parse() {
        Ok(row) => row,
        Err(_) => return false,
    };
    let col = col_part.chars().next().map(|c| c.to_ascii_uppercase());

    row >= 1 && row <= row_count(total_seats) && col.is_some_and(|c| COLUMNS.contains(&c))
}

/// All labels for a cabin, row by row (1A, 1B, ... 1F, 2A, ...), truncated
/// at `total_seats`.
pub fn generate_labels(total_seats: i64) -> Vec<String> {
    let mut labels = Vec::with_capacity(total_seats.max(0) as usize);
    'rows: for row in 1..=row_count(total_seats) {
        for col in COLUMNS {
            if labels.len() as i64 >= total_seats {
                break 'rows;
            }
            labels.push(format!("{row}{col}"));
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fill_rows_in_order() {
        let labels = generate_labels(8);
        assert_eq!(labels, vec!["1A", "1B", "1C", "1D", "1E", "1F", "2A", "2B"]);
    }

    #[test]
    fn label_count_matches_capacity() {
        assert_eq!(generate_labels(180).len(), 180);
        assert_eq!(generate_labels(0).len(), 0);
        assert_eq!(generate_labels(1), vec!["1A"]);
    }

    #[test]
    fn validates_rows_and_columns() {
        // 10 seats -> 2 rows
        assert!(is_valid_label("1A", 10));
        assert!(is_valid_label("2F", 10));
        assert!(is_valid_label("2f", 10));
        assert!(!is_valid_label("3A", 10));
        assert!(!is_valid_label("0A", 10));
        assert!(!is_valid_label("1G", 10));
        assert!(!is_valid_label("A1", 10));
        assert!(!is_valid_label("A", 10));
        assert!(!is_valid_label("", 10));
        assert!(!is_valid_label("12", 10));
        assert!(!is_valid_label("1É", 10));
    }

    #[test]
    fn multi_digit_rows_parse() {
        assert!(is_valid_label("30F", 180));
        assert!(!is_valid_label("31A", 180));
    }
}
