use chrono::NaiveDateTime;

/// First slot inside `[start, end]`, both ends inclusive, in the order given.
///
/// No sorting happens here: when upstream order is not chronological the
/// first slot in the window wins, not the earliest.
pub fn find_first_match(
    start: NaiveDateTime,
    end: NaiveDateTime,
    slots: &[NaiveDateTime],
) -> Option<NaiveDateTime> {
    slots.iter().copied().find(|slot| start <= *slot && *slot <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_skips_slots_before_window() {
        let slots = [at(8, 30), at(9, 15), at(9, 45)];
        assert_eq!(find_first_match(at(9, 0), at(10, 0), &slots), Some(at(9, 15)));
    }

    #[test]
    fn test_window_is_inclusive() {
        assert_eq!(find_first_match(at(9, 0), at(10, 0), &[at(9, 0)]), Some(at(9, 0)));
        assert_eq!(find_first_match(at(9, 0), at(10, 0), &[at(10, 0)]), Some(at(10, 0)));
        assert_eq!(find_first_match(at(9, 0), at(9, 0), &[at(9, 0)]), Some(at(9, 0)));
    }

    #[test]
    fn test_no_match_outside_window() {
        let slots = [at(8, 59), at(10, 1)];
        assert_eq!(find_first_match(at(9, 0), at(10, 0), &slots), None);
    }

    #[test]
    fn test_empty_slots() {
        assert_eq!(find_first_match(at(9, 0), at(10, 0), &[]), None);
    }

    #[test]
    fn test_first_in_order_not_earliest() {
        let slots = [at(9, 50), at(9, 10)];
        assert_eq!(find_first_match(at(9, 0), at(10, 0), &slots), Some(at(9, 50)));
    }

    #[test]
    fn test_inverted_window_matches_nothing() {
        let slots = [at(9, 30)];
        assert_eq!(find_first_match(at(10, 0), at(9, 0), &slots), None);
    }

    #[test]
    fn test_window_spanning_days() {
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let slots = [at(7, 0), next_day];
        assert_eq!(find_first_match(at(18, 0), next_day, &slots), Some(next_day));
    }
}
