//! Property tests for carousel and readiness invariants.
//!
//! Uses proptest to verify:
//! 1. Page bounds: any sequence of moves keeps the page index in range
//! 2. Clamping: replacing the source never leaves an out-of-range page
//! 3. Readiness: a start date after the end date is never ready
//! 4. Symbols: normalization is idempotent

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use vlab_core::domain::normalize_symbol;
use vlab_core::{ConfigDraft, ConfigIssue, ConfigPatch, PaginationCursor};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_moves() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..64)
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|days| {
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap() + Duration::days(days)
    })
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
}

// ── 1. Page bounds ───────────────────────────────────────────────────

proptest! {
    /// next()/prev() never leave [0, max(page_count, 1) - 1].
    #[test]
    fn moves_stay_in_range(
        total in 0usize..40,
        page_size in 1usize..8,
        moves in arb_moves(),
    ) {
        let mut cursor = PaginationCursor::new((0..total).collect::<Vec<_>>(), page_size);
        for forward in moves {
            let window = if forward { cursor.next() } else { cursor.prev() };
            prop_assert!(window.page_index < window.page_count().max(1));
            prop_assert!(cursor.current_page().len() <= page_size);
            if total > 0 {
                prop_assert!(!cursor.current_page().is_empty());
            }
        }
    }

    /// next() on the last page returns the same window.
    #[test]
    fn next_at_last_page_is_noop(total in 1usize..40, page_size in 1usize..8) {
        let mut cursor = PaginationCursor::new((0..total).collect::<Vec<_>>(), page_size);
        let pages = cursor.window().page_count();
        for _ in 0..pages {
            cursor.next();
        }
        let before = cursor.window();
        prop_assert!(before.is_last());
        prop_assert_eq!(cursor.next(), before);
    }
}

// ── 2. Clamping ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn replace_items_clamps(
        before in 0usize..40,
        after in 0usize..40,
        page_size in 1usize..8,
        forward in 0usize..10,
    ) {
        let mut cursor = PaginationCursor::new((0..before).collect::<Vec<_>>(), page_size);
        for _ in 0..forward {
            cursor.next();
        }
        cursor.replace_items((0..after).collect());
        let window = cursor.window();
        prop_assert!(window.page_index < window.page_count().max(1));
        if after > 0 {
            prop_assert!(!cursor.current_page().is_empty());
        }
    }
}

// ── 3. Readiness ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn start_after_end_is_never_ready(a in arb_date(), b in arb_date()) {
        prop_assume!(a != b);
        let (start, end) = if a > b { (a, b) } else { (b, a) };
        let mut draft = ConfigDraft::for_strategy("sma");
        draft.apply(ConfigPatch::new().symbol("SPY").start_date(start).end_date(end));
        prop_assert_eq!(draft.validate(today()), Err(ConfigIssue::StartAfterEnd));
    }

    #[test]
    fn ordered_range_with_symbol_is_ready(a in arb_date(), b in arb_date()) {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let mut draft = ConfigDraft::for_strategy("sma");
        draft.apply(ConfigPatch::new().symbol("spy").start_date(start).end_date(end));
        prop_assert!(draft.is_ready(today()));
    }
}

// ── 4. Symbols ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn symbol_normalization_is_idempotent(raw in "[ a-zA-Z.]{0,12}") {
        let once = normalize_symbol(&raw);
        prop_assert_eq!(normalize_symbol(&once), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
    }
}
