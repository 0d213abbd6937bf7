//! Property-based tests for index arithmetic and the tick window.

use core_config::RotateOptions;
use core_events::ElementId;
use core_rotation::{MemoryHost, Rotator, advance};
use proptest::prelude::*;

proptest! {
    // N applications of advance return to the start.
    #[test]
    fn advance_cycles_after_n_steps(n in 2usize..200, start in 0usize..200) {
        let start = start % n;
        let mut i = start;
        for _ in 0..n {
            i = advance(i, n);
        }
        prop_assert_eq!(i, start);
    }

    // advance never returns its input for N >= 2 and always stays in range.
    #[test]
    fn advance_always_moves(n in 2usize..500, i in 0usize..500) {
        let i = i % n;
        let next = advance(i, n);
        prop_assert_ne!(next, i);
        prop_assert!(next < n);
    }

    // After k ticks from init, active = k mod N, prev = (k-1) mod N, next = (k+1) mod N.
    #[test]
    fn tick_window_after_k_ticks(n in 3usize..16, k in 1usize..64) {
        let text = (0..n).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        let mut r = Rotator::with_options(ElementId(0), MemoryHost::new(text), RotateOptions::default());
        r.init();
        let mut last = None;
        for _ in 0..k {
            last = r.tick();
        }
        let report = last.unwrap();
        prop_assert_eq!(report.active, k % n);
        prop_assert_eq!(report.prev, (k + n - 1) % n);
        prop_assert_eq!(report.next, (k + 1) % n);
    }
}
