use std::collections::HashSet;

use flowrx::{Flow, TestSubscriber};
use quickcheck::quickcheck;

fn collect(flow: &Flow<i32>) -> (Vec<i32>, bool) {
    let subscriber = TestSubscriber::new();
    flow.subscribe(subscriber.clone());
    (subscriber.values(), subscriber.is_complete())
}

quickcheck! {
    fn prop_map_matches_iterator_map(values: Vec<i32>) -> bool {
        let expected: Vec<i32> = values.iter().map(|v| v.wrapping_mul(3)).collect();
        let (emitted, completed) =
            collect(&Flow::from_iter(values).map(|v| v.wrapping_mul(3)));
        emitted == expected && completed
    }

    fn prop_filter_matches_iterator_filter(values: Vec<i32>) -> bool {
        let expected: Vec<i32> = values.iter().copied().filter(|v| v % 2 == 0).collect();
        let (emitted, completed) =
            collect(&Flow::from_iter(values).filter(|v| v % 2 == 0));
        emitted == expected && completed
    }

    fn prop_zip_with_pairs_up_to_the_shorter_side(left: Vec<i32>, right: Vec<i32>) -> bool {
        let expected: Vec<i32> = left
            .iter()
            .zip(right.iter())
            .map(|(a, b)| a.wrapping_add(*b))
            .collect();
        let (emitted, completed) = collect(
            &Flow::from_iter(left)
                .zip_with(&Flow::from_iter(right), |a, b| a.wrapping_add(b)),
        );
        emitted == expected && completed
    }

    fn prop_take_never_exceeds_the_requested_count(values: Vec<i32>, n: usize) -> bool {
        let n = n % 16;
        let expected: Vec<i32> = values.iter().copied().take(n).collect();
        let (emitted, completed) = collect(&Flow::from_iter(values).take(n));
        emitted == expected && completed
    }

    fn prop_take_last_keeps_the_tail(values: Vec<i32>, n: usize) -> bool {
        let n = n % 16;
        let expected: Vec<i32> =
            values[values.len().saturating_sub(n)..].to_vec();
        let (emitted, completed) = collect(&Flow::from_iter(values).take_last(n));
        emitted == expected && completed
    }

    fn prop_skip_drops_the_head(values: Vec<i32>, n: usize) -> bool {
        let n = n % 16;
        let expected: Vec<i32> = values.iter().copied().skip(n).collect();
        let (emitted, completed) = collect(&Flow::from_iter(values).skip(n));
        emitted == expected && completed
    }

    fn prop_distinct_preserves_first_occurrence_order(values: Vec<i32>) -> bool {
        let mut seen = HashSet::new();
        let expected: Vec<i32> = values
            .iter()
            .copied()
            .filter(|v| seen.insert(*v))
            .collect();
        let (emitted, completed) = collect(&Flow::from_iter(values).distinct());
        emitted == expected && completed
    }

    fn prop_distinct_until_changed_matches_dedup(values: Vec<i32>) -> bool {
        let mut expected = values.clone();
        expected.dedup();
        let (emitted, completed) =
            collect(&Flow::from_iter(values).distinct_until_changed());
        emitted == expected && completed
    }

    fn prop_fold_matches_iterator_fold(values: Vec<i32>) -> bool {
        let expected = values.iter().fold(0i64, |acc, v| acc + i64::from(*v));
        let subscriber = TestSubscriber::new();
        Flow::from_iter(values)
            .fold(0i64, |acc, v| acc + i64::from(v))
            .subscribe(subscriber.clone());
        subscriber.values() == vec![expected]
    }

    fn prop_collect_list_round_trips_the_sequence(values: Vec<i32>) -> bool {
        let subscriber = TestSubscriber::new();
        Flow::from_iter(values.clone())
            .collect_list()
            .subscribe(subscriber.clone());
        subscriber.values() == vec![values]
    }

    fn prop_buffer_regroups_without_loss(values: Vec<i32>, size: usize) -> bool {
        let size = size % 8 + 1;
        let expected: Vec<Vec<i32>> =
            values.chunks(size).map(|chunk| chunk.to_vec()).collect();
        let subscriber = TestSubscriber::new();
        Flow::from_iter(values).buffer(size).subscribe(subscriber.clone());
        subscriber.values() == expected && subscriber.is_complete()
    }
}
