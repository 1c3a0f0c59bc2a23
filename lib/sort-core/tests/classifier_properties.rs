use proptest::prelude::*;
use sort_core::{array_split, classify, record::RECORD_SIZE};

fn arb_records(max_len: usize) -> impl Strategy<Value = Vec<[u8; RECORD_SIZE]>> {
    prop::collection::vec(
        any::<u8>().prop_map(|key0| {
            let mut r = [0u8; RECORD_SIZE];
            r[0] = key0;
            r
        }),
        0..max_len,
    )
}

proptest! {
    #[test]
    fn classifier_output_is_sorted_by_category_and_covers_input_exactly(
        records in arb_records(64),
        v_exp in 0u32..=8,
    ) {
        let v = 1u32 << v_exp;
        let mut buf = Vec::with_capacity(records.len() * RECORD_SIZE);
        for r in &records {
            buf.extend_from_slice(r);
        }

        let (out, ranges) = classify(&buf, 0, v).unwrap();
        prop_assert_eq!(out.len(), buf.len());

        let mut prev_end = 0usize;
        let mut prev_cat: Option<u8> = None;
        for range in &ranges {
            prop_assert_eq!(range.start, prev_end);
            prop_assert!(range.end > range.start);
            if let Some(p) = prev_cat {
                prop_assert!(p < range.category_id);
            }
            prev_cat = Some(range.category_id);
            prev_end = range.end;
        }
        prop_assert_eq!(prev_end, records.len());

        // Every record in a range actually belongs to that range's category.
        for range in &ranges {
            for chunk in out[range.start * RECORD_SIZE..range.end * RECORD_SIZE].chunks_exact(RECORD_SIZE) {
                let cat = (u32::from(chunk[0]) / v) as u8;
                prop_assert_eq!(cat, range.category_id);
            }
        }
    }

    #[test]
    fn array_split_lengths_match_numpy_semantics(n in 0usize..200, k in 1usize..32) {
        let items: Vec<usize> = (0..n).collect();
        let parts = array_split(items, k);
        prop_assert_eq!(parts.len(), k);

        let total: usize = parts.iter().map(Vec::len).sum();
        prop_assert_eq!(total, n);

        let base = n / k;
        let remainder = n % k;
        for (i, part) in parts.iter().enumerate() {
            let expected = if i < remainder { base + 1 } else { base };
            prop_assert_eq!(part.len(), expected);
        }

        // Concatenating the parts back together reproduces the original order.
        let flattened: Vec<usize> = parts.into_iter().flatten().collect();
        prop_assert_eq!(flattened, (0..n).collect::<Vec<_>>());
    }
}
