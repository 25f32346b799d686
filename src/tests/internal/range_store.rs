//! 区间集合测试
//!
//! 测试项：
//! - add / sub 的合并、拆分与边界行为
//! - 随机操作序列与位图模型一致
//! - store / load 格式与失败时清空
//! - 块区间的边界检查

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::AssemblyError;
use crate::range::{ContentRange, ContiguousRangeStore, Range, RangeStore, SlottedRangeStore};
use crate::tests::{assert_canonical, pairs};

fn store_of(ranges: &[(i64, i64)]) -> SlottedRangeStore {
    let mut store = SlottedRangeStore::new();
    for (low, high) in ranges {
        store.add(*low, *high).unwrap();
    }
    store
}

// ═══════════════════════════ add ═══════════════════════════

#[test]
fn add_merges_touching_ranges() {
    let store = store_of(&[(0, 9), (10, 19)]);
    assert_eq!(store.get_ranges(), "0-19");
    assert_eq!(store.size(), 1);
}

#[test]
fn add_keeps_gapped_ranges_apart() {
    let store = store_of(&[(0, 9), (11, 19)]);
    assert_eq!(store.get_ranges(), "0-9,11-19");
}

#[test]
fn add_absorbs_contained_range() {
    let store = store_of(&[(0, 99), (10, 20)]);
    assert_eq!(pairs(&store), vec![(0, 99)]);
}

#[test]
fn add_bridges_several_ranges() {
    let store = store_of(&[(0, 4), (10, 14), (20, 24), (30, 34), (5, 25)]);
    assert_eq!(store.get_ranges(), "0-25,30-34");
}

#[test]
fn add_is_idempotent() {
    let mut store = store_of(&[(3, 7), (20, 30)]);
    let before = store.clone();
    store.add(3, 7).unwrap();
    store.add(20, 30).unwrap();
    assert_eq!(store, before);
}

#[test]
fn add_rejects_reversed_range() {
    let mut store = store_of(&[(0, 9)]);
    let err = store.add(5, 4).unwrap_err();
    assert!(matches!(err, AssemblyError::InvalidRange { low: 5, high: 4 }));
    assert_eq!(store.get_ranges(), "0-9");
}

#[test]
fn add_at_integer_extremes() {
    let store = store_of(&[(i64::MAX - 1, i64::MAX), (i64::MIN, i64::MIN + 1)]);
    assert_eq!(
        pairs(&store),
        vec![(i64::MIN, i64::MIN + 1), (i64::MAX - 1, i64::MAX)]
    );
}

// ═══════════════════════════ sub ═══════════════════════════

#[test]
fn sub_splits_range() {
    let mut store = store_of(&[(0, 99)]);
    store.sub(10, 19).unwrap();
    assert_eq!(store.get_ranges(), "0-9,20-99");
}

#[test]
fn sub_trims_both_edges() {
    let mut store = store_of(&[(0, 9), (20, 29)]);
    store.sub(5, 24).unwrap();
    assert_eq!(store.get_ranges(), "0-4,25-29");
}

#[test]
fn sub_exact_entry_leaves_nothing() {
    let mut store = store_of(&[(0, 9), (20, 29)]);
    store.sub(20, 29).unwrap();
    assert_eq!(store.get_ranges(), "0-9");
    store.sub(0, 9).unwrap();
    assert_eq!(store.size(), 0);
    assert_eq!(store.get_ranges(), "");
    assert_eq!(store.span(), None);
}

#[test]
fn sub_outside_is_noop() {
    let mut store = store_of(&[(10, 19)]);
    store.sub(0, 9).unwrap();
    store.sub(20, 29).unwrap();
    assert_eq!(store.get_ranges(), "10-19");
}

#[test]
fn sub_covering_several_ranges() {
    let mut store = store_of(&[(0, 4), (10, 14), (20, 24), (30, 34)]);
    store.sub(2, 31).unwrap();
    assert_eq!(store.get_ranges(), "0-1,32-34");
}

#[test]
fn add_then_sub_same_range_is_empty() {
    let mut store = SlottedRangeStore::new();
    store.add(100, 200).unwrap();
    store.sub(100, 200).unwrap();
    assert_eq!(store.size(), 0);
}

#[test]
fn span_covers_first_to_last() {
    let store = store_of(&[(5, 9), (40, 49)]);
    assert_eq!(store.span(), Some(Range { low: 5, high: 49 }));
}

#[test]
fn ranges_iterator_restarts() {
    let store = store_of(&[(0, 1), (5, 6)]);
    assert_eq!(store.ranges().count(), 2);
    assert_eq!(store.ranges().count(), 2);
}

// ═══════════════════════════ 随机性质 ═══════════════════════════

/// 位图模型转区间列表。
fn model_runs(bits: &[bool]) -> Vec<(i64, i64)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, set) in bits.iter().enumerate() {
        match (set, start) {
            (true, None) => start = Some(i as i64),
            (false, Some(s)) => {
                runs.push((s, i as i64 - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, bits.len() as i64 - 1));
    }
    runs
}

#[test]
fn random_operations_match_bitmap_model() {
    const SIZE: usize = 200;
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..50 {
        let mut store = SlottedRangeStore::new();
        let mut bits = vec![false; SIZE];

        for _ in 0..40 {
            let low = rng.gen_range(0..SIZE);
            let high = rng.gen_range(low..SIZE);
            let is_add = rng.gen_range(0..3) > 0;
            if is_add {
                store.add(low as i64, high as i64).unwrap();
            } else {
                store.sub(low as i64, high as i64).unwrap();
            }
            bits[low..=high].iter_mut().for_each(|b| *b = is_add);

            assert_canonical(&store);
            assert_eq!(pairs(&store), model_runs(&bits));
        }
    }
}

#[test]
fn add_order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut ranges: Vec<(i64, i64)> = (0..30)
        .map(|_| {
            let low = rng.gen_range(0..500);
            (low, low + rng.gen_range(0..20))
        })
        .collect();

    let forward = store_of(&ranges);
    ranges.reverse();
    let backward = store_of(&ranges);
    assert_eq!(forward, backward);
    assert_canonical(&forward);
}

// ═══════════════════════════ store / load ═══════════════════════════

#[test]
fn store_writes_length_prefix_and_pairs() {
    let store = store_of(&[(1, 2), (10, 20)]);
    let mut buf = Vec::new();
    let len = store.store(&mut buf).unwrap();

    assert_eq!(len, 32);
    assert_eq!(buf.len(), 8 + 32);
    assert_eq!(&buf[..8], &32u64.to_be_bytes());
    assert_eq!(&buf[8..16], &1i64.to_be_bytes());
    assert_eq!(&buf[16..24], &2i64.to_be_bytes());

    let mut loaded = SlottedRangeStore::new();
    loaded.load(&mut buf.as_slice()).unwrap();
    assert_eq!(loaded, store);
}

#[test]
fn load_merges_into_existing() {
    let mut buf = Vec::new();
    store_of(&[(10, 19)]).store(&mut buf).unwrap();

    let mut store = store_of(&[(0, 9)]);
    store.load(&mut buf.as_slice()).unwrap();
    assert_eq!(store.get_ranges(), "0-19");
}

#[test]
fn load_empty_input_keeps_store() {
    let mut store = store_of(&[(0, 9)]);
    store.load(&mut std::io::empty()).unwrap();
    assert_eq!(store.get_ranges(), "0-9");
}

#[test]
fn load_truncated_input_resets_store() {
    let mut buf = Vec::new();
    store_of(&[(1, 2), (10, 20)]).store(&mut buf).unwrap();
    buf.truncate(buf.len() - 5);

    let mut store = store_of(&[(100, 200)]);
    let err = store.load(&mut buf.as_slice()).unwrap_err();
    assert!(matches!(err, AssemblyError::ChannelUnderflow { .. }));
    assert_eq!(store.size(), 0);
}

#[test]
fn load_misaligned_length_resets_store() {
    let mut buf = 20u64.to_be_bytes().to_vec();
    buf.extend_from_slice(&[0u8; 20]);

    let mut store = store_of(&[(0, 0)]);
    assert!(store.load(&mut buf.as_slice()).is_err());
    assert_eq!(store.size(), 0);
}

#[test]
fn load_reversed_entry_resets_store() {
    let mut buf = 16u64.to_be_bytes().to_vec();
    buf.extend_from_slice(&9i64.to_be_bytes());
    buf.extend_from_slice(&3i64.to_be_bytes());

    let mut store = store_of(&[(0, 0)]);
    let err = store.load(&mut buf.as_slice()).unwrap_err();
    assert!(matches!(err, AssemblyError::InvalidRange { low: 9, high: 3 }));
    assert_eq!(store.size(), 0);
}

// ═══════════════════════════ ContiguousRangeStore ═══════════════════════════

#[test]
fn contiguous_store_extends_span() {
    let mut store = ContiguousRangeStore::new();
    assert_eq!(store.size(), 0);
    store.add(10, 19).unwrap();
    store.add(20, 29).unwrap();
    store.add(0, 12).unwrap();
    assert_eq!(store.get_ranges(), "0-29");
    assert_eq!(store.size(), 1);
}

#[test]
fn contiguous_store_rejects_gap() {
    let mut store = ContiguousRangeStore::new();
    store.add(0, 9).unwrap();
    let err = store.add(11, 20).unwrap_err();
    assert!(matches!(err, AssemblyError::IllegalRange { low: 11, high: 20 }));
    assert_eq!(store.get_ranges(), "0-9");
}

#[test]
fn contiguous_store_has_no_sub() {
    let mut store = ContiguousRangeStore::new();
    store.add(0, 9).unwrap();
    assert!(matches!(
        store.sub(0, 4),
        Err(AssemblyError::NotImplemented(_))
    ));
}

#[test]
fn contiguous_store_load_rejects_gapped_set() {
    let mut buf = Vec::new();
    store_of(&[(0, 9), (20, 29)]).store(&mut buf).unwrap();

    let mut store = ContiguousRangeStore::new();
    assert!(store.load(&mut buf.as_slice()).is_err());
    assert_eq!(store.size(), 0);
}

#[test]
fn range_display_and_len() {
    let r = Range::new(3, 7).unwrap();
    assert_eq!(r.to_string(), "3-7");
    assert_eq!(r.len(), 5);
    assert!(r.contains(7));
    assert!(!r.contains(8));
    assert!(Range::new(8, 7).is_err());
}

#[test]
fn content_range_display_and_validity() {
    let full = ContentRange::new(Range { low: 0, high: 99 }, Some(100));
    assert_eq!(full.to_string(), "0-99/100");
    assert!(full.is_valid());

    let unknown_size = ContentRange::new(Range { low: 5, high: 9 }, None);
    assert_eq!(unknown_size.to_string(), "5-9/*");
    assert!(unknown_size.is_valid());

    assert_eq!(ContentRange::default().to_string(), "*/*");
    assert!(!ContentRange::new(Range { low: 0, high: 200 }, Some(100)).is_valid());
    assert!(!ContentRange::new(Range { low: 9, high: 5 }, None).is_valid());
}

#[test]
fn chunk_span_checks_bounds() {
    assert_eq!(Range::of_chunk(10, 5).unwrap(), Range { low: 10, high: 14 });
    assert_eq!(
        Range::of_chunk(i64::MAX, 1).unwrap(),
        Range {
            low: i64::MAX,
            high: i64::MAX
        }
    );
    assert!(matches!(
        Range::of_chunk(i64::MAX, 2),
        Err(AssemblyError::InvalidRange { low: i64::MAX, .. })
    ));
    assert!(matches!(
        Range::of_chunk(-2, 4),
        Err(AssemblyError::InvalidRange { low: -2, high: 1 })
    ));
    assert!(Range::of_chunk(0, 0).is_err());
}
