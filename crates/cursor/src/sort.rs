//! In-place quicksort over parallel slices.
//!
//! `keys[i]` and `payload[i]` always move together. The pivot is the larger
//! of the first two *distinct* keys of a range, so every partition step
//! splits off at least one element on each side and a range made only of
//! equal keys is left untouched.

use std::cmp::Ordering;

/// Sorts `keys` (and `payload` in lockstep) in the order defined by `cmp`.
///
/// Pass a reversed comparator for descending order. Equal keys are not
/// reordered among themselves unless a partition step has to move them.
///
/// Slices of different lengths are sorted up to the shorter length.
pub fn quick_sort_by<K, P, F>(keys: &mut [K], payload: &mut [P], cmp: F)
where
    K: Clone,
    F: Fn(&K, &K) -> Ordering,
{
    let n = keys.len().min(payload.len());
    if n < 2 {
        return;
    }
    sort_range(&mut keys[..n], &mut payload[..n], 0, n - 1, &cmp);
}

fn sort_range<K, P, F>(keys: &mut [K], payload: &mut [P], mut lo: usize, mut hi: usize, cmp: &F)
where
    K: Clone,
    F: Fn(&K, &K) -> Ordering,
{
    // Recurse into the smaller side and loop on the larger one so the stack
    // depth stays logarithmic on already-sorted input.
    while lo < hi {
        let p = match pivot(keys, lo, hi, cmp) {
            Some(p) => p,
            None => return,
        };
        let x = keys[p].clone();
        let split = partition(keys, payload, lo, hi, &x, cmp);

        if split - lo < hi + 1 - split {
            sort_range(keys, payload, lo, split - 1, cmp);
            lo = split;
        } else {
            sort_range(keys, payload, split, hi, cmp);
            hi = split - 1;
        }
    }
}

/// Index of the pivot for `keys[lo..=hi]`, or `None` if every key is equal.
fn pivot<K, F>(keys: &[K], lo: usize, hi: usize, cmp: &F) -> Option<usize>
where
    F: Fn(&K, &K) -> Ordering,
{
    let mut k = lo + 1;
    while k <= hi && cmp(&keys[lo], &keys[k]) == Ordering::Equal {
        k += 1;
    }
    if k > hi {
        return None;
    }
    if cmp(&keys[lo], &keys[k]) != Ordering::Less {
        Some(lo)
    } else {
        Some(k)
    }
}

/// Moves keys `< x` to the front of the range. Returns the first index of the
/// `>= x` side, which is always in `lo + 1..=hi`.
fn partition<K, P, F>(keys: &mut [K], payload: &mut [P], lo: usize, hi: usize, x: &K, cmp: &F) -> usize
where
    F: Fn(&K, &K) -> Ordering,
{
    let mut l = lo as isize;
    let mut r = hi as isize;
    let (lo_i, hi_i) = (lo as isize, hi as isize);

    while l <= r {
        while l <= hi_i && cmp(&keys[l as usize], x) == Ordering::Less {
            l += 1;
        }
        while r >= lo_i && cmp(&keys[r as usize], x) != Ordering::Less {
            r -= 1;
        }
        if l > r {
            break;
        }
        keys.swap(l as usize, r as usize);
        payload.swap(l as usize, r as usize);
        l += 1;
        r -= 1;
    }
    l as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asc(a: &i64, b: &i64) -> Ordering {
        a.cmp(b)
    }

    #[test]
    fn sorts_keys_and_moves_payload_with_them() {
        let mut keys = vec![30, 10, 20, 50, 40];
        let mut names = vec!["c", "a", "b", "e", "d"];

        quick_sort_by(&mut keys, &mut names, asc);

        assert_eq!(keys, vec![10, 20, 30, 40, 50]);
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn all_equal_keys_are_left_in_place() {
        let mut keys = vec![7, 7, 7, 7];
        let mut names = vec!["w", "x", "y", "z"];

        quick_sort_by(&mut keys, &mut names, asc);

        assert_eq!(names, vec!["w", "x", "y", "z"]);
    }

    #[test]
    fn reversed_comparator_sorts_descending() {
        let mut keys = vec![3, 1, 4, 1, 5, 9, 2, 6];
        let mut idx: Vec<usize> = (0..keys.len()).collect();

        quick_sort_by(&mut keys, &mut idx, |a: &i64, b: &i64| b.cmp(a));

        assert_eq!(keys, vec![9, 6, 5, 4, 3, 2, 1, 1]);
    }

    #[test]
    fn empty_and_single_element_inputs() {
        let mut keys: Vec<i64> = vec![];
        let mut payload: Vec<()> = vec![];
        quick_sort_by(&mut keys, &mut payload, asc);
        assert!(keys.is_empty());

        let mut keys = vec![1];
        let mut payload = vec!["only"];
        quick_sort_by(&mut keys, &mut payload, asc);
        assert_eq!(payload, vec!["only"]);
    }

    #[test]
    fn sorted_and_reverse_sorted_large_inputs() {
        let n = 20_000;
        let mut keys: Vec<i64> = (0..n).collect();
        let mut payload: Vec<i64> = keys.clone();
        quick_sort_by(&mut keys, &mut payload, asc);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));

        let mut keys: Vec<i64> = (0..n).rev().collect();
        let mut payload: Vec<i64> = keys.clone();
        quick_sort_by(&mut keys, &mut payload, asc);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(keys, payload);
    }

    #[test]
    fn many_duplicates() {
        let mut keys: Vec<i64> = (0..500).map(|i| (i * 7919) % 5).collect();
        let mut payload = keys.clone();
        quick_sort_by(&mut keys, &mut payload, asc);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(keys, payload);
    }

    #[test]
    fn composite_keys_with_custom_comparator() {
        let mut keys = vec![(2, "b"), (1, "z"), (2, "a"), (1, "a")];
        let mut payload = vec![0, 1, 2, 3];

        quick_sort_by(&mut keys, &mut payload, |a, b| a.cmp(b));

        assert_eq!(keys, vec![(1, "a"), (1, "z"), (2, "a"), (2, "b")]);
        assert_eq!(payload, vec![3, 1, 2, 0]);
    }
}
