//! Candidate pair sampling with an injected RNG.

use std::collections::HashSet;

use rand::Rng;

/// Unordered profile pair, stored as (lower index, higher index).
pub type PairKey = (usize, usize);

pub fn pair_key(i: usize, j: usize) -> PairKey {
    if i <= j {
        (i, j)
    } else {
        (j, i)
    }
}

pub fn total_pairs(n: usize) -> u128 {
    let n = n as u128;
    n * n.saturating_sub(1) / 2
}

/// Every pair not in `exclude`, when the pool is no larger than
/// `sample_size`; otherwise up to `sample_size` distinct random pairs.
///
/// Random draws are capped at 4× `sample_size`, so a heavily excluded pool
/// can return fewer pairs than requested.
pub fn sample_pairs<R: Rng + ?Sized>(
    n: usize,
    sample_size: usize,
    exclude: &HashSet<PairKey>,
    rng: &mut R,
) -> Vec<PairKey> {
    if n < 2 || sample_size == 0 {
        return Vec::new();
    }

    if total_pairs(n) <= sample_size as u128 {
        let mut all = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if !exclude.contains(&(i, j)) {
                    all.push((i, j));
                }
            }
        }
        return all;
    }

    let max_draws = sample_size.saturating_mul(4).max(16);
    let mut seen: HashSet<PairKey> = HashSet::with_capacity(sample_size);
    let mut out = Vec::with_capacity(sample_size);
    for _ in 0..max_draws {
        if out.len() >= sample_size {
            break;
        }
        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        let key = pair_key(i, j);
        if exclude.contains(&key) || !seen.insert(key) {
            continue;
        }
        out.push(key);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn small_pools_are_enumerated_exhaustively() {
        let mut rng = StdRng::seed_from_u64(1);
        let pairs = sample_pairs(5, 100, &HashSet::new(), &mut rng);
        assert_eq!(pairs.len(), 10);
        assert_eq!(pairs[0], (0, 1));

        let exclude: HashSet<PairKey> = [(0, 1), (2, 4)].into_iter().collect();
        let pairs = sample_pairs(5, 100, &exclude, &mut rng);
        assert_eq!(pairs.len(), 8);
        assert!(!pairs.contains(&(2, 4)));
    }

    #[test]
    fn large_pools_sample_unique_ordered_pairs() {
        let mut rng = StdRng::seed_from_u64(7);
        let pairs = sample_pairs(1000, 500, &HashSet::new(), &mut rng);
        assert_eq!(pairs.len(), 500);
        let unique: HashSet<PairKey> = pairs.iter().copied().collect();
        assert_eq!(unique.len(), 500);
        assert!(pairs.iter().all(|(i, j)| i < j && *j < 1000));
    }

    #[test]
    fn same_seed_same_sample() {
        let a = sample_pairs(300, 50, &HashSet::new(), &mut StdRng::seed_from_u64(42));
        let b = sample_pairs(300, 50, &HashSet::new(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_inputs_return_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_pairs(1, 10, &HashSet::new(), &mut rng).is_empty());
        assert!(sample_pairs(10, 0, &HashSet::new(), &mut rng).is_empty());
        assert_eq!(total_pairs(0), 0);
        assert_eq!(total_pairs(4), 6);
    }
}
