use pano_core::{Descriptor, Descriptors, FeatureMatch, Matches};
use rayon::prelude::*;

/// Produces candidate correspondences between two descriptor sets,
/// sorted ascending by distance.
pub trait DescriptorMatcher: Send + Sync {
    fn match_descriptors(&self, query: &Descriptors, train: &Descriptors) -> Matches;
}

/// Brute-force Hamming matcher.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    cross_check: bool,
    ratio_threshold: Option<f32>,
    max_distance: Option<u32>,
}

/// Nearest and second-nearest neighbour of one descriptor.
#[derive(Debug, Clone, Copy)]
struct Neighbours {
    best_idx: usize,
    best: u32,
    second: Option<u32>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a pair only when each side is the other's nearest neighbour.
    pub fn with_cross_check(mut self) -> Self {
        self.cross_check = true;
        self
    }

    pub fn with_ratio_test(mut self, threshold: f32) -> Self {
        self.ratio_threshold = Some(threshold);
        self
    }

    pub fn with_max_distance(mut self, max_distance: u32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    fn passes_ratio(&self, n: &Neighbours) -> bool {
        match (self.ratio_threshold, n.second) {
            (Some(t), Some(second)) if second > 0 => (n.best as f32 / second as f32) <= t,
            // two equally perfect candidates are ambiguous
            (Some(_), Some(_)) => false,
            _ => true,
        }
    }
}

impl DescriptorMatcher for Matcher {
    fn match_descriptors(&self, query: &Descriptors, train: &Descriptors) -> Matches {
        if query.is_empty() || train.is_empty() {
            return Matches::new();
        }

        let forward = nearest_neighbours(query, train);
        let backward = if self.cross_check {
            Some(nearest_neighbours(train, query))
        } else {
            None
        };

        let mut matches = Matches::with_capacity(forward.len());
        for (query_idx, n) in forward.iter().enumerate() {
            if let Some(back) = &backward {
                if back[n.best_idx].best_idx != query_idx {
                    continue;
                }
            }
            if !self.passes_ratio(n) {
                continue;
            }
            if self.max_distance.is_some_and(|max| n.best > max) {
                continue;
            }
            matches.push(FeatureMatch::new(query_idx, n.best_idx, n.best as f32));
        }

        matches.sort_by_distance();
        matches
    }
}

fn nearest_neighbours(query: &Descriptors, train: &Descriptors) -> Vec<Neighbours> {
    query
        .descriptors
        .par_iter()
        .map(|q| nearest(q, &train.descriptors))
        .collect()
}

fn nearest(q: &Descriptor, train: &[Descriptor]) -> Neighbours {
    let mut n = Neighbours {
        best_idx: 0,
        best: u32::MAX,
        second: None,
    };
    for (idx, t) in train.iter().enumerate() {
        let d = q.hamming_distance(t);
        // strict comparison: the lowest index wins ties
        if d < n.best {
            if n.best != u32::MAX {
                n.second = Some(n.best);
            }
            n.best = d;
            n.best_idx = idx;
        } else if n.second.map_or(true, |s| d < s) {
            n.second = Some(d);
        }
    }
    n
}

/// Cross-checked brute-force Hamming matching, best match first.
pub fn match_descriptors(query: &Descriptors, train: &Descriptors) -> Matches {
    Matcher::new().with_cross_check().match_descriptors(query, train)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pano_core::KeyPoint;

    fn descs(bytes: &[u8]) -> Descriptors {
        bytes
            .iter()
            .enumerate()
            .map(|(i, &b)| Descriptor::new(vec![b; 4], KeyPoint::new(i as f64, 0.0)))
            .collect()
    }

    #[test]
    fn identical_sets_match_one_to_one() {
        let q = descs(&[0xAA, 0x55, 0x0F]);
        let t = descs(&[0x0F, 0xAA, 0x55]);
        let m = match_descriptors(&q, &t);
        assert_eq!(m.len(), 3);
        for fm in m.iter() {
            assert_eq!(fm.distance, 0.0);
            assert_eq!(q.descriptors[fm.query_idx].data, t.descriptors[fm.train_idx].data);
        }
    }

    #[test]
    fn cross_check_drops_one_sided_matches() {
        // both queries prefer train 0, only query 0 is preferred back
        let q = descs(&[0x00, 0x01]);
        let t = descs(&[0x00, 0xFF]);
        let without = Matcher::new().match_descriptors(&q, &t);
        assert_eq!(without.len(), 2);

        let with = Matcher::new().with_cross_check().match_descriptors(&q, &t);
        assert_eq!(with.len(), 1);
        assert_eq!(with.matches[0].query_idx, 0);
        assert_eq!(with.matches[0].train_idx, 0);
    }

    #[test]
    fn results_sorted_ascending() {
        let q = descs(&[0x00, 0xF0, 0x0F]);
        let t = descs(&[0x01, 0xF0, 0x3F]);
        let m = match_descriptors(&q, &t);
        let d: Vec<f32> = m.iter().map(|f| f.distance).collect();
        let mut sorted = d.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(d, sorted);
    }

    #[test]
    fn empty_inputs_give_no_matches() {
        let q = descs(&[0x00]);
        assert!(match_descriptors(&q, &Descriptors::new()).is_empty());
        assert!(match_descriptors(&Descriptors::new(), &q).is_empty());
    }

    #[test]
    fn ratio_test_keeps_distinctive_matches() {
        // 4 and 8 bits away: ratio 0.5
        let q = descs(&[0x00]);
        let t = descs(&[0x01, 0x03]);
        assert_eq!(Matcher::new().with_ratio_test(0.7).match_descriptors(&q, &t).len(), 1);
        assert!(Matcher::new().with_ratio_test(0.4).match_descriptors(&q, &t).is_empty());
    }

    #[test]
    fn ratio_test_rejects_equal_perfect_candidates() {
        let q = descs(&[0x00]);
        let t = descs(&[0x00, 0x00]);
        assert_eq!(Matcher::new().match_descriptors(&q, &t).len(), 1);
        assert!(Matcher::new().with_ratio_test(0.8).match_descriptors(&q, &t).is_empty());
    }

    #[test]
    fn ratio_test_passes_single_candidate() {
        let q = descs(&[0x00]);
        let t = descs(&[0x0F]);
        let m = Matcher::new().with_ratio_test(0.1).match_descriptors(&q, &t);
        assert_eq!(m.len(), 1);
        assert_eq!(m.matches[0].distance, 16.0);
    }

    #[test]
    fn max_distance_filters() {
        let q = descs(&[0x00]);
        let t = descs(&[0x0F]);
        assert_eq!(Matcher::new().with_max_distance(8).match_descriptors(&q, &t).len(), 0);
        assert_eq!(Matcher::new().with_max_distance(16).match_descriptors(&q, &t).len(), 1);
    }
}
