//! Matched point pairs between a source and a destination image.

use crate::{Error, KeyPoint, Matches, Result};
use nalgebra::Point2;
use std::cmp::Ordering;

pub type Point2D = Point2<f64>;

/// One source/destination pair reported by a matcher.
///
/// `distance` is the matcher's dissimilarity score; smaller is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub src: Point2D,
    pub dst: Point2D,
    pub distance: f64,
}

impl Correspondence {
    pub fn new(src: Point2D, dst: Point2D, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::InvalidInput(format!(
                "match distance must be finite and non-negative, got {distance}"
            )));
        }
        if !(src.x.is_finite() && src.y.is_finite() && dst.x.is_finite() && dst.y.is_finite()) {
            return Err(Error::InvalidInput("correspondence points must be finite".into()));
        }
        Ok(Self { src, dst, distance })
    }

    /// Exact pair with zero distance, for synthetic data.
    pub fn exact(src: Point2D, dst: Point2D) -> Self {
        Self {
            src,
            dst,
            distance: 0.0,
        }
    }
}

/// Ordered correspondences, best match first.
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceSet {
    pairs: Vec<Correspondence>,
}

impl CorrespondenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve matcher indices into point pairs and sort ascending by distance.
    ///
    /// Matches whose indices fall outside either keypoint list are skipped.
    pub fn from_matches(matches: &Matches, src: &[KeyPoint], dst: &[KeyPoint]) -> Self {
        let mut pairs: Vec<Correspondence> = matches
            .iter()
            .filter_map(|m| {
                let s = src.get(m.query_idx)?;
                let d = dst.get(m.train_idx)?;
                Some(Correspondence {
                    src: s.pt(),
                    dst: d.pt(),
                    distance: m.distance.max(0.0) as f64,
                })
            })
            .collect();
        pairs.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        Self { pairs }
    }

    pub fn push(&mut self, c: Correspondence) {
        self.pairs.push(c);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correspondence> {
        self.pairs.iter()
    }

    pub fn as_slice(&self) -> &[Correspondence] {
        &self.pairs
    }

    pub fn sort_by_distance(&mut self) {
        self.pairs
            .sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    }

    /// Keep the pairs whose mask entry is `true`; missing entries count as `false`.
    pub fn filter_by_mask(&self, mask: &[bool]) -> Self {
        let pairs = self
            .pairs
            .iter()
            .zip(mask.iter())
            .filter(|(_, &keep)| keep)
            .map(|(c, _)| *c)
            .collect();
        Self { pairs }
    }
}

impl From<Vec<Correspondence>> for CorrespondenceSet {
    fn from(pairs: Vec<Correspondence>) -> Self {
        Self { pairs }
    }
}

impl FromIterator<Correspondence> for CorrespondenceSet {
    fn from_iter<I: IntoIterator<Item = Correspondence>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
