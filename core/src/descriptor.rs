use crate::KeyPoint;

/// Fixed-length binary descriptor anchored at a keypoint.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub data: Vec<u8>,
    pub keypoint: KeyPoint,
}

impl Descriptor {
    pub fn new(data: Vec<u8>, keypoint: KeyPoint) -> Self {
        Self { data, keypoint }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of differing bits. Both descriptors must have the same length;
    /// bytes past the shorter one count as fully different.
    pub fn hamming_distance(&self, other: &Descriptor) -> u32 {
        let common: u32 = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let extra = self.data.len().abs_diff(other.data.len()) as u32 * 8;
        common + extra
    }
}

#[derive(Debug, Clone, Default)]
pub struct Descriptors {
    pub descriptors: Vec<Descriptor>,
}

impl Descriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            descriptors: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, desc: Descriptor) {
        self.descriptors.push(desc);
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Descriptor> {
        self.descriptors.get(idx)
    }

    /// Keypoints in descriptor order.
    pub fn keypoints(&self) -> Vec<KeyPoint> {
        self.descriptors.iter().map(|d| d.keypoint).collect()
    }
}

impl FromIterator<Descriptor> for Descriptors {
    fn from_iter<I: IntoIterator<Item = Descriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamming_identical_is_zero() {
        let kp = KeyPoint::new(0.0, 0.0);
        let d = Descriptor::new(vec![0b10101010u8, 0b11110000, 0b00001111], kp);
        assert_eq!(d.hamming_distance(&d), 0);
    }

    #[test]
    fn hamming_all_different_is_max() {
        let kp = KeyPoint::new(0.0, 0.0);
        let a = Descriptor::new(vec![0xFFu8; 4], kp);
        let b = Descriptor::new(vec![0x00u8; 4], kp);
        assert_eq!(a.hamming_distance(&b), 32);
    }

    #[test]
    fn hamming_length_mismatch_penalised() {
        let kp = KeyPoint::new(0.0, 0.0);
        let a = Descriptor::new(vec![0u8; 4], kp);
        let b = Descriptor::new(vec![0u8; 2], kp);
        assert_eq!(a.hamming_distance(&b), 16);
        assert_eq!(b.hamming_distance(&a), 16);
    }

    #[test]
    fn keypoints_follow_descriptor_order() {
        let ds: Descriptors = (0..3)
            .map(|i| Descriptor::new(vec![i as u8], KeyPoint::new(i as f64, 0.0)))
            .collect();
        let kps = ds.keypoints();
        assert_eq!(kps.len(), 3);
        assert_eq!(kps[2].x, 2.0);
        assert_eq!(ds.get(1).map(|d| d.data[0]), Some(1));
    }
}
