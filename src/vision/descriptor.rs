use thiserror::Error;

/// Descriptor length is pinned by the embedding model contract.
pub const DESCRIPTOR_LEN: usize = 128;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("descriptor has {got} values, expected {DESCRIPTOR_LEN}")]
    WrongLength { got: usize },
    #[error("descriptor blob is {got} bytes, expected {expected}")]
    WrongBlobSize { got: usize, expected: usize },
}

/// L2-normalized face descriptor produced by the embedding model.
///
/// Stored in the database as little-endian f32 bytes, 512 bytes per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    values: Vec<f32>,
}

impl Descriptor {
    pub fn from_vec(values: Vec<f32>) -> Result<Self, DescriptorError> {
        if values.len() != DESCRIPTOR_LEN {
            return Err(DescriptorError::WrongLength { got: values.len() });
        }
        Ok(Self { values })
    }

    /// Decode a stored blob. Rejects anything that is not exactly
    /// `DESCRIPTOR_LEN` little-endian f32 values.
    pub fn from_bytes(blob: &[u8]) -> Result<Self, DescriptorError> {
        let expected = DESCRIPTOR_LEN * 4;
        if blob.len() != expected {
            return Err(DescriptorError::WrongBlobSize {
                got: blob.len(),
                expected,
            });
        }
        let values = blob
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { values })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(DESCRIPTOR_LEN * 4);
        for v in &self.values {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        blob
    }

    /// Euclidean distance to another descriptor. Lower = more similar.
    pub fn distance(&self, other: &Descriptor) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// The library compare predicate: same face iff distance <= tolerance.
    pub fn matches(&self, other: &Descriptor, tolerance: f32) -> bool {
        self.distance(other) <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_with(first: f32) -> Descriptor {
        let mut values = vec![0.0f32; DESCRIPTOR_LEN];
        values[0] = first;
        Descriptor::from_vec(values).unwrap()
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let a = descriptor_with(1.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        // Differ in two axes by 3 and 4: distance is 5.
        let mut values = vec![0.0f32; DESCRIPTOR_LEN];
        values[0] = 3.0;
        values[1] = 4.0;
        let a = Descriptor::from_vec(values).unwrap();
        let b = descriptor_with(0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_matches_boundary_is_inclusive() {
        let a = descriptor_with(0.0);
        let b = descriptor_with(0.4);
        assert!(a.matches(&b, 0.4));
        assert!(!a.matches(&b, 0.39));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Descriptor::from_vec(vec![0.0; 64]).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_truncated_blob() {
        let blob = vec![0u8; DESCRIPTOR_LEN * 4 - 1];
        assert!(Descriptor::from_bytes(&blob).is_err());
    }

    #[test]
    fn test_bytes_round_trip() {
        let a = descriptor_with(0.25);
        let decoded = Descriptor::from_bytes(&a.to_bytes()).unwrap();
        assert_eq!(a, decoded);
    }
}
