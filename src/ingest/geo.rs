//! Deterministic stand-in coordinates for consumers without geolocation.

use sha2::{Digest, Sha256};

/// Scatter a consumer within `spread` degrees north-east of `reference`, keyed by a hash of
/// its id so the same consumer always lands on the same point.
pub fn synthetic_coordinates(consumer_id: &str, reference: (f64, f64), spread: f64) -> (f64, f64) {
    let digest = Sha256::digest(consumer_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let h = u64::from_be_bytes(bytes);
    let lat = reference.0 + (h % 1000) as f64 / 1000.0 * spread;
    let lon = reference.1 + ((h >> 10) % 1000) as f64 / 1000.0 * spread;
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_bounded() {
        let r = (28.6139, 77.2090);
        let a = synthetic_coordinates("C-001", r, 0.1);
        assert_eq!(a, synthetic_coordinates("C-001", r, 0.1));
        assert!(a.0 >= r.0 && a.0 < r.0 + 0.1);
        assert!(a.1 >= r.1 && a.1 < r.1 + 0.1);
        assert_ne!(a, synthetic_coordinates("C-002", r, 0.1));
    }
}
