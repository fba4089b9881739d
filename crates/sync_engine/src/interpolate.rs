//! Linear gap synthesis for deficit blocks

use contracts::{ContractError, SensorTrack};

/// Round half-to-even at `decimals` decimal places
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / scale
}

/// Append `count` samples evenly spaced in the open interval `(t1, t1 + 1)`
///
/// Channel values lie on the line through `(t1, x1)` and `(t1 + 1, x2)`.
pub fn fill_gap(
    out: &mut SensorTrack,
    t1: u64,
    x1: &[f32],
    x2: &[f32],
    count: usize,
    decimals: u32,
) -> Result<(), ContractError> {
    let t1 = t1 as f64;
    let t2 = t1 + 1.0;
    let steps = (count + 1) as f64;
    let mut row = vec![0f32; x1.len()];

    for k in 1..=count {
        let frame = round_to(t1 + k as f64 * (t2 - t1) / steps, decimals);
        let offset = frame - t1;
        for ((dst, &a), &b) in row.iter_mut().zip(x1).zip(x2) {
            let (a, b) = (f64::from(a), f64::from(b));
            let slope = (b - a) / (t2 - t1);
            *dst = round_to(a + slope * offset, decimals) as f32;
        }
        out.push(frame, &row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(1.5, 0), 2.0);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(199.33333333333, 7), 199.3333333);
        assert_eq!(round_to(-0.125, 2), -0.12);
    }

    #[test]
    fn test_midpoint() {
        let mut out = SensorTrack::new(2);
        fill_gap(&mut out, 10, &[1.0, -4.0], &[3.0, 0.0], 1, 7).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.frame(0), Some(10.5));
        assert_eq!(out.channels(0), Some(&[2.0, -2.0][..]));
    }

    #[test]
    fn test_frames_strictly_inside_gap() {
        let mut out = SensorTrack::new(1);
        fill_gap(&mut out, 199, &[0.0], &[1.0], 4, 7).unwrap();
        assert_eq!(out.frames(), &[199.2, 199.4, 199.6, 199.8]);
        let values: Vec<f32> = out.values().to_vec();
        for (v, expected) in values.iter().zip([0.2f32, 0.4, 0.6, 0.8]) {
            assert!((v - expected).abs() < 1e-6, "{v} != {expected}");
        }
    }

    #[test]
    fn test_constant_signal_stays_constant() {
        let mut out = SensorTrack::new(1);
        fill_gap(&mut out, 0, &[0.75], &[0.75], 7, 7).unwrap();
        assert!(out.values().iter().all(|&v| v == 0.75));
        assert!(out.frames().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_long_gap_midpoint_is_the_mean() {
        let mut out = SensorTrack::new(1);
        fill_gap(&mut out, 10, &[0.0], &[1.0], 1001, 7).unwrap();
        assert_eq!(out.len(), 1001);
        assert_eq!(out.frame(500), Some(10.5));
        let mid = out.channels(500).unwrap()[0];
        assert!((f64::from(mid) - 0.5).abs() < 1e-6, "{mid}");
    }
}
