//! Rate of force development.

use tracing::debug;

use gait_core::{Error, Result, Signal, Slope};

/// Discrete derivative of force with respect to time.
///
/// Interior points use the central difference
/// `(f[i+1] - f[i-1]) / (t[i+1] - t[i-1])`; the first and last points use
/// forward and backward differences. The result has one value per sample.
pub fn slope(signal: &Signal) -> Result<Slope> {
    let n = signal.len();
    if n < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            available: n,
        });
    }

    let s = signal.samples();
    let diff = |hi: usize, lo: usize| (s[hi].force - s[lo].force) / (s[hi].time - s[lo].time);

    let mut values = Vec::with_capacity(n);
    values.push(diff(1, 0));
    values.extend((1..n - 1).map(|i| diff(i + 1, i - 1)));
    values.push(diff(n - 1, n - 2));

    debug!(samples = n, "Computed slope");

    Ok(Slope::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_ramp() {
        let time: Vec<f64> = (0..50).map(|i| i as f64 * 0.01).collect();
        let force: Vec<f64> = time.iter().map(|t| 250.0 * t).collect();
        let signal = Signal::from_columns(&time, &force).unwrap();

        let slope = slope(&signal).unwrap();

        assert_eq!(slope.len(), signal.len());
        assert!(slope.values().iter().all(|k| (k - 250.0).abs() < 1e-9));
    }

    #[test]
    fn test_non_uniform_spacing() {
        // f = t^2, each point uses the secant through its neighbours
        let time = [0.0, 0.1, 0.3, 0.6];
        let force: Vec<f64> = time.iter().map(|t| t * t).collect();
        let signal = Signal::from_columns(&time, &force).unwrap();

        let slope = slope(&signal).unwrap();

        assert!((slope[0] - 0.1).abs() < 1e-12);
        assert!((slope[1] - (0.09 - 0.0) / 0.3).abs() < 1e-12);
        assert!((slope[2] - (0.36 - 0.01) / 0.5).abs() < 1e-12);
        assert!((slope[3] - (0.36 - 0.09) / 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_two_samples() {
        let signal = Signal::from_columns(&[0.0, 0.5], &[1.0, 3.0]).unwrap();
        let slope = slope(&signal).unwrap();
        assert_eq!(slope.values(), &[4.0, 4.0]);
    }

    #[test]
    fn test_insufficient_data() {
        let signal = Signal::from_columns(&[0.0], &[1.0]).unwrap();
        assert_eq!(
            slope(&signal).unwrap_err(),
            Error::InsufficientData { required: 2, available: 1 }
        );
    }
}
