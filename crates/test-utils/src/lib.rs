//! Shared test utilities for the histogram equalizer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic image generators
//! - Fixed scenarios with known histograms and expected outputs
//! - Assertion helpers for mapping tables and floating-point values
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, noise_image};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that a 256-entry lookup row never decreases.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_non_decreasing;
///
/// assert_non_decreasing!(table.channel(Channel::Red));
/// ```
#[macro_export]
macro_rules! assert_non_decreasing {
    ($row:expr) => {{
        let row: &[u8] = &$row[..];
        for i in 1..row.len() {
            if row[i] < row[i - 1] {
                panic!(
                    "assertion failed: lookup row decreases at {}: {} -> {}",
                    i,
                    row[i - 1],
                    row[i]
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_non_decreasing_passes() {
        let row: Vec<u8> = (0..=255).collect();
        assert_non_decreasing!(row);
        assert_non_decreasing!([0u8, 0, 0, 7, 7, 255]);
    }

    #[test]
    #[should_panic(expected = "decreases at 2")]
    fn test_assert_non_decreasing_fails() {
        assert_non_decreasing!([0u8, 5, 4]);
    }
}
