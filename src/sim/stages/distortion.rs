use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Foldback reflection cap. Keeps the loop finite on pathological input.
const MAX_FOLDS: usize = 20;

#[derive(ValueEnum, Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DistortionAlgorithm {
    /// Symmetric tanh saturation with a biased operating point.
    #[default]
    Tanh,
    /// Wave folding between asymmetric thresholds.
    Foldback,
    /// Exponential saturation with a harder negative knee.
    Tube,
}

impl std::fmt::Display for DistortionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tanh => write!(f, "Tanh"),
            Self::Foldback => write!(f, "Foldback"),
            Self::Tube => write!(f, "Tube"),
        }
    }
}

impl DistortionAlgorithm {
    pub const ALL: [Self; 3] = [Self::Tanh, Self::Foldback, Self::Tube];

    /// Position in the host-facing choice list.
    pub const fn index(self) -> usize {
        match self {
            Self::Tanh => 0,
            Self::Foldback => 1,
            Self::Tube => 2,
        }
    }

    /// Maps a choice index back to an algorithm. Out-of-range indices fall back to `Tanh`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    /// Run one sample through the selected transfer function.
    ///
    /// At or below unity drive the stage is transparent and the input comes
    /// back untouched.
    #[inline]
    pub fn process(self, input: f32, drive: f32, asymmetry: f32) -> f32 {
        if is_bypassed(drive) {
            return input;
        }

        match self {
            Self::Tanh => tanh(input, drive, asymmetry),
            Self::Foldback => foldback(input, drive, asymmetry),
            Self::Tube => tube(input, drive, asymmetry),
        }
    }
}

/// Whether the distortion stage passes the signal through for this drive.
#[inline]
pub fn is_bypassed(drive: f32) -> bool {
    drive <= 1.0
}

#[inline]
fn tanh(input: f32, drive: f32, asymmetry: f32) -> f32 {
    let biased = asymmetry.mul_add(0.5, input);
    (drive * biased).tanh()
}

#[inline]
fn foldback(input: f32, drive: f32, asymmetry: f32) -> f32 {
    // Positive asymmetry raises the upper threshold and lowers the lower one.
    let pos_threshold = asymmetry.mul_add(0.5, 1.0);
    let neg_threshold = asymmetry.mul_add(-0.5, 1.0);

    let mut folded = input * drive.sqrt();

    // A reflection about each threshold is a shift by one period, so whole
    // periods can be stripped before the capped loop.
    let period = 2.0 * (pos_threshold + neg_threshold);
    if period > 0.0 && (folded > pos_threshold + period || folded < -neg_threshold - period) {
        folded = (folded + neg_threshold).rem_euclid(period) - neg_threshold;
    }

    for _ in 0..MAX_FOLDS {
        if folded > pos_threshold {
            folded = 2.0f32.mul_add(pos_threshold, -folded);
        } else if folded < -neg_threshold {
            folded = (-2.0f32).mul_add(neg_threshold, -folded);
        } else {
            break;
        }
    }

    folded * 0.8
}

#[inline]
fn tube(input: f32, drive: f32, asymmetry: f32) -> f32 {
    let biased = asymmetry.mul_add(0.5, input);
    let scaled = biased * drive.sqrt() * 5.0;

    let saturated = if scaled >= 0.0 {
        1.0 - (-scaled).exp()
    } else {
        // Negative half compresses harder
        (scaled * 1.2).exp() - 1.0
    };

    saturated * 0.85
}
