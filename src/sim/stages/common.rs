/// Pole of the post-distortion DC blocker.
pub const DC_BLOCKER_POLE: f32 = 0.995;

/// DC blocker using a first-order high-pass filter.
///
/// `y[n] = x[n] - x[n-1] + R * y[n-1]`
///
/// Reference: <https://ccrma.stanford.edu/~jos/fp/DC_Blocker.html>
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DcBlocker {
    x1: f32,
    y1: f32,
    pole: f32,
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new(DC_BLOCKER_POLE)
    }
}

impl DcBlocker {
    pub const fn new(pole: f32) -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            pole,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.pole.mul_add(self.y1, input - self.x1);
        self.x1 = input;
        self.y1 = output;
        output
    }
}

/// One-pole smoother, `z += coeff * (x - z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OnePoleLowpass {
    z1: f32,
}

impl OnePoleLowpass {
    #[inline]
    pub fn process(&mut self, input: f32, coeff: f32) -> f32 {
        self.z1 = coeff.mul_add(input - self.z1, self.z1);
        self.z1
    }

    pub const fn value(&self) -> f32 {
        self.z1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_blocker_follows_recurrence() {
        let mut dc = DcBlocker::default();
        let y0 = dc.process(1.0);
        assert_eq!(y0, 1.0);
        let y1 = dc.process(1.0);
        assert!((y1 - 0.995).abs() < 1e-7);
        let y2 = dc.process(0.0);
        assert!((y2 - (-1.0 + 0.995 * 0.995)).abs() < 1e-6);
    }

    #[test]
    fn dc_blocker_removes_constant_offset() {
        let mut dc = DcBlocker::default();
        for _ in 0..4096 {
            dc.process(0.4);
        }
        assert!(dc.process(0.4).abs() < 1e-3);
    }

    #[test]
    fn dc_blocker_passes_alternating_signal() {
        let mut dc = DcBlocker::default();
        let mut acc = 0.0;
        for i in 0..512 {
            let s = if i % 2 == 0 { 0.5 } else { -0.5 };
            let y = dc.process(s);
            if i >= 256 {
                acc += y.abs();
            }
        }
        assert!(acc / 256.0 > 0.45, "high band attenuated: {}", acc / 256.0);
    }

    #[test]
    fn lowpass_converges_to_input() {
        let mut lp = OnePoleLowpass::default();
        for _ in 0..200 {
            lp.process(1.0, 0.1);
        }
        assert!((lp.value() - 1.0).abs() < 1e-4);
    }
}
