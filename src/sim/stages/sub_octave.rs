use crate::sim::stages::common::OnePoleLowpass;

const SMOOTHING: f32 = 0.1;
const OUTPUT_LEVEL: f32 = 0.3;

/// Zero-crossing frequency divider.
///
/// Every positive-going zero crossing toggles a flip-flop, so the square wave
/// it emits runs one octave below the input. The square is rounded off with a
/// fixed one-pole smoother before it is mixed back in. The flip-flop starts
/// low, so the divider sits at its negative level until the first crossing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubOctave {
    last_positive: bool,
    flip_flop: bool,
    smoother: OnePoleLowpass,
}

impl SubOctave {
    /// Advance the divider by one sample and return the un-mixed contribution.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let positive = input > 0.0;
        if positive && !self.last_positive {
            self.flip_flop = !self.flip_flop;
        }
        self.last_positive = positive;

        let raw = if self.flip_flop { 1.0 } else { -1.0 };
        self.smoother.process(raw, SMOOTHING) * OUTPUT_LEVEL
    }

    pub const fn flip_flop(&self) -> bool {
        self.flip_flop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_toggles_once_per_input_period() {
        let mut sub = SubOctave::default();
        let period = 8;
        let mut toggles = 0;
        let mut last = sub.flip_flop();
        let mut divider_edges = Vec::new();

        for n in 0..period * 16 {
            // Square wave: first half of each period positive.
            let s = if n % period < period / 2 { 0.5 } else { -0.5 };
            sub.process(s);
            if sub.flip_flop() != last {
                toggles += 1;
                last = sub.flip_flop();
                if last {
                    divider_edges.push(n);
                }
            }
        }

        // 16 input periods -> 16 toggles -> 8 divider periods.
        assert_eq!(toggles, 16);
        assert_eq!(divider_edges.len(), 8);
        for pair in divider_edges.windows(2) {
            assert_eq!(pair[1] - pair[0], 2 * period);
        }
    }

    #[test]
    fn alternating_samples_halve_the_rate() {
        let mut sub = SubOctave::default();
        let mut states = Vec::new();
        for n in 0..8 {
            let s = if n % 2 == 0 { 1.0 } else { -1.0 };
            sub.process(s);
            states.push(sub.flip_flop());
        }
        assert_eq!(
            states,
            vec![true, true, false, false, true, true, false, false]
        );
    }

    #[test]
    fn input_that_never_rises_settles_at_the_low_level() {
        let mut sub = SubOctave::default();
        let mut last = 0.0;
        for _ in 0..200 {
            last = sub.process(-0.5);
        }
        assert!(!sub.flip_flop());
        assert!((last + 0.3).abs() < 1e-4, "got {last}");

        // Silence never crosses upwards either.
        let mut sub = SubOctave::default();
        let first = sub.process(0.0);
        assert!((first + 0.1 * 0.3).abs() < 1e-7);
        for _ in 0..200 {
            last = sub.process(0.0);
        }
        assert!((last + 0.3).abs() < 1e-4);
    }

    #[test]
    fn low_half_of_the_divider_is_negative() {
        let mut sub = SubOctave::default();
        sub.process(1.0);
        sub.process(-1.0);
        // Second upward crossing drops the flip-flop low.
        sub.process(1.0);
        assert!(!sub.flip_flop());
        let mut last = 0.0;
        for _ in 0..200 {
            last = sub.process(-1.0);
        }
        assert!((last + 0.3).abs() < 1e-4);
    }

    #[test]
    fn output_is_smoothed_and_scaled() {
        let mut sub = SubOctave::default();
        let first = sub.process(1.0);
        // Flip-flop went high: smoother moves 10 % of the way to +1.
        assert!((first - 0.1 * 0.3).abs() < 1e-7);

        for _ in 0..500 {
            sub.process(1.0);
        }
        assert!((sub.process(1.0) - 0.3).abs() < 1e-4);
    }
}
