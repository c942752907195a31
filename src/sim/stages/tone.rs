use crate::sim::stages::common::OnePoleLowpass;

const LOWPASS_COEFF: f32 = 0.3;
const HIGHPASS_POLE: f32 = 0.95;

/// Tilt EQ: 0.0 = dark, 0.5 = flat, 1.0 = bright.
///
/// Runs a one-pole low-pass and a one-pole high-pass in parallel and
/// crossfades towards one of them depending on which side of centre the
/// control sits. Both filters advance every sample regardless of the tone
/// setting so moving the knob never lands on stale state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TiltEq {
    lowpass: OnePoleLowpass,
    highpass_z1: f32,
    highpass_x1: f32,
}

impl TiltEq {
    #[inline]
    pub fn process(&mut self, input: f32, tone: f32) -> f32 {
        let lowpassed = self.lowpass.process(input, LOWPASS_COEFF);

        let highpassed = HIGHPASS_POLE.mul_add(self.highpass_z1, input - self.highpass_x1);
        self.highpass_z1 = highpassed;
        self.highpass_x1 = input;

        if tone < 0.5 {
            let blend = tone * 2.0;
            lowpassed.mul_add(1.0 - blend, input * blend)
        } else {
            let blend = (tone - 0.5) * 2.0;
            input.mul_add(1.0 - blend, highpassed * blend)
        }
    }
}
