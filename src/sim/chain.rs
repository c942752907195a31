use crate::params::ParameterSnapshot;
use crate::sim::stages::common::DcBlocker;
use crate::sim::stages::distortion::is_bypassed;
use crate::sim::stages::mix::dry_wet;
use crate::sim::stages::sub_octave::SubOctave;
use crate::sim::stages::tone::TiltEq;

/// Number of channels that carry filter state. Wider layouts get the reduced
/// pipeline (distortion and dry/wet only) on the extra channels.
pub const STATEFUL_CHANNELS: usize = 2;

/// Filter memories for one channel. Zeroed at construction, never reset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelState {
    pub dc_blocker: DcBlocker,
    pub sub_octave: SubOctave,
    pub tone: TiltEq,
}

/// DistortionChain runs every channel through the fixed five-stage pipeline:
/// distortion, DC blocker, sub-octave mix-in, tilt EQ and dry/wet.
#[derive(Clone, Debug, Default)]
pub struct DistortionChain {
    channels: [ChannelState; STATEFUL_CHANNELS],
}

impl DistortionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one block in place.
    ///
    /// `channels` holds one slice per channel; the channel count and the block
    /// length are whatever the host hands over this time. The parameters are
    /// read once and held for the whole block.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]], params: &ParameterSnapshot) {
        let params = *params;
        for (index, samples) in channels.iter_mut().enumerate() {
            match self.channels.get_mut(index) {
                Some(state) => {
                    for sample in samples.iter_mut() {
                        *sample = process_stateful(state, *sample, &params);
                    }
                }
                None => {
                    for sample in samples.iter_mut() {
                        *sample = process_reduced(*sample, &params);
                    }
                }
            }
        }
    }

    /// Process a single sample for `channel`.
    #[inline]
    pub fn process(&mut self, channel: usize, input: f32, params: &ParameterSnapshot) -> f32 {
        match self.channels.get_mut(channel) {
            Some(state) => process_stateful(state, input, params),
            None => process_reduced(input, params),
        }
    }

    pub fn channel_state(&self, channel: usize) -> Option<&ChannelState> {
        self.channels.get(channel)
    }
}

#[inline]
fn process_stateful(state: &mut ChannelState, input: f32, params: &ParameterSnapshot) -> f32 {
    let processed = if is_bypassed(params.drive) {
        input
    } else {
        let distorted = params
            .algorithm
            .process(input, params.drive, params.asymmetry);
        state.dc_blocker.process(distorted)
    };

    // The divider listens to the distortion output even when drive is bypassed.
    let sub = if params.sub_octave > 0.0 {
        state.sub_octave.process(processed)
    } else {
        0.0
    };
    let wet = sub.mul_add(params.sub_octave, processed);

    let shaped = state.tone.process(wet, params.tone);

    dry_wet(input, shaped, params.dry_wet)
}

#[inline]
fn process_reduced(input: f32, params: &ParameterSnapshot) -> f32 {
    let processed = params
        .algorithm
        .process(input, params.drive, params.asymmetry);
    dry_wet(input, processed, params.dry_wet)
}
