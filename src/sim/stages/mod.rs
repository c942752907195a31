pub mod common;
pub mod distortion;
pub mod mix;
pub mod sub_octave;
pub mod tone;
