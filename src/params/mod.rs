use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::sim::stages::distortion::DistortionAlgorithm;

pub mod state;
pub mod store;

pub use store::ParameterStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterId {
    Drive,
    Asymmetry,
    SubOctave,
    DryWet,
    Tone,
    Algorithm,
}

impl ParameterId {
    pub const ALL: [Self; 6] = [
        Self::Drive,
        Self::Asymmetry,
        Self::SubOctave,
        Self::DryWet,
        Self::Tone,
        Self::Algorithm,
    ];

    /// Identifier used by hosts and the persisted state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Asymmetry => "asymmetry",
            Self::SubOctave => "suboctave",
            Self::DryWet => "drywet",
            Self::Tone => "tone",
            Self::Algorithm => "algorithm",
        }
    }

    pub fn spec(self) -> &'static ParameterSpec {
        &PARAMETERS[self as usize]
    }
}

impl std::fmt::Display for ParameterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParameterId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::ALL.iter().find(|id| id.as_str() == s) {
            Some(id) => Ok(*id),
            None => bail!("unknown parameter '{s}'"),
        }
    }
}

/// Declared range of one control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub id: ParameterId,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Skew of the normalized mapping; values below 1 spend more of the
    /// control travel on the low end of the range.
    pub skew: f32,
}

/// Parameter table, indexed by `ParameterId as usize`.
pub const PARAMETERS: [ParameterSpec; 6] = [
    ParameterSpec {
        id: ParameterId::Drive,
        name: "Drive",
        min: 1.0,
        max: 1000.0,
        default: 1.0,
        skew: 0.3,
    },
    ParameterSpec {
        id: ParameterId::Asymmetry,
        name: "Asymmetry",
        min: -1.0,
        max: 1.0,
        default: 0.0,
        skew: 1.0,
    },
    ParameterSpec {
        id: ParameterId::SubOctave,
        name: "Sub Octave",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        skew: 1.0,
    },
    ParameterSpec {
        id: ParameterId::DryWet,
        name: "Dry/Wet",
        min: 0.0,
        max: 1.0,
        default: 1.0,
        skew: 1.0,
    },
    ParameterSpec {
        id: ParameterId::Tone,
        name: "Tone",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        skew: 1.0,
    },
    ParameterSpec {
        id: ParameterId::Algorithm,
        name: "Algorithm",
        min: 0.0,
        max: (DistortionAlgorithm::ALL.len() - 1) as f32,
        default: 0.0,
        skew: 1.0,
    },
];

impl ParameterSpec {
    pub fn clamp(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.id == ParameterId::Algorithm {
            clamped.round()
        } else {
            clamped
        }
    }

    /// Plain value to the 0..1 control position.
    pub fn normalize(&self, value: f32) -> f32 {
        let proportion = (self.clamp(value) - self.min) / (self.max - self.min);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// 0..1 control position to a plain value.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let mut proportion = normalized.clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.clamp(proportion.mul_add(self.max - self.min, self.min))
    }
}

/// The six control values, captured once per processing block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSnapshot {
    pub drive: f32,
    pub asymmetry: f32,
    #[serde(rename = "suboctave")]
    pub sub_octave: f32,
    #[serde(rename = "drywet")]
    pub dry_wet: f32,
    pub tone: f32,
    pub algorithm: DistortionAlgorithm,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            drive: ParameterId::Drive.spec().default,
            asymmetry: ParameterId::Asymmetry.spec().default,
            sub_octave: ParameterId::SubOctave.spec().default,
            dry_wet: ParameterId::DryWet.spec().default,
            tone: ParameterId::Tone.spec().default,
            algorithm: DistortionAlgorithm::default(),
        }
    }
}

impl ParameterSnapshot {
    pub fn get(&self, id: ParameterId) -> f32 {
        match id {
            ParameterId::Drive => self.drive,
            ParameterId::Asymmetry => self.asymmetry,
            ParameterId::SubOctave => self.sub_octave,
            ParameterId::DryWet => self.dry_wet,
            ParameterId::Tone => self.tone,
            ParameterId::Algorithm => self.algorithm.index() as f32,
        }
    }

    /// Copy with one field replaced. The value is stored as given; range
    /// enforcement belongs to whoever edits parameters.
    pub fn with(mut self, id: ParameterId, value: f32) -> Self {
        match id {
            ParameterId::Drive => self.drive = value,
            ParameterId::Asymmetry => self.asymmetry = value,
            ParameterId::SubOctave => self.sub_octave = value,
            ParameterId::DryWet => self.dry_wet = value,
            ParameterId::Tone => self.tone = value,
            ParameterId::Algorithm => {
                self.algorithm = DistortionAlgorithm::from_index(value.max(0.0).round() as usize);
            }
        }
        self
    }

    /// Every field pulled into its declared range.
    pub fn clamped(self) -> Self {
        ParameterId::ALL
            .iter()
            .fold(self, |snapshot, &id| snapshot.with(id, id.spec().clamp(snapshot.get(id))))
    }
}
