//! Persisted plugin state: the six parameter values as a flat, tagged JSON object.
//!
//! Filter memories are deliberately absent; every load starts from silence.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::params::ParameterSnapshot;

pub const STATE_TAG: &str = "Parameters";

#[derive(Debug, Serialize, Deserialize)]
struct StateBlob {
    tag: String,
    #[serde(flatten)]
    parameters: ParameterSnapshot,
}

pub fn save_state(parameters: &ParameterSnapshot) -> Result<Vec<u8>> {
    let blob = StateBlob {
        tag: STATE_TAG.to_string(),
        parameters: *parameters,
    };
    serde_json::to_vec_pretty(&blob).context("Failed to serialize state")
}

/// Restore parameters from a blob written by [`save_state`].
///
/// Blobs carrying another tag are rejected so the caller can keep its current
/// values. Missing fields fall back to their defaults.
pub fn load_state(data: &[u8]) -> Result<ParameterSnapshot> {
    let blob: StateBlob = serde_json::from_slice(data).context("Failed to parse state")?;
    if blob.tag != STATE_TAG {
        bail!("unexpected state tag '{}'", blob.tag);
    }
    debug!("Loaded state: {:?}", blob.parameters);
    Ok(blob.parameters.clamped())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterId;
    use crate::sim::stages::distortion::DistortionAlgorithm;

    #[test]
    fn saved_state_is_flat_and_tagged() {
        let params = ParameterSnapshot::default()
            .with(ParameterId::Drive, 250.0)
            .with(ParameterId::Algorithm, 1.0);
        let bytes = save_state(&params).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["tag"], "Parameters");
        assert_eq!(value["drive"], 250.0);
        assert_eq!(value["suboctave"], 0.0);
        assert_eq!(value["drywet"], 1.0);
        assert_eq!(value["algorithm"], "Foldback");

        assert_eq!(load_state(&bytes).unwrap(), params);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let params = load_state(br#"{"tag":"Parameters","tone":0.2}"#).unwrap();
        assert_eq!(params.tone, 0.2);
        assert_eq!(params.dry_wet, 1.0);
        assert_eq!(params.algorithm, DistortionAlgorithm::Tanh);
    }

    #[test]
    fn foreign_tag_is_rejected() {
        assert!(load_state(br#"{"tag":"Other","drive":3.0}"#).is_err());
        assert!(load_state(b"not json").is_err());
    }

    #[test]
    fn out_of_range_values_are_clamped_on_load() {
        let params = load_state(br#"{"tag":"Parameters","drive":1e9,"asymmetry":-4}"#).unwrap();
        assert_eq!(params.drive, 1000.0);
        assert_eq!(params.asymmetry, -1.0);
    }
}
