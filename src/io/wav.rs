use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Deinterleaved audio, one `Vec` per channel.
pub struct AudioFile {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioFile {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

/// Read a WAV file into normalized `f32` channels.
pub fn read_wav(path: &Path) -> Result<AudioFile> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("failed to open WAV file '{}'", path.display()))?;
    let spec = reader.spec();
    debug!("Input spec: {spec:?}");

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to read float samples")?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("failed to read integer samples")?
        }
        (format, bits) => bail!("unsupported WAV format: {format:?} at {bits} bits"),
    };

    let channel_count = usize::from(spec.channels.max(1));
    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    info!(
        "Loaded '{}': {} channel(s), {} frames at {} Hz",
        path.display(),
        channel_count,
        channels[0].len(),
        spec.sample_rate
    );

    Ok(AudioFile {
        sample_rate: spec.sample_rate,
        channels,
    })
}

/// Streaming 32-bit float WAV writer fed with deinterleaved blocks.
pub struct BlockWriter {
    writer: WavWriter<BufWriter<File>>,
    channels: usize,
}

impl BlockWriter {
    pub fn create(path: &Path, sample_rate: u32, channels: usize) -> Result<Self> {
        let spec = WavSpec {
            channels: u16::try_from(channels).context("too many channels for WAV")?,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file '{}'", path.display()))?;
        Ok(Self { writer, channels })
    }

    /// Interleave and append one block. Every channel slice must have the same length.
    pub fn write_block(&mut self, block: &[&mut [f32]]) -> Result<()> {
        if block.len() != self.channels {
            bail!(
                "block has {} channels, writer expects {}",
                block.len(),
                self.channels
            );
        }
        let frames = block.first().map_or(0, |c| c.len());
        for frame in 0..frames {
            for channel in block {
                self.writer
                    .write_sample(channel[frame])
                    .context("failed to write sample")?;
            }
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
