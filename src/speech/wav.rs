//! Lossless WAV concatenation.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{ReelError, Result};

/// Length of a WAV file in seconds.
pub fn wav_duration(path: &Path) -> Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Append `inputs` sample-for-sample into `output`. All inputs must share
/// one format. Returns the output duration in seconds.
pub fn concat_wavs(inputs: &[impl AsRef<Path>], output: &Path) -> Result<f64> {
    let Some(first) = inputs.first() else {
        return Err(ReelError::Synthesis("no audio chunks to concatenate".to_string()));
    };
    let spec = WavReader::open(first.as_ref())?.spec();
    let mut writer = WavWriter::create(output, spec)?;
    let mut frames: u64 = 0;

    for input in inputs {
        let path = input.as_ref();
        let mut reader = WavReader::open(path)?;
        if !same_format(reader.spec(), spec) {
            return Err(ReelError::Synthesis(format!(
                "{} has format {:?}, expected {:?}",
                path.display(),
                reader.spec(),
                spec
            )));
        }
        frames += u64::from(reader.duration());
        match spec.sample_format {
            SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    writer.write_sample(sample?)?;
                }
            }
            SampleFormat::Int => {
                for sample in reader.samples::<i32>() {
                    writer.write_sample(sample?)?;
                }
            }
        }
    }
    writer.finalize()?;
    Ok(frames as f64 / f64::from(spec.sample_rate))
}

fn same_format(a: WavSpec, b: WavSpec) -> bool {
    a.channels == b.channels
        && a.sample_rate == b.sample_rate
        && a.bits_per_sample == b.bits_per_sample
        && a.sample_format == b.sample_format
}

/// Write `seconds` of a quiet tone; used by tests and the fake engines.
#[cfg(test)]
pub(crate) fn write_test_wav(path: &Path, seconds: f64, sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let n = (seconds * f64::from(sample_rate)) as usize;
    for i in 0..n {
        writer.write_sample(((i % 100) as i16) - 50).unwrap();
    }
    writer.finalize().unwrap();
}
