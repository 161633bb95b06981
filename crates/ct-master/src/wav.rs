//! WAV encoding for 16-bit mono PCM.

use std::io::{Cursor, Seek, Write};

use ct_ir::SAMPLE_RATE;

fn spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Convert an engine sample to PCM. The mix is unclipped, so values
/// outside [-1, 1] saturate here.
fn to_pcm(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

pub fn write_wav<W: Write + Seek>(w: W, samples: &[f32]) -> Result<(), hound::Error> {
    let mut writer = hound::WavWriter::new(w, spec())?;
    for &sample in samples {
        writer.write_sample(to_pcm(sample))?;
    }
    writer.finalize()
}

pub fn samples_to_wav(samples: &[f32]) -> Result<Vec<u8>, hound::Error> {
    let mut buf = Cursor::new(Vec::new());
    write_wav(&mut buf, samples)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_saturates() {
        assert_eq!(to_pcm(0.0), 0);
        assert_eq!(to_pcm(1.0), i16::MAX);
        assert_eq!(to_pcm(3.5), i16::MAX);
        assert_eq!(to_pcm(-4.0), -i16::MAX);
    }

    #[test]
    fn header_describes_mono_16_bit() {
        let bytes = samples_to_wav(&[0.0, 0.5, -0.5, 1.0]).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 4);
    }
}
