//! WAV renderer: bounces a running session to a WAV byte buffer.

use crate::session::SessionController;

/// Render `seconds` of the controller's output to a WAV file as bytes
/// (16-bit stereo PCM). The session keeps running afterwards.
pub fn render_wav(controller: &mut SessionController, seconds: f64) -> Vec<u8> {
    let sample_rate = controller.sample_rate();
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let frames = (seconds * sample_rate as f64).round() as usize;
    let mut mono = vec![0.0_f32; frames];
    controller.render(&mut mono);

    encode_wav(&to_pcm_i16_stereo(&mono), sample_rate.round() as u32, 2)
}

/// Duplicate mono samples into interleaved stereo i16 PCM.
pub fn to_pcm_i16_stereo(mono: &[f32]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &s in mono {
        let sample = (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        stereo.push(sample); // L
        stereo.push(sample); // R
    }
    stereo
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::host::RenderHost;

    fn controller(sample_rate: f32) -> SessionController {
        SessionController::with_config(
            RenderHost::new(),
            EngineConfig {
                sample_rate,
                seed: Some(7),
                ..EngineConfig::default()
            },
        )
    }

    #[test]
    fn wav_header_valid() {
        let mut c = controller(22050.0);
        c.start_session("528hz-love");
        let wav = render_wav(&mut c, 0.1);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22050);
        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 2);
    }

    #[test]
    fn wav_size_correct() {
        let mut c = controller(8000.0);
        let wav = render_wav(&mut c, 0.5);

        // 4000 frames * 2 channels * 2 bytes
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 16000);
        assert_eq!(wav.len(), 44 + 16000);
    }

    #[test]
    fn session_bounce_is_audible() {
        let mut c = controller(8000.0);
        c.set_intensity(1.0);
        c.start_session("174hz-foundation");
        let wav = render_wav(&mut c, 2.0);

        let max = wav[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]).unsigned_abs())
            .max()
            .unwrap_or(0);
        assert!(max > 100, "rendered WAV should not be silent, peak {max}");
    }

    #[test]
    fn non_finite_duration_renders_empty() {
        let mut c = controller(8000.0);
        let wav = render_wav(&mut c, f64::INFINITY);
        assert_eq!(wav.len(), 44);
    }

    #[test]
    fn pcm_is_interleaved_and_clamped() {
        let pcm = to_pcm_i16_stereo(&[0.5, -2.0]);
        assert_eq!(pcm, vec![16384, 16384, -32768, -32768]);
    }
}
