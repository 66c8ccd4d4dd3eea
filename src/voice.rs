//! PCM16 frame codec and gapless playback scheduling for realtime voice.
//!
//! Microphone audio goes out as 16 kHz mono PCM16, base64 encoded. Model
//! audio comes back as 24 kHz PCM16 and is scheduled back-to-back on a
//! playback clock.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tracing::debug;

pub const INPUT_SAMPLE_RATE: u32 = 16_000;
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

const PCM_SCALE: f32 = 32768.0;

/// One encoded microphone frame ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBlob {
    pub data: String,
    pub mime_type: String,
}

/// Encode float samples in [-1, 1] as base64 little-endian PCM16.
pub fn encode_input(samples: &[f32]) -> AudioBlob {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
        // `as` saturates, so 1.0 * 32768 lands on i16::MAX.
        let pcm = (s * PCM_SCALE) as i16;
        bytes.extend_from_slice(&pcm.to_le_bytes());
    }
    AudioBlob {
        data: STANDARD.encode(&bytes),
        mime_type: format!("audio/pcm;rate={INPUT_SAMPLE_RATE}"),
    }
}

/// Split interleaved little-endian PCM16 into one float buffer per channel.
///
/// A trailing partial frame is dropped. Zero channels yields no buffers.
pub fn decode_output(bytes: &[u8], channels: usize) -> Vec<Vec<f32>> {
    if channels == 0 {
        return Vec::new();
    }
    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / PCM_SCALE)
        .collect();
    let frames = samples.len() / channels;
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in out.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    out
}

/// Duration in seconds of a mono PCM16 buffer at the output rate.
pub fn output_duration(bytes: usize) -> f64 {
    (bytes / 2) as f64 / f64::from(OUTPUT_SAMPLE_RATE)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledClip {
    pub start: f64,
    pub end: f64,
}

/// Back-to-back scheduling of output clips on an audio clock (seconds).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackQueue {
    next_start: f64,
    clips: Vec<ScheduledClip>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a clip and return its start time.
    pub fn enqueue(&mut self, now: f64, duration: f64) -> f64 {
        let start = self.next_start.max(now);
        let end = start + duration.max(0.0);
        self.clips.push(ScheduledClip { start, end });
        self.next_start = end;
        start
    }

    /// Drop every queued clip, as when the user barges in. Returns how many
    /// clips were cut.
    pub fn interrupt(&mut self) -> usize {
        let flushed = self.clips.len();
        self.clips.clear();
        self.next_start = 0.0;
        debug!(flushed, "playback interrupted");
        flushed
    }

    /// Forget clips that finished playing by `now`.
    pub fn reap(&mut self, now: f64) {
        self.clips.retain(|c| c.end > now);
    }

    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    pub fn clips(&self) -> &[ScheduledClip] {
        &self.clips
    }

    pub fn is_idle(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_scales_and_clamps() {
        let blob = encode_input(&[0.0, 0.5, -1.0, 2.0, f32::NAN]);
        assert_eq!(blob.mime_type, "audio/pcm;rate=16000");
        let bytes = STANDARD.decode(&blob.data).unwrap();
        let pcm: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(pcm, vec![0, 16384, -32768, 32767, 0]);
    }

    #[test]
    fn decode_deinterleaves_channels() {
        let mut bytes = Vec::new();
        for v in [16384i16, -16384, 0, 8192, 7] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let out = decode_output(&bytes, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], vec![0.5, 0.0]);
        assert_eq!(out[1], vec![-0.5, 0.25]);

        let mono = decode_output(&bytes[..5], 1);
        assert_eq!(mono[0].len(), 2);
        assert!(decode_output(&bytes, 0).is_empty());
    }

    #[test]
    fn output_duration_at_24khz() {
        assert_eq!(output_duration(48_000), 1.0);
    }

    #[test]
    fn clips_play_back_to_back() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.enqueue(1.0, 0.5), 1.0);
        assert_eq!(queue.enqueue(1.1, 0.5), 1.5);
        assert_eq!(queue.next_start(), 2.0);
        // A gap in arrivals restarts at the current time.
        assert_eq!(queue.enqueue(3.0, 0.25), 3.0);
    }

    #[test]
    fn interrupt_flushes_everything() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(0.0, 1.0);
        queue.enqueue(0.0, 1.0);
        assert_eq!(queue.interrupt(), 2);
        assert!(queue.is_idle());
        assert_eq!(queue.next_start(), 0.0);
        assert_eq!(queue.enqueue(5.0, 1.0), 5.0);
    }

    #[test]
    fn reap_drops_finished_clips() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(0.0, 1.0);
        queue.enqueue(0.0, 1.0);
        queue.reap(1.0);
        assert_eq!(queue.clips(), &[ScheduledClip { start: 1.0, end: 2.0 }]);
        queue.reap(2.5);
        assert!(queue.is_idle());
    }
}
