/// Sound engine: procedural 8-bit style sound effects and a looping
/// background track via rodio.
///
/// All sounds are generated as in-memory buffers at init time.
/// Each effect owns one Sink; a request for an effect whose previous
/// instance is still playing is dropped. The music has its own Sink and
/// is paused and resumed with the game.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(any(test, feature = "sound"))]
use std::collections::HashMap;

use crate::sim::event::Sound;

/// A playing instance of an effect.
#[cfg(any(test, feature = "sound"))]
trait Voice {
    fn is_playing(&self) -> bool;
}

/// Whether the last instance of `sound` is still audible.
#[cfg(any(test, feature = "sound"))]
fn still_playing<V: Voice>(in_flight: &HashMap<Sound, V>, sound: Sound) -> bool {
    in_flight.get(&sound).is_some_and(Voice::is_playing)
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use log::{info, trace, warn};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::{still_playing, Voice};
    use crate::sim::event::Sound;

    const SAMPLE_RATE: u32 = 22050;
    const MUSIC_VOLUME: f32 = 0.66;

    impl Voice for Sink {
        fn is_playing(&self) -> bool {
            !self.empty()
        }
    }

    /// Pre-generated WAV buffers plus the sink currently playing each one.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Sound, Arc<Vec<u8>>>,
        in_flight: HashMap<Sound, Sink>,
        music: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            let buffers = [
                (Sound::Jump, gen_jump()),
                (Sound::Bump, gen_bump()),
                (Sound::Dig, gen_dig()),
            ]
            .into_iter()
            .map(|(id, samples)| (id, Arc::new(make_wav(&samples))))
            .collect();

            Some(SoundEngine {
                _stream: stream,
                handle,
                buffers,
                in_flight: HashMap::new(),
                music: None,
            })
        }

        /// Start the background loop from the top.
        pub fn start_music(&mut self) {
            let sink = match Sink::try_new(&self.handle) {
                Ok(sink) => sink,
                Err(e) => {
                    warn!("could not open music sink: {e}");
                    return;
                }
            };
            sink.set_volume(MUSIC_VOLUME);
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, gen_music()).repeat_infinite());
            info!("music started");
            self.music = Some(sink);
        }

        pub fn set_music_paused(&mut self, paused: bool) {
            let Some(music) = &self.music else { return };
            if paused {
                music.pause();
            } else {
                music.play();
            }
        }

        /// Fire-and-forget playback, ignored while the same effect is playing.
        pub fn play(&mut self, sound: Sound) {
            if still_playing(&self.in_flight, sound) {
                trace!("{sound:?} still playing, request dropped");
                return;
            }
            let Some(buf) = self.buffers.get(&sound) else { return };
            let sink = match Sink::try_new(&self.handle) {
                Ok(sink) => sink,
                Err(e) => {
                    warn!("could not open sink for {sound:?}: {e}");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    self.in_flight.insert(sound, sink);
                }
                Err(e) => warn!("could not decode {sound:?}: {e}"),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Square wave from a sine sign, for the retro edge.
    fn square(t: f32, freq: f32) -> f32 {
        if (t * freq * 2.0 * std::f32::consts::PI).sin() >= 0.0 { 1.0 } else { -1.0 }
    }

    /// Jump: quick rising square sweep
    pub(super) fn gen_jump() -> Vec<f32> {
        let duration = 0.14;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 + t * 660.0; // 220Hz → 880Hz
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.5);
                square(ti, freq) * env * 0.15
            })
            .collect()
    }

    /// Bump: short low thud
    pub(super) fn gen_bump() -> Vec<f32> {
        let duration = 0.08;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 140.0 - t * 60.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(2.0);
                ((ti * freq * 2.0 * std::f32::consts::PI).sin() * 0.7 + square(ti, freq) * 0.3) * env * 0.35
            })
            .collect()
    }

    /// Dig: short noise burst with descending pitch
    pub(super) fn gen_dig() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 200.0 + (1.0 - t) * 300.0; // descending
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * 0.3 + noise * 0.7) * env * 0.3
            })
            .collect()
    }

    /// Music: a two-bar square-wave bass line over a soft triangle lead.
    pub(super) fn gen_music() -> Vec<f32> {
        const BASS: [f32; 16] = [
            110.0, 110.0, 220.0, 110.0, 98.0, 98.0, 196.0, 98.0,
            87.3, 87.3, 174.6, 87.3, 98.0, 98.0, 196.0, 123.5,
        ];
        const LEAD: [f32; 8] = [440.0, 523.3, 493.9, 392.0, 349.2, 440.0, 392.0, 329.6];
        let step = (SAMPLE_RATE as f32 * 0.15) as usize;
        let mut out = Vec::with_capacity(step * BASS.len());
        for (i, &bass) in BASS.iter().enumerate() {
            let lead = LEAD[i / 2];
            for j in 0..step {
                let ti = (i * step + j) as f32 / SAMPLE_RATE as f32;
                let t = j as f32 / step as f32;
                let env = (1.0 - t).powf(1.5);
                let phase = (ti * lead).fract();
                let tri = 4.0 * (phase - 0.5).abs() - 1.0;
                out.push(square(ti, bass) * env * 0.12 + tri * 0.06);
            }
        }
        out
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn start_music(&mut self) {}
    pub fn set_music_paused(&mut self, _paused: bool) {}
    pub fn play(&mut self, _sound: Sound) {}
}
