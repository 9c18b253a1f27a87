/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_gem: Arc<Vec<u8>>,
        sfx_power_up: Arc<Vec<u8>>,
        sfx_poison: Arc<Vec<u8>>,
        sfx_stomp: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_bonus: Arc<Vec<u8>>,
        sfx_exit: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            let sfx_gem = Arc::new(make_wav(&gen_gem()));
            let sfx_power_up = Arc::new(make_wav(&gen_power_up()));
            let sfx_poison = Arc::new(make_wav(&gen_poison()));
            let sfx_stomp = Arc::new(make_wav(&gen_stomp()));
            let sfx_die = Arc::new(make_wav(&gen_die()));
            let sfx_bonus = Arc::new(make_wav(&gen_bonus()));
            let sfx_exit = Arc::new(make_wav(&gen_exit()));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_gem,
                sfx_power_up,
                sfx_poison,
                sfx_stomp,
                sfx_die,
                sfx_bonus,
                sfx_exit,
            })
        }

        /// Play the effect matching a simulation event.
        pub fn play_event(&self, event: GameEvent) {
            match event {
                GameEvent::GemCollected => self.play(&self.sfx_gem),
                GameEvent::PowerUpStarted => self.play(&self.sfx_power_up),
                GameEvent::Poisoned => self.play(&self.sfx_poison),
                GameEvent::EnemyKilled => self.play(&self.sfx_stomp),
                GameEvent::PlayerKilled => self.play(&self.sfx_die),
                GameEvent::BonusLife => self.play(&self.sfx_bonus),
                GameEvent::ExitReached => self.play(&self.sfx_exit),
            }
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(samples: &mut Vec<f32>, freq: f32, duration: f32, volume: f32) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            // Square-ish wave (sine + 3rd harmonic) for retro feel
            let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
            samples.push(wave * env * volume);
        }
    }

    /// Gem pickup: quick ascending two-note blip G6→B6
    fn gen_gem() -> Vec<f32> {
        let mut samples = Vec::new();
        tone(&mut samples, 1568.0, 0.04, 0.25);
        tone(&mut samples, 1976.0, 0.06, 0.25);
        samples
    }

    /// Power-up: ascending arpeggio C6→E6→G6→C7
    fn gen_power_up() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[1047.0_f32, 1319.0, 1568.0, 2093.0] {
            tone(&mut samples, freq, 0.05, 0.25);
        }
        samples
    }

    /// Poison: warbling low minor second
    fn gen_poison() -> Vec<f32> {
        let mut samples = Vec::new();
        for _ in 0..3 {
            tone(&mut samples, 311.0, 0.06, 0.3);
            tone(&mut samples, 294.0, 0.06, 0.3);
        }
        samples
    }

    /// Enemy stomped: short descending thud
    fn gen_stomp() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 500.0 - t * 350.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.3
            })
            .collect()
    }

    /// Death: sad descending tone
    fn gen_die() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[440.0_f32, 370.0, 311.0, 261.0] {
            tone(&mut samples, freq, 0.12, 0.3);
        }
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Extra life: triumphant two-note chime G5, C6
    fn gen_bonus() -> Vec<f32> {
        let mut samples = Vec::new();
        tone(&mut samples, 784.0, 0.08, 0.3);
        tone(&mut samples, 1047.0, 0.15, 0.3);
        samples
    }

    /// Exit reached: victory ascending fanfare with sustained top note
    fn gen_exit() -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in &[523.0_f32, 659.0, 784.0] {
            tone(&mut samples, freq, 0.1, 0.3);
        }
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.3) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = (t * last_freq * 2.0 * std::f32::consts::PI).sin();
            samples.push(wave * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
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
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_event(&self, _event: crate::sim::event::GameEvent) {}
}
