//! Audio cues for timer milestones
//!
//! Cues are described as a handful of oscillator voices with a gain
//! envelope and rendered to mono PCM on demand. A [`ToneSink`] decides what
//! happens with them; playback is always best effort.

use std::f64::consts::TAU;
use tracing::debug;

use crate::error::AudioError;

/// Sample rate used when rendering cues
pub const SAMPLE_RATE: u32 = 44_100;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

impl Waveform {
    /// Value at `phase`, measured in cycles
    fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase.fract() < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Gain curve: linear rise from silence to `peak`, then exponential decay
/// down to `floor`. Times are seconds from the start of the cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub peak: f64,
    pub attack_end: f64,
    pub release_end: f64,
    pub floor: f64,
}

impl Envelope {
    pub fn gain(&self, t: f64) -> f64 {
        if t <= 0.0 {
            0.0
        } else if t < self.attack_end {
            self.peak * t / self.attack_end
        } else if t < self.release_end {
            let span = self.release_end - self.attack_end;
            self.peak * (self.floor / self.peak).powf((t - self.attack_end) / span)
        } else {
            self.floor
        }
    }
}

/// One oscillator sounding between `start` and `stop`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub frequency: f64,
    pub start: f64,
    pub stop: f64,
    pub envelope: Envelope,
}

/// A short sound effect made of one or more voices
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    name: &'static str,
    voices: Vec<Voice>,
}

impl Cue {
    /// Ascending C5, E5, G5 arpeggio played when a timer completes
    pub fn completion_chime() -> Self {
        let voices = [523.25, 659.25, 783.99]
            .iter()
            .enumerate()
            .map(|(index, &frequency)| {
                let offset = index as f64 * 0.15;
                Voice {
                    waveform: Waveform::Sine,
                    frequency,
                    start: offset,
                    stop: 0.4 + offset,
                    envelope: Envelope {
                        peak: 0.1,
                        attack_end: 0.1 + offset,
                        release_end: 0.4 + offset,
                        floor: 0.01,
                    },
                }
            })
            .collect();

        Self {
            name: "completion",
            voices,
        }
    }

    /// Short square blip played ten seconds before the end
    pub fn warning_blip() -> Self {
        Self {
            name: "warning",
            voices: vec![Voice {
                waveform: Waveform::Square,
                frequency: 800.0,
                start: 0.0,
                stop: 0.3,
                envelope: Envelope {
                    peak: 0.05,
                    attack_end: 0.1,
                    release_end: 0.3,
                    floor: 0.01,
                },
            }],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Length of the cue in seconds
    pub fn duration(&self) -> f64 {
        self.voices.iter().map(|voice| voice.stop).fold(0.0, f64::max)
    }

    /// Mix all voices into mono samples in [-1, 1]
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = sample_rate as f64;
        let len = (self.duration() * rate).round() as usize;
        let mut samples = vec![0.0f64; len];

        for voice in &self.voices {
            let first = (voice.start * rate).round() as usize;
            let last = ((voice.stop * rate).round() as usize).min(len);
            for (index, sample) in samples.iter_mut().enumerate().take(last).skip(first) {
                let t = index as f64 / rate;
                let phase = (t - voice.start) * voice.frequency;
                *sample += voice.waveform.sample(phase) * voice.envelope.gain(t);
            }
        }

        samples
            .into_iter()
            .map(|sample| sample.clamp(-1.0, 1.0) as f32)
            .collect()
    }
}

/// Destination for rendered cues
pub trait ToneSink: Send + Sync {
    fn play(&self, cue: &Cue) -> Result<(), AudioError>;
}

/// Sink that discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ToneSink for SilentSink {
    fn play(&self, _cue: &Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Sink that plays cues on the default output device.
///
/// Every cue opens its own output stream on a short-lived thread, which is
/// released once the cue has finished.
#[cfg(feature = "playback")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceSink;

#[cfg(feature = "playback")]
impl ToneSink for DeviceSink {
    fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        if cue.duration() <= 0.0 {
            return Err(AudioError::EmptyCue);
        }

        let cue = cue.clone();
        std::thread::Builder::new()
            .name(format!("cue-{}", cue.name()))
            .spawn(move || {
                if let Err(e) = play_on_device(&cue) {
                    debug!("Could not play {} cue: {}", cue.name(), e);
                }
            })
            .map(|_| ())
            .map_err(AudioError::Spawn)
    }
}

/// Play `cue` on the default output device, blocking until it ends
#[cfg(feature = "playback")]
fn play_on_device(cue: &Cue) -> Result<(), AudioError> {
    let (_stream, handle) = rodio::OutputStream::try_default()
        .map_err(|e| AudioError::Unavailable(e.to_string()))?;
    let sink = rodio::Sink::try_new(&handle).map_err(|e| AudioError::Unavailable(e.to_string()))?;
    sink.append(rodio::buffer::SamplesBuffer::new(
        1,
        SAMPLE_RATE,
        cue.render(SAMPLE_RATE),
    ));
    sink.sleep_until_end();
    Ok(())
}

/// Play a cue, swallowing any failure. Returns whether the sink accepted it.
pub fn play_cue(sink: &dyn ToneSink, cue: &Cue) -> bool {
    match sink.play(cue) {
        Ok(()) => true,
        Err(e) => {
            debug!("Could not play {} cue: {}", cue.name(), e);
            false
        }
    }
}
