use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// dB reported when the buffer is pure silence.
pub const SILENCE_DB: f32 = -90.0;

const I16_SCALE: f32 = 32_768.0;

/// Lock-free level slot written from the driver callback and read by the UI.
#[derive(Clone, Debug)]
pub struct LevelSlot {
    rms_bits: Arc<AtomicU32>,
}

impl LevelSlot {
    pub fn new() -> Self {
        Self {
            rms_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        }
    }

    /// Single store, safe to call from a real-time callback.
    pub fn store_rms(&self, rms: f32) {
        self.rms_bits.store(rms.to_bits(), Ordering::Relaxed);
    }

    pub fn rms(&self) -> f32 {
        f32::from_bits(self.rms_bits.load(Ordering::Relaxed))
    }

    pub fn db(&self) -> f32 {
        rms_to_db(self.rms())
    }
}

impl Default for LevelSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Input and output level slots for one device session.
#[derive(Clone, Debug, Default)]
pub struct Levels {
    pub input: LevelSlot,
    pub output: LevelSlot,
}

/// RMS of `data` after mapping each sample into `[-1, 1]` with `to_unit`.
pub(crate) fn rms_by<T, F>(data: &[T], mut to_unit: F) -> f32
where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if data.is_empty() {
        return 0.0;
    }
    let energy: f32 = data
        .iter()
        .copied()
        .map(|sample| {
            let v = to_unit(sample);
            v * v
        })
        .sum();
    (energy / data.len() as f32).sqrt().min(1.0)
}

pub fn i16_to_unit(sample: i16) -> f32 {
    sample as f32 / I16_SCALE
}

pub fn u16_to_unit(sample: u16) -> f32 {
    (sample as f32 - I16_SCALE) / I16_SCALE
}

/// RMS over interleaved signed 16-bit samples, any channel count.
pub fn rms_i16(samples: &[i16]) -> f32 {
    rms_by(samples, i16_to_unit)
}

/// RMS over a raw little-endian 16-bit buffer; a trailing odd byte is ignored.
pub fn rms_le_bytes(data: &[u8]) -> f32 {
    let count = data.len() / 2;
    if count == 0 {
        return 0.0;
    }
    let energy: f32 = data
        .chunks_exact(2)
        .map(|pair| {
            let v = i16_to_unit(i16::from_le_bytes([pair[0], pair[1]]));
            v * v
        })
        .sum();
    (energy / count as f32).sqrt().min(1.0)
}

pub fn rms_to_db(rms: f32) -> f32 {
    if rms <= 0.0 {
        return SILENCE_DB;
    }
    20.0 * rms.log10()
}
