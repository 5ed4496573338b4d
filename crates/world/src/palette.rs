//! Quantized colour palette.
//!
//! Each channel is snapped to one of [`LEVELS`] steps in `[0, 1]` and the three
//! steps are packed into a single id. Id 0 is reserved for "no colour"
//! so palette ids double as material ids.

use crate::chunk::MaterialId;

/// Quantization steps per channel.
pub const LEVELS: u16 = 40;

/// Largest valid palette id (`LEVELS³`).
pub const MAX_PALETTE_ID: MaterialId = LEVELS * LEVELS * LEVELS;

const STEP_MAX: f32 = (LEVELS - 1) as f32;

#[inline]
fn quantize(unit: f32) -> u16 {
    (unit.clamp(0.0, 1.0) * STEP_MAX).round() as u16
}

/// Encode a colour given as unit-range channels. Values outside `[0, 1]` are
/// clamped; NaN maps to zero.
pub fn encode_unit(rgb: [f32; 3]) -> MaterialId {
    let [r, g, b] = rgb.map(|c| if c.is_nan() { 0 } else { quantize(c) });
    1 + r + g * LEVELS + b * LEVELS * LEVELS
}

/// Encode an 8-bit-per-channel colour.
pub fn encode(r: u8, g: u8, b: u8) -> MaterialId {
    encode_unit([r, g, b].map(|c| c as f32 / 255.0))
}

/// Encode a packed `0xRRGGBB` colour.
pub fn encode_rgb24(rgb: u32) -> MaterialId {
    encode((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// Decode an id into unit-range channels. `None` for 0 and ids past
/// [`MAX_PALETTE_ID`].
pub fn decode(id: MaterialId) -> Option<[f32; 3]> {
    if id == 0 || id > MAX_PALETTE_ID {
        return None;
    }
    let n = id - 1;
    let r = n % LEVELS;
    let g = (n / LEVELS) % LEVELS;
    let b = n / (LEVELS * LEVELS);
    Some([r, g, b].map(|step| step as f32 / STEP_MAX))
}

/// Decode an id into a packed `0xRRGGBB` colour.
pub fn decode_rgb24(id: MaterialId) -> Option<u32> {
    decode(id).map(|channels| {
        let [r, g, b] = channels.map(|c| (c * 255.0).round() as u32);
        (r << 16) | (g << 8) | b
    })
}
