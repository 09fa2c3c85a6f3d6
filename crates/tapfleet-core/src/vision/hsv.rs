//! RGB → HSV conversion in the OpenCV byte convention.
//!
//! The band constants used to isolate the target element were calibrated
//! against OpenCV's 8-bit HSV ranges, so this conversion reproduces that
//! convention exactly rather than the textbook 0–360° one:
//!
//! - **H**: hue in half-degrees, `0..=179` (360° does not fit in a byte)
//! - **S**: saturation `0..=255`
//! - **V**: value (brightness) `0..=255`
//!
//! For reference: pure red is H 0, pure yellow H 30, pure green H 60.

/// Converts one RGB8 pixel to OpenCV-convention HSV bytes.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;

    // Achromatic pixels have zero saturation and (by convention) zero hue.
    if delta == 0 {
        return [0, 0, v];
    }

    let s = ((delta as u32 * 255) / max as u32) as u8;

    // Hue in degrees, computed from whichever channel is the maximum,
    // then halved to fit the byte range.
    let delta = delta as i32;
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let mut hue_deg = if max == rgb[0] {
        60 * (g - b) / delta
    } else if max == rgb[1] {
        120 + 60 * (b - r) / delta
    } else {
        240 + 60 * (r - g) / delta
    };
    if hue_deg < 0 {
        hue_deg += 360;
    }

    [(hue_deg / 2) as u8, s, v]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
