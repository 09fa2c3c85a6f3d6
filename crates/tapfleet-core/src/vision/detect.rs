//! Color-band element detection.
//!
//! The detector isolates one specific UI element — the accent-yellow
//! action button — from arbitrary screen content:
//!
//! 1. Convert every pixel to HSV and build a binary mask of pixels whose
//!    hue falls in the calibrated band with near-full saturation and
//!    brightness.
//! 2. Extract connected regions from the mask (8-connectivity flood
//!    fill, seeded in raster-scan order).
//! 3. Drop regions at or below the minimum-area threshold; small specks
//!    of the right color (icons, text highlights) are noise.
//! 4. Return the bounding-box center of the first surviving region.
//!
//! The first-in-extraction-order pick (rather than largest-area) is
//! deliberate: it preserves the behaviour the fleet was tuned against.
//! Extraction order is the raster position of each region's first pixel,
//! so repeated calls on the same frame always select the same region.

use tracing::debug;

use super::frame::Frame;
use super::hsv::rgb_to_hsv;

/// The HSV band and area threshold that define the target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvBand {
    /// Inclusive hue range, OpenCV half-degrees (`0..=179`).
    pub h_min: u8,
    pub h_max: u8,
    /// Minimum saturation; the upper bound is always 255.
    pub s_min: u8,
    /// Minimum value (brightness); the upper bound is always 255.
    pub v_min: u8,
    /// Regions with at most this many pixels are discarded as noise.
    pub min_area: usize,
}

impl Default for HsvBand {
    /// Calibrated for the #FEE500 accent yellow.
    fn default() -> Self {
        Self {
            h_min: 20,
            h_max: 30,
            s_min: 100,
            v_min: 100,
            min_area: 5000,
        }
    }
}

impl HsvBand {
    fn matches(&self, hsv: [u8; 3]) -> bool {
        let [h, s, v] = hsv;
        h >= self.h_min && h <= self.h_max && s >= self.s_min && v >= self.v_min
    }
}

/// One connected mask region: pixel count plus bounding box.
#[derive(Debug, Clone, Copy)]
struct Region {
    area: usize,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Region {
    fn center(&self) -> (i32, i32) {
        let cx = self.min_x + (self.max_x - self.min_x + 1) / 2;
        let cy = self.min_y + (self.max_y - self.min_y + 1) / 2;
        (cx as i32, cy as i32)
    }
}

/// Stateless detector for the target element.
///
/// `detect` is a pure function of the frame: no state is retained between
/// calls and the same frame always yields the same result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonDetector {
    band: HsvBand,
}

impl ButtonDetector {
    pub fn new(band: HsvBand) -> Self {
        Self { band }
    }

    /// Returns the bounding-box center of the detected element, or `None`
    /// if no sufficiently large region matches the band.
    pub fn detect(&self, frame: &Frame) -> Option<(i32, i32)> {
        let mask = self.build_mask(frame);

        for region in extract_regions(&mask, frame.width(), frame.height()) {
            if region.area > self.band.min_area {
                let center = region.center();
                debug!(
                    area = region.area,
                    x = center.0,
                    y = center.1,
                    "target element detected"
                );
                return Some(center);
            }
        }
        None
    }

    fn build_mask(&self, frame: &Frame) -> Vec<bool> {
        let (w, h) = (frame.width(), frame.height());
        let mut mask = vec![false; w as usize * h as usize];
        for y in 0..h {
            for x in 0..w {
                if self.band.matches(rgb_to_hsv(frame.pixel(x, y))) {
                    mask[(y * w + x) as usize] = true;
                }
            }
        }
        mask
    }
}

/// Extracts connected mask regions in raster-scan seed order.
///
/// Uses an explicit work queue rather than recursion so pathological
/// masks (e.g. a fully yellow screen) cannot overflow the stack.
fn extract_regions(mask: &[bool], width: u32, height: u32) -> Vec<Region> {
    let idx = |x: u32, y: u32| (y * width + x) as usize;
    let mut visited = vec![false; mask.len()];
    let mut regions = Vec::new();
    let mut queue: Vec<(u32, u32)> = Vec::new();

    for seed_y in 0..height {
        for seed_x in 0..width {
            if !mask[idx(seed_x, seed_y)] || visited[idx(seed_x, seed_y)] {
                continue;
            }

            let mut region = Region {
                area: 0,
                min_x: seed_x,
                min_y: seed_y,
                max_x: seed_x,
                max_y: seed_y,
            };

            visited[idx(seed_x, seed_y)] = true;
            queue.push((seed_x, seed_y));

            while let Some((x, y)) = queue.pop() {
                region.area += 1;
                region.min_x = region.min_x.min(x);
                region.min_y = region.min_y.min(y);
                region.max_x = region.max_x.max(x);
                region.max_y = region.max_y.max(y);

                // 8-connected neighbours.
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        if mask[idx(nx, ny)] && !visited[idx(nx, ny)] {
                            visited[idx(nx, ny)] = true;
                            queue.push((nx, ny));
                        }
                    }
                }
            }

            regions.push(region);
        }
    }

    regions
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// The accent yellow the default band is calibrated for.
    const TARGET: [u8; 3] = [0xFE, 0xE5, 0x00];

    fn detector() -> ButtonDetector {
        ButtonDetector::new(HsvBand::default())
    }

    #[test]
    fn test_blank_frame_detects_nothing() {
        let frame = Frame::solid(320, 480, [255, 255, 255]);
        assert_eq!(detector().detect(&frame), None);
    }

    #[test]
    fn test_single_qualifying_region_returns_its_center() {
        // 100x100 square; area 10_000 > 5_000.
        let mut frame = Frame::solid(640, 480, [20, 20, 20]);
        frame.fill_rect(100, 200, 100, 100, TARGET);

        assert_eq!(detector().detect(&frame), Some((150, 250)));
    }

    #[test]
    fn test_region_below_area_threshold_is_ignored() {
        // 40x40 square; area 1_600 <= 5_000.
        let mut frame = Frame::solid(640, 480, [20, 20, 20]);
        frame.fill_rect(100, 200, 40, 40, TARGET);

        assert_eq!(detector().detect(&frame), None);
    }

    #[test]
    fn test_wrong_hue_is_ignored_regardless_of_size() {
        let mut frame = Frame::solid(640, 480, [20, 20, 20]);
        frame.fill_rect(0, 0, 300, 300, [0, 80, 255]); // blue

        assert_eq!(detector().detect(&frame), None);
    }

    #[test]
    fn test_large_target_wins_over_small_noise() {
        // The documented fleet scenario: 1080x1920 screen, 200x200 target
        // centered at (540, 800), plus a 40x40 same-color noise speck.
        let mut frame = Frame::solid(1080, 1920, [30, 30, 30]);
        frame.fill_rect(440, 700, 200, 200, TARGET);
        frame.fill_rect(900, 100, 40, 40, TARGET);

        assert_eq!(detector().detect(&frame), Some((540, 800)));
    }

    #[test]
    fn test_multiple_qualifying_regions_pick_is_deterministic() {
        // Two qualifying squares; the one whose first pixel comes earlier
        // in raster order must win, every time.
        let mut frame = Frame::solid(640, 640, [20, 20, 20]);
        frame.fill_rect(50, 50, 90, 90, TARGET); // seeded first
        frame.fill_rect(400, 400, 120, 120, TARGET); // larger, seeded later

        let first = detector().detect(&frame);
        assert_eq!(first, Some((95, 95)));
        for _ in 0..5 {
            assert_eq!(detector().detect(&frame), first);
        }
    }

    #[test]
    fn test_diagonally_touching_pixels_form_one_region() {
        // Two 60x60 squares meeting only at a corner: 8-connectivity joins
        // them, and the combined area crosses the 5_000 threshold that
        // neither square reaches alone.
        let mut frame = Frame::solid(300, 300, [20, 20, 20]);
        frame.fill_rect(40, 40, 60, 60, TARGET);
        frame.fill_rect(100, 100, 60, 60, TARGET);

        let hit = detector().detect(&frame).expect("joined region expected");
        // Combined bounding box is 40..=159 in both axes.
        assert_eq!(hit, (100, 100));
    }

    #[test]
    fn test_custom_band_overrides_default() {
        let band = HsvBand {
            h_min: 55,
            h_max: 65,
            s_min: 100,
            v_min: 100,
            min_area: 100,
        };
        let mut frame = Frame::solid(200, 200, [0, 0, 0]);
        frame.fill_rect(50, 50, 20, 20, [0, 255, 0]); // green, area 400

        assert_eq!(ButtonDetector::new(band).detect(&frame), Some((60, 60)));
    }
}
