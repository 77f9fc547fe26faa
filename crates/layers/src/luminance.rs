//! Relative luminance of sRGB colours (Rec. 709 primaries, WCAG 2.x
//! linearisation).

const RED: f64 = 0.2126;
const GREEN: f64 = 0.7152;
const BLUE: f64 = 0.0722;

/// Linear-light value of one 8-bit sRGB channel, in [0, 1].
pub fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Perceptual brightness of an RGB triple, in [0, 1].
///
/// White maps to exactly 1.0 and black to exactly 0.0.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    RED * linearize(r) + GREEN * linearize(g) + BLUE * linearize(b)
}

#[cfg(test)]
mod tests {
    use super::{linearize, relative_luminance};

    #[test]
    fn extremes_are_exact() {
        assert_eq!(relative_luminance(255, 255, 255), 1.0);
        assert_eq!(relative_luminance(0, 0, 0), 0.0);
    }

    #[test]
    fn greys_follow_the_srgb_curve() {
        assert!((relative_luminance(128, 128, 128) - 0.215_860_5).abs() < 1e-6);
        assert!((relative_luminance(64, 64, 64) - 0.051_269_5).abs() < 1e-6);
        assert!((relative_luminance(225, 225, 225) - 0.752_942_2).abs() < 1e-6);
    }

    #[test]
    fn green_dominates_blue() {
        let red = relative_luminance(255, 0, 0);
        let green = relative_luminance(0, 255, 0);
        let blue = relative_luminance(0, 0, 255);
        assert!(green > red && red > blue);
        assert!((red + green + blue - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_segment_near_black() {
        assert!((linearize(10) - (10.0 / 255.0) / 12.92).abs() < 1e-12);
        assert!(linearize(11) > linearize(10));
    }
}
