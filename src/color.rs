//! HSL color conversion.

use glam::Vec3;

/// Convert HSL to RGB, all components in `[0, 1]`.
///
/// Hue wraps, so `1.25` is the same as `0.25`. Saturation and lightness are
/// clamped.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let q = 2.0 * l - p;

    Vec3::new(
        hue_to_channel(q, p, h + 1.0 / 3.0),
        hue_to_channel(q, p, h),
        hue_to_channel(q, p, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_primary_hues() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_grey_without_saturation() {
        assert!(close(hsl_to_rgb(0.3, 0.0, 0.25), Vec3::splat(0.25)));
    }

    #[test]
    fn test_hue_wraps() {
        assert!(close(hsl_to_rgb(1.25, 1.0, 0.7), hsl_to_rgb(0.25, 1.0, 0.7)));
        assert!(close(hsl_to_rgb(-0.75, 1.0, 0.7), hsl_to_rgb(0.25, 1.0, 0.7)));
    }

    #[test]
    fn test_firework_lightness_is_pastel() {
        // Full saturation at lightness 0.7 keeps every channel at or above 0.4.
        for i in 0..36 {
            let rgb = hsl_to_rgb(i as f32 / 36.0, 1.0, 0.7);
            assert!(rgb.min_element() >= 0.4 - 1e-5, "{rgb:?}");
            assert!(rgb.max_element() <= 1.0 + 1e-5, "{rgb:?}");
        }
    }
}
