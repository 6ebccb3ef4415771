//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Rounding
//!
//! Derived sides are computed in `f64` and rounded with [`f64::round`]:
//! nearest integer, ties away from zero (`0.5 → 1`, `607.5 → 608`). A side that
//! rounds to zero is rejected rather than clamped to one pixel.

use super::error::PipelineError;
use super::params::ResizeIntent;
use crate::presets::PresetCatalog;

/// Planned output size. Both sides are at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDimensions {
    pub width: u32,
    pub height: u32,
}

impl TargetDimensions {
    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

fn round_side(value: f64) -> f64 {
    value.round()
}

/// Convert a rounded `f64` side to pixels, rejecting zero and overflow.
fn to_side(value: f64, axis: &str) -> Result<u32, PipelineError> {
    let rounded = round_side(value);
    if !rounded.is_finite() || rounded < 1.0 {
        return Err(PipelineError::invalid(format!(
            "planned {axis} rounds to {rounded}, which is not a positive size"
        )));
    }
    if rounded > u32::MAX as f64 {
        return Err(PipelineError::invalid(format!(
            "planned {axis} {rounded} is out of range"
        )));
    }
    Ok(rounded as u32)
}

fn dims(width: f64, height: f64) -> Result<TargetDimensions, PipelineError> {
    Ok(TargetDimensions {
        width: to_side(width, "width")?,
        height: to_side(height, "height")?,
    })
}

/// Plan the output size of a resize.
///
/// # Modes
///
/// - **Percentage**: both sides scale by `pct / 100`.
/// - **Dimensions, one side given**: the other side is solved from the
///   original ratio, whatever `lock_aspect` says.
/// - **Dimensions, both sides, unlocked**: passed through unchanged, even if
///   that distorts the ratio.
/// - **Dimensions or Preset, locked**: contain-fit. The smaller of the two
///   scale ratios wins, so the result never exceeds the box. On a tie the
///   height is honored exactly and the width derived.
/// - **Preset, unlocked**: the exact preset box.
///
/// # Examples
/// ```
/// # use rastersmith::imaging::{plan, ResizeIntent, TargetDimensions};
/// # use rastersmith::presets::PresetCatalog;
/// let intent = ResizeIntent::Dimensions { width: Some(800), height: None, lock_aspect: true };
/// let target = plan((1920, 1080), &intent, &PresetCatalog::builtin()).unwrap();
/// assert_eq!(target, TargetDimensions { width: 800, height: 450 });
/// ```
pub fn plan(
    original: (u32, u32),
    intent: &ResizeIntent,
    catalog: &PresetCatalog,
) -> Result<TargetDimensions, PipelineError> {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 {
        return Err(PipelineError::invalid(format!(
            "original dimensions {orig_w}x{orig_h} must both be positive"
        )));
    }
    let (ow, oh) = (orig_w as f64, orig_h as f64);

    match intent {
        ResizeIntent::Percentage { pct } => {
            if !pct.is_finite() || *pct <= 0.0 {
                return Err(PipelineError::invalid(format!(
                    "percentage must be greater than zero, got {pct}"
                )));
            }
            let factor = pct / 100.0;
            dims(ow * factor, oh * factor)
        }
        ResizeIntent::Dimensions {
            width,
            height,
            lock_aspect,
        } => plan_box(original, *width, *height, *lock_aspect),
        ResizeIntent::Preset { name, lock_aspect } => {
            let preset = catalog
                .get(name)
                .ok_or_else(|| PipelineError::invalid(format!("unknown preset '{name}'")))?;
            plan_box(
                original,
                Some(preset.width),
                Some(preset.height),
                *lock_aspect,
            )
        }
    }
}

fn plan_box(
    original: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    lock_aspect: bool,
) -> Result<TargetDimensions, PipelineError> {
    let (ow, oh) = (original.0 as f64, original.1 as f64);
    if width == Some(0) || height == Some(0) {
        return Err(PipelineError::invalid(format!(
            "target dimensions must be positive, got {}x{}",
            width.map_or("auto".to_string(), |w| w.to_string()),
            height.map_or("auto".to_string(), |h| h.to_string()),
        )));
    }

    match (width, height) {
        (None, None) => Err(PipelineError::invalid(
            "a target width or height is required",
        )),
        (Some(tw), None) => {
            let tw = tw as f64;
            dims(tw, oh * tw / ow)
        }
        (None, Some(th)) => {
            let th = th as f64;
            dims(ow * th / oh, th)
        }
        (Some(tw), Some(th)) if !lock_aspect => Ok(TargetDimensions {
            width: tw,
            height: th,
        }),
        (Some(tw), Some(th)) => {
            let (tw, th) = (tw as f64, th as f64);
            let width_ratio = tw / ow;
            let height_ratio = th / oh;
            if width_ratio < height_ratio {
                dims(tw, oh * width_ratio)
            } else {
                dims(ow * height_ratio, th)
            }
        }
    }
}

/// Centered source rectangle with the target's aspect ratio (crop before resize).
///
/// Cover-fit crops the source first and scales only the crop, so no buffer
/// larger than the source or the target is ever needed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(x, y, width, height)` - Crop rectangle inside the source, each side at least 1
pub fn calculate_cover_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    let (w, h) = if src_aspect > tgt_aspect {
        // Source is wider: full height kept, sides trimmed
        let w = (src_h as f64 * tgt_aspect).round().clamp(1.0, src_w as f64) as u32;
        (w, src_h)
    } else {
        // Source is taller: full width kept, top and bottom trimmed
        let h = (src_w as f64 / tgt_aspect).round().clamp(1.0, src_h as f64) as u32;
        (src_w, h)
    };
    (
        center_offset(src_w, w) as u32,
        center_offset(src_h, h) as u32,
        w,
        h,
    )
}

/// Offset that centers a span of `inner` pixels inside `outer`.
pub fn center_offset(outer: u32, inner: u32) -> i64 {
    (outer as i64 - inner as i64) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::error::ErrorKind;
    use proptest::prelude::*;

    fn catalog() -> PresetCatalog {
        PresetCatalog::builtin()
    }

    fn dims_intent(width: Option<u32>, height: Option<u32>, lock_aspect: bool) -> ResizeIntent {
        ResizeIntent::Dimensions {
            width,
            height,
            lock_aspect,
        }
    }

    // =========================================================================
    // plan: single-axis and percentage
    // =========================================================================

    #[test]
    fn width_only_solves_height() {
        // 1080 * 800 / 1920 = 450
        let t = plan((1920, 1080), &dims_intent(Some(800), None, true), &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 800, height: 450 });
    }

    #[test]
    fn height_only_solves_width() {
        // 1920 * 540 / 1080 = 960
        let t = plan((1920, 1080), &dims_intent(None, Some(540), false), &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 960, height: 540 });
    }

    #[test]
    fn percentage_scales_both_sides() {
        let t = plan((1920, 1080), &ResizeIntent::Percentage { pct: 50.0 }, &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 960, height: 540 });
    }

    #[test]
    fn percentage_above_100_upscales() {
        let t = plan((100, 50), &ResizeIntent::Percentage { pct: 250.0 }, &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 250, height: 125 });
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        // 15 * 0.5 = 7.5 → 8, 9 * 0.5 = 4.5 → 5
        let t = plan((15, 9), &ResizeIntent::Percentage { pct: 50.0 }, &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 8, height: 5 });
    }

    #[test]
    fn percentage_rounding_to_zero_is_invalid() {
        let err = plan((10, 10), &ResizeIntent::Percentage { pct: 1.0 }, &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn non_positive_percentage_is_invalid() {
        for pct in [0.0, -10.0, f64::NAN] {
            let err = plan((10, 10), &ResizeIntent::Percentage { pct }, &catalog()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    // =========================================================================
    // plan: two-axis
    // =========================================================================

    #[test]
    fn unlocked_box_passes_through() {
        let t = plan((1920, 1080), &dims_intent(Some(500), Some(500), false), &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 500, height: 500 });
    }

    #[test]
    fn contain_fit_width_ratio_wins() {
        // wr = 0.675 < hr = 1.2 → height = round(900 * 0.675) = round(607.5) = 608
        let t = plan((1600, 900), &dims_intent(Some(1080), Some(1080), true), &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 1080, height: 608 });
    }

    #[test]
    fn contain_fit_height_ratio_wins() {
        // Portrait 900x1600 into 1080x1080: hr = 0.675 < wr = 1.2
        let t = plan((900, 1600), &dims_intent(Some(1080), Some(1080), true), &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 608, height: 1080 });
    }

    #[test]
    fn contain_fit_never_exceeds_box() {
        let t = plan((3000, 1000), &dims_intent(Some(400), Some(300), true), &catalog()).unwrap();
        assert!(t.width <= 400 && t.height <= 300);
        assert_eq!(t, TargetDimensions { width: 400, height: 133 });
    }

    #[test]
    fn target_equal_to_original_is_identity() {
        let t = plan((1234, 567), &dims_intent(Some(1234), Some(567), true), &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 1234, height: 567 });
    }

    // =========================================================================
    // plan: presets
    // =========================================================================

    #[test]
    fn preset_unlocked_is_exact_box() {
        let intent = ResizeIntent::Preset {
            name: "facebook-post".into(),
            lock_aspect: false,
        };
        let t = plan((4000, 3000), &intent, &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 1200, height: 630 });
    }

    #[test]
    fn preset_locked_uses_contain_fit() {
        let intent = ResizeIntent::Preset {
            name: "instagram-post".into(),
            lock_aspect: true,
        };
        let t = plan((1600, 900), &intent, &catalog()).unwrap();
        assert_eq!(t, TargetDimensions { width: 1080, height: 608 });
    }

    #[test]
    fn unknown_preset_is_invalid() {
        let intent = ResizeIntent::Preset {
            name: "geocities".into(),
            lock_aspect: true,
        };
        let err = plan((100, 100), &intent, &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    // =========================================================================
    // plan: invalid input
    // =========================================================================

    #[test]
    fn zero_original_is_invalid() {
        for original in [(0, 100), (100, 0), (0, 0)] {
            let err = plan(original, &dims_intent(Some(10), None, true), &catalog()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn zero_target_unlocked_is_invalid() {
        for (w, h) in [(0, 100), (100, 0)] {
            let err = plan((640, 480), &dims_intent(Some(w), Some(h), false), &catalog()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn missing_both_sides_is_invalid() {
        let err = plan((640, 480), &dims_intent(None, None, true), &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn derived_side_rounding_to_zero_is_invalid() {
        // 1 * 1 / 10000 rounds to 0
        let err = plan((10000, 1), &dims_intent(Some(1), None, true), &catalog()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    proptest! {
        #[test]
        fn locked_plan_with_original_box_is_identity(w in 1u32..20_000, h in 1u32..20_000) {
            let t = plan((w, h), &dims_intent(Some(w), Some(h), true), &catalog()).unwrap();
            prop_assert_eq!(t, TargetDimensions { width: w, height: h });
        }

        #[test]
        fn locked_plan_fits_inside_box(
            w in 1u32..10_000, h in 1u32..10_000,
            tw in 1u32..4_000, th in 1u32..4_000,
        ) {
            if let Ok(t) = plan((w, h), &dims_intent(Some(tw), Some(th), true), &catalog()) {
                prop_assert!(t.width <= tw && t.height <= th);
                prop_assert!(t.width == tw || t.height == th);
            }
        }
    }

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn crop_wider_source_to_portrait_target() {
        // 800x600 → 400x500 (0.8): full height, width = 600 * 0.8 = 480
        assert_eq!(calculate_cover_crop((800, 600), (400, 500)), (160, 0, 480, 600));
    }

    #[test]
    fn crop_taller_source_to_landscape_target() {
        // 600x800 → 500x400 (1.25): full width, height = 600 / 1.25 = 480
        assert_eq!(calculate_cover_crop((600, 800), (500, 400)), (0, 160, 600, 480));
    }

    #[test]
    fn crop_same_aspect_ratio_keeps_everything() {
        assert_eq!(calculate_cover_crop((800, 600), (400, 300)), (0, 0, 800, 600));
        assert_eq!(calculate_cover_crop((64, 64), (16, 16)), (0, 0, 64, 64));
    }

    #[test]
    fn crop_of_extreme_aspect_source_stays_inside_it() {
        assert_eq!(calculate_cover_crop((1000, 1), (64, 64)), (499, 0, 1, 1));
        assert_eq!(calculate_cover_crop((1, 20000), (512, 512)), (0, 9999, 1, 1));
    }

    #[test]
    fn center_offset_splits_the_overflow() {
        assert_eq!(center_offset(100, 60), 20);
        assert_eq!(center_offset(60, 100), -20);
    }
}
