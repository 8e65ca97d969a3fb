#![allow(clippy::unwrap_used, reason = "allow in test files")]

use parameterized::parameterized;

use super::*;
use crate::lut::mirror_offsets;

fn run(src: &[u8], width: usize, height: usize, ttype: ThreshType) -> MaskPair {
    let (offp, offn) = mirror_offsets(width);
    let mut dst = MaskPair::new(width * height);
    // luma plane: no horizontal compensation, vertical shift of 1
    thresh_mask_plane(src, width, width, height, ttype, 0, 1, &offp, &offn, &mut dst);
    dst
}

#[parameterized(ttype = {
    ThreshType::FourCompensated, ThreshType::EightCompensated,
    ThreshType::Four, ThreshType::Eight,
    ThreshType::FourRange, ThreshType::EightRange,
})]
fn flat_plane_has_zero_contrast(ttype: ThreshType) {
    let src = [100u8; 16];
    let dst = run(&src, 4, 4, ttype);
    assert!(dst.q.iter().all(|&v| v == 0));
    assert!(dst.h.iter().all(|&v| v == 0));
}

#[test]
fn four_compensated_impulse() {
    // 4x4 plane, all 50 except an impulse of 90 at (1, 1).
    let mut src = [50u8; 16];
    src[4 + 1] = 90;
    let dst = run(&src, 4, 4, ThreshType::FourCompensated);

    // At the impulse: vertical diffs are |90-50| = 40, halved with bias
    // to 20; horizontal diffs are 40 unshifted on luma. at = 40.
    assert_eq!(dst.q[4 + 1], (40 + 2) >> 2);
    assert_eq!(dst.h[4 + 1], (40 + 1) >> 1);

    // Directly above (1, 0): the vertical set is {90, 90} (row 1 both as
    // mirror and as the row below), so at = (40 + 1) >> 1 = 20.
    assert_eq!(dst.q[1], (20 + 2) >> 2);
    assert_eq!(dst.h[1], (20 + 1) >> 1);

    // Left of the impulse (0, 1): the impulse sits in the horizontal
    // set, which is not compensated on luma. at = 40.
    assert_eq!(dst.q[4], (40 + 2) >> 2);

    // Far corner is untouched.
    assert_eq!(dst.q[15], 0);
    assert_eq!(dst.h[15], 0);
}

#[test]
fn four_uncompensated_skips_the_vertical_halving() {
    let mut src = [50u8; 16];
    src[4 + 1] = 90;
    let dst = run(&src, 4, 4, ThreshType::Four);

    // Above the impulse the only deviating neighbor is vertical; the
    // plain variant reports the full 40 instead of the halved 20.
    assert_eq!(dst.q[1], (40 + 2) >> 2);
    assert_eq!(dst.h[1], (40 + 1) >> 1);
}

#[test]
fn eight_compensated_sees_diagonals() {
    // Impulse at (2, 2); the 8-neighbor vertical set of (1, 1) contains
    // it diagonally, the 4-neighbor set does not.
    let mut src = [50u8; 16];
    src[2 * 4 + 2] = 90;

    let four = run(&src, 4, 4, ThreshType::FourCompensated);
    let eight = run(&src, 4, 4, ThreshType::EightCompensated);
    assert_eq!(four.q[4 + 1], 0);
    assert_eq!(eight.q[4 + 1], (20 + 2) >> 2);
    assert_eq!(eight.h[4 + 1], (20 + 1) >> 1);
}

#[parameterized(ttype = { ThreshType::FourRange, ThreshType::EightRange })]
fn range_variants_use_plain_extent(ttype: ThreshType) {
    // The range variants include the center pixel and emit max - min
    // with no compensation at all.
    let mut src = [50u8; 16];
    src[4 + 1] = 90;
    let dst = run(&src, 4, 4, ttype);
    assert_eq!(dst.q[4 + 1], (40 + 2) >> 2);
    assert_eq!(dst.h[4 + 1], (40 + 1) >> 1);
    // The impulse is its own neighborhood maximum, so its row/column
    // neighbors see the full extent too.
    assert_eq!(dst.q[4 + 2], (40 + 2) >> 2);
}

#[test]
fn chroma_compensation_shifts_both_axes() {
    // 4:2:0 chroma plane: horizontal shift 1, vertical shift 2.
    let mut src = [50u8; 16];
    src[4 + 1] = 90;
    let (offp, offn) = mirror_offsets(4);
    let mut dst = MaskPair::new(16);
    thresh_mask_plane(
        &src,
        4,
        4,
        4,
        ThreshType::FourCompensated,
        1,
        2,
        &offp,
        &offn,
        &mut dst,
    );

    // At the impulse: atv = (40 + 2) >> 2 = 10, ath = (40 + 1) >> 1 = 20.
    assert_eq!(dst.q[4 + 1], (20 + 2) >> 2);
    assert_eq!(dst.h[4 + 1], (20 + 1) >> 1);
}
