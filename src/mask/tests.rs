#![allow(clippy::unwrap_used, reason = "allow in test files")]

use super::*;
use crate::lut::{mirror_offsets, motion_lut};

fn pair_filled(len: usize, q: u8, h: u8) -> MaskPair {
    let mut pair = MaskPair::new(len);
    pair.q.fill(q);
    pair.h.fill(h);
    pair
}

#[test]
fn identical_frames_mark_everything_static() {
    let src = [128u8; 16];
    let thresh = pair_filled(16, 0, 0);
    let mlut = motion_lut(2, 4, 75);
    let mut dst = MaskPair::new(16);
    motion_mask_plane(&src, &thresh, &src, &thresh, 4, 4, 4, &mlut, &mut dst);
    // diff = 0 never exceeds the minimum threshold of 4
    assert!(dst.q.iter().all(|&v| v == 255));
    assert!(dst.h.iter().all(|&v| v == 255));
}

#[test]
fn large_difference_marks_motion() {
    let src1 = [0u8; 16];
    let src2 = [255u8; 16];
    let thresh = pair_filled(16, 255, 255);
    // even a saturated per-pixel threshold clamps at maxthresh = 75
    let mlut = motion_lut(2, 4, 75);
    let mut dst = MaskPair::new(16);
    motion_mask_plane(&src1, &thresh, &src2, &thresh, 4, 4, 4, &mlut, &mut dst);
    assert!(dst.q.iter().all(|&v| v == 0));
    assert!(dst.h.iter().all(|&v| v == 0));
}

#[test]
fn threshold_boundary_is_inclusive() {
    // mlut[0] = clamp(0 + 2, 4, 75) = 4: a diff of exactly 4 is static,
    // 5 is motion.
    let src1 = [10u8; 4];
    let on_boundary = [14u8; 4];
    let past_boundary = [15u8; 4];
    let thresh = pair_filled(4, 0, 0);
    let mlut = motion_lut(2, 4, 75);

    let mut dst = MaskPair::new(4);
    motion_mask_plane(&src1, &thresh, &on_boundary, &thresh, 4, 4, 1, &mlut, &mut dst);
    assert!(dst.q.iter().all(|&v| v == 255));

    motion_mask_plane(&src1, &thresh, &past_boundary, &thresh, 4, 4, 1, &mlut, &mut dst);
    assert!(dst.q.iter().all(|&v| v == 0));
}

#[test]
fn motion_mask_takes_the_smaller_threshold() {
    // Thresholds 10 and 60 on the two sides: min wins, so a diff of 40
    // is motion on the quarter plane but static on the half plane.
    let src1 = [100u8; 4];
    let src2 = [140u8; 4];
    let msk1 = pair_filled(4, 10, 60);
    let msk2 = pair_filled(4, 200, 200);
    let mlut = motion_lut(0, 0, 255);
    let mut dst = MaskPair::new(4);
    motion_mask_plane(&src1, &msk1, &src2, &msk2, 4, 4, 1, &mlut, &mut dst);
    assert!(dst.q.iter().all(|&v| v == 0));
    assert!(dst.h.iter().all(|&v| v == 255));
}

#[test]
fn and_masks_combines_both_halves() {
    let src1 = MaskPair {
        q: vec![255, 255, 0, 0],
        h: vec![255, 0, 255, 0],
    };
    let src2 = MaskPair {
        q: vec![255, 0, 255, 0],
        h: vec![255, 255, 0, 0],
    };
    let mut dst = pair_filled(4, 255, 255);
    and_masks(&src1, &src2, &mut dst);
    assert_eq!(dst.q, vec![255, 0, 0, 0]);
    assert_eq!(dst.h, vec![255, 0, 0, 0]);
}

#[test]
fn and_masks_keeps_existing_holes() {
    let all = pair_filled(4, 255, 255);
    let mut dst = MaskPair {
        q: vec![0, 255, 0, 255],
        h: vec![255, 255, 255, 255],
    };
    and_masks(&all, &all, &mut dst);
    assert_eq!(dst.q, vec![0, 255, 0, 255]);
}

#[test]
fn combine_masks_bridges_supported_holes() {
    // 4x4 quarter plane: a hole at (1, 1) surrounded by eight marked
    // neighbors; the half plane still marks the hole.
    let mut src = MaskPair::new(16);
    src.q.fill(255);
    src.q[4 + 1] = 0;
    src.h[4 + 1] = 255;

    let (offp, offn) = mirror_offsets(4);
    let mut dst = vec![0u8; 16];
    combine_masks_plane(&src, 4, 4, 4, &offp, &offn, &mut dst, 4);
    assert_eq!(dst[4 + 1], 255);

    // With cstr above the neighbor count the hole stays.
    let mut dst = vec![0u8; 16];
    combine_masks_plane(&src, 4, 4, 9, &offp, &offn, &mut dst, 4);
    assert_eq!(dst[4 + 1], 0);
}

#[test]
fn combine_masks_ignores_holes_without_half_support() {
    let mut src = MaskPair::new(16);
    src.q.fill(255);
    src.q[4 + 1] = 0;
    // h stays 0 at the hole: no rescue regardless of neighbors
    let (offp, offn) = mirror_offsets(4);
    let mut dst = vec![0u8; 16];
    combine_masks_plane(&src, 4, 4, 1, &offp, &offn, &mut dst, 4);
    assert_eq!(dst[4 + 1], 0);
}

#[test]
fn combine_masks_counts_mirrored_corner_neighbors_twice() {
    // Hole at (0, 0): the mirrored stencil folds both the row above and
    // the left column inward, so row 1 is visited twice ({x=1, x=0,
    // x=1} as the "above" row and again as the "below" row) while the
    // hole's own row contributes srow[1] twice. With only row 1 marked
    // the count is 6.
    let mut src = MaskPair::new(16);
    src.q[4..8].fill(255);
    src.h[0] = 255;

    let (offp, offn) = mirror_offsets(4);
    let mut dst = vec![0u8; 16];
    combine_masks_plane(&src, 4, 4, 6, &offp, &offn, &mut dst, 4);
    assert_eq!(dst[0], 255);

    let mut dst = vec![0u8; 16];
    combine_masks_plane(&src, 4, 4, 7, &offp, &offn, &mut dst, 4);
    assert_eq!(dst[0], 0);
}

#[test]
fn combine_masks_copies_quarter_plane_verbatim() {
    let mut src = MaskPair::new(16);
    src.q[5] = 255;
    src.q[10] = 255;
    let (offp, offn) = mirror_offsets(4);
    let mut dst = vec![0u8; 16];
    combine_masks_plane(&src, 4, 4, 4, &offp, &offn, &mut dst, 4);
    assert_eq!(dst, src.q);
}
