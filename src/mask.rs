#[cfg(test)]
mod tests;

use crate::thresh::MaskPair;

/// Compares two frames of the same parity through their per-pixel
/// thresholds. A pixel is marked 255 ("no motion between these two
/// frames") when the absolute difference stays within the looked-up
/// threshold, on the quarter and half planes independently.
#[allow(clippy::too_many_arguments)]
pub fn motion_mask_plane(
    src1: &[u8],
    msk1: &MaskPair,
    src2: &[u8],
    msk2: &MaskPair,
    src_pitch: usize,
    width: usize,
    height: usize,
    mlut: &[u8; 256],
    dst: &mut MaskPair,
) {
    for y in 0..height {
        let row1 = &src1[y * src_pitch..];
        let row2 = &src2[y * src_pitch..];
        for x in 0..width {
            let i = y * width + x;
            let diff = (i32::from(row1[x]) - i32::from(row2[x])).abs();
            let threshq = std::cmp::min(msk1.q[i], msk2.q[i]);
            dst.q[i] = if diff <= i32::from(mlut[usize::from(threshq)]) {
                255
            } else {
                0
            };
            let threshh = std::cmp::min(msk1.h[i], msk2.h[i]);
            dst.h[i] = if diff <= i32::from(mlut[usize::from(threshh)]) {
                255
            } else {
                0
            };
        }
    }
}

/// ANDs two motion masks into a third, both halves at once.
pub fn and_masks(src1: &MaskPair, src2: &MaskPair, dst: &mut MaskPair) {
    for (d, (a, b)) in dst.q.iter_mut().zip(src1.q.iter().zip(src2.q.iter())) {
        *d &= a & b;
    }
    for (d, (a, b)) in dst.h.iter_mut().zip(src1.h.iter().zip(src2.h.iter())) {
        *d &= a & b;
    }
}

/// Collapses a combined quarter/half mask into the final binary plane.
///
/// The quarter plane is authoritative; a hole in it is bridged when the
/// half plane still marks the pixel and at least `cstr` of the eight
/// quarter-plane neighbors (edges mirrored) are marked.
#[allow(clippy::too_many_arguments)]
pub fn combine_masks_plane(
    src: &MaskPair,
    width: usize,
    height: usize,
    cstr: i32,
    offp: &[usize],
    offn: &[usize],
    dst: &mut [u8],
    dst_pitch: usize,
) {
    for y in 0..height {
        dst[y * dst_pitch..y * dst_pitch + width]
            .copy_from_slice(&src.q[y * width..y * width + width]);
    }
    for y in 0..height {
        let above = if y == 0 { 1 } else { y - 1 };
        let below = if y == height - 1 { height - 2 } else { y + 1 };
        let srow = &src.q[y * width..];
        let prow = &src.q[above * width..];
        let nrow = &src.q[below * width..];
        for x in 0..width {
            if srow[x] != 0 || src.h[y * width + x] == 0 {
                continue;
            }
            let mut count = 0;
            if prow[offp[x]] != 0 {
                count += 1;
            }
            if prow[x] != 0 {
                count += 1;
            }
            if prow[offn[x]] != 0 {
                count += 1;
            }
            if srow[offp[x]] != 0 {
                count += 1;
            }
            if srow[offn[x]] != 0 {
                count += 1;
            }
            if nrow[offp[x]] != 0 {
                count += 1;
            }
            if nrow[x] != 0 {
                count += 1;
            }
            if nrow[offn[x]] != 0 {
                count += 1;
            }
            if count >= cstr {
                dst[y * dst_pitch + x] = 255;
            }
        }
    }
}
