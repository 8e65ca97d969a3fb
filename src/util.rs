use core::slice;

use anyhow::{Result, bail};
use vapoursynth::frame::Frame;

/// Full byte view of one plane, stride padding included.
///
/// The `plane` accessor on Vapoursynth frames refuses planes whose stride
/// exceeds their width; the kernels here index through the stride
/// themselves, so they want the padded view.
pub fn plane_view<'a>(frame: &'a Frame, plane: usize) -> Result<&'a [u8]> {
    if frame.format().plane_count() < plane + 1 {
        bail!("Tried to get plane not present in frame");
    }

    let data_ptr = frame.data_ptr(plane);
    let len = frame.stride(plane) * frame.height(plane);

    // SAFETY: the frame owns `stride * height` bytes for this plane
    Ok(unsafe { slice::from_raw_parts(data_ptr, len) })
}

/// Mutable counterpart of [`plane_view`].
pub fn plane_view_mut<'a>(frame: &'a mut Frame, plane: usize) -> Result<&'a mut [u8]> {
    if frame.format().plane_count() < plane + 1 {
        bail!("Tried to get plane not present in frame");
    }

    let data_ptr = frame.data_ptr_mut(plane);
    let len = frame.stride(plane) * frame.height(plane);

    // SAFETY: the frame owns `stride * height` bytes for this plane
    Ok(unsafe { slice::from_raw_parts_mut(data_ptr, len) })
}
