//! Icon resolution: picking one bitmap out of a peer's candidate set and
//! converting it to the pixel order the presentation layer wants.
//!
//! Pure functions only: no state, no I/O.

use traywatch_protocol::IconPixmap;

/// Picks the candidate whose width is closest to `target`.
///
/// Linear scan; a candidate wins only with a strictly smaller distance than
/// every predecessor, so ties keep the earliest-seen candidate rather than
/// the last one.
pub fn select_by_size(candidates: &[IconPixmap], target: i32) -> Option<&IconPixmap> {
    let mut best: Option<(&IconPixmap, i32)> = None;
    for candidate in candidates {
        let diff = (candidate.width - target).abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((candidate, diff)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Converts a bitmap's samples from alpha-first (ARGB) to alpha-last (RGBA)
/// order, in place.
///
/// Rows may carry trailing padding bytes; those are left untouched.
pub fn argb_to_rgba(width: i32, height: i32, bytes: &mut [u8]) {
    if width <= 0 || height <= 0 {
        return;
    }
    let width = width as usize;
    let stride = row_stride(width, height as usize, bytes.len());
    for row in bytes.chunks_mut(stride).take(height as usize) {
        for pixel in row.chunks_exact_mut(4).take(width) {
            let alpha = pixel[0];
            pixel[0] = pixel[1];
            pixel[1] = pixel[2];
            pixel[2] = pixel[3];
            pixel[3] = alpha;
        }
    }
}

/// Bytes per row including any trailing padding
/// (`padding = total / height - 4 * width`).
pub fn row_stride(width: usize, height: usize, total_bytes: usize) -> usize {
    if height == 0 {
        return 0;
    }
    let padding = (total_bytes / height).saturating_sub(4 * width);
    4 * width + padding
}

/// Consumes an alpha-first bitmap and returns it converted to alpha-last.
pub fn to_rgba(mut pixmap: IconPixmap) -> IconPixmap {
    argb_to_rgba(pixmap.width, pixmap.height, &mut pixmap.bytes);
    pixmap
}
