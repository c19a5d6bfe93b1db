//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate dimensions that fit inside a `max_edge` square.
///
/// The aspect ratio is preserved and images are never upscaled: a source
/// whose longer edge is already within the limit keeps its size. Neither
/// edge is ever rounded down to zero.
///
/// # Examples
/// ```
/// # use inventory_md::imaging::fit_within;
/// // 4000x3000 landscape → longer edge becomes 800
/// assert_eq!(fit_within((4000, 3000), 800), (800, 600));
///
/// // Already small enough → unchanged
/// assert_eq!(fit_within((640, 480), 800), (640, 480));
/// ```
pub fn fit_within(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let longer = src_w.max(src_h);
    if longer <= max_edge || longer == 0 {
        return source;
    }

    let ratio = max_edge as f64 / longer as f64;
    if src_w >= src_h {
        let h = (src_h as f64 * ratio).round().max(1.0) as u32;
        (max_edge, h)
    } else {
        let w = (src_w as f64 * ratio).round().max(1.0) as u32;
        (w, max_edge)
    }
}
