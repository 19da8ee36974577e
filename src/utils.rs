//! Utility functions.

/// Rounds `size` up to the next multiple of `align`, which must be a power of
/// two. Returns `None` if the result does not fit in a `u32`.
pub fn align_up(size: u32, align: u32) -> Option<u32> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    size.checked_add(mask).map(|v| v & !mask)
}

/// Applies a signed delta to a file offset. `None` if the result is negative.
pub fn relocate(offset: u64, delta: i64) -> Option<u64> {
    let moved = i64::try_from(offset).ok()?.checked_add(delta)?;
    u64::try_from(moved).ok()
}
