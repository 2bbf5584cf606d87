use crate::error::{Error, Result};

/// Parses a `Range: bytes=<start>-<end>` header against an object of
/// `size` bytes. Either bound may be omitted: a missing end means the last
/// byte, a missing start is treated as 0 (suffix-length ranges are never
/// served). Bounds are inclusive.
pub fn parse_range(header: &str, size: u64) -> Result<(u64, u64)> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or(Error::RangeNotSatisfiable)?;
    let (start, end) = spec.split_once('-').ok_or(Error::RangeNotSatisfiable)?;

    let start: u64 = if start.is_empty() {
        0
    } else {
        start.parse().map_err(|_| Error::RangeNotSatisfiable)?
    };
    let end: u64 = if end.is_empty() {
        size.checked_sub(1).ok_or(Error::RangeNotSatisfiable)?
    } else {
        end.parse().map_err(|_| Error::RangeNotSatisfiable)?
    };

    if start > end || end >= size {
        return Err(Error::RangeNotSatisfiable);
    }

    Ok((start, end))
}
