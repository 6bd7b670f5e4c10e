// Path helper utilities shared across node operations

/// Last non-empty segment of an object key, used as the download file name.
pub fn basename(path: &str) -> Option<&str> {
    path.rsplit('/').find(|segment| !segment.is_empty())
}

/// Split a listing prefix into the directory to list and the remaining name filter.
///
/// `photos/2024-` lists `photos/` and keeps entries starting with `photos/2024-`.
pub fn listing_root(prefix: &str) -> &str {
    match prefix.rfind('/') {
        Some(idx) => &prefix[..=idx],
        None => "",
    }
}
