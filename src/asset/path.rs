//! Local path allocation and URL escaping for relocated assets.
//!
//! Every path handed out is unique within the session: a second asset
//! extracting to the same filename gets a `-1`, `-2`, ... suffix before
//! the extension.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::LazyLock;

/// Extension-bearing filename segment, query/fragment tail ignored.
/// ASCII class rather than `\w`: the regex build here has no
/// unicode-perl support, and extensions are ASCII anyway.
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^/\\&?#]+\.[0-9A-Za-z_]{3,4})(?:[?&#]|$)").unwrap());

/// Characters escaped when a local path is embedded as a URL. `/` stays
/// literal so the folder structure survives.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%');

/// Escape a relative path for embedding as a URL in rendered output.
pub(crate) fn escape_url(path: &str) -> String {
    utf8_percent_encode(path, PATH_ESCAPE).to_string()
}

/// Extract the filename from a URL or display name.
///
/// Finds the first extension-bearing segment, ignoring query strings;
/// falls back to the input unchanged when nothing matches.
pub(crate) fn extract_filename(reference: &str) -> String {
    FILENAME_RE
        .captures(reference)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| reference.to_string())
}

/// Insert a suffix before the extension (`foo.png` + `-1` ->
/// `foo-1.png`).
pub(crate) fn add_suffix(filename: &str, suffix: &str) -> String {
    match filename.rfind('.') {
        Some(dot) => format!("{}{}{}", &filename[..dot], suffix, &filename[dot..]),
        None => format!("{filename}{suffix}"),
    }
}

/// Replace (or append) the extension.
pub(crate) fn rename_extension(filename: &str, ext: &str) -> String {
    match filename.rfind('.') {
        Some(dot) => format!("{}.{ext}", &filename[..dot]),
        None => format!("{filename}.{ext}"),
    }
}

/// Allocate a session-unique path under `folder` (with optional prefix
/// segment), registering it in the path cache.
pub(crate) fn unique_file_path(
    path_cache: &mut FxHashSet<String>,
    folder: &str,
    prefix: Option<&str>,
    filename: &str,
) -> String {
    let folder = match prefix {
        Some(prefix) => format!("{folder}/{prefix}"),
        None => folder.to_string(),
    };

    let mut candidate = format!("{folder}/{filename}");
    let mut counter = 1;
    while path_cache.contains(&candidate) {
        candidate = format!("{folder}/{}", add_suffix(filename, &format!("-{counter}")));
        counter += 1;
    }
    path_cache.insert(candidate.clone());
    candidate
}
