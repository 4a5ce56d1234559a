use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Coarse traversal guard: any `..` anywhere makes the URL unsafe. Checked
/// against both the raw string and the decoded path component, so an encoded
/// `%2e%2e` cannot slip through.
pub fn is_safe(raw_url: &str) -> bool {
    if raw_url.contains("..") {
        return false;
    }
    !decode(path_component(raw_url)).contains("..")
}

/// Path component only (query and fragment discarded), percent-decoded, then
/// joined under the root. Leading slashes are stripped so the join cannot
/// re-root; `is_safe` is the traversal gate and must have run first.
pub fn resolve(raw_url: &str, root: &Path) -> PathBuf {
    let decoded = decode(path_component(raw_url));
    root.join(decoded.trim_start_matches('/'))
}

fn path_component(raw_url: &str) -> &str {
    let raw_url = raw_url.split('#').next().unwrap_or("");
    raw_url.split('?').next().unwrap_or("")
}

fn decode(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}
