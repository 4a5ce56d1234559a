use crate::config::MimeOverrides;
use std::collections::HashMap;

/// Extension-to-content-type table. Two special keys: `.` for extensionless
/// files and `*` for anything not listed. An empty-string value disables the
/// extension outright, which is distinct from the key being absent.
pub struct MimeMap {
    map: HashMap<String, String>,
}

const BUILTIN: &[(&str, &str)] = &[
    (".", "application/octet-stream"),
    ("*", "application/octet-stream"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("xml", "application/xml"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("bmp", "image/bmp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    ("wasm", "application/wasm"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
];

impl MimeMap {
    /// Override keys replace built-in entries verbatim, including replacement
    /// with an empty string.
    pub fn new(overrides: MimeOverrides) -> Self {
        let mut map = BUILTIN
            .iter()
            .map(|&(ext, ty)| (ext.to_string(), ty.to_string()))
            .collect::<HashMap<_, _>>();
        map.extend(overrides);
        Self { map }
    }

    /// Exact key first, then the `*` fallback. `None` only when both are
    /// absent; a disabled extension comes back as `Some("")`.
    pub fn resolve(&self, extension: &str) -> Option<&str> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        let key = if ext.is_empty() { "." } else { ext.as_str() };
        self.map
            .get(key)
            .or_else(|| self.map.get("*"))
            .map(String::as_str)
    }
}
