use percent_encoding::{percent_encode, AsciiSet, CONTROLS};
use std::io;
use std::path::Path;
use tokio::fs;

const HREF_ESC: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'<')
    .add(b'>')
    .add(b'"')
    .add(b'\'')
    .add(b'#')
    .add(b'?');

/// Immediate children only. Entries whose metadata can't be read (broken
/// links, permission errors) are skipped; a failure to enumerate the
/// directory itself is an error.
pub async fn list(dir: &Path) -> io::Result<String> {
    let mut entries = fs::read_dir(dir).await?;
    let mut folders = Vec::new();
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let meta = match entry.metadata().await {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        let path = entry.path().to_string_lossy().into_owned();
        if meta.is_dir() {
            folders.push(path);
        } else {
            files.push(path);
        }
    }
    folders.sort();
    files.sort();
    Ok(render(&folders, &files))
}

fn render(folders: &[String], files: &[String]) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>",
            "<html>",
            "<head>",
            "<meta charset=\"utf-8\"/>",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>",
            "<base href=\"/\"/>",
            "<style>body{{font-family:monospace}}ul{{list-style:none;padding-left:0}}</style>",
            "</head>",
            "<body>",
            "<h1>Folders</h1>",
            "<ul>{folders}</ul>",
            "<hr/>",
            "<h1>Files</h1>",
            "<ul>{files}</ul>",
            "</body>",
            "</html>",
        ),
        folders = items(folders, "/"),
        files = items(files, ""),
    )
}

fn items(paths: &[String], suffix: &str) -> String {
    paths
        .iter()
        .map(|path| {
            format!(
                "<li><a href=\"{href}\">{text}{suffix}</a></li>",
                href = escape_href(path),
                text = escape_html(path),
                suffix = suffix,
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

fn escape_href(path: &str) -> String {
    percent_encode(path.as_bytes(), HREF_ESC).to_string()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
