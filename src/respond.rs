use crate::body::{self, RespBody};
use crate::dispatch::State;
use crate::events::Event;
use crate::listing;
use crate::resolve;
use headers::{ContentType, HeaderMapExt};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

/// Terminal: always produces exactly one response. Misses re-enter the
/// pipeline at most once, through the configured not-found fallback, so the
/// fallback gets its own default-document and content-type resolution (and
/// its own status, typically 200).
pub async fn serve(raw_url: &str, id: u64, state: &State) -> Response<RespBody> {
    let mut target = resolve::resolve(raw_url, &state.config.root);
    let mut fell_back = false;
    loop {
        match try_serve(&target, id, state).await {
            Outcome::Response(resp) => return resp,
            Outcome::NotFound => {
                if !fell_back {
                    if let Some(fallback) = &state.config.not_found {
                        // existence check keeps the re-entry from looping
                        if fs::metadata(fallback).await.is_ok() {
                            fell_back = true;
                            target = fallback.clone();
                            continue;
                        }
                    }
                }
                log::info!("GET {} -> [not found]", raw_url);
                let mut resp = Response::new(body::full("Not Found"));
                *resp.status_mut() = StatusCode::NOT_FOUND;
                return resp;
            }
        }
    }
}

enum Outcome {
    Response(Response<RespBody>),
    NotFound,
}

async fn try_serve(path: &Path, id: u64, state: &State) -> Outcome {
    let meta = match fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) => {
            log::debug!("{} -> [stat miss] {}", path.display(), e);
            return Outcome::NotFound;
        }
    };

    let mut target = PathBuf::from(path);
    if meta.is_dir() {
        if state.config.listing {
            return Outcome::Response(match listing::list(&target).await {
                Ok(html) => {
                    let mut resp = Response::new(body::full(html));
                    resp.headers_mut().typed_insert(ContentType::html());
                    resp
                }
                Err(e) => {
                    log::warn!("{} -> [listing error] {}", target.display(), e);
                    let mut resp = Response::new(body::full("Internal Server Error"));
                    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    resp
                }
            });
        }
        if state.config.default_document.is_empty() {
            return Outcome::NotFound;
        }
        // server-appended segment, safe by construction; not re-validated
        target.push(&state.config.default_document);
    }

    let extension = target.extension().and_then(|e| e.to_str()).unwrap_or("");
    let content_type = match state.mime.resolve(extension) {
        Some(ty) if !ty.is_empty() => ty.to_string(),
        Some(_) => {
            log::debug!("{} -> [extension disabled]", target.display());
            return Outcome::NotFound;
        }
        None => return Outcome::NotFound,
    };

    let file = match File::open(&target).await {
        Ok(file) => file,
        // stat/open race, or a default-document rewrite that never existed
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} -> [vanished] {}", target.display(), e);
            return Outcome::NotFound;
        }
        Err(e) => {
            log::warn!("{} -> [read error] {}", target.display(), e);
            let mut resp = Response::new(body::full("Internal Server Error"));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return Outcome::Response(resp);
        }
    };

    state.sink.notify(Event::FileResolved {
        id,
        path: target.display().to_string(),
        content_type: content_type.clone(),
    });

    let mut resp = Response::new(body::from_file(file));
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        resp.headers_mut().insert(CONTENT_TYPE, value);
    }
    Outcome::Response(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::events::LogSink;
    use crate::mime::MimeMap;
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn state(root: PathBuf) -> State {
        State::new(
            ServerConfig {
                root,
                default_document: String::new(),
                listing: false,
                not_found: None,
                headers: Vec::new(),
            },
            MimeMap::new(HashMap::new()),
            Arc::new(LogSink),
        )
    }

    async fn body_bytes(resp: Response<RespBody>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn serves_file_bytes_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();
        let state = state(dir.path().to_path_buf());

        let resp = serve("/hello.txt", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert_eq!(body_bytes(resp).await, b"hello world");
    }

    #[tokio::test]
    async fn repeated_requests_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), b"{}").unwrap();
        let state = state(dir.path().to_path_buf());

        for _ in 0..2 {
            let resp = serve("/a.json", 1, &state).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers().get(CONTENT_TYPE).unwrap(),
                "application/json"
            );
        }
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_path_buf());

        let resp = serve("/nope.txt", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(resp).await, b"Not Found");
    }

    #[tokio::test]
    async fn disabled_extension_is_404_even_when_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ttf"), b"font").unwrap();
        let mut state = state(dir.path().to_path_buf());
        state.mime = MimeMap::new(HashMap::from([("ttf".to_string(), String::new())]));

        let resp = serve("/a.ttf", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn directory_without_document_or_listing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let state = state(dir.path().to_path_buf());

        let resp = serve("/docs", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn directory_serves_default_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), b"<p>docs</p>").unwrap();
        let mut state = state(dir.path().to_path_buf());
        state.config.default_document = "index.html".to_string();

        let resp = serve("/docs/", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(body_bytes(resp).await, b"<p>docs</p>");
    }

    #[tokio::test]
    async fn missing_default_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let mut state = state(dir.path().to_path_buf());
        state.config.default_document = "index.html".to_string();

        let resp = serve("/docs", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn directory_listing_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let mut state = state(dir.path().to_path_buf());
        state.config.listing = true;

        let resp = serve("/", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "text/html"
        );
        let html = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(html.contains("sub/"));
        assert!(html.contains("a.txt"));
    }

    #[tokio::test]
    async fn fallback_file_is_served_with_its_own_resolution() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("404.html"), b"<p>lost</p>").unwrap();
        let mut state = state(dir.path().to_path_buf());
        state.config.not_found = Some(dir.path().join("404.html"));

        let resp = serve("/nope.txt", 1, &state).await;
        // the fallback's own resolution decides the status, not a forced 404
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(body_bytes(resp).await, b"<p>lost</p>");
    }

    #[tokio::test]
    async fn missing_fallback_degrades_to_plain_404() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path().to_path_buf());
        state.config.not_found = Some(dir.path().join("gone.html"));

        let resp = serve("/nope.txt", 1, &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(resp).await, b"Not Found");
    }

    #[tokio::test]
    async fn concurrent_requests_get_their_own_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.txt"), b"one").unwrap();
        std::fs::write(dir.path().join("two.txt"), b"two").unwrap();
        let state = Arc::new(state(dir.path().to_path_buf()));

        let a = tokio::spawn({
            let state = Arc::clone(&state);
            async move { body_bytes(serve("/one.txt", 1, &state).await).await }
        });
        let b = tokio::spawn({
            let state = Arc::clone(&state);
            async move { body_bytes(serve("/two.txt", 2, &state).await).await }
        });
        assert_eq!(a.await.unwrap(), b"one");
        assert_eq!(b.await.unwrap(), b"two");
    }
}
