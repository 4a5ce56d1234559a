use crate::body::{self, RespBody};
use crate::config::ServerConfig;
use crate::events::{Event, SharedSink};
use crate::mime::MimeMap;
use crate::resolve;
use crate::respond;
use bytes::Bytes;
use hyper::body::{Body, Frame, SizeHint};
use hyper::{Method, Request, Response, StatusCode};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

pub struct State {
    pub config: ServerConfig,
    pub mime: MimeMap,
    pub sink: SharedSink,
    next_id: AtomicU64,
}

impl State {
    pub fn new(config: ServerConfig, mime: MimeMap, sink: SharedSink) -> Self {
        Self {
            config,
            mime,
            sink,
            // request ids are process-wide, starting at 1
            next_id: AtomicU64::new(1),
        }
    }
}

pub async fn respond_to_request<B>(req: Request<B>, state: &State) -> Response<TimedBody> {
    let id = state.next_id.fetch_add(1, Relaxed);
    let raw_url = req.uri().to_string();
    state.sink.notify(Event::RequestArrived {
        id,
        method: req.method().to_string(),
        url: raw_url.clone(),
    });

    if req.method() != Method::GET {
        log::warn!("#{} {} {} -> [method not allowed]", id, req.method(), raw_url);
        let mut resp = Response::new(TimedBody::untimed(body::full("Method Not Allowed")));
        *resp.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        return resp;
    }

    // traversal attempts are rejected outright, without the not-found fallback
    if !resolve::is_safe(&raw_url) {
        log::warn!("#{} GET {} -> [unsafe path]", id, raw_url);
        let mut resp = Response::new(TimedBody::untimed(body::full("Not Found")));
        *resp.status_mut() = StatusCode::NOT_FOUND;
        return resp;
    }

    // duration runs from just before the stat to response teardown
    let timer = ResponseTimer {
        sink: Arc::clone(&state.sink),
        id,
        url: raw_url.clone(),
        started: Instant::now(),
    };
    let mut resp = respond::serve(&raw_url, id, state).await;

    if resp.status() != StatusCode::NOT_FOUND {
        for (name, value) in &state.config.headers {
            resp.headers_mut().insert(name.clone(), value.clone());
        }
    }

    resp.map(|inner| TimedBody::new(inner, timer))
}

/// Emits the response-sent notification exactly once, on the first of body
/// completion, body error, or drop (client abort).
struct ResponseTimer {
    sink: SharedSink,
    id: u64,
    url: String,
    started: Instant,
}

impl Drop for ResponseTimer {
    fn drop(&mut self) {
        self.sink.notify(Event::ResponseSent {
            id: self.id,
            url: std::mem::take(&mut self.url),
            duration_ms: self.started.elapsed().as_millis() as u64,
        });
    }
}

pub struct TimedBody {
    inner: RespBody,
    timer: Option<ResponseTimer>,
}

impl TimedBody {
    fn new(inner: RespBody, timer: ResponseTimer) -> Self {
        Self {
            inner,
            timer: Some(timer),
        }
    }

    fn untimed(inner: RespBody) -> Self {
        Self { inner, timer: None }
    }
}

impl Body for TimedBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_frame(cx);
        if matches!(poll, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            this.timer.take();
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
