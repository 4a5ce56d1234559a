use bytes::Bytes;
use futures::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use std::io;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub type RespBody = BoxBody<Bytes, io::Error>;

pub fn full(text: impl Into<Bytes>) -> RespBody {
    Full::new(text.into())
        .map_err(|never| match never {})
        .boxed()
}

/// The stream owns the handle, so the file is closed exactly once no matter
/// how the body ends: completion, client abort, or read error.
pub fn from_file(file: File) -> RespBody {
    let stream = ReaderStream::with_capacity(file, 64 * 1024);
    StreamBody::new(stream.map_ok(Frame::data)).boxed()
}
