//! Response body types
//!
//! File contents are streamed in bounded chunks instead of being read into
//! memory; small generated bodies use a single frame.

use futures_util::{stream, StreamExt, TryStreamExt};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Body type of every response the server produces
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Body without content
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Body holding the given bytes
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Stream `len` bytes of the file at `path`, starting at byte `start`.
///
/// The file is opened and the first chunk read before this returns, so a file
/// that cannot be read fails here rather than after the response head is sent.
/// Later read errors end the stream with that error; their detail is only
/// logged when `log_detail` is set.
pub async fn file_body(
    path: &Path,
    start: u64,
    len: u64,
    chunk_size: usize,
    log_detail: bool,
) -> io::Result<ResponseBody> {
    let mut file = File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    let mut chunks = ReaderStream::with_capacity(file.take(len), chunk_size.max(1));
    let first = chunks.next().await.transpose()?;

    let shown = path.display().to_string();
    let rest = chunks.inspect_err(move |e| log_stream_error(&shown, e, log_detail));

    let frames = stream::iter(first.map(Ok))
        .chain(rest)
        .map_ok(Frame::data);
    Ok(BodyExt::boxed(StreamBody::new(frames)))
}

/// The response head is already out, so a late read failure can only be logged
fn log_stream_error(file: &str, e: &io::Error, log_detail: bool) {
    if log_detail {
        tracing::error!(file, error = ?e, "read failed while streaming");
    } else {
        tracing::debug!(kind = %e.kind(), "read failed while streaming");
    }
}
