//! A push-based `multipart/form-data` parser that streams every part into a
//! caller-supplied sink.
//!
//! The request body is handed to the parser chunk by chunk, in whatever sizes
//! it arrives. Each part's headers are parsed, the part is routed by its
//! `name` to a registered [`PartSink`], and the part body is forwarded to that
//! sink as soon as it is known not to belong to a boundary. Nothing but a
//! part's header block and a partial boundary match is ever buffered.
//!
//! The calls a sink sees are the same however the stream is split into chunks.
//!
//! # Examples
//!
//! ```
//! use formsink::{FormDataParser, ListSink, ValueSink};
//!
//! # fn run() -> formsink::Result<()> {
//! let body = "--X-BOUNDARY\r\n\
//!             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
//!             Holiday\r\n\
//!             --X-BOUNDARY\r\n\
//!             Content-Disposition: form-data; name=\"photo\"; filename=\"beach.jpg\"\r\n\
//!             Content-Type: image/jpeg\r\n\r\n\
//!             JFIF...\r\n\
//!             --X-BOUNDARY--\r\n";
//!
//! let mut title = ValueSink::new();
//! let mut photos = ListSink::new();
//!
//! let mut parser = FormDataParser::from_content_type("multipart/form-data; boundary=X-BOUNDARY")?;
//! parser.register("title", &mut title)?;
//! parser.register("photo", &mut photos)?;
//!
//! for chunk in body.as_bytes().chunks(7) {
//!     parser.data_received(chunk)?;
//! }
//! parser.finish()?;
//! drop(parser);
//!
//! assert_eq!(title.text(), "Holiday");
//! assert_eq!(photos.values().len(), 1);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! # Features
//!
//! - `json`: [`ValueSink::json`] deserializes collected data.
//! - `tokio-io`: [`Multipart::feed_reader`] feeds a tokio `AsyncRead`.
//! - `log`: parsing progress is logged through the `log` facade.

#![cfg_attr(nightly, feature(doc_cfg))]

pub use bytes;

pub use boundary::Boundary;
pub use error::{Category, DelimitingError, Error, HeaderError, InternalError, ParseFailure};
pub use form_data::FormDataParser;
pub use headers::PartHeaders;
pub use limits::Limits;
pub use multipart::{Multipart, MultipartBuilder};
pub use router::Target;
pub use sink::{ListSink, NullSink, PartSink, ValueSink};
pub use state::State;

#[cfg(feature = "log")]
macro_rules! trace {
    ($($arg:tt)+) => { log::trace!($($arg)+) };
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($arg:tt)+) => {{
        if false {
            let _ = format_args!($($arg)+);
        }
    }};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($arg:tt)+) => { log::debug!($($arg)+) };
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)+) => {{
        if false {
            let _ = format_args!($($arg)+);
        }
    }};
}

mod boundary;
mod constants;
mod content_disposition;
mod dispatcher;
mod error;
mod form_data;
mod headers;
mod helpers;
mod limits;
mod multipart;
mod router;
mod scanner;
mod sink;
mod state;
mod stream;

/// A Result type often returned from methods that can have `formsink` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(crate::Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(crate::Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(crate::Error::NoBoundary)
}
