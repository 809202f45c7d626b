use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while setting up a parser, registering
/// targets or feeding it a multipart stream.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The boundary token is empty.
    #[display(fmt = "multipart boundary must not be empty")]
    EmptyBoundary,

    /// No `Content-Type` header was found.
    #[display(fmt = "Content-Type header is missing")]
    NoContentType,

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// A target was registered after the parser received its first chunk.
    #[display(fmt = "registering targets is not allowed once parsing has started")]
    RegistrationClosed,

    /// The multipart stream could not be parsed.
    #[display(fmt = "{}", _0)]
    Parse(ParseFailure),

    /// Reading the source stream failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// Failed to decode collected part data as `JSON` in
    /// [`ValueSink::json`](crate::ValueSink::json).
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[display(fmt = "failed to decode part data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

impl Error {
    /// Returns `true` for errors raised while constructing a parser, before
    /// any byte of the stream was looked at.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyBoundary
                | Error::NoContentType
                | Error::NoMultipart
                | Error::DecodeContentType(_)
                | Error::NoBoundary
        )
    }

    /// The parse failure category, if this error came out of the stream.
    pub fn category(&self) -> Option<Category> {
        match self {
            Error::Parse(failure) => Some(failure.category()),
            _ => None,
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(failure) => Some(failure),
            Error::StreamReadFailed(err) => Some(err.as_ref()),
            #[cfg(feature = "json")]
            Error::DecodeJson(err) => Some(err),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

impl From<ParseFailure> for Error {
    fn from(failure: ParseFailure) -> Self {
        Error::Parse(failure)
    }
}

/// Coarse classification of a [`ParseFailure`], ranked from the least to the
/// most specific.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// The parser broke one of its own invariants.
    #[display(fmt = "internal errors")]
    Internal,
    /// The stream does not follow the multipart framing.
    #[display(fmt = "delimiting multipart stream into parts")]
    Delimiting,
    /// The header block of a specific part is malformed.
    #[display(fmt = "parsing specific part headers")]
    PartHeaders,
}

/// A failure raised while feeding the stream.
///
/// Once returned, the parser is stuck in the errored state and hands back a
/// clone of the same failure on every further call.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[display(fmt = "multipart parsing failed with {}", "Category::Internal")]
    Internal(InternalError),
    #[display(fmt = "multipart parsing failed with {}", "Category::Delimiting")]
    Delimiting(DelimitingError),
    #[display(fmt = "multipart parsing failed with {}", "Category::PartHeaders")]
    PartHeaders(HeaderError),
}

impl ParseFailure {
    pub fn category(&self) -> Category {
        match self {
            ParseFailure::Internal(_) => Category::Internal,
            ParseFailure::Delimiting(_) => Category::Delimiting,
            ParseFailure::PartHeaders(_) => Category::PartHeaders,
        }
    }
}

impl std::error::Error for ParseFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseFailure::Internal(err) => Some(err),
            ParseFailure::Delimiting(err) => Some(err),
            ParseFailure::PartHeaders(err) => Some(err),
        }
    }
}

impl From<InternalError> for ParseFailure {
    fn from(err: InternalError) -> Self {
        ParseFailure::Internal(err)
    }
}

impl From<DelimitingError> for ParseFailure {
    fn from(err: DelimitingError) -> Self {
        ParseFailure::Delimiting(err)
    }
}

impl From<HeaderError> for ParseFailure {
    fn from(err: HeaderError) -> Self {
        ParseFailure::PartHeaders(err)
    }
}

/// Defects in the parser itself.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InternalError {
    /// More bytes were withheld between chunks than a partial boundary match can span.
    #[display(fmt = "withheld {} bytes, at most {} may straddle a chunk", len, max)]
    ResidualOverflow { len: usize, max: usize },

    /// The scan window did not cover the matched boundary.
    #[display(fmt = "scan window shorter than the boundary match")]
    ScanWindow,

    /// Body bytes showed up while no part was open.
    #[display(fmt = "body data received outside of a part")]
    DataOutsidePart,

    /// A stage handler consumed nothing from non-empty input.
    #[display(fmt = "no progress while parsing {:?}", _0)]
    Stalled(crate::State),
}

impl std::error::Error for InternalError {}

/// The byte stream does not follow the multipart framing.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DelimitingError {
    /// The terminator showed up before any part was opened.
    #[display(fmt = "terminating boundary found before the first delimiter")]
    TerminatorBeforeDelimiter,

    /// Too many bytes preceded the first delimiter.
    #[display(fmt = "no delimiter found within the first {} bytes", limit)]
    PreambleTooLong { limit: usize },

    /// Input ended before the terminating boundary.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,
}

impl std::error::Error for DelimitingError {}

/// A part's header block is malformed.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HeaderError {
    /// Couldn't read the part headers completely.
    #[display(fmt = "failed to read part complete headers")]
    IncompleteHeaders,

    /// The header block grew past the limit without a blank line.
    #[display(fmt = "part header block exceeded the maximum size limit: {} bytes", limit)]
    HeaderBlockTooLarge { limit: usize },

    /// Failed to read headers.
    #[display(fmt = "failed to read headers: {}", _0)]
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode the part's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode part's raw header name: {:?}", name)]
    DecodeHeaderName { name: String },

    /// Failed to decode the part's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[display(fmt = "failed to decode part's raw header value")]
    DecodeHeaderValue { value: Vec<u8> },

    /// The part has no `Content-Disposition` header.
    #[display(fmt = "part has no Content-Disposition header")]
    MissingContentDisposition,

    /// The `Content-Disposition` header has no `name` parameter.
    #[display(fmt = "Content-Disposition header has no name parameter")]
    MissingName,
}

impl std::error::Error for HeaderError {}
