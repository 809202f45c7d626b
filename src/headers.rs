use crate::constants;
use crate::content_disposition::ContentDisposition;
use crate::error::HeaderError;
use crate::helpers;
use http::header::{self, AsHeaderName, HeaderMap, HeaderName, HeaderValue};
use memchr::memmem;

/// The parsed header block of a part.
///
/// Header names are compared case-insensitively. Every header of the block is
/// kept: [`iter`](PartHeaders::iter) yields them in the order they were
/// received, [`headers`](PartHeaders::headers) offers keyed lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PartHeaders {
    name: String,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    headers: HeaderMap,
    received: Vec<(HeaderName, HeaderValue)>,
}

impl PartHeaders {
    pub(crate) fn new(received: Vec<(HeaderName, HeaderValue)>) -> Result<PartHeaders, HeaderError> {
        let mut headers = HeaderMap::with_capacity(received.len());
        for (name, value) in &received {
            headers.append(name.clone(), value.clone());
        }

        let content_disposition =
            ContentDisposition::parse(&headers).ok_or(HeaderError::MissingContentDisposition)?;
        let name = content_disposition.field_name.ok_or(HeaderError::MissingName)?;

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<mime::Mime>().ok());

        Ok(PartHeaders {
            name,
            file_name: content_disposition.file_name,
            content_type,
            headers,
            received,
        })
    }

    /// The `name` parameter of the `Content-Disposition` header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `filename` parameter of the `Content-Disposition` header, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The `Content-Type` header, if present and a valid media type.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Every header line of the block, in the order received.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.received.iter().map(|(name, value)| (name, value))
    }

    /// The first value of a header, if it is visible ASCII.
    pub fn get<K: AsHeaderName>(&self, key: K) -> Option<&str> {
        self.headers.get(key).and_then(|val| val.to_str().ok())
    }
}

/// Collects header block bytes until the blank line that ends it.
#[derive(Debug)]
pub(crate) struct HeaderReader {
    buf: Vec<u8>,
    limit: usize,
}

impl HeaderReader {
    pub(crate) fn new(limit: usize) -> HeaderReader {
        HeaderReader { buf: Vec::new(), limit }
    }

    /// Feeds header bytes. Returns how many bytes of `input` were taken, and
    /// the parsed headers once the block is complete.
    ///
    /// Bytes after the blank line are left untouched.
    pub(crate) fn read(&mut self, input: &[u8]) -> Result<(usize, Option<PartHeaders>), HeaderError> {
        let seen = self.buf.len();
        let room = self.limit.saturating_sub(seen);
        let take = input.len().min(room);
        self.buf.extend_from_slice(&input[..take]);

        let end = match self.block_end(seen) {
            Some(end) => end,
            None if self.buf.len() >= self.limit => {
                return Err(HeaderError::HeaderBlockTooLarge { limit: self.limit });
            }
            None => return Ok((take, None)),
        };

        let headers = self.parse(end)?;
        self.buf.clear();

        Ok((end - seen, Some(headers)))
    }

    fn block_end(&self, seen: usize) -> Option<usize> {
        let crlf = constants::CRLF.as_bytes();
        if self.buf.starts_with(crlf) {
            return Some(crlf.len());
        }

        let blank_line = constants::CRLF_CRLF.as_bytes();
        let from = seen.saturating_sub(blank_line.len() - 1);
        memmem::find(&self.buf[from..], blank_line).map(|idx| from + idx + blank_line.len())
    }

    fn parse(&self, end: usize) -> Result<PartHeaders, HeaderError> {
        let mut raw_headers = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

        match httparse::parse_headers(&self.buf[..end], &mut raw_headers) {
            Ok(httparse::Status::Complete((_, raw_headers))) => {
                let headers = helpers::convert_raw_headers(raw_headers)?;
                PartHeaders::new(headers)
            }
            Ok(httparse::Status::Partial) => Err(HeaderError::IncompleteHeaders),
            Err(err) => Err(HeaderError::ReadHeaderFailed(err)),
        }
    }
}
