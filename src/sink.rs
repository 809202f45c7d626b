use crate::PartHeaders;
use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// A consumer of part data.
///
/// For every part routed to it, a sink sees one `on_part_begin`, zero or more
/// `on_part_data` calls carrying the body in stream order, and one
/// `on_part_end` once the closing boundary of the part has been seen. If the
/// caller stops feeding the parser mid-part, `on_part_end` never comes.
///
/// The slice handed to `on_part_data` is only valid for the duration of the call.
pub trait PartSink {
    fn on_part_begin(&mut self, headers: &PartHeaders) {
        let _ = headers;
    }

    fn on_part_data(&mut self, chunk: &[u8]);

    fn on_part_end(&mut self) {}
}

/// Discards everything. Parts no target matches are routed here.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PartSink for NullSink {
    fn on_part_data(&mut self, _chunk: &[u8]) {}
}

/// Collects part data in memory.
///
/// Data of every part routed to the sink is appended to the same buffer.
#[derive(Debug, Default)]
pub struct ValueSink {
    value: BytesMut,
    content_type: Option<mime::Mime>,
    parts: usize,
    open: bool,
}

impl ValueSink {
    pub fn new() -> ValueSink {
        ValueSink::default()
    }

    /// Number of parts that began on this sink.
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Whether every part that began has also ended.
    pub fn is_finished(&self) -> bool {
        self.parts > 0 && !self.open
    }

    pub fn bytes(&self) -> &[u8] {
        &self.value
    }

    pub fn into_bytes(self) -> Bytes {
        self.value.freeze()
    }

    /// Decodes the collected data as text using the `charset` of the last
    /// part's `Content-Type`, falling back to UTF-8.
    pub fn text(&self) -> String {
        self.text_with_charset("utf-8")
    }

    /// Decodes the collected data as text using the `charset` of the last
    /// part's `Content-Type`, falling back to `default_encoding`.
    pub fn text_with_charset(&self, default_encoding: &str) -> String {
        let encoding_name = self
            .content_type
            .as_ref()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding);

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let (text, _, _) = encoding.decode(&self.value);

        match text {
            Cow::Owned(s) => s,
            Cow::Borrowed(s) => String::from(s),
        }
    }

    /// Deserializes the collected data as `JSON`.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_slice(&self.value).map_err(crate::Error::DecodeJson)
    }
}

impl PartSink for ValueSink {
    fn on_part_begin(&mut self, headers: &PartHeaders) {
        self.content_type = headers.content_type().cloned();
        self.parts += 1;
        self.open = true;
    }

    fn on_part_data(&mut self, chunk: &[u8]) {
        self.value.extend_from_slice(chunk);
    }

    fn on_part_end(&mut self) {
        self.open = false;
    }
}

/// Collects the data of each routed part separately, e.g. for repeated fields.
#[derive(Debug, Default)]
pub struct ListSink {
    values: Vec<Bytes>,
    current: BytesMut,
}

impl ListSink {
    pub fn new() -> ListSink {
        ListSink::default()
    }

    /// Data of the parts that ended, in stream order.
    pub fn values(&self) -> &[Bytes] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Bytes> {
        self.values
    }
}

impl PartSink for ListSink {
    fn on_part_begin(&mut self, _headers: &PartHeaders) {
        self.current.clear();
    }

    fn on_part_data(&mut self, chunk: &[u8]) {
        self.current.extend_from_slice(chunk);
    }

    fn on_part_end(&mut self) {
        self.values.push(self.current.split().freeze());
    }
}
