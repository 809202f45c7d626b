use crate::boundary::{Boundary, BoundaryKind};
use crate::dispatcher::Dispatcher;
use crate::error::{DelimitingError, HeaderError, InternalError, ParseFailure};
use crate::headers::HeaderReader;
use crate::router::{RouteTable, Target};
use crate::scanner::BoundaryScanner;
use crate::sink::PartSink;
use crate::{constants, Limits, PartHeaders, State};

/// A push parser for a `multipart/form-data` stream.
///
/// The stream is handed over in chunks of any size through [`feed`](Multipart::feed).
/// Each part's headers are parsed, the part is routed by name to a registered
/// [`PartSink`], and its body is streamed to that sink without buffering it.
/// The sink calls do not depend on how the stream was split into chunks.
///
/// Targets are registered on a [`MultipartBuilder`] and are fixed once the
/// parser is built.
///
/// # Examples
///
/// ```
/// use formsink::{Multipart, ValueSink};
///
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
///
/// let mut field = ValueSink::new();
/// let mut multipart = Multipart::builder("X-BOUNDARY")?
///     .register("my_text_field", &mut field)
///     .build();
///
/// for chunk in data.as_bytes().chunks(5) {
///     multipart.feed(chunk)?;
/// }
/// multipart.finish()?;
/// drop(multipart);
///
/// assert_eq!(field.text(), "abcd");
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct Multipart<'a> {
    scanner: BoundaryScanner,
    headers: HeaderReader,
    dispatcher: Dispatcher<'a>,
    limits: Limits,
    state: State,
    failure: Option<ParseFailure>,
    preamble_len: usize,
}

/// Collects targets for a [`Multipart`] before parsing starts.
#[derive(Debug)]
pub struct MultipartBuilder<'a> {
    boundary: Boundary,
    limits: Limits,
    targets: Vec<Target<'a>>,
}

impl<'a> MultipartBuilder<'a> {
    pub fn new(boundary: Boundary) -> MultipartBuilder<'a> {
        MultipartBuilder {
            boundary,
            limits: Limits::default(),
            targets: Vec::new(),
        }
    }

    /// Routes the parts named `name` to `sink`.
    pub fn register<N: Into<String>>(mut self, name: N, sink: &'a mut dyn PartSink) -> MultipartBuilder<'a> {
        self.push(Target::new(name, sink));
        self
    }

    /// Routes the parts whose name satisfies `matcher` to `sink`.
    ///
    /// Targets are tried in registration order and the first match wins.
    pub fn register_with<N, F>(mut self, name: N, sink: &'a mut dyn PartSink, matcher: F) -> MultipartBuilder<'a>
    where
        N: Into<String>,
        F: Fn(&str) -> bool + 'a,
    {
        self.push(Target::with_matcher(name, sink, matcher));
        self
    }

    pub fn limits(mut self, limits: Limits) -> MultipartBuilder<'a> {
        self.limits = limits;
        self
    }

    pub(crate) fn push(&mut self, target: Target<'a>) {
        self.targets.push(target);
    }

    pub(crate) fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    pub fn build(self) -> Multipart<'a> {
        let routes = RouteTable::new(self.targets);
        debug!("registration closed with {} targets", routes.len());

        Multipart {
            scanner: BoundaryScanner::new(self.boundary),
            headers: HeaderReader::new(self.limits.header_block),
            dispatcher: Dispatcher::new(routes),
            limits: self.limits,
            state: State::AwaitingFirstDelimiter,
            failure: None,
            preamble_len: 0,
        }
    }
}

impl<'a> Multipart<'a> {
    /// Starts building a parser for the given boundary token.
    pub fn builder<T: AsRef<[u8]>>(boundary: T) -> crate::Result<MultipartBuilder<'a>> {
        Boundary::new(boundary).map(MultipartBuilder::new)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn boundary(&self) -> &Boundary {
        self.scanner.boundary()
    }

    /// Headers of the part being streamed, if any.
    pub fn current_part(&self) -> Option<&PartHeaders> {
        self.dispatcher.current().map(|part| &part.headers)
    }

    /// Number of parts whose headers were parsed so far.
    pub fn parts_seen(&self) -> usize {
        self.dispatcher.parts_seen()
    }

    /// Feeds the next chunk of the stream.
    ///
    /// Chunks must be passed in order, without gaps or overlaps. Once the
    /// terminating boundary was seen, further chunks are ignored. After a
    /// failure, every call returns that same failure without looking at the
    /// input.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ParseFailure> {
        if self.state.is_terminal() {
            return self.outcome();
        }

        let result = self.advance(chunk);
        self.settle(result)
    }

    /// Signals the end of the stream.
    ///
    /// Fails unless the terminating boundary was seen.
    pub fn finish(&mut self) -> Result<(), ParseFailure> {
        if self.state.is_terminal() {
            return self.outcome();
        }

        let result = match self.state {
            State::InHeaders => Err(HeaderError::IncompleteHeaders.into()),
            _ => Err(DelimitingError::IncompleteStream.into()),
        };

        self.settle(result)
    }

    /// What every call reports once the parser reached a terminal state.
    fn outcome(&self) -> Result<(), ParseFailure> {
        match self.state {
            State::Errored => Err(self.failure()),
            _ => Ok(()),
        }
    }

    fn failure(&self) -> ParseFailure {
        self.failure
            .clone()
            .unwrap_or(ParseFailure::Internal(InternalError::Stalled(State::Errored)))
    }

    fn settle(&mut self, result: Result<(), ParseFailure>) -> Result<(), ParseFailure> {
        if let Err(failure) = &result {
            debug!("multipart parsing failed in {:?}: {:?}", self.state, failure);
            self.state = State::Errored;
            self.failure = Some(failure.clone());
        }
        result
    }

    fn advance(&mut self, mut input: &[u8]) -> Result<(), ParseFailure> {
        while !input.is_empty() {
            let consumed = match self.state {
                State::AwaitingFirstDelimiter => self.skip_preamble(input)?,
                State::InHeaders => self.read_headers(input)?,
                State::InBody => self.stream_body(input)?,
                State::Complete => {
                    trace!("ignoring {} bytes of epilogue", input.len());
                    return Ok(());
                }
                State::Errored => return Err(self.failure()),
            };

            if consumed == 0 {
                return Err(InternalError::Stalled(self.state).into());
            }
            input = &input[consumed..];
        }

        Ok(())
    }

    fn skip_preamble(&mut self, input: &[u8]) -> Result<usize, ParseFailure> {
        let limit = self.limits.preamble;
        let preamble_len = &mut self.preamble_len;

        let scanned = self.scanner.scan(input, |bytes| {
            *preamble_len += bytes.len();
            // The search starts with a virtual line break which is never part of the preamble.
            if preamble_len.saturating_sub(constants::CRLF.len()) > limit {
                return Err(DelimitingError::PreambleTooLong { limit }.into());
            }
            Ok(())
        })?;
        self.check_residual()?;

        match scanned.found {
            Some(BoundaryKind::Delimiter) => {
                trace!("first delimiter found");
                self.state = State::InHeaders;
            }
            Some(BoundaryKind::Terminator) => return Err(DelimitingError::TerminatorBeforeDelimiter.into()),
            None => {}
        }

        Ok(scanned.consumed)
    }

    fn read_headers(&mut self, input: &[u8]) -> Result<usize, ParseFailure> {
        let (consumed, headers) = self.headers.read(input)?;

        if let Some(headers) = headers {
            self.dispatcher.begin(headers);
            self.state = State::InBody;
        }

        Ok(consumed)
    }

    fn stream_body(&mut self, input: &[u8]) -> Result<usize, ParseFailure> {
        let dispatcher = &mut self.dispatcher;
        let scanned = self
            .scanner
            .scan(input, |bytes| dispatcher.data(bytes).map_err(ParseFailure::from))?;
        self.check_residual()?;

        match scanned.found {
            Some(BoundaryKind::Delimiter) => {
                self.dispatcher.end()?;
                self.state = State::InHeaders;
            }
            Some(BoundaryKind::Terminator) => {
                self.dispatcher.end()?;
                debug!("multipart stream complete after {} parts", self.dispatcher.parts_seen());
                self.state = State::Complete;
            }
            None => {}
        }

        Ok(scanned.consumed)
    }

    fn check_residual(&self) -> Result<(), InternalError> {
        let len = self.scanner.residual().len();
        let max = self.scanner.boundary().delimiter().len() - 1;
        if len > max {
            return Err(InternalError::ResidualOverflow { len, max });
        }
        Ok(())
    }
}
