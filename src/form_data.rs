use crate::multipart::{Multipart, MultipartBuilder};
use crate::router::Target;
use crate::sink::PartSink;
use crate::{Boundary, Limits, State};
use http::header::{self, HeaderMap};
use std::mem;

/// A form-data parser configured from request metadata, accepting target
/// registrations until the first chunk arrives.
///
/// # Examples
///
/// ```
/// use formsink::{FormDataParser, ValueSink};
///
/// # fn run() -> formsink::Result<()> {
/// let mut title = ValueSink::new();
/// let mut late = ValueSink::new();
/// let mut parser = FormDataParser::from_content_type("multipart/form-data; boundary=XYZ")?;
/// parser.register("title", &mut title)?;
///
/// parser.data_received(b"--XYZ\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n")?;
/// parser.data_received(b"Hello\r\n--XYZ--\r\n")?;
/// parser.finish()?;
///
/// // Too late now.
/// assert!(parser.register("late", &mut late).is_err());
///
/// drop(parser);
/// assert_eq!(title.text(), "Hello");
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug)]
pub struct FormDataParser<'a> {
    phase: Phase<'a>,
}

#[derive(Debug)]
enum Phase<'a> {
    Registering(MultipartBuilder<'a>),
    Running(Multipart<'a>),
    Starting,
}

impl<'a> FormDataParser<'a> {
    /// Creates a parser for a raw boundary token.
    pub fn new<T: AsRef<[u8]>>(boundary: T) -> crate::Result<FormDataParser<'a>> {
        let boundary = Boundary::new(boundary)?;
        Ok(FormDataParser {
            phase: Phase::Registering(MultipartBuilder::new(boundary)),
        })
    }

    /// Creates a parser for the boundary of a `multipart/form-data` content type.
    pub fn from_content_type<T: AsRef<str>>(content_type: T) -> crate::Result<FormDataParser<'a>> {
        let boundary = crate::parse_boundary(content_type)?;
        FormDataParser::new(boundary)
    }

    /// Creates a parser from the `Content-Type` of a request's headers.
    pub fn from_headers(headers: &HeaderMap) -> crate::Result<FormDataParser<'a>> {
        let content_type = headers.get(header::CONTENT_TYPE).ok_or(crate::Error::NoContentType)?;
        let content_type = content_type.to_str().map_err(|_| crate::Error::NoMultipart)?;
        FormDataParser::from_content_type(content_type)
    }

    /// Replaces the buffering limits. Only effective before the first chunk.
    pub fn with_limits(mut self, limits: Limits) -> FormDataParser<'a> {
        if let Phase::Registering(builder) = &mut self.phase {
            builder.set_limits(limits);
        }
        self
    }

    /// Routes the parts named `name` to `sink`.
    ///
    /// Fails with [`Error::RegistrationClosed`](crate::Error::RegistrationClosed)
    /// once [`data_received`](FormDataParser::data_received) was called.
    pub fn register<N: Into<String>>(&mut self, name: N, sink: &'a mut dyn PartSink) -> crate::Result<()> {
        self.add_target(Target::new(name, sink))
    }

    /// Routes the parts whose name satisfies `matcher` to `sink`.
    pub fn register_with<N, F>(&mut self, name: N, sink: &'a mut dyn PartSink, matcher: F) -> crate::Result<()>
    where
        N: Into<String>,
        F: Fn(&str) -> bool + 'a,
    {
        self.add_target(Target::with_matcher(name, sink, matcher))
    }

    fn add_target(&mut self, target: Target<'a>) -> crate::Result<()> {
        match &mut self.phase {
            Phase::Registering(builder) => {
                builder.push(target);
                Ok(())
            }
            _ => Err(crate::Error::RegistrationClosed),
        }
    }

    /// Feeds the next chunk of the stream, closing registration.
    pub fn data_received(&mut self, chunk: &[u8]) -> crate::Result<()> {
        self.running()?.feed(chunk).map_err(crate::Error::Parse)
    }

    /// Signals the end of the stream, closing registration.
    pub fn finish(&mut self) -> crate::Result<()> {
        self.running()?.finish().map_err(crate::Error::Parse)
    }

    pub fn state(&self) -> State {
        match &self.phase {
            Phase::Running(multipart) => multipart.state(),
            _ => State::AwaitingFirstDelimiter,
        }
    }

    fn running(&mut self) -> crate::Result<&mut Multipart<'a>> {
        if let Phase::Registering(_) = self.phase {
            if let Phase::Registering(builder) = mem::replace(&mut self.phase, Phase::Starting) {
                self.phase = Phase::Running(builder.build());
            }
        }

        match &mut self.phase {
            Phase::Running(multipart) => Ok(multipart),
            _ => Err(crate::Error::Parse(
                crate::error::InternalError::Stalled(State::AwaitingFirstDelimiter).into(),
            )),
        }
    }
}
