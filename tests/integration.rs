use bytes::Bytes;
use formsink::{
    Category, Error, FormDataParser, Limits, ListSink, Multipart, PartHeaders, PartSink, State, ValueSink,
};
use futures_util::stream;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Begin(String, Option<String>),
    Data(Vec<u8>),
    End,
}

/// Records sink calls, merging consecutive data calls.
#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
    data_calls: usize,
}

impl PartSink for Recorder {
    fn on_part_begin(&mut self, headers: &PartHeaders) {
        self.events.push(Event::Begin(
            headers.name().to_owned(),
            headers.file_name().map(str::to_owned),
        ));
    }

    fn on_part_data(&mut self, chunk: &[u8]) {
        assert!(!chunk.is_empty());
        self.data_calls += 1;
        match self.events.last_mut() {
            Some(Event::Data(data)) => data.extend_from_slice(chunk),
            _ => self.events.push(Event::Data(chunk.to_vec())),
        }
    }

    fn on_part_end(&mut self) {
        self.events.push(Event::End);
    }
}

const BASIC: &str = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

fn part(name: &str, body: &[u8]) -> Vec<u8> {
    [
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        body,
    ]
    .concat()
}

fn multipart_body(boundary: &str, parts: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        out.extend_from_slice(part);
    }
    out.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    out
}

/// Runs `chunks` through a parser routing every part to one recorder.
fn record<'c, I>(boundary: &str, chunks: I) -> (Vec<Event>, Result<(), formsink::ParseFailure>)
where
    I: IntoIterator<Item = &'c [u8]>,
{
    let mut recorder = Recorder::default();
    let result = {
        let mut multipart = Multipart::builder(boundary)
            .unwrap()
            .register_with("all", &mut recorder, |_| true)
            .build();

        chunks
            .into_iter()
            .try_for_each(|chunk| multipart.feed(chunk))
            .and_then(|_| multipart.finish())
    };
    (recorder.events, result)
}

fn assert_chunk_invariant(boundary: &str, data: &[u8]) -> Vec<Event> {
    let (expected, result) = record(boundary, Some(data));

    for size in 1..=data.len() {
        let (events, chunked) = record(boundary, data.chunks(size));
        assert_eq!(events, expected, "chunk size {}", size);
        assert_eq!(chunked, result, "chunk size {}", size);
    }

    for split in 0..=data.len() {
        let (head, tail) = data.split_at(split);
        let (events, chunked) = record(boundary, vec![head, tail]);
        assert_eq!(events, expected, "split at {}", split);
        assert_eq!(chunked, result, "split at {}", split);
    }

    expected
}

#[test]
fn test_end_to_end_example() {
    let data = b"--XYZ\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nhello\r\n--XYZ--";

    let mut recorder = Recorder::default();
    let mut multipart = Multipart::builder("XYZ").unwrap().register("f", &mut recorder).build();
    multipart.feed(data).unwrap();
    assert_eq!(multipart.state(), State::Complete);
    multipart.finish().unwrap();
    drop(multipart);

    assert_eq!(
        recorder.events,
        vec![
            Event::Begin("f".to_owned(), None),
            Event::Data(b"hello".to_vec()),
            Event::End,
        ]
    );
    assert_eq!(recorder.data_calls, 1);
}

#[test]
fn test_multipart_basic() {
    let mut my_field = ValueSink::new();
    let mut file_field = Recorder::default();

    let mut multipart = Multipart::builder("X-BOUNDARY")
        .unwrap()
        .register("My Field", &mut my_field)
        .register("File Field", &mut file_field)
        .build();

    for ch in BASIC.chars() {
        multipart.feed(ch.to_string().as_bytes()).unwrap();
    }
    multipart.finish().unwrap();
    drop(multipart);

    assert_eq!(my_field.text(), "abcd");
    assert!(my_field.is_finished());
    assert_eq!(
        file_field.events,
        vec![
            Event::Begin("File Field".to_owned(), Some("a-text-file.txt".to_owned())),
            Event::Data(b"Hello world\nHello\r\nWorld\rAgain".to_vec()),
            Event::End,
        ]
    );
}

#[test]
fn test_chunk_invariance() {
    assert_chunk_invariant("X-BOUNDARY", BASIC.as_bytes());

    let data = multipart_body(
        "XYZ",
        &[
            part("a", b""),
            part("b", b"\r\n--XYZ "),
            part("c", b"\r\n--XY\r\n--XYZ-\r\n--XYZ\r"),
            part("d", b"--XYZ\r\n"),
            part("e", b"\r\r\n\r\n--"),
        ],
    );
    let events = assert_chunk_invariant("XYZ", &data);
    assert_eq!(events.iter().filter(|e| **e == Event::End).count(), 5);
}

#[test]
fn test_chunk_invariance_with_self_overlapping_tokens() {
    let cases: &[(&str, &[u8])] = &[
        ("--", b"\r\n---\r\n-----\r\n----x-"),
        ("-X-", b"\r\n---X--X-\r\n--X-X-\r\n---X-!"),
        ("a-a", b"\r\n--a-a-a\r\n--a-\r\n--a-a-"),
    ];

    for &(token, body) in cases {
        let data = multipart_body(token, &[part("f", body), part("g", b"-")]);
        let events = assert_chunk_invariant(token, &data);
        assert_eq!(
            events,
            vec![
                Event::Begin("f".to_owned(), None),
                Event::Data(body.to_vec()),
                Event::End,
                Event::Begin("g".to_owned(), None),
                Event::Data(b"-".to_vec()),
                Event::End,
            ],
            "token {:?}",
            token
        );
    }
}

#[test]
fn test_chunk_invariance_of_failures() {
    let truncated = &BASIC.as_bytes()[..BASIC.len() - 6];
    let events = assert_chunk_invariant("X-BOUNDARY", truncated);
    assert_eq!(events.last(), Some(&Event::Data(b"Hello world\nHello\r\nWorld\rAgain".to_vec())));

    let bad_headers = b"--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nok\r\n--XYZ\r\nno colon here\r\n\r\nx\r\n--XYZ--";
    let events = assert_chunk_invariant("XYZ", bad_headers);
    assert_eq!(
        events,
        vec![Event::Begin("a".to_owned(), None), Event::Data(b"ok".to_vec()), Event::End]
    );
}

#[test]
fn test_body_exactness() {
    let bodies: &[&[u8]] = &[
        b"",
        b"\r",
        b"\r\n",
        b"\r\n-",
        b"\r\n--",
        b"\r\n--X",
        b"\r\n--XYZ!",
        b"\r\n--XYZ-",
        b"\r\n--XYZ\r",
        b"--XYZ--",
        b"tail\r\n--XY",
        b"\r\n\r\n\r\n",
        b"\x00\xff\r\n--\xfe",
    ];

    for &body in bodies {
        let data = multipart_body("XYZ", &[part("f", body)]);
        let mut sink = ValueSink::new();
        let mut multipart = Multipart::builder("XYZ").unwrap().register("f", &mut sink).build();

        for byte in data.iter() {
            multipart.feed(std::slice::from_ref(byte)).unwrap();
        }
        multipart.finish().unwrap();
        drop(multipart);

        assert_eq!(sink.bytes(), body, "body {:?}", body);
        assert_eq!(sink.parts(), 1);
    }
}

#[test]
fn test_name_based_routing() {
    let data = multipart_body(
        "XYZ",
        &[part("f", b"one"), part("g", b"two"), part("f", b"three"), part("h", b"four")],
    );

    let mut f = ListSink::new();
    let mut g = Recorder::default();
    let mut multipart = Multipart::builder("XYZ")
        .unwrap()
        .register("f", &mut f)
        .register("g", &mut g)
        .build();

    multipart.feed(&data).unwrap();
    multipart.finish().unwrap();
    assert_eq!(multipart.parts_seen(), 4);
    drop(multipart);

    assert_eq!(
        f.into_values(),
        vec![Bytes::from_static(b"one"), Bytes::from_static(b"three")]
    );
    assert_eq!(
        g.events,
        vec![Event::Begin("g".to_owned(), None), Event::Data(b"two".to_vec()), Event::End]
    );
}

#[test]
fn test_custom_matcher_first_match_wins() {
    let data = multipart_body("XYZ", &[part("file[0]", b"a"), part("file[1]", b"b"), part("title", b"t")]);

    let mut files = ListSink::new();
    let mut exact = ValueSink::new();
    let mut rest = ValueSink::new();
    let mut multipart = Multipart::builder("XYZ")
        .unwrap()
        .register_with("files", &mut files, |name| name.starts_with("file["))
        .register("file[1]", &mut exact)
        .register_with("rest", &mut rest, |_| true)
        .build();

    multipart.feed(&data).unwrap();
    multipart.finish().unwrap();
    drop(multipart);

    assert_eq!(files.values().len(), 2);
    assert_eq!(exact.parts(), 0);
    assert_eq!(rest.text(), "t");
}

#[test]
fn test_registration_lock() {
    let mut early = ValueSink::new();
    let mut late = [ValueSink::new(), ValueSink::new(), ValueSink::new()];
    let [late_a, late_b, late_c] = &mut late;

    let mut parser = FormDataParser::new("XYZ").unwrap();
    parser.register("f", &mut early).unwrap();

    parser.data_received(b"--XYZ\r\n").unwrap();
    assert_eq!(parser.register("g", late_a), Err(Error::RegistrationClosed));

    parser
        .data_received(b"Content-Disposition: form-data; name=\"f\"\r\n\r\nv\r\n--XYZ--")
        .unwrap();
    assert_eq!(parser.state(), State::Complete);
    assert_eq!(parser.register("g", late_b), Err(Error::RegistrationClosed));

    let mut failed = FormDataParser::new("XYZ").unwrap();
    assert!(failed.data_received(b"--XYZ--").is_err());
    assert_eq!(failed.register("g", late_c), Err(Error::RegistrationClosed));

    drop(parser);
    assert_eq!(early.text(), "v");
}

#[test]
fn test_error_classification() {
    let err = FormDataParser::from_content_type("multipart/form-data").unwrap_err();
    assert_eq!(err, Error::NoBoundary);
    assert!(err.is_configuration());

    let mut parser = FormDataParser::new("XYZ").unwrap();
    parser
        .data_received(b"--XYZ\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\npartial body")
        .unwrap();
    assert_eq!(parser.finish().unwrap_err().category(), Some(Category::Delimiting));

    let mut parser = FormDataParser::new("XYZ").unwrap();
    parser
        .data_received(b"--XYZ\r\nContent-Disposition: form-data; name=\"f\"\r\nno blank line")
        .unwrap();
    assert_eq!(parser.finish().unwrap_err().category(), Some(Category::PartHeaders));

    let mut parser = FormDataParser::new("XYZ").unwrap().with_limits(Limits::new().header_block(64));
    let err = parser
        .data_received(&[&b"--XYZ\r\nX-Filler: "[..], &[b'a'; 100][..]].concat())
        .unwrap_err();
    assert_eq!(err.category(), Some(Category::PartHeaders));

    let mut parser = FormDataParser::new("XYZ").unwrap();
    let err = parser.data_received(b"--XYZ\r\nContent-Type: text/plain\r\n\r\n").unwrap_err();
    assert_eq!(err.category(), Some(Category::PartHeaders));
    // Same failure again, input untouched.
    assert_eq!(parser.data_received(b"anything").unwrap_err(), err);
    assert_eq!(parser.state(), State::Errored);
}

#[test]
fn test_preamble_and_epilogue() {
    let data = b"This is the preamble.\r\n--XYZ\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nbody\r\n--XYZ--\r\nThis is the epilogue.\r\n--XYZ\r\n";

    let (events, result) = record("XYZ", Some(&data[..]));
    assert_eq!(result, Ok(()));
    assert_eq!(
        events,
        vec![Event::Begin("f".to_owned(), None), Event::Data(b"body".to_vec()), Event::End]
    );
}

#[test]
fn test_multipart_empty() {
    let (events, result) = record("X-BOUNDARY", Some(&b"--X-BOUNDARY--\r\n"[..]));
    assert!(events.is_empty());
    assert_eq!(result.unwrap_err().category(), Category::Delimiting);
}

#[tokio::test]
async fn test_feed_stream() {
    let stream = stream::iter(
        BASIC
            .chars()
            .map(|ch| ch.to_string())
            .map(|part| formsink::Result::Ok(Bytes::copy_from_slice(part.as_bytes()))),
    );

    let mut my_field = ValueSink::new();
    let mut multipart = Multipart::builder("X-BOUNDARY")
        .unwrap()
        .register("My Field", &mut my_field)
        .build();

    multipart.feed_stream(stream).await.unwrap();
    assert_eq!(multipart.state(), State::Complete);
    drop(multipart);

    assert_eq!(my_field.text(), "abcd");
}

#[tokio::test]
async fn test_feed_stream_failures() {
    let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
        Ok("--X-BOUNDARY\r\n"),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];
    let mut multipart = Multipart::builder("X-BOUNDARY").unwrap().build();
    let err = multipart.feed_stream(stream::iter(chunks)).await.unwrap_err();
    assert!(matches!(err, Error::StreamReadFailed(_)));

    let truncated = stream::iter(vec![Result::<_, std::io::Error>::Ok(&BASIC[..40])]);
    let mut multipart = Multipart::builder("X-BOUNDARY").unwrap().build();
    let err = multipart.feed_stream(truncated).await.unwrap_err();
    assert_eq!(err.category(), Some(Category::PartHeaders));
}

#[cfg(feature = "tokio-io")]
#[tokio::test]
async fn test_feed_reader() {
    let mut file_field = ValueSink::new();
    let mut multipart = Multipart::builder("X-BOUNDARY")
        .unwrap()
        .register("File Field", &mut file_field)
        .build();

    multipart.feed_reader(BASIC.as_bytes()).await.unwrap();
    drop(multipart);

    assert_eq!(file_field.text(), "Hello world\nHello\r\nWorld\rAgain");
}

#[cfg(feature = "json")]
#[test]
fn test_json_value() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Meta {
        width: u32,
    }

    let data = multipart_body("XYZ", &[part("meta", br#"{"width": 640}"#)]);
    let mut meta = ValueSink::new();
    let mut multipart = Multipart::builder("XYZ").unwrap().register("meta", &mut meta).build();
    multipart.feed(&data).unwrap();
    drop(multipart);

    assert_eq!(meta.json::<Meta>().unwrap(), Meta { width: 640 });
}
