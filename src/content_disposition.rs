use http::header::{self, HeaderMap};

pub(crate) struct ContentDisposition {
    pub(crate) field_name: Option<String>,
    pub(crate) file_name: Option<String>,
}

impl ContentDisposition {
    /// Reads `name` and `filename` from the `Content-Disposition` header.
    ///
    /// Returns `None` when the header is absent.
    pub(crate) fn parse(headers: &HeaderMap) -> Option<ContentDisposition> {
        let value = headers.get(header::CONTENT_DISPOSITION)?;
        let value = String::from_utf8_lossy(value.as_bytes());

        let mut field_name = None;
        let mut file_name = None;

        // The first segment is the disposition type.
        for param in split_params(&value).into_iter().skip(1) {
            let (key, val) = match param.split_once('=') {
                Some(pair) => pair,
                None => continue,
            };

            let key = key.trim();
            if key.eq_ignore_ascii_case("name") {
                field_name = Some(unquote(val.trim()));
            } else if key.eq_ignore_ascii_case("filename") {
                file_name = Some(unquote(val.trim()));
            }
        }

        Some(ContentDisposition { field_name, file_name })
    }
}

/// Splits on `;` outside of quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (idx, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);

    params
}

fn unquote(value: &str) -> String {
    let inner = match value.strip_prefix('"') {
        Some(rest) => rest,
        None => return value.to_owned(),
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
