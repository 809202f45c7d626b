use crate::error::HeaderError;
use http::header::{HeaderName, HeaderValue};
use httparse::Header;
use std::convert::TryFrom;

pub(crate) fn convert_raw_headers(raw_headers: &[Header]) -> Result<Vec<(HeaderName, HeaderValue)>, HeaderError> {
    let mut headers = Vec::with_capacity(raw_headers.len());

    for raw_header in raw_headers {
        let name = HeaderName::try_from(raw_header.name).map_err(|_| HeaderError::DecodeHeaderName {
            name: raw_header.name.to_owned(),
        })?;

        let value = HeaderValue::try_from(raw_header.value).map_err(|_| HeaderError::DecodeHeaderValue {
            value: raw_header.value.to_vec(),
        })?;

        headers.push((name, value));
    }

    Ok(headers)
}
