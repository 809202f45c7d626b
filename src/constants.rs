pub(crate) const DEFAULT_HEADER_BLOCK_LIMIT: usize = 8 * 1024;
pub(crate) const DEFAULT_PREAMBLE_LIMIT: usize = 16 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";

