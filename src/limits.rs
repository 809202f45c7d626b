use crate::constants;

/// Bounds on the bytes a parser buffers, so a hostile stream cannot run it out of memory.
///
/// # Examples
///
/// ```
/// use formsink::{Limits, Multipart};
///
/// # fn run() -> formsink::Result<()> {
/// let limits = Limits::new().header_block(4 * 1024).preamble(0);
/// let multipart = Multipart::builder("X-BOUNDARY")?.limits(limits).build();
/// # drop(multipart);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub(crate) header_block: usize,
    pub(crate) preamble: usize,
}

impl Limits {
    /// Creates the default limits: 8 KiB per header block and 16 KiB of preamble.
    pub fn new() -> Limits {
        Limits::default()
    }

    /// Sets the maximum size of a part's header block, blank line included.
    pub fn header_block(mut self, limit: usize) -> Limits {
        self.header_block = limit;
        self
    }

    /// Sets how many bytes may precede the first delimiter.
    pub fn preamble(mut self, limit: usize) -> Limits {
        self.preamble = limit;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            header_block: constants::DEFAULT_HEADER_BLOCK_LIMIT,
            preamble: constants::DEFAULT_PREAMBLE_LIMIT,
        }
    }
}
