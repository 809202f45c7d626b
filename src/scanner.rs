use crate::boundary::{Boundary, BoundaryKind, MatchState};
use crate::error::{InternalError, ParseFailure};

/// Outcome of a single [`BoundaryScanner::scan`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scanned {
    /// Bytes of the chunk taken by this call. Anything past it belongs to the next stage.
    pub(crate) consumed: usize,
    pub(crate) found: Option<BoundaryKind>,
}

/// Incremental search for the delimiter and the terminator.
///
/// Bytes that may begin a boundary are withheld until the match completes or
/// fails. Withheld bytes are never stored: they always equal the matched part
/// of the boundary, so they are replayed from it once disproven.
#[derive(Debug)]
pub(crate) struct BoundaryScanner {
    boundary: Boundary,
    state: MatchState,
}

impl BoundaryScanner {
    /// The stream is expected to open with `--token\r\n`, so the search starts
    /// as if a line break had been seen already.
    pub(crate) fn new(boundary: Boundary) -> BoundaryScanner {
        BoundaryScanner {
            boundary,
            state: MatchState::Prefix(crate::constants::CRLF.len()),
        }
    }

    pub(crate) fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Bytes of a possible boundary carried over to the next chunk.
    pub(crate) fn residual(&self) -> &[u8] {
        self.boundary.matched(self.state)
    }

    /// Scans `chunk`, passing every byte that can no longer be part of a
    /// boundary to `emit`, in stream order.
    ///
    /// Stops right after the first complete delimiter or terminator.
    pub(crate) fn scan<F>(&mut self, chunk: &[u8], mut emit: F) -> Result<Scanned, ParseFailure>
    where
        F: FnMut(&[u8]) -> Result<(), ParseFailure>,
    {
        let carried = self.boundary.matched_len(self.state);
        let mut state = self.state;
        let mut consumed = chunk.len();
        let mut found = None;

        for (idx, &byte) in chunk.iter().enumerate() {
            state = self.boundary.step(state, byte);
            if let MatchState::Found(kind) = state {
                consumed = idx + 1;
                found = Some(kind);
                break;
            }
        }

        let withheld = self.boundary.matched_len(state);
        let released = (carried + consumed)
            .checked_sub(withheld)
            .ok_or(InternalError::ScanWindow)?;

        let residual = self.boundary.matched(self.state);
        let from_residual = released.min(carried);
        if from_residual > 0 {
            emit(&residual[..from_residual])?;
        }
        if released > carried {
            emit(&chunk[..released - carried])?;
        }

        self.state = match found {
            Some(_) => MatchState::Prefix(0),
            None => state,
        };

        Ok(Scanned { consumed, found })
    }
}
