use crate::constants;

/// Which of the two boundary sequences was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryKind {
    /// `\r\n--token\r\n`, opens the next part.
    Delimiter,
    /// `\r\n--token--`, closes the stream.
    Terminator,
}

/// Progress of the delimiter/terminator search.
///
/// Both sequences share the prefix `\r\n--token`, so the search runs a single
/// automaton over that prefix and only tells the two apart in `Lookahead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchState {
    /// This many bytes of the shared prefix are matched.
    Prefix(usize),
    /// The shared prefix plus the first byte picking the sequence are matched.
    Lookahead(BoundaryKind),
    /// A whole sequence is matched.
    Found(BoundaryKind),
}

/// A multipart boundary token with the byte sequences derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    token: Vec<u8>,
    delimiter: Vec<u8>,
    terminator: Vec<u8>,
    // border[i]: longest proper border of delimiter[..=i]
    delimiter_border: Vec<usize>,
    terminator_border: Vec<usize>,
}

impl Boundary {
    /// Derives the delimiter and terminator from a boundary token.
    ///
    /// Fails with [`Error::EmptyBoundary`](crate::Error::EmptyBoundary) if the token is empty.
    pub fn new<T: AsRef<[u8]>>(token: T) -> crate::Result<Boundary> {
        let token = token.as_ref();
        if token.is_empty() {
            return Err(crate::Error::EmptyBoundary);
        }

        let shared = [constants::CRLF.as_bytes(), constants::BOUNDARY_EXT.as_bytes(), token].concat();
        let delimiter = [shared.as_slice(), constants::CRLF.as_bytes()].concat();
        let terminator = [shared.as_slice(), constants::BOUNDARY_EXT.as_bytes()].concat();

        Ok(Boundary {
            token: token.to_vec(),
            delimiter_border: borders(&delimiter),
            terminator_border: borders(&terminator),
            delimiter,
            terminator,
        })
    }

    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// `\r\n--token\r\n`
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// `\r\n--token--`
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    /// Length of the prefix the delimiter and the terminator have in common.
    pub(crate) fn shared_len(&self) -> usize {
        self.delimiter.len() - constants::CRLF.len()
    }

    fn sequence(&self, kind: BoundaryKind) -> &[u8] {
        match kind {
            BoundaryKind::Delimiter => &self.delimiter,
            BoundaryKind::Terminator => &self.terminator,
        }
    }

    /// The stream bytes covered by `state`, always a suffix of what was scanned.
    pub(crate) fn matched(&self, state: MatchState) -> &[u8] {
        match state {
            MatchState::Prefix(n) => &self.delimiter[..n],
            MatchState::Lookahead(kind) => &self.sequence(kind)[..self.shared_len() + 1],
            MatchState::Found(kind) => self.sequence(kind),
        }
    }

    pub(crate) fn matched_len(&self, state: MatchState) -> usize {
        self.matched(state).len()
    }

    /// Advances the search by one byte.
    pub(crate) fn step(&self, mut state: MatchState, byte: u8) -> MatchState {
        let shared = self.shared_len();

        loop {
            state = match state {
                MatchState::Prefix(n) if n < shared => {
                    if self.delimiter[n] == byte {
                        return MatchState::Prefix(n + 1);
                    }
                    if n == 0 {
                        return MatchState::Prefix(0);
                    }
                    MatchState::Prefix(self.delimiter_border[n - 1])
                }
                MatchState::Prefix(_) => {
                    if byte == self.delimiter[shared] {
                        return MatchState::Lookahead(BoundaryKind::Delimiter);
                    }
                    if byte == self.terminator[shared] {
                        return MatchState::Lookahead(BoundaryKind::Terminator);
                    }
                    MatchState::Prefix(self.delimiter_border[shared - 1])
                }
                MatchState::Lookahead(kind) => {
                    if self.sequence(kind)[shared + 1] == byte {
                        return MatchState::Found(kind);
                    }
                    let border = match kind {
                        BoundaryKind::Delimiter => self.delimiter_border[shared],
                        BoundaryKind::Terminator => self.terminator_border[shared],
                    };
                    MatchState::Prefix(border)
                }
                MatchState::Found(_) => MatchState::Prefix(0),
            };
        }
    }
}

fn borders(pattern: &[u8]) -> Vec<usize> {
    let mut border = vec![0; pattern.len()];
    let mut k = 0;

    for i in 1..pattern.len() {
        while k > 0 && pattern[i] != pattern[k] {
            k = border[k - 1];
        }
        if pattern[i] == pattern[k] {
            k += 1;
        }
        border[i] = k;
    }

    border
}
