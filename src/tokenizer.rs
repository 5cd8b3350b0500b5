//! Splits a byte buffer into tokens using a per-byte classifier.
//!
//! Tokens are views into the input, never copies. Each byte is classified as
//! one of four actions; the iterator yields maximal non-empty runs and never
//! produces an empty token.

/// What the tokenizer does with a byte
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Stop tokenizing; the byte is dropped and any pending token is flushed
    ///
    /// Stopping does not discard the token in progress: a plain early return
    /// would lose it, so it is yielded before the iterator ends.
    Stop,
    /// Append the byte to the current token, then end it
    EndInclude,
    /// End the current token without the byte
    EndExclude,
    /// Append the byte and keep going
    Continue,
}

/// Iterator over the tokens of a buffer
pub struct Tokens<'a, F> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
    classifier: F,
}

impl<'a, F> Tokens<'a, F>
where
    F: FnMut(u8) -> Classification,
{
    pub fn new(bytes: &'a [u8], classifier: F) -> Self {
        Self {
            bytes,
            pos: 0,
            done: false,
            classifier,
        }
    }

    /// The part of the input not yet consumed
    #[inline]
    pub fn remainder(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    #[inline]
    fn pending(&self, start: usize) -> Option<&'a [u8]> {
        (start < self.pos).then(|| &self.bytes[start..self.pos])
    }
}

impl<'a, F> Iterator for Tokens<'a, F>
where
    F: FnMut(u8) -> Classification,
{
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut start = self.pos;
        while let Some(&byte) = self.bytes.get(self.pos) {
            match (self.classifier)(byte) {
                Classification::Continue => {
                    self.pos += 1;
                }
                Classification::EndInclude => {
                    self.pos += 1;
                    return self.pending(start);
                }
                Classification::EndExclude => {
                    let token = self.pending(start);
                    self.pos += 1;
                    if token.is_some() {
                        return token;
                    }
                    // separator run: slide the token start past it
                    start = self.pos;
                }
                Classification::Stop => {
                    self.done = true;
                    return self.pending(start);
                }
            }
        }

        self.done = true;
        self.pending(start)
    }
}

impl<F> std::iter::FusedIterator for Tokens<'_, F> where F: FnMut(u8) -> Classification {}

/// Tokenize `bytes` with `classifier`
#[inline]
pub fn tokenize<F>(bytes: &[u8], classifier: F) -> Tokens<'_, F>
where
    F: FnMut(u8) -> Classification,
{
    Tokens::new(bytes, classifier)
}

/// Number of tokens `tokenize` would yield
pub fn count_tokens<F>(bytes: &[u8], classifier: F) -> usize
where
    F: FnMut(u8) -> Classification,
{
    tokenize(bytes, classifier).count()
}

/// Words: ASCII letters continue a token, every other byte ends one and is dropped
#[inline]
pub fn alphabetic(byte: u8) -> Classification {
    if byte.is_ascii_alphabetic() {
        Classification::Continue
    } else {
        Classification::EndExclude
    }
}
