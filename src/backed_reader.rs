use std::str::Chars;

/// A character reader with scoped, restorable look-back.
///
/// `BackedReader` wraps an arbitrary `char` source and records every character
/// read since each enclosing checkpoint, so that speculative parsing can
/// rewind the stream to where the checkpoint was taken. Checkpoints nest: an
/// inner checkpoint sees only the characters it itself consumed, and
/// committing it hands those characters to the enclosing checkpoint so the
/// outer scope can still roll back the whole region.
///
/// Characters read while no checkpoint is active are committed permanently and
/// cannot be rewound. Restoration is the checkpoint's job alone; readers of a
/// failed speculative branch do not have to (and should not) unget what they
/// consumed.
pub struct BackedReader<'a> {
    source: Box<dyn Iterator<Item = char> + 'a>,
    /// Characters pushed back onto the stream, last pushed = next read.
    pending: Vec<char>,
    /// One backup buffer per active checkpoint, innermost last.
    backups: Vec<String>,
    /// Every character ever pulled from the source, in input order.
    ///
    /// Rewinding moves the cursor, not this record; it is what failure
    /// diagnostics quote from.
    seen: String,
    position: usize,
}

impl<'a> BackedReader<'a> {
    /// Creates a reader over the characters of a string slice.
    pub fn from_str(input: &'a str) -> Self {
        Self::from_chars(input.chars())
    }

    /// Creates a reader over an arbitrary `char` iterator.
    pub fn from_chars(chars: impl Iterator<Item = char> + 'a) -> Self {
        Self::from_boxed_chars(Box::new(chars))
    }

    /// Creates a reader over a boxed `char` iterator.
    pub fn from_boxed_chars(source: Box<dyn Iterator<Item = char> + 'a>) -> Self {
        BackedReader {
            source,
            pending: vec![],
            backups: vec![],
            seen: String::new(),
            position: 0,
        }
    }

    /// Number of characters consumed from the start of the input.
    ///
    /// Rewinding a checkpoint moves this back to its value at the checkpoint.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns whether another character is available.
    #[inline]
    pub fn at_eof(&mut self) -> bool {
        self.peek_char().is_none()
    }

    /// Returns the next character without consuming it.
    #[inline]
    pub fn peek_char(&mut self) -> Option<char> {
        if let Some(&c) = self.pending.last() {
            return Some(c);
        }
        let c = self.source.next()?;
        self.seen.push(c);
        self.pending.push(c);
        Some(c)
    }

    /// Consumes and returns the next character.
    #[inline]
    pub fn read_char(&mut self) -> Option<char> {
        let c = self.next_char()?;
        if let Some(backup) = self.backups.last_mut() {
            backup.push(c);
        }
        self.position += 1;
        Some(c)
    }

    /// Consumes up to `n` characters and returns them.
    ///
    /// The result is shorter than `n` when the end of input intervenes, and
    /// empty at the end of input.
    pub fn read(&mut self, n: usize) -> String {
        let mut out = String::new();
        for _ in 0..n {
            match self.read_char() {
                Some(c) => out.push(c),
                None => break,
            }
        }
        out
    }

    /// Pushes the characters of `s` back onto the stream.
    ///
    /// `s` must be exactly the most recently read text of the innermost
    /// checkpoint; ungetting anything else would desynchronize the cursor and
    /// panics instead.
    pub fn unget(&mut self, s: &str) {
        let recorded = match self.backups.last_mut() {
            Some(backup) if backup.ends_with(s) => {
                backup.truncate(backup.len() - s.len());
                true
            }
            _ => false,
        };
        if !recorded {
            self.unget_misuse();
        }
        let mut count = 0;
        for c in s.chars().rev() {
            self.pending.push(c);
            count += 1;
        }
        self.position -= count;
    }

    #[cold]
    #[inline(never)]
    fn unget_misuse(&self) -> ! {
        panic!("ungetting text that was not read under the innermost checkpoint");
    }

    /// Rewinds the innermost checkpoint, ungetting everything read since it
    /// was taken. The checkpoint stays active.
    pub fn restore(&mut self) {
        let Some(backup) = self.backups.last_mut() else {
            Self::no_checkpoint();
        };
        let backup = std::mem::take(backup);
        let mut count = 0;
        for c in backup.chars().rev() {
            self.pending.push(c);
            count += 1;
        }
        self.position -= count;
    }

    #[cold]
    #[inline(never)]
    fn no_checkpoint() -> ! {
        panic!("no active checkpoint");
    }

    /// Takes a checkpoint: subsequent reads are recorded until the matching
    /// [`commit`][Self::commit] or [`abort`][Self::abort].
    #[inline]
    pub fn begin(&mut self) {
        self.backups.push(String::new());
    }

    /// Drops the innermost checkpoint, keeping everything read under it
    /// consumed. The consumed text becomes part of the enclosing checkpoint,
    /// if any, so an outer rewind still covers it.
    #[inline]
    pub fn commit(&mut self) {
        let Some(inner) = self.backups.pop() else {
            Self::no_checkpoint();
        };
        if let Some(outer) = self.backups.last_mut() {
            outer.push_str(&inner);
        }
    }

    /// Rewinds and drops the innermost checkpoint.
    #[inline]
    pub fn abort(&mut self) {
        self.restore();
        self.backups.pop();
    }

    /// Runs `f` under a fresh checkpoint, committing on `Ok` and rewinding on
    /// `Err`.
    pub fn with_checkpoint<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        self.begin();
        match f(self) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                self.abort();
                Err(err)
            }
        }
    }

    /// The input prefix observed so far, including rewound characters.
    pub(crate) fn seen(&self) -> &str {
        &self.seen
    }

    /// Peeks past any whitespace at the upcoming run of non-whitespace
    /// characters, up to `max` of them, without consuming anything.
    pub(crate) fn peek_word(&mut self, max: usize) -> String {
        self.begin();
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.read_char();
        }
        let mut out = String::new();
        let mut len = 0;
        while len < max {
            match self.peek_char() {
                Some(c) if !c.is_whitespace() => {
                    self.read_char();
                    out.push(c);
                    len += 1;
                }
                _ => break,
            }
        }
        self.abort();
        out
    }

    /// Reads ahead (and rewinds) until the end of the current line or `max`
    /// characters, so the observed prefix covers the whole line for
    /// diagnostics.
    pub(crate) fn fill_line(&mut self, max: usize) {
        self.begin();
        let mut len = 0;
        while len < max {
            match self.peek_char() {
                Some(c) if c != '\n' => {
                    self.read_char();
                    len += 1;
                }
                _ => break,
            }
        }
        self.abort();
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some(c) = self.pending.pop() {
            return Some(c);
        }
        let c = self.source.next()?;
        self.seen.push(c);
        Some(c)
    }
}

impl<'a> From<Chars<'a>> for BackedReader<'a> {
    fn from(chars: Chars<'a>) -> Self {
        Self::from_chars(chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_the_position() {
        let mut reader = BackedReader::from_str("abcdef");
        assert_eq!(reader.read(2), "ab");
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read(10), "cdef");
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.read(1), "");
        assert!(reader.at_eof());
    }

    #[test]
    fn peeking_does_not_consume() {
        let mut reader = BackedReader::from_str("xy");
        assert_eq!(reader.peek_char(), Some('x'));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_char(), Some('x'));
        assert_eq!(reader.peek_char(), Some('y'));
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn restore_rewinds_to_the_checkpoint() {
        let mut reader = BackedReader::from_str("abcdef");
        assert_eq!(reader.read(2), "ab");
        reader.begin();
        assert_eq!(reader.read(3), "cde");
        reader.restore();
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read(4), "cdef");
    }

    #[test]
    fn unget_returns_the_read_suffix() {
        let mut reader = BackedReader::from_str("hello");
        reader.begin();
        assert_eq!(reader.read(4), "hell");
        reader.unget("ll");
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read(3), "llo");
        reader.commit();
    }

    #[test]
    #[should_panic(expected = "ungetting text")]
    fn unget_of_unread_text_panics() {
        let mut reader = BackedReader::from_str("hello");
        reader.begin();
        reader.read(2);
        reader.unget("xx");
    }

    #[test]
    fn committed_inner_checkpoint_rewinds_with_the_outer() {
        let mut reader = BackedReader::from_str("abcdef");
        reader.begin();
        assert_eq!(reader.read(2), "ab");
        reader.begin();
        assert_eq!(reader.read(2), "cd");
        reader.commit();
        assert_eq!(reader.position(), 4);
        reader.restore();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read(6), "abcdef");
    }

    #[test]
    fn aborted_inner_checkpoint_keeps_the_outer_intact() {
        let mut reader = BackedReader::from_str("abcdef");
        reader.begin();
        assert_eq!(reader.read(2), "ab");
        reader.begin();
        assert_eq!(reader.read(2), "cd");
        reader.abort();
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read(2), "cd");
        reader.restore();
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn with_checkpoint_commits_on_ok_and_rewinds_on_err() {
        let mut reader = BackedReader::from_str("abcd");
        let ok: Result<String, ()> = reader.with_checkpoint(|r| Ok(r.read(2)));
        assert_eq!(ok.unwrap(), "ab");
        assert_eq!(reader.position(), 2);
        let err: Result<(), &str> = reader.with_checkpoint(|r| {
            r.read(2);
            Err("nope")
        });
        assert!(err.is_err());
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read(2), "cd");
    }

    #[test]
    fn reads_outside_checkpoints_are_committed() {
        let mut reader = BackedReader::from_str("abcd");
        assert_eq!(reader.read(2), "ab");
        reader.begin();
        assert_eq!(reader.read(1), "c");
        reader.abort();
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn peek_word_skips_whitespace_and_rewinds() {
        let mut reader = BackedReader::from_str("  foo bar");
        assert_eq!(reader.peek_word(10), "foo");
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.peek_word(2), "fo");
    }

    #[test]
    fn observed_prefix_survives_rewinds() {
        let mut reader = BackedReader::from_str("abc");
        reader.begin();
        reader.read(3);
        reader.abort();
        assert_eq!(reader.seen(), "abc");
        assert_eq!(reader.position(), 0);
    }
}
