//! Span-scoped edit operations over one compilation unit's text.
//!
//! The rewriter accumulates replacements and insertions against the
//! original byte offsets and materializes the result once at the end.
//! Unedited bytes, comments and whitespace included, come through verbatim
//! and in order.
//!
//! Overlap policy: replacements of the *identical* range overwrite each
//! other, last writer wins. Any other overlap is a fault in the caller and
//! surfaces as an error from `render`.


use std::ops::Range;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RewriteError {
    #[error("overlapping edits: [{0}, {1}) and [{2}, {3})")]
    Overlap(usize, usize, usize, usize),
    #[error("insertion at {0} lands inside replaced range [{1}, {2})")]
    InsertInReplace(usize, usize, usize),
}

#[derive(Debug, Clone)]
struct Replace {
    range: Range<usize>,
    text: String,
    seq: usize,
}

#[derive(Debug, Clone)]
struct Insert {
    pos: usize,
    text: String,
    seq: usize,
}

/// Edit accumulator for one unit.
#[derive(Debug)]
pub struct Rewriter<'s> {
    source: &'s str,
    replaces: Vec<Replace>,
    inserts: Vec<Insert>,
    seq: usize,
}

impl<'s> Rewriter<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            replaces: Vec::new(),
            inserts: Vec::new(),
            seq: 0,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    fn next_seq(&mut self) -> usize {
        self.seq += 1;
        self.seq
    }

    /// Substitute the byte range `[start, end)`.
    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        let seq = self.next_seq();
        self.replaces.push(Replace {
            range: start..end,
            text: text.into(),
            seq,
        });
    }

    /// Replace with nothing.
    pub fn delete(&mut self, start: usize, end: usize) {
        self.replace(start, end, "");
    }

    /// Insert text at a byte offset. Insertions at one offset render in
    /// the order they were issued.
    pub fn insert(&mut self, pos: usize, text: impl Into<String>) {
        let seq = self.next_seq();
        self.inserts.push(Insert {
            pos,
            text: text.into(),
            seq,
        });
    }

    /// Materialize the rewritten text.
    pub fn render(&self) -> Result<String, RewriteError> {
        // Identical ranges collapse to the latest write.
        let mut replaces: Vec<&Replace> = Vec::new();
        for r in &self.replaces {
            match replaces.iter_mut().find(|k| k.range == r.range) {
                Some(kept) => {
                    if r.seq > kept.seq {
                        *kept = r;
                    }
                }
                None => replaces.push(r),
            }
        }
        replaces.sort_by_key(|r| (r.range.start, r.range.end, r.seq));

        for pair in replaces.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.range.start < a.range.end {
                return Err(RewriteError::Overlap(
                    a.range.start,
                    a.range.end,
                    b.range.start,
                    b.range.end,
                ));
            }
        }

        let mut inserts: Vec<&Insert> = self.inserts.iter().collect();
        inserts.sort_by_key(|i| (i.pos, i.seq));
        for i in &inserts {
            if let Some(r) = replaces
                .iter()
                .find(|r| r.range.start < i.pos && i.pos < r.range.end)
            {
                return Err(RewriteError::InsertInReplace(
                    i.pos,
                    r.range.start,
                    r.range.end,
                ));
            }
        }

        let mut out = String::with_capacity(self.source.len() + 256);
        let mut pos = 0usize;
        let mut ins = inserts.into_iter().peekable();
        for r in &replaces {
            while let Some(i) = ins.peek() {
                if i.pos > r.range.start {
                    break;
                }
                out.push_str(&self.source[pos..i.pos]);
                pos = i.pos;
                out.push_str(&i.text);
                ins.next();
            }
            out.push_str(&self.source[pos..r.range.start]);
            out.push_str(&r.text);
            pos = r.range.end;
        }
        for i in ins {
            out.push_str(&self.source[pos..i.pos]);
            pos = i.pos;
            out.push_str(&i.text);
        }
        out.push_str(&self.source[pos..]);
        Ok(out)
    }
}
