use std::borrow::Cow;

/// Outcome of asking the cursor for the next word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextResult {
    /// The list has no words at all.
    Empty,
    /// `word` sat at `position` before the cursor moved past it.
    Word { word: String, position: usize },
    /// Every word has already been served in this pass.
    Exhausted,
}

/// Walks a word list one entry per call, writing its position back into
/// the owning session.
#[derive(Debug)]
pub struct WordCursor<'a> {
    words: &'a [String],
    index: &'a mut usize,
}

impl<'a> WordCursor<'a> {
    pub fn new(words: &'a [String], index: &'a mut usize) -> Self {
        Self { words, index }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> NextResult {
        if self.words.is_empty() {
            return NextResult::Empty;
        }
        match self.words.get(*self.index) {
            Some(word) => {
                let position = *self.index;
                *self.index += 1;
                NextResult::Word {
                    word: word.clone(),
                    position,
                }
            }
            None => NextResult::Exhausted,
        }
    }

    /// Starts a new pass.
    pub fn rewind(&mut self) {
        *self.index = 0;
    }

    /// The word served by the most recent `next`, if any.
    pub fn last_served(&self) -> Option<&'a str> {
        let index = self.index.checked_sub(1)?;
        self.words.get(index).map(String::as_str)
    }
}

/// Spoken ordinal for the word at `position` in a list of `total` words.
///
/// The final word is always "last"; past the twentieth word the label
/// degrades to "next".
pub fn ordinal_label(position: usize, total: usize) -> Cow<'static, str> {
    if position + 1 == total {
        return Cow::Borrowed("last");
    }
    match position + 1 {
        1 => Cow::Borrowed("1st"),
        2 => Cow::Borrowed("2nd"),
        3 => Cow::Borrowed("3rd"),
        n if n > 20 => Cow::Borrowed("next"),
        n => Cow::Owned(format!("{n}th")),
    }
}
