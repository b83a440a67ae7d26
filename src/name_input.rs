use crate::leaderboard::MAX_NAME_LEN;

/// Name typed on the high score screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameInput {
    buf: String,
}

impl NameInput {
    /// Accepts printable ASCII while there is room; returns whether it was taken.
    pub fn push(&mut self, c: char) -> bool {
        if !(c.is_ascii_graphic() || c == ' ') || self.len() >= MAX_NAME_LEN {
            return false;
        }
        self.buf.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.buf.pop();
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}
