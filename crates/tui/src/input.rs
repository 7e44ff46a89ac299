//! Single-line text input used while editing a form field.

use games_editor_core::Field;

pub const MAX_INPUT_CHARS: usize = 2048;

#[derive(Debug, Clone)]
pub struct FieldInput {
    pub field: Field,
    input: String,
    /// Cursor position in characters, not bytes.
    cursor: usize,
}

impl FieldInput {
    pub fn new(field: Field, initial: &str) -> Self {
        Self {
            field,
            input: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn is_full(&self) -> bool {
        self.len() >= MAX_INPUT_CHARS
    }

    pub fn insert(&mut self, ch: char) {
        if ch.is_control() || self.is_full() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_offset(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.input.len())
    }
}
