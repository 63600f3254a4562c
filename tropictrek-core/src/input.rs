use tui_input::{Input, InputRequest};

use crate::error::InputError;

/// Message box with a hard character limit. Edits that would push the text
/// past the limit are refused and leave the box untouched.
#[derive(Clone, Debug)]
pub struct InputBox {
    input: Input,
    max_chars: usize,
}

impl InputBox {
    pub fn new(max_chars: usize) -> Self {
        Self {
            input: Input::default(),
            max_chars,
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn char_count(&self) -> usize {
        self.input.value().chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.input.value().trim().is_empty()
    }

    /// Apply an editing request. Returns whether the box changed.
    pub fn handle(&mut self, request: InputRequest) -> Result<bool, InputError> {
        let mut next = self.input.clone();
        let changed = next.handle(request).is_some();
        if next.value().chars().count() > self.max_chars {
            return Err(InputError::TooLong {
                max: self.max_chars,
            });
        }
        self.input = next;
        Ok(changed)
    }

    pub fn set_value(&mut self, text: &str) -> Result<(), InputError> {
        if text.chars().count() > self.max_chars {
            return Err(InputError::TooLong {
                max: self.max_chars,
            });
        }
        self.input = Input::from(text.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }
}
