// SPDX-License-Identifier: MIT

///! [`LineMap`] interns the lines of one or more texts and represents each
///! distinct line as a single token, so that a line-oriented diff can run on
///! short token sequences instead of the full character data. The table lives
///! for a single diff invocation and is discarded afterwards.

use std::collections::HashMap;

/// Bidirectional mapping between lines and tokens. Lines keep their trailing
/// newline, so decoding a token sequence reproduces the original text exactly,
/// including a final line without a newline.
#[derive(Debug, Default)]
pub struct LineMap<'a> {
    lines: Vec<&'a str>,
    index: HashMap<&'a str, u32>,
}

impl<'a> LineMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `text` into lines and return one token per line. The table is
    /// shared across calls, so identical lines of different texts map to the
    /// same token.
    pub fn encode(&mut self, text: &'a str) -> Vec<u32> {
        let mut tokens = Vec::new();
        let mut start = 0;
        while start < text.len() {
            let end = match text[start..].find('\n') {
                Some(pos) => start + pos + 1,
                None => text.len(),
            };
            let line = &text[start..end];
            let token = match self.index.get(line) {
                Some(&token) => token,
                None => {
                    self.lines.push(line);
                    let token = (self.lines.len() - 1) as u32;
                    self.index.insert(line, token);
                    token
                }
            };
            tokens.push(token);
            start = end;
        }
        tokens
    }

    /// Expand a token sequence produced by [`encode`](Self::encode) back into
    /// text.
    pub fn decode(&self, tokens: &[u32]) -> String {
        tokens.iter().map(|&token| self.lines[token as usize]).collect()
    }
}
