// ============================================================
// Layer 4 - Sentence Preprocessor
// ============================================================
// Cleans a raw sentence before tokenisation.
//
// Crowd-sourced NLI sentences often contain:
//   - Tabs and stray newlines inside a single sentence
//   - Non-breaking / zero-width spaces from copy-pasting
//   - Runs of spaces
//   - Leading/trailing whitespace
//
// Cleaning steps (applied in order):
//   1. Replace Unicode whitespace variants and control chars with a space
//   2. Collapse runs of spaces into one
//   3. Trim both ends
//
// Lower-casing is left to the tokenizer's normaliser.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one sentence. Always returns a single line.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // drops leading spaces

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space can remain
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
