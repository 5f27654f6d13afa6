//! Whitespace-aware tokenization.
//!
//! A token is a maximal run of whitespace or a maximal run of
//! non-whitespace characters. Splitting this way keeps the whitespace in
//! the token stream, so joining the tokens always reproduces the input.
//!
//! "Whitespace" is the ECMAScript `\s` class, not Unicode `White_Space`:
//! U+FEFF counts, U+0085 does not. Token boundaries must agree with the
//! diffs the dashboard already renders.

/// Split `input` into alternating whitespace and non-whitespace runs.
///
/// Empty input yields no tokens. Tokens borrow from `input`.
pub fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0usize;
    let mut in_whitespace: Option<bool> = None;

    for (idx, ch) in input.char_indices() {
        let is_ws = is_js_whitespace(ch);
        match in_whitespace {
            Some(run) if run == is_ws => {}
            Some(_) => {
                tokens.push(&input[start..idx]);
                start = idx;
                in_whitespace = Some(is_ws);
            }
            None => in_whitespace = Some(is_ws),
        }
    }

    if start < input.len() {
        tokens.push(&input[start..]);
    }
    tokens
}

/// Membership in the ECMAScript `\s` class (WhiteSpace plus LineTerminator).
pub fn is_js_whitespace(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n'
            | '\u{0B}'
            | '\u{0C}'
            | '\r'
            | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
