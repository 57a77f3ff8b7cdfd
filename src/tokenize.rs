//! Lexical analysis of one input line.
//!
//! The tokenizer walks characters with an explicit quoting mode and
//! produces decoded tokens: quotes and escapes are consumed here, so the
//! rest of the shell only ever sees plain strings.  Redirection operators
//! survive as ordinary tokens for the redirection splitter to pick out.
//!
//! Splitting into pipeline stages also happens here, on the token stream:
//! only an unquoted, unescaped `|` separates stages, so `echo "a|b"` stays
//! a single command.

#[derive(Copy, Clone, Eq, PartialEq)]
enum Mode {
    Normal,
    Single,
    Double,
}

/// Characters that keep their backslash inside double quotes removed;
/// everything else keeps both the backslash and the character.
const DOUBLE_QUOTE_ESCAPES: [char; 4] = ['"', '\\', '$', '`'];

/// Split a line into pipeline stages of decoded tokens.
///
/// Stages that contain no tokens at all (as in `a ||| b` or a trailing
/// `|`) are dropped.
pub fn tokenize_pipeline(line: &str) -> Vec<Vec<String>> {
    let mut stages = scan(line, true);
    stages.retain(|stage| !stage.is_empty());
    stages
}

/// Tokenize a line without treating `|` specially.
pub fn tokenize(line: &str) -> Vec<String> {
    scan(line, false).pop().unwrap_or_default()
}

fn scan(line: &str, split_pipes: bool) -> Vec<Vec<String>> {
    let mut stages: Vec<Vec<String>> = vec![Vec::new()];
    let mut current = String::new();
    let mut mode = Mode::Normal;
    let mut chars = line.chars();

    // Finalizes the in-progress token.  An empty buffer means no token is
    // in progress: `''` between separators contributes nothing, exactly
    // like consecutive whitespace.
    fn flush(stages: &mut [Vec<String>], current: &mut String) {
        if !current.is_empty() {
            stages.last_mut().unwrap().push(std::mem::take(current));
        }
    }

    while let Some(c) = chars.next() {
        match mode {
            Mode::Single => {
                if c == '\'' {
                    mode = Mode::Normal;
                } else {
                    current.push(c);
                }
            }
            Mode::Double => match c {
                '"' => mode = Mode::Normal,
                '\\' => {
                    // A backslash at end of line is dropped.
                    if let Some(next) = chars.next() {
                        if !DOUBLE_QUOTE_ESCAPES.contains(&next) {
                            current.push('\\');
                        }
                        current.push(next);
                    }
                }
                _ => current.push(c),
            },
            Mode::Normal => match c {
                '\'' => mode = Mode::Single,
                '"' => mode = Mode::Double,
                '\\' => {
                    // The next character is taken literally; a trailing
                    // backslash is dropped.
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                '|' if split_pipes => {
                    flush(&mut stages, &mut current);
                    stages.push(Vec::new());
                }
                c if c.is_whitespace() => flush(&mut stages, &mut current),
                _ => current.push(c),
            },
        }
    }
    // An unterminated quote still yields the partial token.
    flush(&mut stages, &mut current);
    stages
}
