//! Flat JSON object scanner.
//!
//! Configuration request bodies are small flat JSON objects — one level,
//! string/integer/boolean values, no arrays, no nesting. Rather than pull a
//! full document tree into memory, the scanner walks the input once through
//! an explicit state machine and hands back the key/value pairs in document
//! order. Any unexpected character fails the scan with a typed error and
//! the whole payload is rejected; there is no partial result.
//!
//! Pattern matching here is deliberately dependency-free so the same code
//! can run on embedded targets.

use thiserror::Error;

/// A scalar value produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Bool(bool),
}

/// Scanner state. Exactly one mode is active per input character; escape
/// handling inside the two string states is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitKey,
    InKey,
    AwaitColon,
    AwaitValue,
    InStringValue,
    InNumberValue,
    InBooleanValue,
    AwaitComma,
    Done,
}

/// Errors produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The input does not start with `{`.
    #[error("input is not a JSON object")]
    NotAnObject,

    #[error("unexpected character {found:?} at byte {at}")]
    UnexpectedCharacter { at: usize, found: char },

    /// The input ended inside a key, value or escape sequence.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("invalid escape sequence at byte {at}")]
    InvalidEscape { at: usize },

    /// A bare literal that is neither `true`, `false` nor a decimal integer.
    #[error("invalid literal at byte {at}")]
    InvalidLiteral { at: usize },

    #[error("number at byte {at} does not fit in 64 bits")]
    NumberOutOfRange { at: usize },

    #[error("trailing data at byte {at}")]
    TrailingData { at: usize },
}

/// Escape progress inside a string. `Pending` means a backslash was just
/// consumed; `Unicode` collects the four hex digits of a `\uXXXX` sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Escape {
    None,
    Pending,
    Unicode { at: usize, digits: String },
}

/// Scan a flat JSON object into key/value pairs in document order.
///
/// Duplicate keys are all returned; callers applying pairs in order get
/// last-occurrence-wins semantics. `null`, floats, exponents, arrays and
/// nested objects are rejected — the configuration documents never carry
/// them, and anything shaped differently is a malformed payload.
pub fn scan_object(input: &str) -> Result<Vec<(String, Scalar)>, ScanError> {
    let mut iter = input.char_indices();

    // Leading whitespace, then the opening brace.
    loop {
        match iter.next() {
            Some((_, c)) if c.is_ascii_whitespace() => continue,
            Some((_, '{')) => break,
            Some(_) | None => return Err(ScanError::NotAnObject),
        }
    }

    let mut state = State::AwaitKey;
    let mut pairs: Vec<(String, Scalar)> = Vec::new();

    let mut key = String::new();
    let mut text = String::new(); // current string content (key or value)
    let mut lit = String::new(); // current number/boolean literal
    let mut lit_at = 0usize;
    let mut escape = Escape::None;
    let mut had_pair = false;

    for (at, c) in iter {
        match state {
            State::AwaitKey => {
                if c.is_ascii_whitespace() {
                    continue;
                }
                match c {
                    '"' => {
                        text.clear();
                        state = State::InKey;
                    }
                    // `}` is only the end of an *empty* object here; after a
                    // comma it would be a trailing comma.
                    '}' if !had_pair => state = State::Done,
                    _ => return Err(ScanError::UnexpectedCharacter { at, found: c }),
                }
            }

            State::InKey => {
                if string_char(c, at, &mut text, &mut escape)? {
                    key = std::mem::take(&mut text);
                    state = State::AwaitColon;
                }
            }

            State::AwaitColon => {
                if c.is_ascii_whitespace() {
                    continue;
                }
                if c == ':' {
                    state = State::AwaitValue;
                } else {
                    return Err(ScanError::UnexpectedCharacter { at, found: c });
                }
            }

            State::AwaitValue => {
                if c.is_ascii_whitespace() {
                    continue;
                }
                match c {
                    '"' => {
                        text.clear();
                        state = State::InStringValue;
                    }
                    '-' | '0'..='9' => {
                        lit.clear();
                        lit.push(c);
                        lit_at = at;
                        state = State::InNumberValue;
                    }
                    't' | 'f' => {
                        lit.clear();
                        lit.push(c);
                        lit_at = at;
                        state = State::InBooleanValue;
                    }
                    // Covers `{`, `[` and `n` (null): the accepted shape is
                    // flat and fully typed, so these reject the payload.
                    _ => return Err(ScanError::UnexpectedCharacter { at, found: c }),
                }
            }

            State::InStringValue => {
                if string_char(c, at, &mut text, &mut escape)? {
                    pairs.push((std::mem::take(&mut key), Scalar::Str(std::mem::take(&mut text))));
                    had_pair = true;
                    state = State::AwaitComma;
                }
            }

            State::InNumberValue => match c {
                '0'..='9' => lit.push(c),
                ',' => {
                    pairs.push((std::mem::take(&mut key), finish_number(&lit, lit_at)?));
                    had_pair = true;
                    state = State::AwaitKey;
                }
                '}' => {
                    pairs.push((std::mem::take(&mut key), finish_number(&lit, lit_at)?));
                    had_pair = true;
                    state = State::Done;
                }
                _ if c.is_ascii_whitespace() => {
                    pairs.push((std::mem::take(&mut key), finish_number(&lit, lit_at)?));
                    had_pair = true;
                    state = State::AwaitComma;
                }
                // Decimal integers only: `.`, `e`, a second `-` all reject.
                _ => return Err(ScanError::UnexpectedCharacter { at, found: c }),
            },

            State::InBooleanValue => match c {
                'a'..='z' => {
                    lit.push(c);
                    if lit.len() > 5 {
                        return Err(ScanError::InvalidLiteral { at: lit_at });
                    }
                }
                ',' => {
                    pairs.push((std::mem::take(&mut key), finish_boolean(&lit, lit_at)?));
                    had_pair = true;
                    state = State::AwaitKey;
                }
                '}' => {
                    pairs.push((std::mem::take(&mut key), finish_boolean(&lit, lit_at)?));
                    had_pair = true;
                    state = State::Done;
                }
                _ if c.is_ascii_whitespace() => {
                    pairs.push((std::mem::take(&mut key), finish_boolean(&lit, lit_at)?));
                    had_pair = true;
                    state = State::AwaitComma;
                }
                _ => return Err(ScanError::UnexpectedCharacter { at, found: c }),
            },

            State::AwaitComma => {
                if c.is_ascii_whitespace() {
                    continue;
                }
                match c {
                    ',' => state = State::AwaitKey,
                    '}' => state = State::Done,
                    _ => return Err(ScanError::UnexpectedCharacter { at, found: c }),
                }
            }

            State::Done => {
                if c.is_ascii_whitespace() {
                    continue;
                }
                return Err(ScanError::TrailingData { at });
            }
        }
    }

    if state != State::Done {
        return Err(ScanError::UnexpectedEnd);
    }
    Ok(pairs)
}

/// Feed one character of a JSON string (key or value). Returns `true` when
/// the closing quote was consumed.
fn string_char(
    c: char,
    at: usize,
    buf: &mut String,
    escape: &mut Escape,
) -> Result<bool, ScanError> {
    match escape {
        Escape::Unicode { at: start, digits } => {
            if !c.is_ascii_hexdigit() {
                return Err(ScanError::InvalidEscape { at: *start });
            }
            digits.push(c);
            if digits.len() == 4 {
                let code = u32::from_str_radix(digits, 16).map_err(|_| ScanError::InvalidEscape { at: *start })?;
                // Surrogate halves are not valid scalar values; pairs are
                // not supported by this scanner.
                let decoded =
                    char::from_u32(code).ok_or(ScanError::InvalidEscape { at: *start })?;
                buf.push(decoded);
                *escape = Escape::None;
            }
            Ok(false)
        }

        Escape::Pending => {
            match c {
                '"' => buf.push('"'),
                '\\' => buf.push('\\'),
                '/' => buf.push('/'),
                'b' => buf.push('\u{0008}'),
                'f' => buf.push('\u{000C}'),
                'n' => buf.push('\n'),
                'r' => buf.push('\r'),
                't' => buf.push('\t'),
                'u' => {
                    *escape = Escape::Unicode {
                        at,
                        digits: String::new(),
                    };
                    return Ok(false);
                }
                _ => return Err(ScanError::InvalidEscape { at }),
            }
            *escape = Escape::None;
            Ok(false)
        }

        Escape::None => match c {
            '\\' => {
                *escape = Escape::Pending;
                Ok(false)
            }
            '"' => Ok(true),
            // Raw control characters are not allowed inside JSON strings.
            _ if (c as u32) < 0x20 => Err(ScanError::UnexpectedCharacter { at, found: c }),
            _ => {
                buf.push(c);
                Ok(false)
            }
        },
    }
}

fn finish_number(lit: &str, at: usize) -> Result<Scalar, ScanError> {
    if lit == "-" {
        return Err(ScanError::InvalidLiteral { at });
    }
    lit.parse::<i64>()
        .map(Scalar::Int)
        .map_err(|_| ScanError::NumberOutOfRange { at })
}

fn finish_boolean(lit: &str, at: usize) -> Result<Scalar, ScanError> {
    match lit {
        "true" => Ok(Scalar::Bool(true)),
        "false" => Ok(Scalar::Bool(false)),
        _ => Err(ScanError::InvalidLiteral { at }),
    }
}
