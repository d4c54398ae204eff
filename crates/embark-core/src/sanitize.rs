//! Allow-list sanitizers for values embedded in the emba command line.
//!
//! Every quoted flag value passes through one of these before it is placed
//! between double quotes. Characters outside the allow-list are dropped,
//! never escaped, so a value can not terminate its quotes.

/// Character classes accepted inside quoted flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanitizer {
    /// `[A-Za-z0-9._+-]`, used for the firmware version.
    Version,
    /// `[A-Za-z0-9_-]`, used for device and vendor name lists.
    NameList,
    /// `[A-Za-z0-9._ -]`, used for free-form notes.
    Notes,
}

impl Sanitizer {
    /// Returns true if `c` survives sanitization.
    pub fn allows(self, c: char) -> bool {
        if c.is_ascii_alphanumeric() {
            return true;
        }
        match self {
            Sanitizer::Version => matches!(c, '.' | '_' | '+' | '-'),
            Sanitizer::NameList => matches!(c, '_' | '-'),
            Sanitizer::Notes => matches!(c, '.' | '_' | ' ' | '-'),
        }
    }

    /// Drops every character outside the allow-list.
    pub fn apply(self, input: &str) -> String {
        input.chars().filter(|c| self.allows(*c)).collect()
    }
}

/// Renders a list of names the way a Python list of strings prints.
///
/// The name-list flags sanitize this representation rather than the bare
/// names, so the letters of escape sequences (`\n`, `\x07`) are kept while
/// brackets, quotes and separators are dropped.
pub fn list_repr<S: AsRef<str>>(items: &[S]) -> String {
    let parts: Vec<String> = items.iter().map(|s| str_repr(s.as_ref())).collect();
    format!("[{}]", parts.join(", "))
}

fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code <= 0xffff {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Printable in the Python sense: every character except the space is
/// rejected when it is a control, format, private-use, unassigned or
/// separator code point.
fn is_printable(c: char) -> bool {
    use unicode_general_category::{get_general_category, GeneralCategory::*};

    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        Control
            | Format
            | Surrogate
            | PrivateUse
            | Unassigned
            | LineSeparator
            | ParagraphSeparator
            | SpaceSeparator
    )
}
