//! SQL text normalization.
//!
//! Produces the canonical spelling every later stage works on: comments and
//! optimizer hints removed, whitespace collapsed, comparison operators and
//! commas spaced uniformly, keywords and identifiers upper-cased. String
//! literals are copied verbatim.

/// Normalize a SQL statement.
///
/// The function is idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut pending_space = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                flush_space(&mut out, &mut pending_space);
                out.push(ch);
                for next in chars.by_ref() {
                    out.push(next);
                    if next == '\'' {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                pending_space = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                pending_space = true;
            }
            ',' => {
                // Whitespace before a comma is dropped.
                out.push(',');
                pending_space = true;
            }
            '<' | '>' | '=' | '!' => {
                let mut op = String::from(ch);
                if let Some(&next) = chars.peek() {
                    let pairs = matches!((ch, next), ('<', '>') | ('<', '=') | ('>', '=') | ('!', '='));
                    if pairs {
                        op.push(next);
                        chars.next();
                    }
                }
                if op == "!" {
                    flush_space(&mut out, &mut pending_space);
                    out.push('!');
                    continue;
                }
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(&op);
                pending_space = true;
            }
            c if c.is_whitespace() => pending_space = true,
            c => {
                flush_space(&mut out, &mut pending_space);
                out.extend(c.to_uppercase());
            }
        }
    }

    trim_terminators(&out).to_string()
}

/// Strip surrounding whitespace and any run of trailing `;`, including
/// semicolons separated by whitespace.
fn trim_terminators(sql: &str) -> &str {
    let mut rest = sql.trim();
    while let Some(stripped) = rest.strip_suffix(';') {
        rest = stripped.trim_end();
    }
    rest
}

fn flush_space(out: &mut String, pending_space: &mut bool) {
    if *pending_space && !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
    *pending_space = false;
}
