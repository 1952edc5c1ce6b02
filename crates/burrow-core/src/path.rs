// Textual paths for callers that take paths as strings (CLI, logs).
// Two forms:
// - JSON Pointer (`/friends/1/name`, `~1` and `~0` escapes)
// - dotted (`friends.1.name`, `\.` for a literal dot)
// Tokens that look like integers become `Key::Int`.
use crate::value::Key;

pub fn parse_path(text: &str) -> Vec<Key> {
    if text.is_empty() {
        return Vec::new();
    }
    if let Some(rest) = text.strip_prefix('/') {
        return rest.split('/').map(|tok| token_to_key(unescape_token(tok))).collect();
    }
    split_dotted(text).into_iter().map(token_to_key).collect()
}

pub fn format_path(path: &[Key]) -> String {
    let mut out = String::new();
    for (i, key) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match key {
            Key::Int(n) => out.push_str(&n.to_string()),
            Key::Str(s) => out.push_str(&s.replace('.', "\\.")),
        }
    }
    out
}

fn unescape_token(tok: &str) -> String {
    let s = tok.replace("~1", "/");
    s.replace("~0", "~")
}

fn split_dotted(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('.') => cur.push('.'),
                Some(other) => {
                    cur.push('\\');
                    cur.push(other);
                }
                None => cur.push('\\'),
            },
            '.' => out.push(std::mem::take(&mut cur)),
            c => cur.push(c),
        }
    }
    out.push(cur);
    out
}

fn token_to_key(tok: String) -> Key {
    let digits = tok.strip_prefix('-').unwrap_or(&tok);
    if !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = tok.parse::<i64>()
    {
        return Key::Int(n);
    }
    Key::Str(tok)
}
