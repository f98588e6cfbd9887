use super::*;

//
// Tokens
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Open {
        name: String,
        classes: Vec<String>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    /// Comments, doctypes and processing instructions.
    Markup,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// An element located in a document, with byte ranges into that document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// From the start of the opening tag to the end of the closing tag.
    pub outer: Range<usize>,
    /// Between the tags.
    pub inner: Range<usize>,
    /// Decoded text of all descendant text nodes.
    pub text: String,
}

fn tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(concat!(
            r"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>",
            r"|</(?P<close>[A-Za-z][A-Za-z0-9:-]*)\s*>",
            r#"|<(?P<open>[A-Za-z][A-Za-z0-9:-]*)"#,
            r#"(?P<attrs>(?:\s+[^\s/>"'=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)"#,
            r"\s*(?P<slash>/?)>",
        ))
        .expect("Invalid tag regex")
    })
}

fn class_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\sclass\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'>]+))"#)
            .expect("Invalid class regex")
    })
}

fn entity_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z]+);").expect("Invalid entity regex")
    })
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text(name: &str) -> bool {
    matches!(name, "script" | "style")
}

fn classes_of(attrs: &str) -> Vec<String> {
    class_regex()
        .captures(attrs)
        .and_then(|caps| {
            caps.name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))
        })
        .map(|m| m.as_str().split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Splits `html` into text, tags and other markup. The contents of `script`
/// and `style` elements are kept as a single text token.
#[must_use]
pub fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = vec![];
    let mut cursor = 0;
    let mut raw_text: Option<String> = None;
    for caps in tag_regex().captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let kind = if let Some(name) = caps.name("close") {
            TokenKind::Close {
                name: name.as_str().to_ascii_lowercase(),
            }
        } else if let Some(name) = caps.name("open") {
            TokenKind::Open {
                name: name.as_str().to_ascii_lowercase(),
                classes: caps.name("attrs").map_or_else(Vec::new, |a| classes_of(a.as_str())),
                self_closing: caps.name("slash").map_or(false, |s| !s.as_str().is_empty()),
            }
        } else {
            TokenKind::Markup
        };

        // Inside script and style, only the matching end tag counts.
        if let Some(raw) = raw_text.as_deref() {
            if !matches!(&kind, TokenKind::Close { name } if name == raw) {
                continue;
            }
            raw_text = None;
        }

        if cursor < whole.start() {
            tokens.push(Token {
                kind: TokenKind::Text,
                span: cursor..whole.start(),
            });
        }
        if let TokenKind::Open {
            name, self_closing, ..
        } = &kind
        {
            if !self_closing && is_raw_text(name) {
                raw_text = Some(name.clone());
            }
        }
        tokens.push(Token {
            kind,
            span: whole.range(),
        });
        cursor = whole.end();
    }
    if cursor < html.len() {
        tokens.push(Token {
            kind: TokenKind::Text,
            span: cursor..html.len(),
        });
    }
    tokens
}

fn matching_close(tokens: &[Token], open_index: usize, name: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (index, token) in tokens.iter().enumerate().skip(open_index + 1) {
        match &token.kind {
            TokenKind::Open {
                name: other,
                self_closing: false,
                ..
            } if other == name => depth += 1,
            TokenKind::Close { name: other } if other == name => {
                if depth == 0 {
                    return Some(index);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Finds every element whose `class` attribute contains `class`. Unclosed
/// elements extend to the end of the document.
#[must_use]
pub fn find_class(html: &str, class: &str) -> Vec<Element> {
    let tokens = tokenize(html);
    let mut elements = vec![];
    for (index, token) in tokens.iter().enumerate() {
        let TokenKind::Open {
            name,
            classes,
            self_closing,
        } = &token.kind
        else {
            continue;
        };
        if !classes.iter().any(|c| c == class) {
            continue;
        }

        if *self_closing || is_void(name) {
            elements.push(Element {
                name: name.clone(),
                outer: token.span.clone(),
                inner: token.span.end..token.span.end,
                text: String::new(),
            });
            continue;
        }

        let (inner_end, outer_end, last) = match matching_close(&tokens, index, name) {
            Some(close) => (tokens[close].span.start, tokens[close].span.end, close),
            None => (html.len(), html.len(), tokens.len()),
        };
        let text = tokens[index + 1..last]
            .iter()
            .filter(|t| t.kind == TokenKind::Text)
            .map(|t| decode_entities(&html[t.span.clone()]))
            .collect::<String>();
        elements.push(Element {
            name: name.clone(),
            outer: token.span.start..outer_end,
            inner: token.span.end..inner_end,
            text,
        });
    }
    elements
}

/// Replaces the contents of `element` with `inner`, which is inserted as is.
#[must_use]
pub fn replace_inner(html: &str, element: &Element, inner: &str) -> String {
    let mut out = String::with_capacity(html.len() + inner.len());
    out.push_str(&html[..element.inner.start]);
    out.push_str(inner);
    out.push_str(&html[element.inner.end..]);
    out
}

//
// Text
//

#[must_use]
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Decodes numeric character references and the common named entities.
/// Unknown entities are left untouched.
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    entity_regex().replace_all(text, |caps: &regex::Captures<'_>| {
        let entity = &caps[1];
        let decoded = if let Some(hex) = entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "hellip" => Some('\u{2026}'),
                _ => None,
            }
        };
        decoded.map_or_else(|| caps[0].to_owned(), String::from)
    })
}

/// Shortens `html` to `max_words` words of visible text. When anything was cut,
/// `suffix` is placed after the last kept word, inside the innermost open
/// element, and every element still open is closed.
#[must_use]
pub fn truncate_words(html: &str, max_words: usize, suffix: &str) -> String {
    let tokens = tokenize(html);
    let mut open: Vec<&str> = vec![];
    let mut words = 0;
    let mut cut: Option<(usize, Vec<&str>)> = None;
    for token in &tokens {
        match &token.kind {
            TokenKind::Open {
                name, self_closing, ..
            } => {
                if !self_closing && !is_void(name) {
                    open.push(name.as_str());
                }
            }
            TokenKind::Close { name } => {
                if let Some(position) = open.iter().rposition(|n| *n == name.as_str()) {
                    open.truncate(position);
                }
            }
            TokenKind::Text => {
                if open.last().map_or(false, |n| is_raw_text(n)) {
                    continue;
                }
                let text = &html[token.span.clone()];
                for word_end in word_ends(text) {
                    if let Some((position, kept_open)) = &cut {
                        // There is at least one word past the cut.
                        return close_truncated(html, *position, suffix, kept_open);
                    }
                    words += 1;
                    if words == max_words {
                        cut = Some((token.span.start + word_end, open.clone()));
                    }
                }
            }
            TokenKind::Markup => {}
        }
    }
    if max_words == 0 && words > 0 {
        return close_truncated(html, 0, suffix, &[]);
    }
    html.to_owned()
}

fn word_ends(text: &str) -> Vec<usize> {
    let mut ends = vec![];
    let mut in_word = false;
    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                ends.push(index);
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    if in_word {
        ends.push(text.len());
    }
    ends
}

fn close_truncated(html: &str, position: usize, suffix: &str, open: &[&str]) -> String {
    let mut out = html[..position].to_owned();
    if !suffix.is_empty() {
        out.push(' ');
        out.push_str(suffix);
    }
    for name in open.iter().rev() {
        out.push_str(&format!("</{name}>"));
    }
    out
}

//
// Tests
//
