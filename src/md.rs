use super::*;

use pulldown_cmark::{html as cmark_html, CowStr, Event, Options, Parser, Tag};

// Private-use code points never occur in ordinary Markdown text.
const PLACEHOLDER_OPEN: char = '\u{e000}';
const PLACEHOLDER_CLOSE: char = '\u{e001}';

/// Markdown converter that keeps math away from Markdown processing.
///
/// Math is hidden behind placeholders while `pulldown-cmark` parses, then put
/// back into the event stream: escaped and wrapped in elements carrying
/// `math_tag_class` in text, as written everywhere markup can't go (link
/// destinations, image alt text, code, raw HTML).
#[derive(Clone, Debug)]
pub struct MathJaxExtension {
    pub mathjax_script: String,
    pub math_tag_class: String,
    pub auto_insert: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct Expression {
    /// Math source with the delimiters MathJax looks for.
    source: String,
    /// The expression as it appeared in the Markdown.
    raw: String,
    display: bool,
}

enum Scan {
    Math(usize, Expression),
    Skip(usize),
}

enum Piece<'t> {
    Text(&'t str),
    Math(&'t Expression),
}

impl MathJaxExtension {
    #[must_use]
    pub fn new(mathjax_script: &str, settings: &MathJaxSettings) -> Self {
        Self {
            mathjax_script: mathjax_script.to_owned(),
            math_tag_class: MATH_TAG_CLASS.to_owned(),
            auto_insert: settings.auto_insert,
        }
    }

    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let (protected, expressions) = protect_math(markdown);
        let events = merge_text(Parser::new_ext(&protected, Options::empty()));
        let events = self.restore_math(&events, &expressions);
        let mut html_output = String::new();
        cmark_html::push_html(&mut html_output, events.into_iter());
        if self.auto_insert && !expressions.is_empty() {
            html_output.push_str(&script_tag(&self.mathjax_script));
        }
        html_output
    }

    fn restore_math<'a>(&self, events: &[Event<'a>], expressions: &[Expression]) -> Vec<Event<'a>> {
        let mut restored = Vec::with_capacity(events.len());
        // Inside image alt text and code blocks only plain text is rendered.
        let mut verbatim = 0_usize;
        let mut index = 0;
        while index < events.len() {
            if let Some(element) = self.display_paragraph(&events[index..], expressions) {
                restored.push(Event::Html(format!("{element}\n").into()));
                index += 3;
                continue;
            }
            let event = events[index].clone();
            index += 1;
            match event {
                Event::Start(tag) => {
                    if matches!(tag, Tag::Image(..) | Tag::CodeBlock(_)) {
                        verbatim += 1;
                    }
                    restored.push(Event::Start(restore_tag(tag, expressions)));
                }
                Event::End(tag) => {
                    if matches!(tag, Tag::Image(..) | Tag::CodeBlock(_)) {
                        verbatim = verbatim.saturating_sub(1);
                    }
                    restored.push(Event::End(restore_tag(tag, expressions)));
                }
                Event::Text(text) if verbatim > 0 => {
                    restored.push(Event::Text(restore_raw(text, expressions)));
                }
                Event::Text(text) => {
                    for piece in pieces(&text, expressions) {
                        restored.push(match piece {
                            Piece::Text(text) => Event::Text(text.to_owned().into()),
                            Piece::Math(expression) => Event::Html(self.element(expression).into()),
                        });
                    }
                }
                Event::Code(text) => restored.push(Event::Code(restore_raw(text, expressions))),
                Event::Html(text) => restored.push(Event::Html(restore_raw(text, expressions))),
                event => restored.push(event),
            }
        }
        restored
    }

    /// A paragraph holding nothing but display math becomes the math block.
    fn display_paragraph(&self, events: &[Event<'_>], expressions: &[Expression]) -> Option<String> {
        let [Event::Start(Tag::Paragraph), Event::Text(text), Event::End(Tag::Paragraph), ..] = events
        else {
            return None;
        };
        let expression = placeholder_index(text)
            .and_then(|index| expressions.get(index))
            .filter(|expression| expression.display)?;
        Some(self.element(expression))
    }

    fn element(&self, expression: &Expression) -> String {
        let class = &self.math_tag_class;
        let source = html::escape_text(&expression.source);
        if expression.display {
            format!("<div class=\"{class}\">{source}</div>")
        } else {
            format!("<span class=\"{class}\">{source}</span>")
        }
    }
}

/// Plain Markdown conversion, without any math handling.
#[must_use]
pub fn to_html(markdown: &str) -> String {
    let mut html_output = String::new();
    cmark_html::push_html(&mut html_output, Parser::new_ext(markdown, Options::empty()));
    html_output
}

//
// Placeholders
//

fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_OPEN}{index}{PLACEHOLDER_CLOSE}")
}

fn placeholder_index(text: &str) -> Option<usize> {
    text.strip_prefix(PLACEHOLDER_OPEN)?
        .strip_suffix(PLACEHOLDER_CLOSE)?
        .parse()
        .ok()
}

/// The parser splits text around characters that could start inline markup.
fn merge_text<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut merged: Vec<Event<'a>> = vec![];
    for event in events {
        if let (Event::Text(text), Some(Event::Text(previous))) = (&event, merged.last_mut()) {
            *previous = format!("{previous}{text}").into();
            continue;
        }
        merged.push(event);
    }
    merged
}

/// Splits `text` into plain runs and the expressions behind placeholders.
fn pieces<'t>(text: &'t str, expressions: &'t [Expression]) -> Vec<Piece<'t>> {
    let mut pieces = vec![];
    let mut rest = text;
    while let Some(open) = rest.find(PLACEHOLDER_OPEN) {
        let after = open + PLACEHOLDER_OPEN.len_utf8();
        let expression = rest[after..].find(PLACEHOLDER_CLOSE).and_then(|close| {
            let expression = rest[after..after + close].parse::<usize>().ok()?;
            Some((expressions.get(expression)?, after + close + PLACEHOLDER_CLOSE.len_utf8()))
        });
        let Some((expression, end)) = expression else {
            pieces.push(Piece::Text(&rest[..after]));
            rest = &rest[after..];
            continue;
        };
        if open > 0 {
            pieces.push(Piece::Text(&rest[..open]));
        }
        pieces.push(Piece::Math(expression));
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    pieces
}

/// Puts expressions back exactly as they were written.
fn restore_raw<'a>(text: CowStr<'a>, expressions: &[Expression]) -> CowStr<'a> {
    if !text.contains(PLACEHOLDER_OPEN) {
        return text;
    }
    pieces(&text, expressions)
        .into_iter()
        .map(|piece| match piece {
            Piece::Text(text) => text,
            Piece::Math(expression) => expression.raw.as_str(),
        })
        .collect::<String>()
        .into()
}

fn restore_tag<'a>(tag: Tag<'a>, expressions: &[Expression]) -> Tag<'a> {
    match tag {
        Tag::Link(link_type, url, title) => Tag::Link(
            link_type,
            restore_raw(url, expressions),
            restore_raw(title, expressions),
        ),
        Tag::Image(link_type, url, title) => Tag::Image(
            link_type,
            restore_raw(url, expressions),
            restore_raw(title, expressions),
        ),
        tag => tag,
    }
}

//
// Scanning
//

fn protect_math(markdown: &str) -> (String, Vec<Expression>) {
    let code = code_blocks(markdown);
    let mut protected = String::with_capacity(markdown.len());
    let mut expressions = vec![];
    let mut cursor = 0;
    let mut index = 0;
    while index < markdown.len() {
        if let Some(block) = code.iter().find(|block| block.contains(&index)) {
            index = block.end;
            continue;
        }
        match scan(&markdown[index..]) {
            Scan::Math(len, mut expression) => {
                protected.push_str(&markdown[cursor..index]);
                protected.push_str(&placeholder(expressions.len()));
                expression.raw = markdown[index..index + len].to_owned();
                expressions.push(expression);
                index += len;
                cursor = index;
            }
            Scan::Skip(len) => index += len,
        }
    }
    protected.push_str(&markdown[cursor..]);
    (protected, expressions)
}

fn scan(rest: &str) -> Scan {
    let Some(first) = rest.chars().next() else {
        return Scan::Skip(1);
    };
    let skip_char = Scan::Skip(first.len_utf8());
    match first {
        '`' => Scan::Skip(code_span_len(rest)),
        '\\' => scan_backslash(rest),
        '$' => scan_dollar(rest).unwrap_or(skip_char),
        _ => skip_char,
    }
}

fn delimited(rest: &str, open: &str, close: &str, display: bool) -> Option<Scan> {
    let end = rest[open.len()..].find(close)? + open.len() + close.len();
    Some(Scan::Math(
        end,
        Expression {
            source: rest[..end].to_owned(),
            raw: String::new(),
            display,
        },
    ))
}

fn scan_backslash(rest: &str) -> Scan {
    let math = if rest.starts_with(r"\(") {
        delimited(rest, r"\(", r"\)", false)
    } else if rest.starts_with(r"\[") {
        delimited(rest, r"\[", r"\]", true)
    } else if let Some(env) = rest.strip_prefix(r"\begin{") {
        env.find('}')
            .map(|end| &env[..end])
            .filter(|name| !name.is_empty() && !name.contains(char::is_whitespace))
            .and_then(|name| {
                delimited(
                    rest,
                    &format!(r"\begin{{{name}}}"),
                    &format!(r"\end{{{name}}}"),
                    true,
                )
            })
    } else {
        None
    };
    // An escaped character, including `\$`, is left for Markdown to unescape.
    math.unwrap_or_else(|| {
        let escaped = rest[1..].chars().next().map_or(0, char::len_utf8);
        Scan::Skip(1 + escaped)
    })
}

fn scan_dollar(rest: &str) -> Option<Scan> {
    if rest.starts_with("$$") {
        let end = rest[2..].find("$$")? + 4;
        if rest[2..end - 2].trim().is_empty() {
            return None;
        }
        return Some(Scan::Math(
            end,
            Expression {
                source: rest[..end].to_owned(),
                raw: String::new(),
                display: true,
            },
        ));
    }

    let body = &rest[1..];
    let mut chars = body.char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\n' if body[offset + 1..].trim_start_matches(&[' ', '\t'][..]).starts_with('\n') => {
                return None;
            }
            '$' => {
                let content = &body[..offset];
                let trimmed = content.trim();
                if content.is_empty() || trimmed.len() != content.len() {
                    return None;
                }
                return Some(Scan::Math(
                    offset + 2,
                    Expression {
                        source: format!(r"\({content}\)"),
                        raw: String::new(),
                        display: false,
                    },
                ));
            }
            _ => {}
        }
    }
    None
}

/// Length of the code span starting at `rest`, or of the backtick run alone
/// when it is never closed.
fn code_span_len(rest: &str) -> usize {
    let run = rest.len() - rest.trim_start_matches('`').len();
    let mut search = run;
    while let Some(found) = rest[search..].find('`') {
        let start = search + found;
        let len = rest[start..].len() - rest[start..].trim_start_matches('`').len();
        if len == run {
            return start + len;
        }
        search = start + len;
    }
    run
}

/// Byte ranges of fenced and indented code blocks.
fn code_blocks(markdown: &str) -> Vec<Range<usize>> {
    fn fence_run(line: &str) -> Option<&str> {
        let marker = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let run = &line[..line.len() - line.trim_start_matches(marker).len()];
        (run.len() >= 3).then_some(run)
    }

    let mut blocks = vec![];
    let mut fence: Option<(usize, String)> = None;
    let mut indented: Option<usize> = None;
    let mut previous_blank = true;
    let mut offset = 0;
    for line in markdown.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        let blank = line.trim().is_empty();

        if let Some((fence_start, open_run)) = &fence {
            let closes = indent < 4
                && fence_run(trimmed).map_or(false, |run| {
                    run.starts_with(open_run.as_str())
                        && trimmed[run.len()..].trim().is_empty()
                });
            if closes {
                blocks.push(*fence_start..offset);
                fence = None;
            }
            previous_blank = blank;
            continue;
        }

        if let Some(indented_start) = indented {
            if blank || line.starts_with("    ") || line.starts_with('\t') {
                previous_blank = blank;
                continue;
            }
            blocks.push(indented_start..start);
            indented = None;
        }

        if indent < 4 {
            if let Some(run) = fence_run(trimmed) {
                fence = Some((start, run.to_owned()));
                previous_blank = false;
                continue;
            }
        }
        if previous_blank && !blank && (indent >= 4 || line.starts_with('\t')) {
            indented = Some(start);
        }
        previous_blank = blank;
    }
    if let Some((fence_start, _)) = fence {
        blocks.push(fence_start..markdown.len());
    }
    if let Some(indented_start) = indented {
        blocks.push(indented_start..markdown.len());
    }
    blocks
}

//
// Tests
//
