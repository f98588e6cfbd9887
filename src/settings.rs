use super::*;

use itertools::Itertools;

//
// Defaults
//

pub const DEFAULT_SOURCE: &str =
    "'https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.3/latest.js?config=TeX-AMS-MML_HTMLorMML'";
const DEFAULT_FONT_LIST: [&str; 2] = ["STIX", "TeX"];

//
// Enums
//

/// Alignment of displayed equations.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
    #[default]
    Center,
}

impl Align {
    /// Unrecognized names fall back to [`Align::Center`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }
}

/// Font forced onto MathJax. Matching is case-insensitive.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MathJaxFont {
    SansSerif,
    Fraktur,
    Typewriter,
    #[default]
    #[serde(rename = "default")]
    Default,
}

impl MathJaxFont {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "sanserif" => Self::SansSerif,
            "fraktur" => Self::Fraktur,
            "typewriter" => Self::Typewriter,
            _ => Self::Default,
        }
    }
}

//
// Settings
//

/// MathJax options as they are substituted into the script template.
///
/// Options that end up inside JavaScript are stored already serialized: flags
/// are the literal strings `"true"`/`"false"`, lists are quoted and
/// comma-joined. Only `auto_insert` and `process_summary` stay native, since
/// they steer the build rather than the script.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct MathJaxSettings {
    pub auto_insert: bool,
    pub align: Align,
    pub indent: String,
    pub show_menu: String,
    pub process_escapes: String,
    pub latex_preview: String,
    pub color: String,
    pub linebreak_automatic: String,
    pub tex_extensions: String,
    pub responsive: String,
    pub responsive_break: String,
    pub mathjax_font: MathJaxFont,
    pub process_summary: bool,
    pub message_style: String,
    pub font_list: String,
    pub equation_numbering: String,
    pub source: String,
}

impl MathJaxSettings {
    /// Default settings. Summary processing is on whenever HTML inspection is
    /// available.
    #[must_use]
    pub fn defaults(caps: &Capabilities) -> Self {
        Self {
            auto_insert: true,
            align: Align::Center,
            indent: "0em".to_owned(),
            show_menu: js_bool(true),
            process_escapes: js_bool(true),
            latex_preview: "TeX".to_owned(),
            color: "inherit".to_owned(),
            linebreak_automatic: js_bool(false),
            tex_extensions: String::new(),
            responsive: js_bool(false),
            responsive_break: "768".to_owned(),
            mathjax_font: MathJaxFont::Default,
            process_summary: caps.html_available(),
            message_style: "normal".to_owned(),
            font_list: quoted_list(DEFAULT_FONT_LIST.iter().copied()),
            equation_numbering: "none".to_owned(),
            source: DEFAULT_SOURCE.to_owned(),
        }
    }

    /// Overlays user overrides on top of the defaults.
    ///
    /// Malformed values are skipped and leave the default in place; nothing
    /// here ever fails. A missing or non-object `raw` yields the defaults.
    pub fn from_overrides(
        raw: Option<&Value>,
        caps: &Capabilities,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut settings = Self::defaults(caps);
        let Some(Value::Object(overrides)) = raw else {
            if let Some(raw) = raw {
                debug!("MATH_JAX is not a mapping, using defaults: {raw}");
            }
            return settings;
        };
        for (key, value) in overrides {
            if settings.apply(key, value, caps, diagnostics).is_none() {
                debug!("Ignoring MathJax setting {key:?} with unexpected value {value}");
            }
        }
        settings
    }

    /// Returns `None` when the value has the wrong shape for its key.
    fn apply(
        &mut self,
        key: &str,
        value: &Value,
        caps: &Capabilities,
        diagnostics: &mut Diagnostics,
    ) -> Option<()> {
        match key {
            "auto_insert" => self.auto_insert = value.as_bool()?,
            "align" => self.align = Align::from_name(value.as_str()?),
            "indent" => self.indent = scalar_text(value)?,
            "source" => self.source = scalar_text(value)?,
            "show_menu" => self.show_menu = js_bool(value.as_bool()?),
            "process_escapes" => self.process_escapes = js_bool(value.as_bool()?),
            "latex_preview" => self.latex_preview = value.as_str()?.to_owned(),
            "color" => self.color = value.as_str()?.to_owned(),
            "linebreak_automatic" => self.linebreak_automatic = js_bool(value.as_bool()?),
            "responsive" => self.responsive = js_bool(value.as_bool()?),
            "responsive_break" => self.responsive_break = integer_text(value)?,
            "message_style" => self.message_style = nullable_text(value)?,
            "equation_numbering" => self.equation_numbering = nullable_text(value)?,
            "mathjax_font" => self.mathjax_font = MathJaxFont::from_name(value.as_str()?),
            "tex_extensions" => {
                self.tex_extensions = value
                    .as_array()?
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|ext| format!(",'{ext}'"))
                    .collect();
            }
            "font_list" => {
                self.font_list = quoted_list(value.as_array()?.iter().filter_map(Value::as_str));
            }
            "process_summary" => {
                let requested = value.as_bool()?;
                self.process_summary = requested && caps.html_available();
                if requested && !caps.html_available() {
                    diagnostics.push(
                        "An HTML parser is needed for summaries to be processed by render-math, \
                         summary processing is disabled",
                    );
                }
            }
            _ => debug!("Ignoring unknown MathJax setting {key:?}"),
        }
        Some(())
    }
}

//
// Serialization helpers
//

fn js_bool(value: bool) -> String {
    value.to_string()
}

fn quoted_list<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().map(|v| format!("'{v}'")).join(",")
}

/// Strings verbatim, numbers and booleans in their textual form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn nullable_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("none".to_owned()),
        _ => scalar_text(value),
    }
}

fn integer_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

//
// Tests
//
