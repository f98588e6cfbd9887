use super::*;

use tinytemplate::TinyTemplate;

const TEMPLATE_NAME: &str = "mathjax-script";
const BUILTIN_TEMPLATE: &str = include_str!("templates/mathjax_script.js");

/// The MathJax loader script template. Placeholders are `{option}` and name
/// fields of [`MathJaxSettings`]; literal braces are written `\{`.
pub struct ScriptTemplate(Cow<'static, str>);

impl ScriptTemplate {
    #[must_use]
    pub fn builtin() -> Self {
        Self(Cow::Borrowed(BUILTIN_TEMPLATE))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading MathJax script template {}", path.display()))?;
        Ok(Self(Cow::Owned(text)))
    }

    #[must_use]
    pub fn from_text(text: String) -> Self {
        Self(Cow::Owned(text))
    }

    /// Substitutes `settings` into the template. Placeholders without a
    /// matching field are an error.
    pub fn render(&self, settings: &MathJaxSettings) -> Result<String> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        tt.add_template(TEMPLATE_NAME, &self.0)
            .context("Compiling MathJax script template")?;
        let script = tt
            .render(TEMPLATE_NAME, settings)
            .context("Rendering MathJax script template")?;
        Ok(script)
    }
}

/// Wraps a script so it can be appended to rendered HTML.
#[must_use]
pub fn script_tag(script: &str) -> String {
    format!("<script type='text/javascript'>{script}</script>")
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn settings(raw: &Value) -> MathJaxSettings {
        let mut diagnostics = Diagnostics::new();
        MathJaxSettings::from_overrides(Some(raw), &Capabilities::default(), &mut diagnostics)
    }

    #[test]
    fn builtin_defaults() {
        let settings = MathJaxSettings::defaults(&Capabilities::default());
        let script = ScriptTemplate::builtin().render(&settings).unwrap();
        assert!(script.starts_with("if (!document.getElementById('mathjaxscript_render_math')) {"));
        assert!(script.contains(r#"var align = "center","#));
        assert!(script.contains(r#"indent = "0em","#));
        assert!(script.contains("if (false) {"));
        assert!(script.contains("screen.width < 768"));
        assert!(script.contains(&format!(
            "mathjaxscript.src = {};",
            crate::settings::DEFAULT_SOURCE
        )));
        assert!(script.contains("'noErrors.js','noUndefined.js'],"));
        assert!(script.contains("autoNumber: 'none'"));
        assert!(script.contains("showMathMenu: true,"));
        assert!(script.contains("messageStyle: 'normal',"));
        assert!(script.contains("processEscapes: true,"));
        assert!(script.contains("preview: 'TeX',"));
        assert!(script.contains("availableFonts: ['STIX','TeX'],"));
        assert!(script.contains("{color: 'inherit ! important'}"));
        assert!(script.contains("if ('default' !== 'default') {"));
        assert!(script.contains(r"inlineMath: [ ['\\\\(','\\\\)'] ]"));
        assert!(!script.contains(r"\{"));
    }

    #[test]
    fn overrides_are_substituted() {
        let settings = settings(&json!({
            "align": "left",
            "responsive": true,
            "responsive_break": 1024,
            "tex_extensions": ["color.js"],
            "mathjax_font": "fraktur",
            "equation_numbering": "AMS",
        }));
        let script = ScriptTemplate::builtin().render(&settings).unwrap();
        assert!(script.contains(r#"var align = "left","#));
        assert!(script.contains("if (true) {"));
        assert!(script.contains("screen.width < 1024"));
        assert!(script.contains("'noUndefined.js','color.js'],"));
        assert!(script.contains("autoNumber: 'AMS'"));
        assert!(script.contains("if ('Fraktur' !== 'default') {"));
        assert!(script.contains("unshift('MathJax_Fraktur-bold')"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let settings = settings(&json!({ "color": "red", "font_list": ["TeX"] }));
        let template = ScriptTemplate::builtin();
        let first = template.render(&settings).unwrap();
        let second = template.render(&settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_placeholder_fails() {
        let settings = MathJaxSettings::defaults(&Capabilities::default());
        let template =
            ScriptTemplate::from_text("var a = {align}; var b = {no_such_option};".to_owned());
        assert!(template.render(&settings).is_err());
    }

    #[test]
    fn custom_template() {
        let settings = MathJaxSettings::defaults(&Capabilities::default());
        let template =
            ScriptTemplate::from_text(r"load({source}, \{ font: '{mathjax_font}' })".to_owned());
        assert_eq!(
            template.render(&settings).unwrap(),
            format!(
                "load({}, {{ font: 'default' }})",
                crate::settings::DEFAULT_SOURCE
            )
        );
    }

    #[test]
    fn missing_template_file_fails() {
        let path = std::env::temp_dir().join("render-math-no-such-template.js");
        assert!(ScriptTemplate::from_file(&path).is_err());
    }

    #[test]
    fn tag() {
        assert_eq!(
            script_tag("var a = 1;"),
            "<script type='text/javascript'>var a = 1;</script>"
        );
    }
}
