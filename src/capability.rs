use super::*;

/// Environment variable announcing the installed typography prettifier
/// version to [`Capabilities::detect`].
pub const TYPOGRIFY_VERSION_VAR: &str = "RENDER_MATH_TYPOGRIFY_VERSION";

//
// HTML inspection
//

/// Locates elements in rendered HTML.
pub trait HtmlInspector {
    fn is_available(&self) -> bool;

    /// All elements carrying `class`, in document order.
    fn find_class(&self, html: &str, class: &str) -> Vec<crate::html::Element>;
}

/// Built-in tag scanner, see [`html`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupScanner;

impl HtmlInspector for MarkupScanner {
    fn is_available(&self) -> bool {
        true
    }

    fn find_class(&self, html: &str, class: &str) -> Vec<crate::html::Element> {
        crate::html::find_class(html, class)
    }
}

/// Stands in when no HTML parser is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInspector;

impl HtmlInspector for NoInspector {
    fn is_available(&self) -> bool {
        false
    }

    fn find_class(&self, _html: &str, _class: &str) -> Vec<crate::html::Element> {
        vec![]
    }
}

//
// Capabilities
//

/// Optional collaborators, resolved once when a build starts.
pub struct Capabilities {
    pub html: Box<dyn HtmlInspector>,
    /// Installed typography prettifier version, if any.
    pub typography: Option<String>,
}

impl Capabilities {
    pub fn new<H>(html: H, typography: Option<&str>) -> Self
    where
        H: HtmlInspector + 'static,
    {
        Self {
            html: Box::new(html),
            typography: typography.map(str::to_owned),
        }
    }

    /// Built-in HTML scanner, typography version from the environment.
    #[must_use]
    pub fn detect() -> Self {
        let typography = std::env::var(TYPOGRIFY_VERSION_VAR).ok();
        match &typography {
            Some(version) => debug!("Typography prettifier version {version}"),
            None => debug!("No typography prettifier announced via {TYPOGRIFY_VERSION_VAR}"),
        }
        Self {
            html: Box::new(MarkupScanner),
            typography,
        }
    }

    #[must_use]
    pub fn html_available(&self) -> bool {
        self.html.is_available()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new(MarkupScanner, None)
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("html", &self.html.is_available())
            .field("typography", &self.typography)
            .finish()
    }
}
