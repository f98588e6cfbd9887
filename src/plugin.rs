use super::*;

/// Markdown extension name registered in the host's `MARKDOWN` settings.
pub const MARKDOWN_EXTENSION_NAME: &str = "render_math.mathjax";

/// State shared by the two build phases: created when the build initializes,
/// consulted once all content has been generated, dropped with the build.
pub struct Plugin {
    settings: MathJaxSettings,
    mathjax_script: String,
    caps: Capabilities,
    diagnostics: Diagnostics,
}

impl Plugin {
    /// Normalizes the MathJax settings, builds the script and hooks it into
    /// the Markdown and reStructuredText engines. Only a broken script
    /// template is fatal.
    pub fn initialize(site: &mut SiteSettings, caps: Capabilities) -> Result<Self> {
        let mut diagnostics = Diagnostics::new();

        // Settings.
        let settings =
            MathJaxSettings::from_overrides(site.math_jax.as_ref(), &caps, &mut diagnostics);
        debug!("MathJax settings: {settings:#?}");

        // Script.
        let template = match &site.math_jax_template {
            Some(path) => ScriptTemplate::from_file(path)?,
            None => ScriptTemplate::builtin(),
        };
        let mathjax_script = template.render(&settings)?;

        // Engines.
        typogrify::configure_typogrify(site, &caps, &mut diagnostics);
        if let Err(err) = register_markdown(site, &mathjax_script, &settings) {
            error!("The MathJax Markdown extension failed to configure, MathJax is non-functional for Markdown: {err:#}");
        }
        configure_rst(site, &settings);

        info!(
            "MathJax ready (auto insert: {}, summaries: {})",
            settings.auto_insert, settings.process_summary
        );
        Ok(Self {
            settings,
            mathjax_script,
            caps,
            diagnostics,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &MathJaxSettings {
        &self.settings
    }

    #[must_use]
    pub fn mathjax_script(&self) -> &str {
        &self.mathjax_script
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Adds MathJax to reStructuredText articles and pages, and repairs
    /// article summaries when summary processing is on.
    pub fn finalize(&self, generators: &mut [Generator]) {
        let mut repaired = 0;
        for generator in generators.iter_mut() {
            match generator {
                Generator::Articles {
                    articles,
                    translations,
                    drafts,
                } => {
                    for article in articles
                        .iter_mut()
                        .chain(translations.iter_mut())
                        .chain(drafts.iter_mut())
                    {
                        rst::add_script_to_rst(article, &self.mathjax_script);
                        if self.settings.process_summary
                            && summary::repair_summary(
                                article,
                                &*self.caps.html,
                                &self.mathjax_script,
                            )
                        {
                            repaired += 1;
                        }
                    }
                }
                Generator::Pages {
                    pages,
                    hidden_pages,
                } => {
                    for page in pages.iter_mut().chain(hidden_pages.iter_mut()) {
                        rst::add_script_to_rst(page, &self.mathjax_script);
                    }
                }
                Generator::Other(name) => debug!("Skipping {name} generator"),
            }
        }
        if repaired > 0 {
            info!("Repaired {repaired} summaries with truncated math");
        }
    }
}

/// Appends the extension to `MARKDOWN["extensions"]` and keeps its
/// configuration for the Markdown engine.
fn register_markdown(
    site: &mut SiteSettings,
    mathjax_script: &str,
    settings: &MathJaxSettings,
) -> Result<()> {
    if !site.markdown.is_object() {
        bail!("MARKDOWN must be a mapping, got {}", site.markdown);
    }
    let Some(extensions) = site
        .markdown
        .as_object_mut()
        .map(|markdown| markdown.entry("extensions"))
        .map(|entry| entry.or_insert_with(|| Value::Array(vec![])))
        .and_then(Value::as_array_mut)
    else {
        bail!("MARKDOWN[\"extensions\"] must be a list");
    };
    extensions.push(Value::from(MARKDOWN_EXTENSION_NAME));
    site.markdown_extensions
        .push(MathJaxExtension::new(mathjax_script, settings));
    Ok(())
}

/// Has docutils emit math for MathJax unless the site chose otherwise.
fn configure_rst(site: &mut SiteSettings, settings: &MathJaxSettings) {
    site.docutils_settings
        .entry("math_output".to_owned())
        .or_insert_with(|| format!("MathJax {}", settings.source));
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    const MATH_BODY: &str = r#"<p>See <span class="math">\(x^2 + y^2 = z^2\)</span> now.</p>"#;

    fn site(math_jax: Value) -> SiteSettings {
        SiteSettings {
            math_jax: Some(math_jax),
            ..SiteSettings::default()
        }
    }

    #[test]
    fn initialize_defaults() {
        let mut site = SiteSettings::default();
        let plugin = Plugin::initialize(&mut site, Capabilities::default()).unwrap();
        assert!(plugin.settings().process_summary);
        assert!(plugin.mathjax_script().contains("mathjaxscript_render_math"));
        assert!(plugin.diagnostics().is_empty());
        assert_eq!(
            site.markdown["extensions"],
            json!([MARKDOWN_EXTENSION_NAME])
        );
        assert_eq!(site.markdown["output_format"], json!("html5"));
        assert_eq!(site.markdown_extensions.len(), 1);
        assert_eq!(site.markdown_extensions[0].mathjax_script, plugin.mathjax_script());
        assert_eq!(site.markdown_extensions[0].math_tag_class, "math");
        assert_eq!(
            site.docutils_settings["math_output"],
            format!("MathJax {}", crate::settings::DEFAULT_SOURCE)
        );
    }

    #[test]
    fn initialize_keeps_existing_engine_settings() {
        let mut site = SiteSettings {
            markdown: json!({ "extensions": ["toc"] }),
            ..SiteSettings::default()
        };
        site.docutils_settings
            .insert("math_output".to_owned(), "MathML".to_owned());
        Plugin::initialize(&mut site, Capabilities::default()).unwrap();
        assert_eq!(
            site.markdown["extensions"],
            json!(["toc", MARKDOWN_EXTENSION_NAME])
        );
        assert_eq!(site.docutils_settings["math_output"], "MathML");
    }

    #[test]
    fn markdown_registration_failure_is_not_fatal() {
        let mut site = SiteSettings {
            markdown: json!({ "extensions": "toc" }),
            ..SiteSettings::default()
        };
        let plugin = Plugin::initialize(&mut site, Capabilities::default());
        assert!(plugin.is_ok());
        assert!(site.markdown_extensions.is_empty());

        let mut site = SiteSettings {
            markdown: json!(null),
            ..SiteSettings::default()
        };
        assert!(Plugin::initialize(&mut site, Capabilities::default()).is_ok());
        assert!(site.markdown_extensions.is_empty());
    }

    #[test]
    fn missing_template_is_fatal() {
        let mut site = SiteSettings {
            math_jax_template: Some(std::env::temp_dir().join("render-math-missing.js")),
            ..SiteSettings::default()
        };
        assert!(Plugin::initialize(&mut site, Capabilities::default()).is_err());
    }

    #[test]
    fn typogrify_is_guarded() {
        let mut site = SiteSettings {
            typogrify: true,
            ..SiteSettings::default()
        };
        let plugin = Plugin::initialize(&mut site, Capabilities::default()).unwrap();
        assert!(!site.typogrify);
        assert!(plugin.diagnostics().contains("not installed"));
    }

    #[test]
    fn process_summary_without_parser() {
        let mut site = site(json!({ "process_summary": true }));
        let plugin =
            Plugin::initialize(&mut site, Capabilities::new(NoInspector, None)).unwrap();
        assert!(!plugin.settings().process_summary);
        assert!(plugin.diagnostics().contains("HTML parser"));
    }

    #[test]
    fn finalize() {
        let mut site = SiteSettings::default();
        let plugin = Plugin::initialize(&mut site, Capabilities::default()).unwrap();
        let truncated = r#"<p>See <span class="math">\(x^2 + ...</span></p>"#;

        let mut draft = Content::new("drafts/draft.md", MATH_BODY);
        draft
            .metadata
            .insert("summary".to_owned(), truncated.to_owned());
        let mut generators = vec![
            Generator::Articles {
                articles: vec![Content::new("posts/a.rst", MATH_BODY)],
                translations: vec![Content::new("posts/a-fr.md", MATH_BODY)],
                drafts: vec![draft],
            },
            Generator::Pages {
                pages: vec![Content::new("pages/about.rst", MATH_BODY)],
                hidden_pages: vec![Content::new("pages/hidden.rst", "<p>No math.</p>")],
            },
            Generator::Other("static".to_owned()),
        ];
        plugin.finalize(&mut generators);

        let tag = script_tag(plugin.mathjax_script());
        let Generator::Articles {
            articles,
            translations,
            drafts,
        } = &generators[0]
        else {
            panic!("expected articles");
        };
        assert_eq!(articles[0].body, format!("{MATH_BODY}{tag}"));
        assert_eq!(translations[0].body, MATH_BODY);
        assert_eq!(
            drafts[0].summary(),
            format!(
                r#"<p>See <span class="math">\(x^2 + y^2 = z^2\) ...</span></p>{tag}"#
            )
        );

        let Generator::Pages {
            pages,
            hidden_pages,
        } = &generators[1]
        else {
            panic!("expected pages");
        };
        assert_eq!(pages[0].body, format!("{MATH_BODY}{tag}"));
        assert_eq!(hidden_pages[0].body, "<p>No math.</p>");
    }

    #[test]
    fn finalize_without_summary_processing() {
        let mut site = site(json!({ "process_summary": false }));
        let plugin = Plugin::initialize(&mut site, Capabilities::default()).unwrap();
        let truncated = r#"<p>See <span class="math">\(x^2 + ...</span></p>"#;
        let mut article = Content::new("posts/a.md", MATH_BODY);
        article
            .metadata
            .insert("summary".to_owned(), truncated.to_owned());
        let mut generators = vec![Generator::articles(vec![article])];
        plugin.finalize(&mut generators);
        assert_eq!(generators[0].contents().next().unwrap().summary(), truncated);
    }
}
