use super::*;

/// The subset of the host's site settings this plugin reads or updates.
///
/// Keys follow the host's upper-case naming. `MATH_JAX` and `MARKDOWN` are
/// kept untyped: the former is validated leniently by
/// [`MathJaxSettings::from_overrides`], the latter belongs to the Markdown
/// engine.
#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct SiteSettings {
    pub math_jax: Option<Value>,
    /// Alternative MathJax script template.
    pub math_jax_template: Option<PathBuf>,
    pub typogrify: bool,
    pub typogrify_ignore_tags: Vec<String>,
    pub markdown: Value,
    pub docutils_settings: BTreeMap<String, String>,
    pub summary_max_length: usize,
    pub summary_end_suffix: String,
    /// Extensions registered with the Markdown engine during initialization.
    #[serde(skip)]
    pub markdown_extensions: Vec<MathJaxExtension>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            math_jax: None,
            math_jax_template: None,
            typogrify: false,
            typogrify_ignore_tags: vec![],
            markdown: serde_json::json!({
                "extension_configs": {},
                "output_format": "html5",
            }),
            docutils_settings: BTreeMap::new(),
            summary_max_length: content::DEFAULT_SUMMARY_MAX_LENGTH,
            summary_end_suffix: content::DEFAULT_SUMMARY_END_SUFFIX.to_owned(),
            markdown_extensions: vec![],
        }
    }
}

impl SiteSettings {
    /// Reads settings from a `.ron` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(
            File::open(path).with_context(|| format!("Opening settings {}", path.display()))?,
        );
        let settings = match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => ron_options()
                .from_reader(reader)
                .with_context(|| format!("Parsing settings {}", path.display()))?,
            Some("json") => serde_json::from_reader(reader)
                .with_context(|| format!("Parsing settings {}", path.display()))?,
            _ => bail!(
                "Settings must be a .ron or .json file, got {}",
                path.display()
            ),
        };
        Ok(settings)
    }

    /// Content item configured with this site's summary length.
    pub fn content<P: Into<PathBuf>, S: Into<String>>(&self, source_path: P, body: S) -> Content {
        Content::new(source_path, body)
            .with_summary_length(self.summary_max_length, &self.summary_end_suffix)
    }
}

/// Optional keys may be written without `Some(...)`.
fn ron_options() -> ron::Options {
    ron::Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

//
// Tests
//
