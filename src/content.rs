use super::*;

pub const DEFAULT_SUMMARY_MAX_LENGTH: usize = 50;
pub const DEFAULT_SUMMARY_END_SUFFIX: &str = "...";

/// An article or page, after its source has been rendered to HTML.
#[derive(Debug)]
pub struct Content {
    pub source_path: PathBuf,
    /// Rendered body.
    pub body: String,
    pub metadata: BTreeMap<String, String>,
    summary_max_length: usize,
    summary_end_suffix: String,
    summary_cache: RefCell<Option<String>>,
}

impl Content {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(source_path: P, body: S) -> Self {
        Self {
            source_path: source_path.into(),
            body: body.into(),
            metadata: BTreeMap::new(),
            summary_max_length: DEFAULT_SUMMARY_MAX_LENGTH,
            summary_end_suffix: DEFAULT_SUMMARY_END_SUFFIX.to_owned(),
            summary_cache: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn with_summary_length(mut self, max_length: usize, end_suffix: &str) -> Self {
        self.summary_max_length = max_length;
        self.summary_end_suffix = end_suffix.to_owned();
        self.invalidate_summary();
        self
    }

    /// File extension of the source, including the dot.
    #[must_use]
    pub fn source_extension(&self) -> Option<String> {
        self.source_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
    }

    /// The `summary` metadata when present, the truncated body otherwise.
    /// Memoized until [`Content::invalidate_summary`].
    #[must_use]
    pub fn summary(&self) -> String {
        self.summary_cache
            .borrow_mut()
            .get_or_insert_with(|| match self.metadata.get("summary") {
                Some(summary) => summary.clone(),
                None => html::truncate_words(
                    &self.body,
                    self.summary_max_length,
                    &self.summary_end_suffix,
                ),
            })
            .clone()
    }

    pub fn invalidate_summary(&self) {
        self.summary_cache.borrow_mut().take();
    }
}

/// Content grouped the way the host's generators hold it.
#[derive(Debug)]
pub enum Generator {
    Articles {
        articles: Vec<Content>,
        translations: Vec<Content>,
        drafts: Vec<Content>,
    },
    Pages {
        pages: Vec<Content>,
        hidden_pages: Vec<Content>,
    },
    /// Generators this plugin does not know how to handle.
    Other(String),
}

impl Generator {
    #[must_use]
    pub fn articles(articles: Vec<Content>) -> Self {
        Self::Articles {
            articles,
            translations: vec![],
            drafts: vec![],
        }
    }

    #[must_use]
    pub fn pages(pages: Vec<Content>) -> Self {
        Self::Pages {
            pages,
            hidden_pages: vec![],
        }
    }

    /// Every content item, whatever its role.
    pub fn contents(&self) -> impl Iterator<Item = &Content> {
        let groups: Vec<&Vec<Content>> = match self {
            Self::Articles {
                articles,
                translations,
                drafts,
            } => vec![articles, translations, drafts],
            Self::Pages {
                pages,
                hidden_pages,
            } => vec![pages, hidden_pages],
            Self::Other(_) => vec![],
        };
        groups.into_iter().flatten()
    }
}

//
// Tests
//
