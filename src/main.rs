#![deny(future_incompatible)]
#![deny(nonstandard_style)]
#![deny(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use render_math::*;

#[macro_use]
extern crate log;

/// Source files whose stem ends with this are drafts.
const DRAFT_SUFFIX: &str = "-draft";

/// Log filter used when `RUST_LOG` is unset: diagnostics and progress.
const DEFAULT_LOG_FILTER: &str = "warn,render_math=info";

//
// Runner
//

#[derive(clap::Parser)]
#[command(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Prints the MathJax loader script for a site's settings.
    Script(ScriptArgs),
    /// Renders articles and pages with MathJax support.
    Build(BuildArgs),
}

fn main() -> Result<()> {
    // Init logging.
    logger(env_logger::Env::default()).init();

    // Execute command.
    match Cli::parse().command {
        Commands::Script(args) => args.run()?,
        Commands::Build(args) => args.run()?,
    }

    Ok(())
}

fn logger(env: env_logger::Env<'_>) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or(DEFAULT_LOG_FILTER))
}

fn load_settings(path: Option<&Path>) -> Result<SiteSettings> {
    match path {
        Some(path) => {
            ensure!(path.is_file(), "--settings must be a file");
            SiteSettings::load(path)
        }
        None => Ok(SiteSettings::default()),
    }
}

//
// Script
//

#[derive(clap::Args)]
struct ScriptArgs {
    /// Site settings, `.ron` or `.json`.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Wrap the script in a `<script>` tag.
    #[arg(long)]
    tag: bool,
}

impl ScriptArgs {
    fn run(self) -> Result<()> {
        let mut site = load_settings(self.settings.as_deref())?;
        let plugin = Plugin::initialize(&mut site, Capabilities::detect())?;
        if self.tag {
            println!("{}", script_tag(plugin.mathjax_script()));
        } else {
            println!("{}", plugin.mathjax_script());
        }
        Ok(())
    }
}

//
// Build
//

#[derive(clap::Args)]
struct BuildArgs {
    /// Site settings, `.ron` or `.json`.
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    output_directory: PathBuf,

    /// Page sources, rendered without summaries.
    #[arg(long = "page")]
    pages: Vec<PathBuf>,

    /// Article sources. Markdown (`.md`) is rendered, anything else is read
    /// as already rendered HTML.
    articles: Vec<PathBuf>,
}

impl BuildArgs {
    fn run(self) -> Result<()> {
        // Validation.
        ensure!(
            self.output_directory.is_dir(),
            "--output-directory must be a directory"
        );
        ensure!(
            self.articles.iter().chain(&self.pages).all(|f| f.is_file()),
            "Every input must be a file"
        );

        // Plugin.
        let timer = Instant::now();
        let mut site = load_settings(self.settings.as_deref())?;
        let plugin = Plugin::initialize(&mut site, Capabilities::detect())?;

        // Read content.
        let mut articles = vec![];
        let mut drafts = vec![];
        for path in &self.articles {
            let content = read_content(&site, path)?;
            if is_draft(path) {
                drafts.push(content);
            } else {
                articles.push(content);
            }
        }
        let pages = self
            .pages
            .iter()
            .map(|path| read_content(&site, path))
            .collect::<Result<Vec<_>>>()?;
        let mut generators = vec![
            Generator::Articles {
                articles,
                translations: vec![],
                drafts,
            },
            Generator::pages(pages),
        ];

        // Finalize and write.
        plugin.finalize(&mut generators);
        let mut written = 0;
        for generator in &generators {
            let with_summary = matches!(generator, Generator::Articles { .. });
            for content in generator.contents() {
                written += write_content(&self.output_directory, content, with_summary)?;
            }
        }

        info!(
            "Wrote {written} files to {} in {:.02} s, {} diagnostics",
            self.output_directory.display(),
            timer.elapsed().as_secs_f64(),
            plugin.diagnostics().messages().len()
        );
        Ok(())
    }
}

fn is_draft(path: &Path) -> bool {
    path.file_stem()
        .map_or(false, |stem| stem.to_string_lossy().ends_with(DRAFT_SUFFIX))
}

fn read_content(site: &SiteSettings, path: &Path) -> Result<Content> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Reading content from {}", path.display()))?;
    let body = if path.extension().map_or(false, |ext| ext == "md") {
        match site.markdown_extensions.first() {
            Some(extension) => extension.render(&text),
            None => md::to_html(&text),
        }
    } else {
        text
    };
    Ok(site.content(path, body))
}

fn write_content(output_directory: &Path, content: &Content, with_summary: bool) -> Result<usize> {
    let stem = content
        .source_path
        .file_stem()
        .context("Content path has no file name")?
        .to_string_lossy();
    let output_file = output_directory.join(format!("{stem}.html"));
    std::fs::write(&output_file, &content.body)
        .with_context(|| format!("Writing {}", output_file.display()))?;
    if !with_summary {
        return Ok(1);
    }
    let summary_file = output_directory.join(format!("{stem}.summary.html"));
    std::fs::write(&summary_file, content.summary())
        .with_context(|| format!("Writing {}", summary_file.display()))?;
    Ok(2)
}

//
// Tests
//
