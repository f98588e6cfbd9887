#![deny(future_incompatible)]
#![deny(nonstandard_style)]
#![deny(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::wildcard_imports
)]

use std::{
    borrow::Cow,
    cell::RefCell,
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    ops::Range,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[macro_use]
extern crate log;

//
// Modules
//

pub mod capability;
pub mod content;
pub mod diag;
pub mod html;
pub mod md;
pub mod plugin;
pub mod rst;
pub mod script;
pub mod settings;
pub mod site;
pub mod summary;
pub mod typogrify;

//
// Re-exports
//

pub use capability::{Capabilities, HtmlInspector, MarkupScanner, NoInspector};
pub use content::{Content, Generator};
pub use diag::Diagnostics;
pub use md::MathJaxExtension;
pub use plugin::Plugin;
pub use script::{script_tag, ScriptTemplate};
pub use settings::MathJaxSettings;
pub use site::SiteSettings;

/// CSS class carried by every element holding math source.
pub const MATH_TAG_CLASS: &str = "math";
