use super::*;

use semver::Version;

/// Oldest prettifier release that honors an ignore list.
pub const MIN_TYPOGRIFY_VERSION: Version = Version::new(2, 0, 7);

/// Selectors the prettifier must not touch: math source and our script.
const IGNORE_TAGS: [&str; 2] = [".math", "script"];

/// Keeps typographic prettifying away from math and the MathJax script, or
/// turns prettifying off when the installed prettifier can't be told to.
pub fn configure_typogrify(
    settings: &mut SiteSettings,
    caps: &Capabilities,
    diagnostics: &mut Diagnostics,
) {
    if !settings.typogrify {
        return;
    }

    let Some(installed) = caps.typography.as_deref() else {
        settings.typogrify = false;
        diagnostics.push("Typogrify is not installed, so it is being ignored");
        return;
    };

    if !is_supported(installed) {
        settings.typogrify = false;
        diagnostics.push(format!(
            "Typogrify {installed} is too old for render-math, version \
             {MIN_TYPOGRIFY_VERSION} or above is needed. Typogrify is turned off"
        ));
        return;
    }

    for tag in IGNORE_TAGS {
        if !settings.typogrify_ignore_tags.iter().any(|t| t == tag) {
            settings.typogrify_ignore_tags.push(tag.to_owned());
        }
    }
    debug!("Typogrify ignores {:?}", settings.typogrify_ignore_tags);
}

/// Unparsable versions count as too old. Missing minor and patch components
/// are read as zero.
fn is_supported(version: &str) -> bool {
    parse_version(version).map_or(false, |v| v >= MIN_TYPOGRIFY_VERSION)
}

fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim().trim_start_matches('v');
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }
    let mut parts = version.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().unwrap_or(Ok(0)).ok()?;
    let patch = parts.next().unwrap_or(Ok(0)).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Version::new(major, minor, patch))
}

//
// Tests
//
