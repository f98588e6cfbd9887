use super::*;

/// `.rst` is the only extension reStructuredText sources use.
const RST_EXTENSION: &str = ".rst";

/// Appends the MathJax script to reStructuredText output containing math.
/// docutils always emits math with the `math` class.
///
/// Nothing marks an item as already processed, so the host must call this
/// once per item and build.
pub fn add_script_to_rst(content: &mut Content, mathjax_script: &str) {
    if content.source_extension().as_deref() != Some(RST_EXTENSION) {
        return;
    }
    if content
        .body
        .contains(&format!("class=\"{MATH_TAG_CLASS}\""))
    {
        debug!("Adding MathJax to {}", content.source_path.display());
        content.body.push_str(&script_tag(mathjax_script));
    }
}

//
// Tests
//
