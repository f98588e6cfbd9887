use super::*;

/// Non-fatal findings collected while setting up a build.
///
/// Every message is logged as a warning when pushed and kept around so that
/// hosts can surface them again after the build.
#[derive(Default, Debug)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        warn!("{message}");
        self.messages.push(message);
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}
