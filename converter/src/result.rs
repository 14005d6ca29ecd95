//! Display-ready result items.

use serde::Serialize;

/// Subtitle of a failed conversion.
pub const CURRENCY_LIST_HINT: &str = "Press enter or click to open the currencies list";

/// Subtitle of a configuration problem.
pub const SETUP_HINT: &str = "Press enter or click to see how to fix this issue";

/// Where configuration problems are explained.
pub const README_URL: &str = "https://github.com/cambio-rs/cambio#configuration";

pub const INVALID_EXPRESSION_TITLE: &str = "Invalid expression provided";
pub const INVALID_EXPRESSION_HINT: &str = "Please check your mathematical expression";

/// What activating an item does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum ResultAction {
    /// Copy the text to the clipboard.
    Copy(String),
    /// Open the URL in a browser.
    OpenUrl(String),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKind {
    Conversion,
    Warning,
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub title: String,
    pub subtitle: String,
    pub kind: ResultKind,
    pub action: ResultAction,
}

impl ConversionResult {
    /// A successful conversion; activating it copies `copy_text`.
    pub fn conversion(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        copy_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            kind: ResultKind::Conversion,
            action: ResultAction::Copy(copy_text.into()),
        }
    }

    /// A warning, optionally linking somewhere helpful.
    pub fn warning(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        url: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            kind: ResultKind::Warning,
            action: url.map_or(ResultAction::None, |u| ResultAction::OpenUrl(u.to_string())),
        }
    }

    /// The item shown when the amount does not evaluate.
    pub fn invalid_expression() -> Self {
        Self::warning(INVALID_EXPRESSION_TITLE, INVALID_EXPRESSION_HINT, None)
    }

    /// Text copied on activation, if any.
    pub fn copy_text(&self) -> Option<&str> {
        match &self.action {
            ResultAction::Copy(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.kind == ResultKind::Warning
    }
}
