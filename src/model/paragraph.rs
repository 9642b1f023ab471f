//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

/// A paragraph: an ordered sequence of text runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text runs in the paragraph
    pub runs: Vec<TextRun>,

    /// Paragraph alignment
    pub alignment: Alignment,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single plain run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a paragraph with one plain run per fragment.
    pub fn with_runs<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self {
            runs: fragments.into_iter().map(TextRun::new).collect(),
            alignment: Alignment::default(),
        }
    }

    /// Add plain text as a new run.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.runs.push(TextRun::new(text));
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                bold: true,
                ..Default::default()
            },
        }
    }

    /// Set the style and return self.
    pub fn styled(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

/// Text styling properties. Substitution never touches these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Font name
    pub font_name: Option<String>,

    /// Font size in points
    pub font_size: Option<f32>,

    /// Text color as a hex RGB value, e.g. "C00000"
    pub color: Option<String>,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}
