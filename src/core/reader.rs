/// Top-level entry point: validates input, applies the nickname
/// substitution, and drives the scene assembler.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::assembler::SceneAssembler;
use crate::core::decision::DecisionError;
use crate::core::dispatcher::{CommandDispatcher, DispatchError};
use crate::schema::scene::Scene;

/// Replaced by [`ReaderOptions::nickname`] before scanning.
pub const NICKNAME_PLACEHOLDER: &str = "{@nickname}";

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("story text is empty or blank")]
    EmptyInput,
    #[error("line {line}: tutorial scenes are not supported")]
    TutorialUnsupported { line: usize },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("line {line}: {source}")]
    Decision {
        line: usize,
        #[source]
        source: DecisionError,
    },
    #[error("decision opened at line {line} is never closed")]
    UnterminatedDecision { line: usize },
    #[error("line {line}: predicate outside of a decision block")]
    StrayPredicate { line: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl ReaderError {
    /// 1-based source line the error points at, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::TutorialUnsupported { line }
            | Self::Decision { line, .. }
            | Self::UnterminatedDecision { line }
            | Self::StrayPredicate { line } => Some(*line),
            Self::Dispatch(DispatchError::UnrecognizedLine { line, .. })
            | Self::Dispatch(DispatchError::Attribute { line, .. }) => Some(*line),
            Self::EmptyInput | Self::Io(_) | Self::Ron(_) => None,
        }
    }
}

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Substituted for every `{@nickname}` in the script.
    pub nickname: String,
    /// Turn `[PopupDialog(...)] text` into plain text instead of a no-op.
    pub convert_popup_dialog: bool,
}

impl ReaderOptions {
    pub fn load_from_ron(path: &Path) -> Result<ReaderOptions, ReaderError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<ReaderOptions, ReaderError> {
        Ok(ron::from_str(input)?)
    }
}

/// Parses one story script into a [`Scene`].
///
/// The reader owns its text; every call to [`read_scene`](Self::read_scene)
/// scans it from the start with fresh state.
#[derive(Debug, Clone)]
pub struct StoryReader {
    text: String,
    options: ReaderOptions,
}

impl StoryReader {
    /// Rejects empty or whitespace-only text.
    pub fn new(story_text: &str, options: ReaderOptions) -> Result<Self, ReaderError> {
        if story_text.trim().is_empty() {
            return Err(ReaderError::EmptyInput);
        }
        let text = if story_text.contains(NICKNAME_PLACEHOLDER) {
            story_text.replace(NICKNAME_PLACEHOLDER, &options.nickname)
        } else {
            story_text.to_string()
        };
        Ok(Self { text, options })
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Script text after nickname substitution.
    pub fn text(&self) -> &str {
        &self.text
    }

    #[tracing::instrument(skip_all, fields(bytes = self.text.len()))]
    pub fn read_scene(&self) -> Result<Scene, ReaderError> {
        let dispatcher = CommandDispatcher::new(self.options.convert_popup_dialog);
        let scene = SceneAssembler::new(&self.text, dispatcher).assemble()?;
        tracing::debug!(commands = scene.len(), "scene assembled");
        Ok(scene)
    }
}

/// Parse `story_text` with the given options in one call.
pub fn read_scene(story_text: &str, options: ReaderOptions) -> Result<Scene, ReaderError> {
    StoryReader::new(story_text, options)?.read_scene()
}
