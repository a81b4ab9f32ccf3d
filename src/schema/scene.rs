use serde::{Deserialize, Serialize};

use super::command::Command;

/// Scalar metadata declared by a script's `[HEADER(...)]` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SceneHeader {
    pub skippable: bool,
    pub autoable: bool,
    pub fit_mode: String,
    pub comment: String,
}

/// A parsed story scene: the ordered command sequence plus header metadata.
///
/// Built once by the scene assembler; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    commands: Vec<Command>,
    header: SceneHeader,
}

impl Scene {
    pub fn new(commands: Vec<Command>, header: SceneHeader) -> Self {
        Self { commands, header }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn header(&self) -> &SceneHeader {
        &self.header
    }

    pub fn is_skippable(&self) -> bool {
        self.header.skippable
    }

    pub fn is_autoable(&self) -> bool {
        self.header.autoable
    }

    pub fn fit_mode(&self) -> &str {
        &self.header.fit_mode
    }

    pub fn comment(&self) -> &str {
        &self.header.comment
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Plain dialogue transcript of the scene.
    pub fn story_text(&self) -> String {
        crate::core::transcript::render(&self.commands)
    }

    pub(crate) fn header_mut(&mut self) -> &mut SceneHeader {
        &mut self.header
    }

    pub(crate) fn set_commands(&mut self, commands: Vec<Command>) {
        self.commands = commands;
    }
}

impl<'a> IntoIterator for &'a Scene {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
