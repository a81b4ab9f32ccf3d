use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a character illustration slides into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnterStyle {
    #[default]
    None,
    Left,
    Right,
}

impl EnterStyle {
    /// Parse the literal used by the `enter`/`enter2` attributes
    /// (case-insensitive).
    pub fn from_literal(literal: &str) -> Option<Self> {
        if literal.eq_ignore_ascii_case("none") {
            Some(Self::None)
        } else if literal.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if literal.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

/// Dialogue text without a speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainText {
    pub text: String,
}

/// Dialogue text spoken by a named character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedText {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub alignment: String,
    pub size: f64,
    pub delay: f64,
    pub width: f64,
}

/// Decorative on-screen text, usually wrapped in rich-text markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub alignment: String,
    pub size: f64,
    pub delay: f64,
    pub width: f64,
}

/// Fade parameters for hiding the dialog box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFade {
    pub fade_time: f64,
    pub block: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub image: String,
    pub screen_adapt: String,
    pub fade_time: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub x: f64,
    pub y: f64,
}

/// One character slot on stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSlot {
    pub code: String,
    pub enter: EnterStyle,
}

/// One or two character illustrations. When `secondary` is set, `focus`
/// names the highlighted slot (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterIllustration {
    pub primary: CharacterSlot,
    pub secondary: Option<CharacterSlot>,
    pub fade_time: f64,
    pub block: bool,
    pub focus: u32,
}

/// Full-screen color overlay. Channels are in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub a: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub fade_time: f64,
    pub block: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MusicTrack {
    /// Plays `intro` once, then loops `looped`.
    IntroLoop { intro: String, looped: String },
    Single { key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Music {
    pub track: MusicTrack,
    pub volume: f64,
    pub fade_time: f64,
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    pub key: String,
    pub channel: String,
    pub volume: f64,
    pub delay: f64,
    pub block: bool,
    pub looped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub image: String,
    pub screen_adapt: String,
    pub fade_time: f64,
    pub block: bool,
    pub tiled: bool,
    pub x_scale: f64,
    pub y_scale: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTween {
    pub image: String,
    pub block: bool,
    pub fade_time: f64,
    pub duration: f64,
    pub x_scale_from: f64,
    pub y_scale_from: f64,
    pub x_scale_to: f64,
    pub y_scale_to: f64,
    pub x_from: f64,
    pub y_from: f64,
    pub x_to: f64,
    pub y_to: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub image: String,
    pub block: bool,
    pub fade_time: f64,
    pub fade_style: String,
    pub offset_x: f64,
}

/// Camera shake. A negative `duration` means the shake runs until a
/// later shake with `stop` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraShake {
    pub duration: f64,
    pub x_strength: f64,
    pub y_strength: f64,
    pub vibrato: f64,
    pub randomness: f64,
    pub fade_out: bool,
    pub block: bool,
    pub stop: bool,
}

/// A branch point: each option label maps to the commands played when
/// that option is picked.
///
/// Options keep the order they were declared in; `branches` is only a
/// lookup table and is never iterated for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Decision {
    options: Vec<String>,
    branches: FxHashMap<String, Vec<Command>>,
}

impl Decision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the branch for `option`. A new label is appended to the option
    /// order; an existing label keeps its position and gets the new body.
    pub fn insert(&mut self, option: impl Into<String>, commands: Vec<Command>) {
        let option = option.into();
        if !self.branches.contains_key(&option) {
            self.options.push(option.clone());
        }
        self.branches.insert(option, commands);
    }

    /// Option labels in declaration order.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn branch(&self, option: &str) -> Option<&[Command]> {
        self.branches.get(option).map(Vec::as_slice)
    }

    /// Iterate `(option, branch)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Command])> + '_ {
        self.options.iter().filter_map(move |option| {
            self.branches
                .get(option)
                .map(|commands| (option.as_str(), commands.as_slice()))
        })
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// One directive extracted from a script line, or a synthesized
/// structural aggregate such as a [`Decision`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    NoOperation,
    PlainText(PlainText),
    NamedText(NamedText),
    ShowSubtitle(Subtitle),
    HideSubtitle,
    ShowSticker(Sticker),
    ClearSticker,
    ShowDialog,
    HideDialog(DialogFade),
    ShowBackground(Background),
    ShowCharacter(CharacterIllustration),
    HideCharacter,
    ShowBlocker(Blocker),
    PlayMusic(Music),
    StopMusic { fade_time: f64 },
    PlaySound(Sound),
    ShowImage(Image),
    HideImage,
    ImageTween(ImageTween),
    ShowItem(Item),
    HideItem,
    CameraShake(CameraShake),
    Delay { seconds: f64 },
    PlayVideo { resource: String },
    Decision(Decision),
}

impl Command {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText(PlainText { text: text.into() })
    }

    pub fn named(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::NamedText(NamedText {
            name: name.into(),
            text: text.into(),
        })
    }

    /// Whether the command carries dialogue that belongs in a transcript.
    pub fn is_text_bearing(&self) -> bool {
        matches!(
            self,
            Self::PlainText(_) | Self::NamedText(_) | Self::ShowSticker(_)
        )
    }

    /// Variant name, used for diagnostics and display.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoOperation => "NoOperation",
            Self::PlainText(_) => "PlainText",
            Self::NamedText(_) => "NamedText",
            Self::ShowSubtitle(_) => "ShowSubtitle",
            Self::HideSubtitle => "HideSubtitle",
            Self::ShowSticker(_) => "ShowSticker",
            Self::ClearSticker => "ClearSticker",
            Self::ShowDialog => "ShowDialog",
            Self::HideDialog(_) => "HideDialog",
            Self::ShowBackground(_) => "ShowBackground",
            Self::ShowCharacter(_) => "ShowCharacter",
            Self::HideCharacter => "HideCharacter",
            Self::ShowBlocker(_) => "ShowBlocker",
            Self::PlayMusic(_) => "PlayMusic",
            Self::StopMusic { .. } => "StopMusic",
            Self::PlaySound(_) => "PlaySound",
            Self::ShowImage(_) => "ShowImage",
            Self::HideImage => "HideImage",
            Self::ImageTween(_) => "ImageTween",
            Self::ShowItem(_) => "ShowItem",
            Self::HideItem => "HideItem",
            Self::CameraShake(_) => "CameraShake",
            Self::Delay { .. } => "Delay",
            Self::PlayVideo { .. } => "PlayVideo",
            Self::Decision(_) => "Decision",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedText(t) => write!(f, "[{}] {}:{}", self.kind(), t.name, t.text),
            Self::PlainText(t) => write!(f, "[{}]{}", self.kind(), t.text),
            Self::ShowSticker(s) => write!(f, "[{}]{}", self.kind(), s.text),
            Self::Decision(d) => write!(f, "[{}] {}", self.kind(), d.options().join(";")),
            _ => write!(f, "[{}]", self.kind()),
        }
    }
}
