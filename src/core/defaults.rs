/// Per-command defaults for omitted numeric attributes.
///
/// Boolean flags default to `false` and string attributes to the empty
/// string everywhere, so only numbers need a table.

/// Numeric defaults for one tag. Attributes not listed default to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultTable {
    pub tag: &'static str,
    pub numbers: &'static [(&'static str, f64)],
}

impl DefaultTable {
    pub fn number(&self, attribute: &str) -> f64 {
        self.numbers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, value)| *value)
            .unwrap_or(0.0)
    }
}

pub const STOP_MUSIC: DefaultTable = DefaultTable {
    tag: "stopmusic",
    numbers: &[("fadetime", 0.0)],
};

pub const PLAY_MUSIC: DefaultTable = DefaultTable {
    tag: "playMusic",
    numbers: &[("volume", 0.4), ("fadetime", 0.0), ("delay", 0.0)],
};

pub const DELAY: DefaultTable = DefaultTable {
    tag: "Delay",
    numbers: &[("time", 0.0)],
};

pub const CHARACTER: DefaultTable = DefaultTable {
    tag: "Character",
    numbers: &[("fadetime", 0.15)],
};

/// Highlighted slot when two characters are on stage.
pub const CHARACTER_FOCUS: u32 = 1;

pub const DIALOG: DefaultTable = DefaultTable {
    tag: "dialog",
    numbers: &[("fadetime", 0.0)],
};

pub const BLOCKER: DefaultTable = DefaultTable {
    tag: "Blocker",
    numbers: &[
        ("a", 1.0),
        ("r", 0.0),
        ("g", 0.0),
        ("b", 0.0),
        ("fadetime", 0.2),
    ],
};

pub const BACKGROUND: DefaultTable = DefaultTable {
    tag: "Background",
    numbers: &[
        ("fadetime", 0.15),
        ("xscale", 0.0),
        ("yscale", 0.0),
        ("x", 0.0),
        ("y", 0.0),
    ],
};

pub const SUBTITLE: DefaultTable = DefaultTable {
    tag: "Subtitle",
    numbers: &[
        ("x", 0.0),
        ("y", 0.0),
        ("size", 18.0),
        ("delay", 0.0),
        ("width", 675.0),
    ],
};

pub const STICKER: DefaultTable = DefaultTable {
    tag: "Sticker",
    numbers: SUBTITLE.numbers,
};

pub const PLAY_SOUND: DefaultTable = DefaultTable {
    tag: "PlaySound",
    numbers: &[("volume", 0.5), ("delay", 0.0)],
};

pub const IMAGE: DefaultTable = DefaultTable {
    tag: "image",
    numbers: &[
        ("fadetime", 0.15),
        ("xscale", 0.0),
        ("yscale", 0.0),
        ("x", 0.0),
        ("y", 0.0),
    ],
};

pub const IMAGE_TWEEN: DefaultTable = DefaultTable {
    tag: "imageTween",
    numbers: &[
        ("fadetime", 0.0),
        ("duration", 0.0),
        ("xscalefrom", 0.0),
        ("yscalefrom", 0.0),
        ("xscaleto", 0.0),
        ("yscaleto", 0.0),
        ("xfrom", 0.0),
        ("yfrom", 0.0),
        ("xto", 0.0),
        ("yto", 0.0),
    ],
};

pub const SHOW_ITEM: DefaultTable = DefaultTable {
    tag: "ShowItem",
    numbers: &[("fadetime", 0.15), ("offsetx", 0.0)],
};

/// A negative duration keeps the shake running until stopped.
pub const CAMERA_SHAKE: DefaultTable = DefaultTable {
    tag: "CameraShake",
    numbers: &[
        ("duration", -1.0),
        ("xstrength", 0.0),
        ("ystrength", 0.0),
        ("vibrato", 30.0),
        ("randomness", 90.0),
    ],
};
