/// Command dispatcher — turns one script line into one command.

use thiserror::Error;

use crate::core::defaults::{self, DefaultTable};
use crate::core::pattern::{AttributeError, Attributes, LineShape, TagBody, TagKind, TagLine};
use crate::schema::command::{
    Background, Blocker, CameraShake, CharacterIllustration, CharacterSlot, Command, DialogFade,
    EnterStyle, Image, ImageTween, Item, Music, MusicTrack, Sound, Sticker, Subtitle,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unrecognized line {line}: \"{text}\"")]
    UnrecognizedLine { line: usize, text: String },
    #[error("line {line}: {source}")]
    Attribute {
        line: usize,
        #[source]
        source: AttributeError,
    },
}

/// Maps script lines to [`Command`]s.
///
/// Blank and comment lines are the caller's business: any line that is
/// not structural becomes plain text here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDispatcher {
    convert_popup_dialog: bool,
}

impl CommandDispatcher {
    /// With `convert_popup_dialog` set, `[PopupDialog(...)] text` becomes a
    /// plain text line; otherwise popups are dropped as no-ops.
    pub fn new(convert_popup_dialog: bool) -> Self {
        Self {
            convert_popup_dialog,
        }
    }

    /// Parse one line. `line_number` (1-based) is only used in errors.
    pub fn parse_line(&self, line: &str, line_number: usize) -> Result<Command, DispatchError> {
        let command = match LineShape::classify(line) {
            LineShape::Tag(tag) => self
                .parse_tag(&tag)
                .map_err(|source| DispatchError::Attribute {
                    line: line_number,
                    source,
                })?
                .ok_or_else(|| unrecognized(line, line_number))?,
            LineShape::Malformed => return Err(unrecognized(line, line_number)),
            LineShape::Text(_) | LineShape::Blank | LineShape::Comment => Command::plain(line),
        };

        tracing::trace!(line = line_number, kind = command.kind(), "dispatched line");
        Ok(command)
    }

    /// `Ok(None)` when the tag (or its shape) is not a known command.
    pub fn parse_tag(&self, tag: &TagLine<'_>) -> Result<Option<Command>, AttributeError> {
        let Some(kind) = tag.kind else {
            return Ok(None);
        };

        let command = match (kind, tag.body) {
            (TagKind::StopMusic, TagBody::Bare) => Command::StopMusic {
                fade_time: defaults::STOP_MUSIC.number("fadetime"),
            },
            (TagKind::StopMusic, TagBody::Call(_)) => Command::StopMusic {
                fade_time: tag
                    .attributes()?
                    .number_or("fadetime", &defaults::STOP_MUSIC)?,
            },
            (TagKind::PlayMusic, TagBody::Call(_)) => play_music(&tag.attributes()?)?,
            (TagKind::Delay, TagBody::Bare) => Command::Delay {
                seconds: defaults::DELAY.number("time"),
            },
            (TagKind::Delay, TagBody::Call(_)) => Command::Delay {
                seconds: tag.attributes()?.number_or("time", &defaults::DELAY)?,
            },
            (TagKind::Name, TagBody::Assign(name)) => Command::named(name, tag.trailing_text()),
            (TagKind::Character, TagBody::Call(_)) => show_character(&tag.attributes()?)?,
            (TagKind::Character, TagBody::Bare) => Command::HideCharacter,
            (TagKind::Dialog, TagBody::Bare | TagBody::Call(_)) => {
                let attrs = tag.attributes()?;
                Command::HideDialog(DialogFade {
                    fade_time: attrs.number_or("fadetime", &defaults::DIALOG)?,
                    block: attrs.flag("block")?,
                })
            }
            (TagKind::Blocker, TagBody::Call(_)) => show_blocker(&tag.attributes()?)?,
            (TagKind::Background, TagBody::Call(_)) => show_background(&tag.attributes()?)?,
            (TagKind::Subtitle, TagBody::Call(_)) => show_subtitle(&tag.attributes()?)?,
            (TagKind::Subtitle, TagBody::Bare) => Command::HideSubtitle,
            (TagKind::PlaySound, TagBody::Call(_)) => play_sound(&tag.attributes()?)?,
            (TagKind::Image, TagBody::Call(_)) => show_image(&tag.attributes()?)?,
            (TagKind::Image, TagBody::Bare) => Command::HideImage,
            (TagKind::ImageTween, TagBody::Call(_)) => image_tween(&tag.attributes()?)?,
            (TagKind::ShowItem, TagBody::Call(_)) => show_item(&tag.attributes()?)?,
            (TagKind::HideItem, TagBody::Bare) => Command::HideItem,
            (TagKind::CameraShake, TagBody::Call(_)) => camera_shake(&tag.attributes()?)?,
            (TagKind::PopupDialog, TagBody::Call(_)) => self.popup_dialog(tag),
            (TagKind::Video, TagBody::Call(_)) => Command::PlayVideo {
                resource: tag.attributes()?.string("res"),
            },
            (TagKind::Sticker, TagBody::Call(_)) => show_sticker(&tag.attributes()?)?,
            (TagKind::StickerClear, TagBody::Bare) => Command::ClearSticker,
            _ => return Ok(None),
        };

        Ok(Some(command))
    }

    fn popup_dialog(&self, tag: &TagLine<'_>) -> Command {
        let text = tag.trailing_text();
        if self.convert_popup_dialog && !text.is_empty() {
            Command::plain(text)
        } else {
            Command::NoOperation
        }
    }
}

fn unrecognized(line: &str, line_number: usize) -> DispatchError {
    DispatchError::UnrecognizedLine {
        line: line_number,
        text: line.to_string(),
    }
}

fn numbers<const N: usize>(
    attrs: &Attributes<'_>,
    table: &DefaultTable,
    keys: [&str; N],
) -> Result<[f64; N], AttributeError> {
    let mut values = [0.0; N];
    for (value, key) in values.iter_mut().zip(keys) {
        *value = attrs.number_or(key, table)?;
    }
    Ok(values)
}

fn enter_style(attrs: &Attributes<'_>, key: &str) -> Result<EnterStyle, AttributeError> {
    match attrs.get(key) {
        None => Ok(EnterStyle::default()),
        Some(value) => {
            EnterStyle::from_literal(value).ok_or_else(|| AttributeError::UnknownLiteral {
                attribute: key.to_string(),
                value: value.to_string(),
            })
        }
    }
}

fn play_music(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [volume, fade_time, delay] =
        numbers(attrs, &defaults::PLAY_MUSIC, ["volume", "fadetime", "delay"])?;
    let track = match attrs.get("intro") {
        Some(intro) => MusicTrack::IntroLoop {
            intro: intro.to_string(),
            looped: attrs.string("key"),
        },
        None => MusicTrack::Single {
            key: attrs.string("key"),
        },
    };
    Ok(Command::PlayMusic(Music {
        track,
        volume,
        fade_time,
        delay,
    }))
}

fn show_character(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let primary = CharacterSlot {
        code: attrs.string("name"),
        enter: enter_style(attrs, "enter")?,
    };
    let secondary = match attrs.get("name2").filter(|code| !code.is_empty()) {
        Some(code) => Some(CharacterSlot {
            code: code.to_string(),
            enter: enter_style(attrs, "enter2")?,
        }),
        None => None,
    };
    Ok(Command::ShowCharacter(CharacterIllustration {
        primary,
        secondary,
        fade_time: attrs.number_or("fadetime", &defaults::CHARACTER)?,
        block: attrs.flag("block")?,
        focus: attrs.integer("focus")?.unwrap_or(defaults::CHARACTER_FOCUS),
    }))
}

fn show_blocker(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [a, r, g, b, fade_time] =
        numbers(attrs, &defaults::BLOCKER, ["a", "r", "g", "b", "fadetime"])?;
    Ok(Command::ShowBlocker(Blocker {
        a,
        r,
        g,
        b,
        fade_time,
        block: attrs.flag("block")?,
    }))
}

fn show_background(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [fade_time, x_scale, y_scale, x, y] = numbers(
        attrs,
        &defaults::BACKGROUND,
        ["fadetime", "xscale", "yscale", "x", "y"],
    )?;
    Ok(Command::ShowBackground(Background {
        image: attrs.string("image"),
        screen_adapt: attrs.string("screenadapt"),
        fade_time,
        x_scale,
        y_scale,
        x,
        y,
    }))
}

fn show_subtitle(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [x, y, size, delay, width] = numbers(
        attrs,
        &defaults::SUBTITLE,
        ["x", "y", "size", "delay", "width"],
    )?;
    Ok(Command::ShowSubtitle(Subtitle {
        text: attrs.string("text"),
        x,
        y,
        alignment: attrs.string("alignment"),
        size,
        delay,
        width,
    }))
}

fn show_sticker(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [x, y, size, delay, width] = numbers(
        attrs,
        &defaults::STICKER,
        ["x", "y", "size", "delay", "width"],
    )?;
    Ok(Command::ShowSticker(Sticker {
        id: attrs.string("id"),
        text: attrs.string("text"),
        x,
        y,
        alignment: attrs.string("alignment"),
        size,
        delay,
        width,
    }))
}

fn play_sound(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [volume, delay] = numbers(attrs, &defaults::PLAY_SOUND, ["volume", "delay"])?;
    Ok(Command::PlaySound(Sound {
        key: attrs.string("key"),
        channel: attrs.string("channel"),
        volume,
        delay,
        block: attrs.flag("block")?,
        looped: attrs.flag("loop")?,
    }))
}

fn show_image(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [fade_time, x_scale, y_scale, x, y] = numbers(
        attrs,
        &defaults::IMAGE,
        ["fadetime", "xscale", "yscale", "x", "y"],
    )?;
    Ok(Command::ShowImage(Image {
        image: attrs.string("image"),
        screen_adapt: attrs.string("screenadapt"),
        fade_time,
        block: attrs.flag("block")?,
        tiled: attrs.flag("tiled")?,
        x_scale,
        y_scale,
        x,
        y,
    }))
}

fn image_tween(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [fade_time, duration] =
        numbers(attrs, &defaults::IMAGE_TWEEN, ["fadetime", "duration"])?;
    let [x_scale_from, y_scale_from, x_scale_to, y_scale_to] = numbers(
        attrs,
        &defaults::IMAGE_TWEEN,
        ["xscalefrom", "yscalefrom", "xscaleto", "yscaleto"],
    )?;
    let [x_from, y_from, x_to, y_to] =
        numbers(attrs, &defaults::IMAGE_TWEEN, ["xfrom", "yfrom", "xto", "yto"])?;
    Ok(Command::ImageTween(ImageTween {
        image: attrs.string("image"),
        block: attrs.flag("block")?,
        fade_time,
        duration,
        x_scale_from,
        y_scale_from,
        x_scale_to,
        y_scale_to,
        x_from,
        y_from,
        x_to,
        y_to,
    }))
}

fn show_item(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    Ok(Command::ShowItem(Item {
        image: attrs.string("image"),
        block: attrs.flag("block")?,
        fade_time: attrs.number_or("fadetime", &defaults::SHOW_ITEM)?,
        fade_style: attrs.string("fadestyle"),
        offset_x: attrs.number_or("offsetx", &defaults::SHOW_ITEM)?,
    }))
}

fn camera_shake(attrs: &Attributes<'_>) -> Result<Command, AttributeError> {
    let [duration, x_strength, y_strength, vibrato, randomness] = numbers(
        attrs,
        &defaults::CAMERA_SHAKE,
        ["duration", "xstrength", "ystrength", "vibrato", "randomness"],
    )?;
    Ok(Command::CameraShake(CameraShake {
        duration,
        x_strength,
        y_strength,
        vibrato,
        randomness,
        fade_out: attrs.flag("fadeout")?,
        block: attrs.flag("block")?,
        stop: attrs.flag("stop")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        CommandDispatcher::default().parse_line(line, 1).unwrap()
    }

    #[test]
    fn omitted_attributes_take_documented_defaults() {
        let cases: Vec<(&str, Command)> = vec![
            ("[stopmusic]", Command::StopMusic { fade_time: 0.0 }),
            ("[stopmusic()]", Command::StopMusic { fade_time: 0.0 }),
            (
                r#"[playMusic(key="m_bat")]"#,
                Command::PlayMusic(Music {
                    track: MusicTrack::Single {
                        key: "m_bat".to_string(),
                    },
                    volume: 0.4,
                    fade_time: 0.0,
                    delay: 0.0,
                }),
            ),
            ("[Delay]", Command::Delay { seconds: 0.0 }),
            ("[Delay()]", Command::Delay { seconds: 0.0 }),
            (
                r#"[Character(name="char_002_amiya_1#1")]"#,
                Command::ShowCharacter(CharacterIllustration {
                    primary: CharacterSlot {
                        code: "char_002_amiya_1#1".to_string(),
                        enter: EnterStyle::None,
                    },
                    secondary: None,
                    fade_time: 0.15,
                    block: false,
                    focus: 1,
                }),
            ),
            (
                "[dialog]",
                Command::HideDialog(DialogFade {
                    fade_time: 0.0,
                    block: false,
                }),
            ),
            (
                "[Blocker()]",
                Command::ShowBlocker(Blocker {
                    a: 1.0,
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                    fade_time: 0.2,
                    block: false,
                }),
            ),
            (
                r#"[Background(image="bg_corridor")]"#,
                Command::ShowBackground(Background {
                    image: "bg_corridor".to_string(),
                    screen_adapt: String::new(),
                    fade_time: 0.15,
                    x_scale: 0.0,
                    y_scale: 0.0,
                    x: 0.0,
                    y: 0.0,
                }),
            ),
            (
                r#"[Subtitle(text="Lungmen, 1097")]"#,
                Command::ShowSubtitle(Subtitle {
                    text: "Lungmen, 1097".to_string(),
                    x: 0.0,
                    y: 0.0,
                    alignment: String::new(),
                    size: 18.0,
                    delay: 0.0,
                    width: 675.0,
                }),
            ),
            (
                r#"[PlaySound(key="$d_gen_walk_n")]"#,
                Command::PlaySound(Sound {
                    key: "$d_gen_walk_n".to_string(),
                    channel: String::new(),
                    volume: 0.5,
                    delay: 0.0,
                    block: false,
                    looped: false,
                }),
            ),
            (
                r#"[image(image="avg_img_01")]"#,
                Command::ShowImage(Image {
                    image: "avg_img_01".to_string(),
                    screen_adapt: String::new(),
                    fade_time: 0.15,
                    block: false,
                    tiled: false,
                    x_scale: 0.0,
                    y_scale: 0.0,
                    x: 0.0,
                    y: 0.0,
                }),
            ),
            (
                r#"[imageTween(image="avg_img_01")]"#,
                Command::ImageTween(ImageTween {
                    image: "avg_img_01".to_string(),
                    block: false,
                    fade_time: 0.0,
                    duration: 0.0,
                    x_scale_from: 0.0,
                    y_scale_from: 0.0,
                    x_scale_to: 0.0,
                    y_scale_to: 0.0,
                    x_from: 0.0,
                    y_from: 0.0,
                    x_to: 0.0,
                    y_to: 0.0,
                }),
            ),
            (
                r#"[ShowItem(image="item_letter")]"#,
                Command::ShowItem(Item {
                    image: "item_letter".to_string(),
                    block: false,
                    fade_time: 0.15,
                    fade_style: String::new(),
                    offset_x: 0.0,
                }),
            ),
            (
                "[CameraShake()]",
                Command::CameraShake(CameraShake {
                    duration: -1.0,
                    x_strength: 0.0,
                    y_strength: 0.0,
                    vibrato: 30.0,
                    randomness: 90.0,
                    fade_out: false,
                    block: false,
                    stop: false,
                }),
            ),
            (
                r#"[Sticker(id="st1", text="<i>Day 1</i>")]"#,
                Command::ShowSticker(Sticker {
                    id: "st1".to_string(),
                    text: "<i>Day 1</i>".to_string(),
                    x: 0.0,
                    y: 0.0,
                    alignment: String::new(),
                    size: 18.0,
                    delay: 0.0,
                    width: 675.0,
                }),
            ),
        ];

        for (line, expected) in cases {
            assert_eq!(parse(line), expected, "defaults for {line}");
        }
    }

    #[test]
    fn explicit_attributes_override_defaults() {
        let cmd = parse(r#"[Blocker(a=0.5, r=1, g=0.2, b=0, fadetime=2, block=true)]"#);
        assert_eq!(
            cmd,
            Command::ShowBlocker(Blocker {
                a: 0.5,
                r: 1.0,
                g: 0.2,
                b: 0.0,
                fade_time: 2.0,
                block: true,
            })
        );
    }

    #[test]
    fn play_music_with_intro_and_loop() {
        let cmd = parse(r#"[playMusic(intro="$m_intro", key="$m_loop", volume=0.8)]"#);
        assert_eq!(
            cmd,
            Command::PlayMusic(Music {
                track: MusicTrack::IntroLoop {
                    intro: "$m_intro".to_string(),
                    looped: "$m_loop".to_string(),
                },
                volume: 0.8,
                fade_time: 0.0,
                delay: 0.0,
            })
        );
    }

    #[test]
    fn two_characters_with_focus_and_enter_styles() {
        let cmd = parse(concat!(
            r#"[Character(name="avg_npc_142#1",name2="char_455_nothing_1#3","#,
            r#"enter2="right",fadetime=1, focus=2)]"#,
        ));
        let Command::ShowCharacter(c) = cmd else {
            panic!("expected ShowCharacter");
        };
        assert_eq!(c.primary.code, "avg_npc_142#1");
        assert_eq!(c.primary.enter, EnterStyle::None);
        let secondary = c.secondary.expect("second slot");
        assert_eq!(secondary.code, "char_455_nothing_1#3");
        assert_eq!(secondary.enter, EnterStyle::Right);
        assert_eq!(c.fade_time, 1.0);
        assert_eq!(c.focus, 2);
    }

    #[test]
    fn bare_and_call_forms_differ() {
        assert_eq!(parse("[character]"), Command::HideCharacter);
        assert_eq!(parse("[subtitle]"), Command::HideSubtitle);
        assert_eq!(parse("[image]"), Command::HideImage);
        assert_eq!(parse("[hideitem]"), Command::HideItem);
        assert_eq!(parse("[stickerclear]"), Command::ClearSticker);
        assert!(matches!(parse("[Character()]"), Command::ShowCharacter(_)));
    }

    #[test]
    fn named_text_takes_trailing_text() {
        assert_eq!(
            parse(r#"[name="Amiya"]   Doctor, we're almost there."#),
            Command::named("Amiya", "Doctor, we're almost there.")
        );
        assert_eq!(parse(r#"[name="???"]"#), Command::named("???", ""));
    }

    #[test]
    fn non_structural_lines_are_plain_text() {
        assert_eq!(parse("The wind howls."), Command::plain("The wind howls."));
    }

    #[test]
    fn video_resource() {
        assert_eq!(
            parse(r#"[Video(res="ep01_opening")]"#),
            Command::PlayVideo {
                resource: "ep01_opening".to_string()
            }
        );
    }

    #[test]
    fn popup_dialog_is_gated() {
        let line = r#"[PopupDialog(key="tip")] Use your skills wisely."#;
        assert_eq!(parse(line), Command::NoOperation);
        let converting = CommandDispatcher::new(true);
        assert_eq!(
            converting.parse_line(line, 1).unwrap(),
            Command::plain("Use your skills wisely.")
        );
        assert_eq!(
            converting.parse_line(r#"[PopupDialog(key="tip")]"#, 1).unwrap(),
            Command::NoOperation
        );
    }

    #[test]
    fn unknown_tags_fail_with_line_number() {
        let err = CommandDispatcher::default()
            .parse_line(r#"[charslot(slot="m")]"#, 42)
            .unwrap_err();
        match err {
            DispatchError::UnrecognizedLine { line, text } => {
                assert_eq!(line, 42);
                assert_eq!(text, r#"[charslot(slot="m")]"#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn known_tag_in_wrong_shape_is_unrecognized() {
        let dispatcher = CommandDispatcher::default();
        for line in ["[Background]", "[playMusic]", "[hideitem(x=1)]", "[name]", "[Blocker(a=1"] {
            assert!(
                matches!(
                    dispatcher.parse_line(line, 3),
                    Err(DispatchError::UnrecognizedLine { line: 3, .. })
                ),
                "{line} should be unrecognized"
            );
        }
    }

    #[test]
    fn structural_tags_are_not_commands() {
        let dispatcher = CommandDispatcher::default();
        assert!(dispatcher
            .parse_line(r#"[HEADER(key="x")] title"#, 1)
            .is_err());
        assert!(dispatcher
            .parse_line(r#"[Predicate(references="1")]"#, 1)
            .is_err());
    }

    #[test]
    fn malformed_literals_carry_line_and_attribute() {
        let err = CommandDispatcher::default()
            .parse_line("[Delay(time=soon)]", 7)
            .unwrap_err();
        match err {
            DispatchError::Attribute { line, source } => {
                assert_eq!(line, 7);
                assert_eq!(
                    source,
                    AttributeError::MalformedNumber {
                        attribute: "time".to_string(),
                        value: "soon".to_string(),
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            CommandDispatcher::default().parse_line("[PlaySound(key=\"k\", loop=maybe)]", 2),
            Err(DispatchError::Attribute { line: 2, .. })
        ));
        assert!(matches!(
            CommandDispatcher::default().parse_line("[Character(name=\"a\", enter=\"up\")]", 2),
            Err(DispatchError::Attribute { line: 2, .. })
        ));
    }
}
