/// Line-shape recognition and attribute extraction.
///
/// A structural line looks like `[Tag(key=value, key="quoted")] trailing`,
/// `[Tag] trailing` or `[Tag="value"] trailing`. The tag name is read once
/// and classified into a [`TagKind`]; attributes are parsed on demand.

use thiserror::Error;

use crate::core::defaults::DefaultTable;

/// First character of every structural line.
pub const STRUCTURAL_MARKER: char = '[';
/// Lines starting with this prefix are ignored.
pub const COMMENT_MARKER: &str = "//";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute `{attribute}`: `{value}` is not a decimal literal")]
    MalformedNumber { attribute: String, value: String },
    #[error("attribute `{attribute}`: `{value}` is not `true` or `false`")]
    MalformedBoolean { attribute: String, value: String },
    #[error("attribute `{attribute}`: `{value}` is not an unsigned integer")]
    MalformedInteger { attribute: String, value: String },
    #[error("attribute `{attribute}`: unknown value `{value}`")]
    UnknownLiteral { attribute: String, value: String },
    #[error("malformed argument list: {0}")]
    MalformedArguments(String),
}

/// Every tag name the parser knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Header,
    Decision,
    Predicate,
    StopMusic,
    PlayMusic,
    Delay,
    Name,
    Character,
    Dialog,
    Blocker,
    Background,
    Subtitle,
    PlaySound,
    Image,
    ImageTween,
    ShowItem,
    HideItem,
    CameraShake,
    PopupDialog,
    Video,
    Sticker,
    StickerClear,
}

const TAG_NAMES: &[(&str, TagKind)] = &[
    ("header", TagKind::Header),
    ("decision", TagKind::Decision),
    ("predicate", TagKind::Predicate),
    ("stopmusic", TagKind::StopMusic),
    ("playmusic", TagKind::PlayMusic),
    ("delay", TagKind::Delay),
    ("name", TagKind::Name),
    ("character", TagKind::Character),
    ("dialog", TagKind::Dialog),
    ("blocker", TagKind::Blocker),
    ("background", TagKind::Background),
    ("subtitle", TagKind::Subtitle),
    ("playsound", TagKind::PlaySound),
    ("image", TagKind::Image),
    ("imagetween", TagKind::ImageTween),
    ("showitem", TagKind::ShowItem),
    ("hideitem", TagKind::HideItem),
    ("camerashake", TagKind::CameraShake),
    ("popupdialog", TagKind::PopupDialog),
    ("video", TagKind::Video),
    ("sticker", TagKind::Sticker),
    ("stickerclear", TagKind::StickerClear),
];

impl TagKind {
    /// Case-insensitive lookup of a tag name.
    pub fn from_name(name: &str) -> Option<Self> {
        TAG_NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }
}

/// What follows the tag name inside the brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagBody<'a> {
    /// `[Tag]`
    Bare,
    /// `[Tag(...)]`, holding the raw text between the parentheses.
    Call(&'a str),
    /// `[Tag="value"]`, holding the unquoted value.
    Assign(&'a str),
}

/// A recognized structural line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLine<'a> {
    /// `None` when the name is well-formed but unknown.
    pub kind: Option<TagKind>,
    pub name: &'a str,
    pub body: TagBody<'a>,
    /// Raw text after the closing bracket.
    pub trailing: &'a str,
}

impl<'a> TagLine<'a> {
    /// Parse the argument list. Bare and assignment tags have none.
    pub fn attributes(&self) -> Result<Attributes<'a>, AttributeError> {
        match self.body {
            TagBody::Call(raw) => Attributes::parse(raw),
            TagBody::Bare | TagBody::Assign(_) => Ok(Attributes::default()),
        }
    }

    /// Trailing text with leading whitespace removed.
    pub fn trailing_text(&self) -> &'a str {
        self.trailing.trim_start()
    }
}

/// Classification of one raw script line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape<'a> {
    Blank,
    Comment,
    Text(&'a str),
    Tag(TagLine<'a>),
    /// Starts with the structural marker but has no readable tag shape.
    Malformed,
}

impl<'a> LineShape<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.starts_with(STRUCTURAL_MARKER) {
            return match parse_tag(line) {
                Some(tag) => Self::Tag(tag),
                None => Self::Malformed,
            };
        }
        if line.trim().is_empty() {
            Self::Blank
        } else if line.starts_with(COMMENT_MARKER) {
            Self::Comment
        } else {
            Self::Text(line)
        }
    }
}

fn parse_tag(line: &str) -> Option<TagLine<'_>> {
    let rest = line.strip_prefix(STRUCTURAL_MARKER)?;
    let name_end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_end == 0 {
        return None;
    }
    let name = &rest[..name_end];
    let after = rest[name_end..].trim_start();

    let (body, trailing) = if let Some(trailing) = after.strip_prefix(']') {
        (TagBody::Bare, trailing)
    } else if let Some(args) = after.strip_prefix('(') {
        let close = find_call_end(args)?;
        let trailing = args[close + 1..].trim_start().strip_prefix(']')?;
        (TagBody::Call(&args[..close]), trailing)
    } else if let Some(value) = after.strip_prefix('=') {
        let value = value.trim_start();
        if let Some(quoted) = value.strip_prefix('"') {
            let end = quoted.find("\"]")?;
            (TagBody::Assign(&quoted[..end]), &quoted[end + 2..])
        } else {
            let end = value.find(']')?;
            (TagBody::Assign(value[..end].trim()), &value[end + 1..])
        }
    } else {
        return None;
    };

    Some(TagLine {
        kind: TagKind::from_name(name),
        name,
        body,
        trailing,
    })
}

/// Byte offset of the `)` closing an argument list: the first one outside
/// quotes that is followed (after optional whitespace) by `]`.
fn find_call_end(args: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in args.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ')' if !in_quotes && args[i + 1..].trim_start().starts_with(']') => {
                return Some(i);
            }
            _ => {}
        }
    }
    None
}

/// Key/value pairs from a tag's argument list. Keys are matched
/// case-insensitively; the first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Attributes<'a> {
    /// Parse `key=value, key="quoted value", ...`.
    pub fn parse(raw: &'a str) -> Result<Self, AttributeError> {
        let mut pairs = Vec::new();
        let mut rest = raw;

        loop {
            rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            if rest.is_empty() {
                break;
            }

            let eq = rest
                .find(|c: char| c == '=' || c == ',')
                .filter(|&i| rest.as_bytes()[i] == b'=')
                .ok_or_else(|| AttributeError::MalformedArguments(raw.to_string()))?;
            let key = rest[..eq].trim();
            if key.is_empty() {
                return Err(AttributeError::MalformedArguments(raw.to_string()));
            }

            let value_start = rest[eq + 1..].trim_start();
            let (value, remainder) = if let Some(quoted) = value_start.strip_prefix('"') {
                let end = quoted
                    .find('"')
                    .ok_or_else(|| AttributeError::MalformedArguments(raw.to_string()))?;
                (&quoted[..end], &quoted[end + 1..])
            } else {
                let end = value_start.find(',').unwrap_or(value_start.len());
                (value_start[..end].trim(), &value_start[end..])
            };

            pairs.push((key, value));
            rest = remainder;
        }

        Ok(Self { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    }

    /// String attribute, empty when absent.
    pub fn string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, AttributeError> {
        self.get(key).map(|value| parse_decimal(key, value)).transpose()
    }

    /// Numeric attribute, falling back to the command's default table.
    pub fn number_or(&self, key: &str, defaults: &DefaultTable) -> Result<f64, AttributeError> {
        Ok(self.number(key)?.unwrap_or_else(|| {
            tracing::trace!(tag = defaults.tag, attribute = key, "attribute defaulted");
            defaults.number(key)
        }))
    }

    /// Boolean flag; absent flags are `false`.
    pub fn flag(&self, key: &str) -> Result<bool, AttributeError> {
        Ok(self
            .get(key)
            .map(|value| parse_boolean(key, value))
            .transpose()?
            .unwrap_or(false))
    }

    pub fn integer(&self, key: &str) -> Result<Option<u32>, AttributeError> {
        self.get(key)
            .map(|value| {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    value.parse().map_err(|_| malformed_integer(key, value))
                } else {
                    Err(malformed_integer(key, value))
                }
            })
            .transpose()
    }

    /// `;`-separated list attribute.
    pub fn list(&self, key: &str) -> Option<Vec<&'a str>> {
        self.get(key).map(|value| value.split(';').collect())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn malformed_integer(key: &str, value: &str) -> AttributeError {
    AttributeError::MalformedInteger {
        attribute: key.to_string(),
        value: value.to_string(),
    }
}

/// Unsigned decimal grammar: digits with at most one decimal point,
/// starting with a digit. No sign, no exponent.
pub fn is_decimal_literal(value: &str) -> bool {
    let mut points = 0;
    value.starts_with(|c: char| c.is_ascii_digit())
        && value.chars().all(|c| match c {
            '0'..='9' => true,
            '.' => {
                points += 1;
                points == 1
            }
            _ => false,
        })
}

pub fn parse_decimal(attribute: &str, value: &str) -> Result<f64, AttributeError> {
    let malformed = || AttributeError::MalformedNumber {
        attribute: attribute.to_string(),
        value: value.to_string(),
    };
    if !is_decimal_literal(value) {
        return Err(malformed());
    }
    value.parse().map_err(|_| malformed())
}

/// `true` or `false`, case-insensitive.
pub fn parse_boolean(attribute: &str, value: &str) -> Result<bool, AttributeError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AttributeError::MalformedBoolean {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(line: &str) -> TagLine<'_> {
        match LineShape::classify(line) {
            LineShape::Tag(tag) => tag,
            other => panic!("expected tag, got {:?}", other),
        }
    }

    #[test]
    fn classify_non_structural_lines() {
        assert_eq!(LineShape::classify(""), LineShape::Blank);
        assert_eq!(LineShape::classify("   \t"), LineShape::Blank);
        assert_eq!(LineShape::classify("// note"), LineShape::Comment);
        assert_eq!(LineShape::classify("Hello."), LineShape::Text("Hello."));
        assert_eq!(LineShape::classify(" [indented]"), LineShape::Text(" [indented]"));
    }

    #[test]
    fn classify_bare_tag() {
        let t = tag("[stopmusic]");
        assert_eq!(t.kind, Some(TagKind::StopMusic));
        assert_eq!(t.body, TagBody::Bare);
        assert_eq!(t.trailing, "");
    }

    #[test]
    fn classify_call_tag_with_trailing_text() {
        let t = tag(r#"[HEADER(key="title_test", is_skippable=true)] Prologue"#);
        assert_eq!(t.kind, Some(TagKind::Header));
        assert_eq!(t.body, TagBody::Call(r#"key="title_test", is_skippable=true"#));
        assert_eq!(t.trailing_text(), "Prologue");
    }

    #[test]
    fn classify_assign_tag() {
        let t = tag(r#"[name="Amiya"]  Doctor, are you awake?"#);
        assert_eq!(t.kind, Some(TagKind::Name));
        assert_eq!(t.body, TagBody::Assign("Amiya"));
        assert_eq!(t.trailing_text(), "Doctor, are you awake?");
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        assert_eq!(tag("[CHARACTER]").kind, Some(TagKind::Character));
        assert_eq!(tag("[character]").kind, Some(TagKind::Character));
        assert_eq!(tag("[ImageTween(image=\"x\")]").kind, Some(TagKind::ImageTween));
        assert_eq!(tag("[hideItem]").kind, Some(TagKind::HideItem));
    }

    #[test]
    fn unknown_tag_keeps_its_name() {
        let t = tag("[charslot(slot=\"m\")]");
        assert_eq!(t.kind, None);
        assert_eq!(t.name, "charslot");
    }

    #[test]
    fn malformed_structural_lines() {
        assert_eq!(LineShape::classify("["), LineShape::Malformed);
        assert_eq!(LineShape::classify("[]"), LineShape::Malformed);
        assert_eq!(LineShape::classify("[Blocker(a=1"), LineShape::Malformed);
        assert_eq!(LineShape::classify("[Blocker(a=1)"), LineShape::Malformed);
        assert_eq!(LineShape::classify("[Delay?]"), LineShape::Malformed);
    }

    #[test]
    fn parenthesis_inside_quotes_does_not_close_call() {
        let t = tag(r#"[Subtitle(text="(whispering) hello", y=300)]"#);
        let attrs = t.attributes().unwrap();
        assert_eq!(attrs.get("text"), Some("(whispering) hello"));
        assert_eq!(attrs.number("y").unwrap(), Some(300.0));
    }

    #[test]
    fn attribute_keys_are_case_insensitive() {
        let attrs = Attributes::parse(r#"xScale=1.5, FADETIME=2, image="bg_room""#).unwrap();
        assert_eq!(attrs.number("xscale").unwrap(), Some(1.5));
        assert_eq!(attrs.number("fadetime").unwrap(), Some(2.0));
        assert_eq!(attrs.string("Image"), "bg_room");
        assert_eq!(attrs.string("missing"), "");
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn quoted_values_may_contain_commas() {
        let attrs = Attributes::parse(r#"text="one, two", size=20"#).unwrap();
        assert_eq!(attrs.get("text"), Some("one, two"));
        assert_eq!(attrs.number("size").unwrap(), Some(20.0));
    }

    #[test]
    fn empty_argument_list() {
        assert!(Attributes::parse("").unwrap().is_empty());
        assert!(Attributes::parse("  ").unwrap().is_empty());
    }

    #[test]
    fn malformed_argument_lists() {
        assert!(matches!(
            Attributes::parse("justaword"),
            Err(AttributeError::MalformedArguments(_))
        ));
        assert!(matches!(
            Attributes::parse(r#"text="unterminated"#),
            Err(AttributeError::MalformedArguments(_))
        ));
        assert!(matches!(
            Attributes::parse("a, b=1"),
            Err(AttributeError::MalformedArguments(_))
        ));
    }

    #[test]
    fn decimal_grammar() {
        for ok in ["0", "7", "12", "0.5", "1.", "10.25", "007"] {
            assert!(is_decimal_literal(ok), "{ok} should be accepted");
        }
        for bad in ["", ".5", "-1", "+1", "1e3", "1.2.3", "abc", "1,5", " 1"] {
            assert!(!is_decimal_literal(bad), "{bad} should be rejected");
        }
        assert_eq!(parse_decimal("x", "1.").unwrap(), 1.0);
        assert_eq!(parse_decimal("x", "0.25").unwrap(), 0.25);
    }

    #[test]
    fn malformed_number_names_the_attribute() {
        let attrs = Attributes::parse("volume=-0.5").unwrap();
        let err = attrs.number("volume").unwrap_err();
        assert_eq!(
            err,
            AttributeError::MalformedNumber {
                attribute: "volume".to_string(),
                value: "-0.5".to_string(),
            }
        );
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn boolean_grammar() {
        let attrs = Attributes::parse("block=TRUE, loop=false, tiled=yes").unwrap();
        assert!(attrs.flag("block").unwrap());
        assert!(!attrs.flag("loop").unwrap());
        assert!(!attrs.flag("absent").unwrap());
        assert!(matches!(
            attrs.flag("tiled"),
            Err(AttributeError::MalformedBoolean { .. })
        ));
    }

    #[test]
    fn integer_and_list_attributes() {
        let attrs = Attributes::parse(r#"focus=2, options="A;B;C", bad=1.5"#).unwrap();
        assert_eq!(attrs.integer("focus").unwrap(), Some(2));
        assert_eq!(attrs.integer("absent").unwrap(), None);
        assert!(attrs.integer("bad").is_err());
        assert_eq!(attrs.list("options"), Some(vec!["A", "B", "C"]));
    }

    proptest::proptest! {
        #[test]
        fn decimal_literals_parse_to_their_value(
            whole in 0u32..100_000,
            frac in "[0-9]{0,4}",
        ) {
            let literal = format!("{whole}.{frac}");
            let expected: f64 = literal.parse().unwrap();
            proptest::prop_assert_eq!(parse_decimal("x", &literal).unwrap(), expected);
            let integral = parse_decimal("x", &whole.to_string()).unwrap();
            proptest::prop_assert_eq!(integral, f64::from(whole));
        }

        #[test]
        fn signed_or_exponent_literals_are_rejected(literal in "[-+]?[0-9]{1,4}(e[0-9])?") {
            let signed = literal.starts_with(|c: char| c == '-' || c == '+');
            let signed_or_exp = signed || literal.contains('e');
            proptest::prop_assert_eq!(is_decimal_literal(&literal), !signed_or_exp);
        }
    }
}
