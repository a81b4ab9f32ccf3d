/// Scene assembler — drives the scanner and builds the command tree.
///
/// Header lines fill the scene metadata, decision blocks are rebuilt
/// through [`DecisionBuilder`], and everything else goes to the
/// [`CommandDispatcher`].

use regex::Regex;
use std::sync::OnceLock;

use crate::core::decision::{DecisionBuilder, Pivot};
use crate::core::dispatcher::{CommandDispatcher, DispatchError};
use crate::core::pattern::{LineShape, TagKind, TagLine};
use crate::core::reader::ReaderError;
use crate::core::scanner::LineScanner;
use crate::schema::command::{Command, Decision};
use crate::schema::scene::{Scene, SceneHeader};

pub struct SceneAssembler<'a> {
    scanner: LineScanner<'a>,
    dispatcher: CommandDispatcher,
}

impl<'a> SceneAssembler<'a> {
    pub fn new(text: &'a str, dispatcher: CommandDispatcher) -> Self {
        Self {
            scanner: LineScanner::new(text),
            dispatcher,
        }
    }

    pub fn assemble(mut self) -> Result<Scene, ReaderError> {
        let mut scene = Scene::default();
        let mut header_recorded = false;
        let mut commands = Vec::new();

        while let Some(line) = self.scanner.next_line() {
            let line_number = self.scanner.line_number();
            if !header_recorded && declares_tutorial(line) {
                return Err(ReaderError::TutorialUnsupported { line: line_number });
            }
            let tag = match LineShape::classify(line) {
                LineShape::Blank | LineShape::Comment => continue,
                LineShape::Tag(tag) => tag,
                LineShape::Text(_) | LineShape::Malformed => {
                    commands.push(self.dispatcher.parse_line(line, line_number)?);
                    continue;
                }
            };

            match tag.kind {
                Some(TagKind::Header) if !header_recorded => {
                    read_header(&tag, line_number, scene.header_mut())?;
                    header_recorded = true;
                }
                Some(TagKind::Predicate) => {
                    return Err(ReaderError::StrayPredicate { line: line_number });
                }
                Some(TagKind::Decision) => {
                    let decision = self.read_decision(&tag, line, line_number)?;
                    commands.push(Command::Decision(decision));
                }
                _ => commands.push(self.dispatcher.parse_line(line, line_number)?),
            }
        }

        scene.set_commands(commands);
        Ok(scene)
    }

    /// Consume lines up to and including the closing predicate of the
    /// decision opened by `tag`.
    fn read_decision(
        &mut self,
        tag: &TagLine<'_>,
        line: &str,
        open_line: usize,
    ) -> Result<Decision, ReaderError> {
        let attrs = tag.attributes().map_err(|source| DispatchError::Attribute {
            line: open_line,
            source,
        })?;
        let (Some(options), Some(values)) = (attrs.list("options"), attrs.list("values")) else {
            return Err(unrecognized(line, open_line));
        };
        let mut builder = DecisionBuilder::new(
            options.into_iter().map(String::from).collect(),
            values.into_iter().map(String::from).collect(),
        )
        .map_err(|source| ReaderError::Decision {
            line: open_line,
            source,
        })?;
        tracing::debug!(line = open_line, options = ?builder.options(), "decision opened");

        loop {
            let Some(line) = self.scanner.next_line() else {
                return Err(ReaderError::UnterminatedDecision { line: open_line });
            };
            let line_number = self.scanner.line_number();

            match LineShape::classify(line) {
                LineShape::Blank | LineShape::Comment => {}
                LineShape::Tag(inner) if inner.kind == Some(TagKind::Predicate) => {
                    let attrs = inner.attributes().map_err(|source| DispatchError::Attribute {
                        line: line_number,
                        source,
                    })?;
                    let references = attrs
                        .list("references")
                        .ok_or_else(|| unrecognized(line, line_number))?;
                    let pivot = builder
                        .pivot(&references)
                        .map_err(|source| ReaderError::Decision {
                            line: line_number,
                            source,
                        })?;
                    if pivot == Pivot::Close {
                        break;
                    }
                }
                LineShape::Tag(inner) if inner.kind == Some(TagKind::Decision) => {
                    let nested = self.read_decision(&inner, line, line_number)?;
                    builder.push(Command::Decision(nested));
                }
                _ => builder.push(self.dispatcher.parse_line(line, line_number)?),
            }
        }

        tracing::debug!(line = open_line, "decision closed");
        Ok(builder.into_decision())
    }
}

fn unrecognized(line: &str, line_number: usize) -> ReaderError {
    ReaderError::Dispatch(DispatchError::UnrecognizedLine {
        line: line_number,
        text: line.to_string(),
    })
}

fn tutorial_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)^\[header\s*\(.*\bis_tutorial\s*=\s*"?true\b"#)
            .expect("tutorial pattern is valid")
    })
}

/// Raw check for `is_tutorial=true` on a header line. Runs before the
/// argument list is parsed, so malformed sibling fields cannot hide it.
fn declares_tutorial(line: &str) -> bool {
    tutorial_pattern().is_match(line)
}

/// Fill `header` from a `[HEADER(...)] comment` line.
fn read_header(
    tag: &TagLine<'_>,
    line: usize,
    header: &mut SceneHeader,
) -> Result<(), ReaderError> {
    let attrs = tag
        .attributes()
        .map_err(|source| DispatchError::Attribute { line, source })?;
    let flag = |key: &str| {
        attrs
            .flag(key)
            .map_err(|source| DispatchError::Attribute { line, source })
    };

    header.skippable = flag("is_skippable")?;
    header.autoable = flag("is_autoable")?;
    header.fit_mode = attrs.string("fit_mode");
    header.comment = tag.trailing_text().to_string();
    tracing::debug!(line, ?header, "header read");
    Ok(())
}
