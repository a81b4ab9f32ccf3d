/// Text projection — renders a command sequence as a plain dialogue
/// transcript.
///
/// Only text-bearing commands and decisions produce output. Decision
/// options are written as `[label]` lines followed by their branch text,
/// tab-indented. A blank line marks a scene change: the dialog box was
/// hidden and a new background or character was shown before the next
/// line of dialogue.

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::command::Command;

/// Render a transcript of `commands`.
pub fn render(commands: &[Command]) -> String {
    let mut out = String::new();
    render_into(commands, &mut out, false);
    out
}

fn render_into(commands: &[Command], out: &mut String, in_decision: bool) {
    let shown: Vec<usize> = commands
        .iter()
        .enumerate()
        .filter(|(_, command)| command.is_text_bearing() || matches!(command, Command::Decision(_)))
        .map(|(i, _)| i)
        .collect();

    for (position, &index) in shown.iter().enumerate() {
        let command = &commands[index];
        if in_decision {
            out.push('\t');
        }

        match command {
            Command::NamedText(t) => push_line(out, &format!("{}: {}", t.name, t.text)),
            Command::ShowSticker(s) => push_line(out, strip_markup(&s.text)),
            Command::PlainText(t) => push_line(out, &t.text),
            Command::Decision(decision) => {
                out.push('\n');
                for (option, branch) in decision.iter() {
                    push_line(out, &format!("[{}]", option));
                    render_into(branch, out, true);
                }
                let next_is_decision = shown
                    .get(position + 1)
                    .is_some_and(|&next| matches!(commands[next], Command::Decision(_)));
                if !next_is_decision {
                    out.push('\n');
                }
                continue;
            }
            _ => {}
        }

        if is_scene_change(&commands[index + 1..]) {
            out.push('\n');
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Whether the commands between this line and the next text-bearing one
/// hide the dialog box and bring in a new background or character, with
/// no decision in between.
fn is_scene_change(following: &[Command]) -> bool {
    let mut hides_dialog = false;
    let mut changes_stage = false;
    for command in following.iter().take_while(|c| !c.is_text_bearing()) {
        match command {
            Command::Decision(_) => return false,
            Command::HideDialog(_) => hides_dialog = true,
            Command::ShowBackground(_) | Command::ShowCharacter(_) => changes_stage = true,
            _ => {}
        }
    }
    hides_dialog && changes_stage
}

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<.*>(.*)</.*>").expect("markup pattern is valid"))
}

/// Inner text of `<tag>text</tag>`, or the input unchanged.
pub fn strip_markup(text: &str) -> &str {
    markup_pattern()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or(text, |inner| inner.as_str())
}
