//! WASM bindings for story-script — powers the in-browser script viewer.

use wasm_bindgen::prelude::*;

use story_script::core::reader::{read_scene, ReaderOptions};
use story_script::schema::scene::Scene;

const SAMPLE_SCRIPT: &str = include_str!("../../demos/data/sample_scene.txt");

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct OptionsInput {
    nickname: Option<String>,
    convert_popup_dialog: bool,
}

impl From<OptionsInput> for ReaderOptions {
    fn from(input: OptionsInput) -> Self {
        ReaderOptions {
            nickname: input.nickname.unwrap_or_else(|| "Doctor".to_string()),
            convert_popup_dialog: input.convert_popup_dialog,
        }
    }
}

fn parse(script: &str, options_json: &str) -> Result<Scene, JsError> {
    let input: OptionsInput = if options_json.trim().is_empty() {
        OptionsInput::default()
    } else {
        serde_json::from_str(options_json)
            .map_err(|e| JsError::new(&format!("Invalid options JSON: {e}")))?
    };
    read_scene(script, input.into()).map_err(|e| JsError::new(&format!("Parse error: {e}")))
}

/// Parse `script` and return the scene as JSON.
///
/// `options_json` may be empty or an object with `nickname` and
/// `convert_popup_dialog`.
#[wasm_bindgen]
pub fn parse_scene_json(script: &str, options_json: &str) -> Result<String, JsError> {
    let scene = parse(script, options_json)?;
    serde_json::to_string(&scene).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

/// Parse `script` and return its dialogue transcript.
#[wasm_bindgen]
pub fn story_text(script: &str, options_json: &str) -> Result<String, JsError> {
    Ok(parse(script, options_json)?.story_text())
}

#[wasm_bindgen]
pub fn sample_script() -> String {
    SAMPLE_SCRIPT.to_string()
}
