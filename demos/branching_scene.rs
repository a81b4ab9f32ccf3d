/// Branching Scene example — parses a short rooftop scene with one decision.
///
/// Prints the scene header, the command listing, every decision branch and
/// finally the dialogue transcript.
///
/// Run with: cargo run --example branching_scene

use story_script::core::reader::{ReaderOptions, StoryReader};
use story_script::schema::command::Command;

fn main() {
    let script = std::fs::read_to_string("demos/data/sample_scene.txt")
        .expect("Failed to read sample scene");

    let options = ReaderOptions {
        nickname: "Doctor".to_string(),
        convert_popup_dialog: true,
    };
    let reader = StoryReader::new(&script, options).expect("Sample scene is blank");
    let scene = reader.read_scene().expect("Failed to parse sample scene");

    println!("========================================");
    println!("   {}", scene.comment());
    println!(
        "   skippable: {} | autoable: {} | fit: {}",
        scene.is_skippable(),
        scene.is_autoable(),
        scene.fit_mode()
    );
    println!("========================================");
    println!();

    println!("--- Commands ({}) ---", scene.len());
    for (i, command) in scene.iter().enumerate() {
        println!("{:>3}. {}", i + 1, command);
    }
    println!();

    for command in &scene {
        if let Command::Decision(decision) = command {
            println!("--- Decision with {} options ---", decision.len());
            for (option, branch) in decision.iter() {
                println!("[{}]", option);
                for step in branch {
                    println!("    {}", step);
                }
            }
            println!();
        }
    }

    println!("--- Transcript ---");
    print!("{}", scene.story_text());
}
