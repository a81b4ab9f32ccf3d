/// Story Text — prints the dialogue transcript of a story script.
///
/// Usage: story_text <script> [--nickname <name>] [--convert-popups] [--config <ron>] [--ron]

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use story_script::core::reader::{read_scene, ReaderOptions};

#[derive(Debug, Parser)]
#[command(name = "story_text", about = "Render a story script as a dialogue transcript")]
struct Args {
    /// Script file to read.
    script: PathBuf,
    /// Value substituted for `{@nickname}`.
    #[arg(long)]
    nickname: Option<String>,
    /// Keep popup dialog text as plain lines.
    #[arg(long)]
    convert_popups: bool,
    /// Reader options in RON; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dump the parsed scene as RON instead of the transcript.
    #[arg(long)]
    ron: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => match ReaderOptions::load_from_ron(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("ERROR: Failed to load options {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ReaderOptions::default(),
    };
    if let Some(nickname) = args.nickname {
        options.nickname = nickname;
    }
    options.convert_popup_dialog |= args.convert_popups;

    let script = match std::fs::read_to_string(&args.script) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("ERROR: Cannot read {}: {}", args.script.display(), e);
            process::exit(1);
        }
    };

    let scene = match read_scene(&script, options) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("ERROR: {}: {}", args.script.display(), e);
            process::exit(1);
        }
    };

    if args.ron {
        match ron::ser::to_string_pretty(&scene, ron::ser::PrettyConfig::default()) {
            Ok(dump) => println!("{}", dump),
            Err(e) => {
                eprintln!("ERROR: Serialization failed: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", scene.story_text());
    }
}
