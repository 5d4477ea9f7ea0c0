// src/bounce_main.rs
//
// Headless surface: decode a file, optionally apply a saved effect preset,
// render the chain offline and write a PCM16 WAV. Shares the whole core with
// the interactive editor, so the two surfaces cannot drift apart.

use anyhow::{bail, Context};

use wavedit::config::EditorConfig;
use wavedit::decoder;
use wavedit::session::export::{default_export_path, export_to_wav};
use wavedit::session::PresetManifest;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: bounce <input> [output.wav] [preset.json]");
    }
    let input = &args[1];
    let output = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| default_export_path(input));
    let preset_path = args.get(3);

    let config = EditorConfig::load_or_default("wavedit.json")?;

    let source = decoder::decode_file(input).context("loading input")?;
    println!(
        "loaded {}: {:.2}s, {} Hz, {} ch",
        input,
        source.duration_secs(),
        source.sample_rate,
        source.channels
    );

    let settings = match preset_path {
        Some(path) => {
            let preset = PresetManifest::load_from_disk(path).context("loading preset")?;
            println!("preset {path}: effects {:?}", enabled_names(&preset));
            preset.effects
        }
        None => Default::default(),
    };

    export_to_wav(&source, &settings, &output, config.export_block_frames)
        .context("rendering export")?;
    println!("wrote {output}");
    Ok(())
}

fn enabled_names(preset: &PresetManifest) -> Vec<&'static str> {
    use wavedit::effects::EffectKind;
    EffectKind::ALL
        .iter()
        .filter(|k| preset.effects.enabled(**k))
        .map(|k| k.name())
        .collect()
}
