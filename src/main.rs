// src/main.rs

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;

use wavedit::config::EditorConfig;
use wavedit::editor_controller::EditorController;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let track_path = args.get(1).cloned();

    let config = EditorConfig::load_or_default("wavedit.json")?;
    let mut editor = EditorController::new(config, track_path)?;

    println!(
        "[SPACE] Play/Pause | [←/→] Seek | [↑/↓] Volume | [E/C/R] Effects | \
         [G] Region | [D] Clear | [+/-] Zoom | [W] Export | [Q] Quit"
    );

    enable_raw_mode()?;

    // The poll timeout doubles as the position-sync interval.
    let tick = Duration::from_millis(editor.ui_tick_ms());

    // Initial draw
    editor.run_tick()?;

    loop {
        if event::poll(tick)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind == KeyEventKind::Press {
                    if ev.code == KeyCode::Char('c')
                        && ev.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }

                    if editor.should_quit(ev.code) {
                        break;
                    }

                    editor.handle_key(ev.code, ev.modifiers);
                    // Immediate redraw on input for responsiveness.
                    editor.run_tick()?;
                    continue;
                }
            }
        }

        editor.run_tick()?;
    }

    disable_raw_mode()?;
    println!("\nbye.");
    Ok(())
}
