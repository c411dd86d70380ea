//! gridtone - grid synthesizer in the terminal
//!
//! The library's audio engine driven from the keyboard: move a cursor over
//! the note grid, toggle cells, arpeggiate, and tweak the effects live.
//!
//! Run with: cargo run

mod app;
mod ui;

use app::Gridtone;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    Gridtone::new().run()
}
