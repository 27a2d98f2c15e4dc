mod app;
mod config;
mod error;
mod frame;
mod input;
mod lattice;
mod params;
mod render;
mod resize;
mod sim;
mod update;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
