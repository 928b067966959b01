//! Ashen - headless driver for the combat and progression simulation
//!
//! Loads settings and content, restores or creates the player, and plays a
//! scripted session for the requested number of seconds (default 120).

mod save;
mod session;
mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use ashen_game::ContentCatalog;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::save::SaveSlots;
use crate::session::Session;
use crate::settings::GameSettings;

const CONTENT: &str = include_str!("../data/content.json");

/// Host frame length fed to the clock
const FRAME: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Ashen...");

    let seconds = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<f32>()
            .with_context(|| format!("Invalid session length {:?}", arg))?,
        None => 120.0,
    };

    let settings = GameSettings::load();
    if let Err(e) = settings.save() {
        warn!("Could not write settings: {}", e);
    }

    let catalog = Arc::new(ContentCatalog::from_json(CONTENT).context("Failed to load content")?);
    let slots = SaveSlots::open(save::default_save_dir())?;
    let mut session = Session::new(&settings, catalog, slots, "Ash")?;

    let frames = (seconds.max(0.0) / FRAME).ceil() as u64;
    for _ in 0..frames {
        session.update(FRAME)?;
    }
    session.shutdown()
}
