//! Rejeu d'un script de gestes (JSON) dans une session
//!
//! Format :
//!
//! ```json
//! {
//!   "layer": "lines",
//!   "multipart": true,
//!   "code": "BMAD_L",
//!   "events": [
//!     {"event": "press", "x": 147.1, "y": -42.0},
//!     {"event": "move", "x": 147.2, "y": -42.1},
//!     {"event": "release"},
//!     {"event": "finish"}
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};
use sketch::{GestureOutcome, LayerRole};
use tracing::{debug, trace};

use crate::export::layer::SketchLayer;
use crate::session::DigitizingSession;

/// Événement de saisie
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum GestureEvent {
    Press { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Release,
    /// Combine les segments multi-parties
    Finish,
    /// Annule le dernier élément saisi
    Undo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayScript {
    /// Couche cible
    pub layer: LayerRole,

    #[serde(default)]
    pub multipart: bool,

    /// Code saisi au keypad
    #[serde(default)]
    pub code: String,

    pub events: Vec<GestureEvent>,
}

/// Résultat du rejeu avant enregistrement
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub discarded: usize,
    pub undone: usize,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read gesture script: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse gesture script JSON")
    }

    /// Rejoue les événements dans la session, sans enregistrer
    pub fn replay<L: SketchLayer>(&self, session: &mut DigitizingSession<L>) -> ReplayStats {
        let mut stats = ReplayStats::default();

        for event in &self.events {
            stats.events += 1;
            let outcome = match *event {
                GestureEvent::Press { x, y } => session.press(Coord { x, y }),
                GestureEvent::Move { x, y } => session.move_to(Coord { x, y }),
                GestureEvent::Release => session.release(),
                GestureEvent::Finish => {
                    session.finish();
                    continue;
                }
                GestureEvent::Undo => {
                    let removed = session.remove_last();
                    trace!(outcome = ?removed, "Undo");
                    stats.undone += 1;
                    continue;
                }
            };
            if let GestureOutcome::Discarded(reason) = outcome {
                debug!(reason = %reason, "Gesture discarded");
                stats.discarded += 1;
            }
        }
        stats
    }
}
