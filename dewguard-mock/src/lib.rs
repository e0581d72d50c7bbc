use std::error::Error;
use std::sync::Arc;

use dewguard_embedded::protocol::BANNER;
use dewguard_embedded::storage::{load_image, save_image};
use dewguard_embedded::DewController;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::{signal, time};

use crate::settings::Settings;
use crate::simulate::{SimulatedAir, SimulatedProbes};
use crate::store::FileStore;

pub mod settings;
pub mod simulate;
pub mod store;

/// Drives the engine against the simulated rig. Commands are read line by
/// line from stdin and answered on stdout; logs go to stderr.
pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let control = settings.control.to_config();
    let mut controller = DewController::new(control.clone());

    let mut store = FileStore::new(&settings.storage.path);
    match load_image(&mut store) {
        Ok(Some(image)) => match controller.import_config(&image) {
            Ok(()) => tracing::info!("Loaded configuration from {}", store.path().display()),
            Err(e) => tracing::warn!("Ignoring stored configuration: {}", e),
        },
        Ok(None) => tracing::info!("No stored configuration, using defaults"),
        Err(e) => tracing::warn!("Failed to read {}: {}", store.path().display(), e),
    }

    let mut air = SimulatedAir::new(&settings.ambient)?;
    let mut probes = SimulatedProbes::new(&settings.plant, air.temperature())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = time::interval(control.tick_period);

    println!("{BANNER}");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let outputs = controller.tick(&mut air, &mut probes);
                probes.advance(&outputs, air.temperature());

                tracing::debug!(
                    dew_point = controller.ambient().dew_point(),
                    ?outputs,
                    "Tick"
                );
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("Input closed");
                    break;
                };

                let before = controller.export_config();
                let response = controller.process_line(&line);
                if let Some(text) = response.as_str() {
                    println!("{text}");
                }

                let after = controller.export_config();
                if after != before {
                    persist(&mut store, &after);
                }
            },
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    persist(&mut store, &controller.export_config());
    Ok(())
}

fn persist(store: &mut FileStore, image: &dewguard_embedded::ConfigImage) {
    match save_image(store, image) {
        Ok(()) => tracing::debug!("Saved configuration to {}", store.path().display()),
        Err(e) => tracing::error!("Failed to save {}: {}", store.path().display(), e),
    }
}
