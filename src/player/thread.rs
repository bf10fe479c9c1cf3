use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::config::Settings;
use crate::state::StateStore;

use super::core::EngineCore;
use super::types::PlayerCmd;

/// Spawn the engine thread: the single serialization point for commands and
/// device events. Between commands it polls the device (`tick`), which also
/// fires due deferred navigation loads.
pub(super) fn spawn_engine_thread(
    settings: Settings,
    store: Arc<StateStore>,
    rx: Receiver<PlayerCmd>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let poll = Duration::from_millis(settings.engine.poll_interval_ms.max(1));
        let mut core = EngineCore::new(settings, store);

        loop {
            match rx.recv_timeout(poll) {
                Ok(PlayerCmd::Quit) => break,
                Ok(cmd) => core.handle_cmd(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            // Runs after every command as well as on idle, so a steady
            // command stream cannot starve deferred loads or end-of-track
            // detection.
            core.tick();
        }

        core.teardown();
        debug!("engine thread exited");
    })
}
