//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hostpipe::dispatch::HostQueue;
use hostpipe::{Host, ListenerState, ObjectRef, PipeModule, Position, StateSnapshot};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// In-memory scene standing in for the embedded host.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub names: HashMap<String, ObjectRef>,
    pub positions: HashMap<ObjectRef, Position>,
}

impl FakeHost {
    pub fn with_objects(names: &[&str]) -> Self {
        let mut host = Self::default();
        for (index, name) in names.iter().enumerate() {
            let object = ObjectRef(index as u64 + 1);
            host.names.insert(name.to_string(), object);
            host.positions.insert(object, Position::default());
        }
        host
    }

    pub fn position_of(&self, name: &str) -> Option<Position> {
        self.names
            .get(name)
            .and_then(|object| self.positions.get(object))
            .copied()
    }
}

impl Host for FakeHost {
    fn host_state(&self) -> StateSnapshot {
        StateSnapshot {
            scene: "TestScene".to_string(),
            time: 12.5,
            fps: 60.0,
            screen_width: 1920,
            screen_height: 1080,
            platform: "LinuxPlayer".to_string(),
        }
    }

    fn find_object(&self, name: &str) -> Option<ObjectRef> {
        self.names.get(name).copied()
    }

    fn set_object_position(&mut self, object: ObjectRef, position: Position) {
        self.positions.insert(object, position);
    }
}

/// Drain `queue` against `host` every few milliseconds, like a frame loop.
pub fn spawn_host_loop(queue: HostQueue, host: Arc<Mutex<FakeHost>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            {
                let mut host = host.lock().unwrap();
                queue.drain_and_run_all(&mut *host);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
}

/// Socket path inside a fresh temp directory.
pub fn channel_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

/// Wait until the listener accepts connections.
pub async fn wait_listening(module: &PipeModule) {
    let mut state = module.watch_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|state| *state == ListenerState::Listening),
    )
    .await
    .expect("listener never reached Listening")
    .unwrap();
}
