//! Host Loop - embedding the module in a single-threaded main loop.
//!
//! This example demonstrates:
//! - Keeping the tokio runtime on a side thread while the host owns `main`
//! - Draining the work queue once per frame
//! - A custom handler next to the built-in ones
//! - Subscribing to module events
//!
//! # Running
//!
//! ```text
//! RUST_LOG=debug cargo run --example host_loop
//! cargo run --example orchestrator          # in another terminal
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hostpipe::{Host, ModuleEvent, ObjectRef, PipeModule, Position, StateSnapshot};
use tracing_subscriber::EnvFilter;

const FRAME_TIME: Duration = Duration::from_millis(16);

/// A tiny scene with named objects.
struct Scene {
    started: Instant,
    frames: u64,
    objects: HashMap<String, ObjectRef>,
    positions: HashMap<ObjectRef, Position>,
}

impl Scene {
    fn new() -> Self {
        let mut objects = HashMap::new();
        let mut positions = HashMap::new();
        for (id, name) in ["Player", "Camera", "Cube"].into_iter().enumerate() {
            let object = ObjectRef(id as u64);
            objects.insert(name.to_string(), object);
            positions.insert(object, Position::default());
        }

        Self {
            started: Instant::now(),
            frames: 0,
            objects,
            positions,
        }
    }
}

impl Host for Scene {
    fn host_state(&self) -> StateSnapshot {
        let time = self.started.elapsed().as_secs_f32();
        StateSnapshot {
            scene: "DemoScene".to_string(),
            time,
            fps: if time > 0.0 { self.frames as f32 / time } else { 0.0 },
            screen_width: 1280,
            screen_height: 720,
            platform: std::env::consts::OS.to_string(),
        }
    }

    fn find_object(&self, name: &str) -> Option<ObjectRef> {
        self.objects.get(name).copied()
    }

    fn set_object_position(&mut self, object: ObjectRef, position: Position) {
        tracing::info!("Object {:?} moved to {:?}", object, position);
        self.positions.insert(object, position);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let mut module = PipeModule::builder()
        .module_name("DemoHost")
        .handle("list_objects", |_item, ctx, host| {
            let names = ["Player", "Camera", "Cube"]
                .into_iter()
                .filter(|name| host.find_object(name).is_some())
                .collect::<Vec<_>>();
            ctx.respond_json(&names)
        })
        .build()?;

    let mut events = module.subscribe();
    runtime.spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ModuleEvent::Error(message) = event {
                tracing::warn!("Module error: {}", message);
            }
        }
    });

    let running = Arc::new(AtomicBool::new(true));
    runtime.spawn({
        let running = Arc::clone(&running);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                running.store(false, Ordering::SeqCst);
            }
        }
    });

    module.start_on(runtime.handle())?;

    let mut scene = Scene::new();
    while running.load(Ordering::SeqCst) {
        let handled = module.run_pending(&mut scene);
        if handled > 0 {
            tracing::debug!("Handled {} work item(s) on frame {}", handled, scene.frames);
        }
        scene.frames += 1;
        std::thread::sleep(FRAME_TIME);
    }

    runtime.block_on(module.stop());
    Ok(())
}
