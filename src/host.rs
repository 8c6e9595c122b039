//! Capabilities the embedded host exposes to work handlers.
//!
//! Handlers only ever see the host through [`Host`], and only on the host's
//! own thread, when it drains the [`MainThreadQueue`](crate::dispatch::MainThreadQueue).
//! Implementations therefore do not need to be `Send` or `Sync`.

use serde::{Deserialize, Serialize};

/// Snapshot of host state returned by `get_game_state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Active scene name.
    pub scene: String,
    /// Seconds since the host started.
    pub time: f32,
    pub fps: f32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub platform: String,
}

/// Opaque handle to a host-owned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub u64);

/// World-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The host collaborator.
pub trait Host {
    /// Current host state.
    fn host_state(&self) -> StateSnapshot;

    /// Look up an object by name.
    fn find_object(&self, name: &str) -> Option<ObjectRef>;

    /// Move an object previously returned by [`find_object`](Self::find_object).
    fn set_object_position(&mut self, object: ObjectRef, position: Position);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_wire_names() {
        let snapshot = StateSnapshot {
            scene: "Arena".to_string(),
            time: 1.5,
            fps: 60.0,
            screen_width: 1280,
            screen_height: 720,
            platform: "LinuxPlayer".to_string(),
        };

        let text = serde_json::to_string(&snapshot).unwrap();
        assert!(text.contains(r#""screenWidth":1280"#));
        assert!(text.contains(r#""screenHeight":720"#));
        assert!(text.contains(r#""platform":"LinuxPlayer""#));
    }
}
