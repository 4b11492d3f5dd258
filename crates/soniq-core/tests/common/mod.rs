// Shared test fixtures: an in-memory playback backend and scrobbler.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use soniq_core::{
    EngineCommand, EngineError, PlaybackBackend, PlaybackEngine, PlaybackQueue, Property,
    PropertyValue, QueueItem, Scrobbler,
};

/// Mimics mpv's reaction to commands: `loadfile` clears idle, `stop`
/// sets it, `cycle pause` flips pause.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    commands: Vec<EngineCommand>,
    idle: bool,
    paused: bool,
    volume: Option<f64>,
    position: Option<f64>,
    duration: Option<f64>,
    /// Takes precedence over the modelled value.
    overrides: HashMap<Property, Option<PropertyValue>>,
    hang: bool,
    reject_loads: bool,
    reads: usize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                idle: true,
                volume: Some(50.0),
                ..FakeState::default()
            }),
        })
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.lock().unwrap().commands.clear();
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.state.lock().unwrap().idle = !loaded;
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().unwrap().paused = paused;
    }

    pub fn set_volume(&self, volume: Option<f64>) {
        self.state.lock().unwrap().volume = volume;
    }

    pub fn set_position(&self, position: Option<f64>, duration: Option<f64>) {
        let mut state = self.state.lock().unwrap();
        state.position = position;
        state.duration = duration;
    }

    pub fn override_property(&self, property: Property, value: Option<PropertyValue>) {
        self.state
            .lock()
            .unwrap()
            .overrides
            .insert(property, value);
    }

    /// Never answer again.
    pub fn hang(&self) {
        self.state.lock().unwrap().hang = true;
    }

    /// Answer every `loadfile` with an error, leaving the player as is.
    pub fn reject_loads(&self) {
        self.state.lock().unwrap().reject_loads = true;
    }

    /// Property reads answered so far.
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn volume(&self) -> Option<f64> {
        self.state.lock().unwrap().volume
    }

    fn hanging(&self) -> bool {
        self.state.lock().unwrap().hang
    }
}

#[async_trait]
impl PlaybackBackend for FakeBackend {
    async fn command(&self, command: EngineCommand) -> Result<(), EngineError> {
        if self.hanging() {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock().unwrap();
        if state.reject_loads && matches!(command, EngineCommand::LoadFile(_)) {
            return Err(EngineError::CommandFailed {
                command: command.name().to_owned(),
                reason: "rejected".into(),
            });
        }
        match &command {
            EngineCommand::LoadFile(_) => state.idle = false,
            EngineCommand::Stop => state.idle = true,
            EngineCommand::CyclePause => state.paused = !state.paused,
            EngineCommand::Seek(_) | EngineCommand::Quit => {}
        }
        state.commands.push(command);
        Ok(())
    }

    async fn get_property(&self, property: Property) -> Result<Option<PropertyValue>, EngineError> {
        if self.hanging() {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if let Some(value) = state.overrides.get(&property) {
            return Ok(value.clone());
        }
        Ok(match property {
            Property::IdleActive => Some(PropertyValue::Flag(state.idle)),
            Property::Pause => Some(PropertyValue::Flag(state.paused)),
            Property::Volume => state.volume.map(PropertyValue::Double),
            Property::TimePos => state.position.map(PropertyValue::Double),
            Property::Duration => state.duration.map(PropertyValue::Double),
        })
    }

    async fn set_property(
        &self,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        match property {
            Property::Volume => state.volume = value.as_f64(),
            Property::Pause => state.paused = value.as_flag().unwrap_or(state.paused),
            _ => {}
        }
        Ok(())
    }
}

/// Records scrobble calls as `("now", id)` / `("played", id)`.
#[derive(Default)]
pub struct RecordingScrobbler {
    pub calls: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingScrobbler {
    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scrobbler for RecordingScrobbler {
    async fn now_playing(&self, entity_id: &str) {
        self.calls.lock().unwrap().push(("now", entity_id.to_owned()));
    }

    async fn played(&self, entity_id: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(("played", entity_id.to_owned()));
    }
}

pub fn item(name: &str) -> QueueItem {
    QueueItem {
        uri: format!("http://server/rest/stream?id={name}"),
        title: name.to_uppercase(),
        artist: "Artist".into(),
        duration: 180,
        entity_id: name.into(),
    }
}

pub fn engine(backend: &Arc<FakeBackend>) -> Arc<PlaybackEngine> {
    Arc::new(PlaybackEngine::new(
        Arc::clone(backend) as Arc<dyn PlaybackBackend>,
        PlaybackQueue::new(),
        Duration::from_secs(1),
    ))
}

pub async fn titles(queue: &PlaybackQueue) -> Vec<String> {
    queue.snapshot().await.into_iter().map(|i| i.title).collect()
}
