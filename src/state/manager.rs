//! State manager implementation
//!
//! The state-persistence collaborator of the stream reader. Holds the latest
//! state of every stream and builds the state messages that are emitted as
//! checkpoints. Optionally persists to a file with atomic writes.

use super::types::{is_sentinel_state, ConnectorState, StreamDescriptor, StreamState};
use crate::engine::Message;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for persisting and loading state
#[derive(Debug)]
pub struct StateManager {
    /// Path to the state file
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<ConnectorState>>,
    /// Whether to auto-save on every update
    auto_save: bool,
}

impl StateManager {
    /// Create a new state manager with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(ConnectorState::new())),
            auto_save: true,
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::from_state(ConnectorState::new())
    }

    /// Create an in-memory state manager seeded with existing state
    pub fn from_state(state: ConnectorState) -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
            auto_save: false,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            ConnectorState::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            auto_save: true,
        })
    }

    /// Create a state manager from inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_state(parse_state(json)?))
    }

    /// Save state to a specific file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;
        write_atomic(path.as_ref(), &contents).await
    }

    /// Load state from file
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;

        let loaded_state = parse_state(&contents)?;
        *self.state.write().await = loaded_state;

        Ok(())
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        self.save_to_file(&self.path).await
    }

    /// Get a read lock on the current state
    pub async fn state(&self) -> tokio::sync::RwLockReadGuard<'_, ConnectorState> {
        self.state.read().await
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Get the incoming state for a stream
    ///
    /// The full refresh sentinel reads back as the empty mapping.
    pub async fn get_stream_state(&self, name: &str, namespace: Option<&str>) -> StreamState {
        let state = self.state.read().await;
        state
            .get_stream(&StreamDescriptor::new(name, namespace))
            .filter(|s| !is_sentinel_state(s))
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the state of a stream
    pub async fn update_state_for_stream(
        &self,
        name: &str,
        namespace: Option<&str>,
        stream_state: StreamState,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .set_stream(StreamDescriptor::new(name, namespace), stream_state);

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Build the state message for a stream from its current state
    pub async fn create_state_message(&self, name: &str, namespace: Option<&str>) -> Message {
        let descriptor = StreamDescriptor::new(name, namespace);
        let data = self
            .state
            .read()
            .await
            .get_stream(&descriptor)
            .cloned()
            .unwrap_or_default();
        Message::state(descriptor, data)
    }

    /// Update a stream's state and build its state message in one step
    ///
    /// No other update can land between the two.
    pub async fn checkpoint(
        &self,
        name: &str,
        namespace: Option<&str>,
        stream_state: StreamState,
    ) -> Result<Message> {
        let descriptor = StreamDescriptor::new(name, namespace);
        let message = {
            let mut state = self.state.write().await;
            state.set_stream(descriptor.clone(), stream_state.clone());
            Message::state(descriptor, stream_state)
        };

        if self.auto_save {
            self.save().await?;
        }

        Ok(message)
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
            auto_save: self.auto_save,
        }
    }
}

fn parse_state(contents: &str) -> Result<ConnectorState> {
    if contents.trim().is_empty() {
        return Ok(ConnectorState::new());
    }
    serde_json::from_str(contents)
        .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))
}

/// Write to a temp file first, then rename
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, contents)
        .await
        .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

    Ok(())
}
