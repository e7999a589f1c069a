//! Log of manually classified objects across images.

use serde::{Deserialize, Serialize};

use crate::model::{ManualClass, ObjectNumber};

/// External accumulator of every object that carries a manual class.
pub trait ManualLog: Send {
    /// Add an object or change its recorded class.
    fn upsert(&mut self, image_key: &str, object: ObjectNumber, class: ManualClass);

    /// Forget an object that went back to unclassified.
    fn remove(&mut self, image_key: &str, object: ObjectNumber);

    /// Copy of every recorded entry.
    fn snapshot(&self) -> Vec<ManualEntry>;

    /// Recorded class of one object.
    fn lookup(&self, image_key: &str, object: ObjectNumber) -> Option<ManualClass> {
        self.snapshot()
            .into_iter()
            .find(|e| e.image_key == image_key && e.object == object)
            .map(|e| e.class)
    }
}

/// One manually classified object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    /// Image the object belongs to
    pub image_key: String,
    pub object: ObjectNumber,
    pub class: ManualClass,
}

/// In-memory manual classification log, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualClassLog {
    entries: Vec<ManualEntry>,
}

impl ManualClassLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log holding `entries`.
    pub fn from_entries(entries: Vec<ManualEntry>) -> Self {
        Self { entries }
    }

    /// Get the recorded class of an object.
    pub fn get(&self, image_key: &str, object: ObjectNumber) -> Option<ManualClass> {
        self.entries
            .iter()
            .find(|e| e.image_key == image_key && e.object == object)
            .map(|e| e.class)
    }

    /// Get all entries.
    pub fn entries(&self) -> &[ManualEntry] {
        &self.entries
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the log to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import a log from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ManualLog for ManualClassLog {
    fn upsert(&mut self, image_key: &str, object: ObjectNumber, class: ManualClass) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.image_key == image_key && e.object == object)
        {
            log::debug!("Manual log: {}#{} {} -> {}", image_key, object, entry.class, class);
            entry.class = class;
        } else {
            log::debug!("Manual log: add {}#{} as {}", image_key, object, class);
            self.entries.push(ManualEntry {
                image_key: image_key.to_string(),
                object,
                class,
            });
        }
    }

    fn remove(&mut self, image_key: &str, object: ObjectNumber) {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.image_key == image_key && e.object == object));
        if self.entries.len() != before {
            log::debug!("Manual log: removed {}#{}", image_key, object);
        }
    }

    fn snapshot(&self) -> Vec<ManualEntry> {
        self.entries.clone()
    }

    fn lookup(&self, image_key: &str, object: ObjectNumber) -> Option<ManualClass> {
        self.get(image_key, object)
    }
}
