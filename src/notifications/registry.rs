//! Observer Registry
//!
//! Owns the topic -> observer list mapping, the id -> topic index and the id
//! allocator. The registry itself is not synchronized; the notification center
//! keeps it behind its reentrant lock and decides when removal is safe with
//! respect to in-flight async work.
//!
//! Removal is two-phase. `detach` takes an observer out of its topic so no
//! later post reaches it, but keeps its id reserved; `release` hands the id
//! back once the observer's async work has drained.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::notifications::callback::ErasedCallback;
use crate::notifications::error::{NotiflyError, NotiflyResult};
use crate::notifications::ids::{IdAllocator, ObserverId};
use crate::notifications::signature::TypeSignature;
use crate::notifications::Topic;

/// One registered observer
struct ObserverEntry {
    id: ObserverId,
    callback: ErasedCallback,
}

/// Observers of one topic, in registration order, and the topic's pinned signature
struct TopicEntry {
    signature: TypeSignature,
    observers: Vec<ObserverEntry>,
}

/// Callbacks captured for one post, in dispatch order
pub(crate) struct PostSnapshot {
    pub observers: Vec<(ObserverId, ErasedCallback)>,
}

pub(crate) struct ObserverRegistry {
    topics: HashMap<Topic, TopicEntry>,
    index: HashMap<ObserverId, Topic>,
    /// Detached ids still waiting on async work
    retiring: HashSet<ObserverId>,
    ids: IdAllocator,
}

impl ObserverRegistry {
    pub fn new(ids: IdAllocator) -> Self {
        Self {
            topics: HashMap::new(),
            index: HashMap::new(),
            retiring: HashSet::new(),
            ids,
        }
    }

    /// Append an observer to `topic`, pinning the signature if the topic is new
    pub fn add(
        &mut self,
        topic: Topic,
        signature: TypeSignature,
        callback: ErasedCallback,
    ) -> NotiflyResult<ObserverId> {
        if let Some(entry) = self.topics.get(&topic) {
            if entry.signature != signature {
                return Err(NotiflyError::payload_type_mismatch(
                    topic,
                    entry.signature.clone(),
                    signature,
                ));
            }
        }

        let id = self.ids.allocate()?;
        let entry = self.topics.entry(topic).or_insert_with(|| TopicEntry {
            signature,
            observers: Vec::new(),
        });
        entry.observers.push(ObserverEntry { id, callback });
        self.index.insert(id, topic);

        debug!("Observer {} added to notification {} ({} observers)", id, topic, entry.observers.len());
        Ok(id)
    }

    /// Take one observer out of its topic without releasing its id.
    /// Drops the topic with its last observer.
    pub fn detach(&mut self, id: ObserverId) -> NotiflyResult<Topic> {
        let topic = self.index.remove(&id).ok_or(NotiflyError::ObserverNotFound(id))?;

        let entry = self
            .topics
            .get_mut(&topic)
            .unwrap_or_else(|| panic!("observer {} indexed under missing notification {}", id, topic));
        let position = entry
            .observers
            .iter()
            .position(|o| o.id == id)
            .unwrap_or_else(|| panic!("observer {} missing from notification {}", id, topic));
        entry.observers.remove(position);

        if entry.observers.is_empty() {
            self.topics.remove(&topic);
            debug!("Notification {} has no observers left and was dropped", topic);
        }

        self.retiring.insert(id);
        Ok(topic)
    }

    /// Take a whole topic out, keeping its ids reserved. Returns the detached ids.
    pub fn detach_topic(&mut self, topic: Topic) -> Vec<ObserverId> {
        let Some(entry) = self.topics.remove(&topic) else {
            return Vec::new();
        };

        let ids: Vec<_> = entry.observers.iter().map(|o| o.id).collect();
        for id in &ids {
            self.index.remove(id);
            self.retiring.insert(*id);
        }
        ids
    }

    /// Hand a detached id back to the allocator
    pub fn release(&mut self, id: ObserverId) {
        if self.retiring.remove(&id) {
            self.ids.release(id);
        }
    }

    /// Detached ids not yet released
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    /// Detach one observer and release its id at once
    pub fn remove(&mut self, id: ObserverId) -> NotiflyResult<Topic> {
        let topic = self.detach(id)?;
        self.release(id);
        Ok(topic)
    }

    /// Detach a whole topic and release every id on it. Returns how many were removed.
    pub fn remove_topic(&mut self, topic: Topic) -> usize {
        let ids = self.detach_topic(topic);
        for id in &ids {
            self.release(*id);
        }
        ids.len()
    }

    /// Validate a post and capture the callbacks it will run
    pub fn snapshot_for_post(&self, topic: Topic, signature: &TypeSignature) -> NotiflyResult<PostSnapshot> {
        let entry = self
            .topics
            .get(&topic)
            .ok_or(NotiflyError::NotificationNotFound(topic))?;

        if &entry.signature != signature {
            return Err(NotiflyError::payload_type_mismatch(
                topic,
                entry.signature.clone(),
                signature.clone(),
            ));
        }

        Ok(PostSnapshot {
            observers: entry
                .observers
                .iter()
                .map(|o| (o.id, ErasedCallback::clone(&o.callback)))
                .collect(),
        })
    }

    pub fn signature(&self, topic: Topic) -> Option<&TypeSignature> {
        self.topics.get(&topic).map(|entry| &entry.signature)
    }

    pub fn observer_count(&self, topic: Topic) -> usize {
        self.topics.get(&topic).map_or(0, |entry| entry.observers.len())
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn total_observers(&self) -> usize {
        self.index.len()
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.topics.keys().copied().collect()
    }

    /// Take every observer out, releasing all ids
    pub fn clear(&mut self) -> usize {
        let count = self.index.len();
        for topic in self.topics() {
            self.remove_topic(topic);
        }
        for id in std::mem::take(&mut self.retiring) {
            self.ids.release(id);
        }
        count
    }
}
