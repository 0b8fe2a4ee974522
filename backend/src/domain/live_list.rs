//! Observable in-memory lists kept in step with successful writes.
//!
//! Record services publish every committed change into a [`LiveList`] so that
//! subscribers observe inserts, edits and removals without refetching the
//! whole collection.
//!
//! Lists always hold records as stored. Each subscriber reads through a
//! [`LiveFeed`] whose view decides what that subscriber may see, so one list
//! serves readers with different permissions.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

/// Items stored in a [`LiveList`] expose a stable key.
pub trait Keyed {
    /// Key type; two items with equal keys are the same record.
    type Key: PartialEq;

    /// Key of this item.
    fn key(&self) -> Self::Key;
}

/// Watch-backed list of records.
///
/// Cloning a `LiveList` yields another handle onto the same channel.
#[derive(Debug)]
pub struct LiveList<T> {
    sender: Arc<watch::Sender<Vec<T>>>,
}

impl<T> Clone for LiveList<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> Default for LiveList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> LiveList<T> {
    /// Create a list seeded with `items`.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        let (sender, _receiver) = watch::channel(items);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.sender.subscribe()
    }

    /// Replace the whole list, typically after a full fetch.
    pub fn replace(&self, items: Vec<T>) {
        self.sender.send_replace(items);
    }

    /// Number of items currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sender.borrow().len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sender.borrow().is_empty()
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> LiveList<T> {
    /// Clone the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.sender.borrow().clone()
    }

    /// Open a feed that passes every record through `view`.
    ///
    /// Records for which `view` returns `None` are hidden from this
    /// subscriber.
    pub fn feed<F>(&self, view: F) -> LiveFeed<T>
    where
        F: Fn(&T) -> Option<T> + Send + Sync + 'static,
    {
        LiveFeed {
            receiver: self.subscribe(),
            view: Arc::new(view),
        }
    }

    /// Open a feed that shows every record unchanged.
    #[must_use]
    pub fn unfiltered_feed(&self) -> LiveFeed<T> {
        self.feed(|item| Some(item.clone()))
    }
}

type View<T> = Arc<dyn Fn(&T) -> Option<T> + Send + Sync>;

/// One subscriber's view onto a [`LiveList`].
#[derive(Clone)]
pub struct LiveFeed<T> {
    receiver: watch::Receiver<Vec<T>>,
    view: View<T>,
}

impl<T> std::fmt::Debug for LiveFeed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed").finish_non_exhaustive()
    }
}

impl<T> LiveFeed<T> {
    /// Current contents as this subscriber sees them.
    ///
    /// Marks the current version as seen, so [`LiveFeed::next`] waits for the
    /// following change.
    pub fn current(&mut self) -> Vec<T> {
        let view = &*self.view;
        self.receiver
            .borrow_and_update()
            .iter()
            .filter_map(view)
            .collect()
    }

    /// Wait for the next change and return the new contents.
    ///
    /// Returns `None` once the list has been dropped.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }
}

/// Live lists keyed by a parent record, each kept only while subscribed.
///
/// Writes reach a list only when someone is watching it; a list nobody
/// watches any more is dropped on the next write or subscription.
#[derive(Debug)]
pub struct LiveLists<K, T> {
    lists: Arc<Mutex<HashMap<K, LiveList<T>>>>,
}

impl<K, T> Clone for LiveLists<K, T> {
    fn clone(&self) -> Self {
        Self {
            lists: Arc::clone(&self.lists),
        }
    }
}

impl<K, T> Default for LiveLists<K, T> {
    fn default() -> Self {
        Self {
            lists: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> LiveLists<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    /// Open a feed on the list for `key`, creating the list when absent.
    ///
    /// The feed is registered before the lock is released, so the returned
    /// list cannot be pruned while the caller seeds it.
    pub fn subscribe<F>(&self, key: &K, view: F) -> (LiveList<T>, LiveFeed<T>)
    where
        F: Fn(&T) -> Option<T> + Send + Sync + 'static,
    {
        let mut lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        lists.retain(|existing, list| existing == key || list.subscriber_count() > 0);
        let list = lists.entry(key.clone()).or_default().clone();
        let feed = list.feed(view);
        (list, feed)
    }

    /// Apply `change` to the list for `key` when anyone still watches it.
    pub fn reconcile<F>(&self, key: &K, change: F)
    where
        F: FnOnce(&LiveList<T>),
    {
        let mut lists = self.lists.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = lists.get(key) else {
            return;
        };
        if list.subscriber_count() == 0 {
            lists.remove(key);
            return;
        }
        change(list);
    }

    /// Number of lists currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no list is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Keyed> LiveList<T> {
    /// Append a new record.
    pub fn insert(&self, item: T) {
        self.sender.send_modify(|items| items.push(item));
    }

    /// Apply `patch` to the record with `key`.
    ///
    /// Returns `false` when no record carries that key; subscribers are not
    /// notified in that case.
    pub fn patch<F>(&self, key: &T::Key, patch: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_if_modified(|items| {
            let Some(item) = items.iter_mut().find(|item| item.key() == *key) else {
                return false;
            };
            patch(item);
            true
        })
    }

    /// Replace the record with the same key, or append it when absent.
    pub fn upsert(&self, item: T) {
        self.sender.send_modify(|items| {
            let key = item.key();
            match items.iter_mut().find(|existing| existing.key() == key) {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
        });
    }

    /// Keep only the records matching `keep`, returning how many were dropped.
    pub fn retain<F>(&self, keep: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let mut dropped = 0;
        self.sender.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| keep(item));
            dropped = before - items.len();
            dropped > 0
        });
        dropped
    }

    /// Remove the record with `key`, returning whether it was present.
    pub fn remove(&self, key: &T::Key) -> bool {
        self.sender.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| item.key() != *key);
            items.len() != before
        })
    }
}

impl Keyed for crate::domain::User {
    type Key = crate::domain::UserId;

    fn key(&self) -> Self::Key {
        self.id.clone()
    }
}

impl Keyed for crate::domain::AllowListEntry {
    type Key = crate::domain::EmailAddress;

    fn key(&self) -> Self::Key {
        self.email.clone()
    }
}

impl Keyed for crate::domain::Organization {
    type Key = crate::domain::OrganizationId;

    fn key(&self) -> Self::Key {
        self.id
    }
}

impl Keyed for crate::domain::Review {
    type Key = crate::domain::ReviewId;

    fn key(&self) -> Self::Key {
        self.id
    }
}
