// Generational arena giving every player a stable handle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permanent handle for a player on one team.
///
/// Ordered by slot, then generation. A handle to a released player never
/// resolves again, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId {
    slot: u32,
    generation: u32,
}

impl PlayerId {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32 },
}

/// Slot storage with reuse of vacated slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    #[serde(default)]
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and return its handle.
    pub fn insert(&mut self, value: T) -> PlayerId {
        if let Some(slot) = self.free.pop() {
            let generation = match self.entries[slot as usize] {
                Entry::Vacant { generation } => generation,
                Entry::Occupied { generation, .. } => generation + 1,
            };
            self.entries[slot as usize] = Entry::Occupied { generation, value };
            return PlayerId { slot, generation };
        }

        let slot = self.entries.len() as u32;
        self.entries.push(Entry::Occupied {
            generation: 0,
            value,
        });
        PlayerId {
            slot,
            generation: 0,
        }
    }

    /// Remove a value. The slot's generation is bumped so `id` goes stale.
    pub fn remove(&mut self, id: PlayerId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        let vacant = Entry::Vacant {
            generation: id.generation + 1,
        };
        let old = std::mem::replace(&mut self.entries[id.slot as usize], vacant);
        self.free.push(id.slot);
        match old {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: PlayerId) -> Option<&T> {
        match self.entries.get(id.slot as usize)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut T> {
        match self.entries.get_mut(id.slot as usize)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// Occupied entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| match entry {
                Entry::Occupied { generation, value } => Some((
                    PlayerId {
                        slot: slot as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Entry::Vacant { .. } => None,
            })
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
