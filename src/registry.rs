use std::fmt;

use crate::instance::Glitcher;

/// Stable reference to a registered glitcher.
///
/// Removing the glitcher bumps its slot's generation, so old handles stop
/// resolving even after the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

struct Slot {
    generation: u32,
    glitcher: Option<Glitcher>,
}

/// Arena owning every live glitcher.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, glitcher: Glitcher) -> Handle {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.glitcher = Some(glitcher);
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            glitcher: Some(glitcher),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, handle: Handle) -> Option<Glitcher> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let glitcher = slot.glitcher.take()?;

        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(glitcher)
    }

    pub fn get(&self, handle: Handle) -> Option<&Glitcher> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.glitcher.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Glitcher> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.glitcher.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Snapshot of the live handles, in slot order.
    pub fn handles(&self) -> Vec<Handle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.glitcher.is_some())
            .map(|(index, slot)| Handle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
