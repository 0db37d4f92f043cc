use std::marker::PhantomData;

/// Slot index plus the generation it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Key {
	pub(crate) index: u32,
	pub(crate) generation: u32,
}

/// Handle types stored in an [`Arena`].
pub(crate) trait ArenaId: Copy {
	fn from_key(key: Key) -> Self;
	fn key(self) -> Key;
}

struct Slot<T> {
	generation: u32,
	value: Option<T>,
}

/// Slot storage with generational handles; freed slots are reused under a new generation.
pub(crate) struct Arena<I, T> {
	slots: Vec<Slot<T>>,
	free: Vec<u32>,
	_id: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
	fn default() -> Self {
		Self {
			slots: Vec::new(),
			free: Vec::new(),
			_id: PhantomData,
		}
	}
}

impl<I: ArenaId, T> Arena<I, T> {
	pub(crate) fn insert(&mut self, value: T) -> I {
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.value = Some(value);
			return I::from_key(Key { index, generation: slot.generation });
		}
		let index = self.slots.len() as u32;
		self.slots.push(Slot { generation: 0, value: Some(value) });
		I::from_key(Key { index, generation: 0 })
	}

	/// Handle that never resolves.
	pub(crate) fn dangling(&self) -> I {
		I::from_key(Key {
			index: u32::MAX,
			generation: u32::MAX,
		})
	}

	pub(crate) fn get(&self, id: I) -> Option<&T> {
		let key = id.key();
		self.slots
			.get(key.index as usize)
			.filter(|slot| slot.generation == key.generation)
			.and_then(|slot| slot.value.as_ref())
	}

	pub(crate) fn contains(&self, id: I) -> bool {
		self.get(id).is_some()
	}

	pub(crate) fn get_mut(&mut self, id: I) -> Option<&mut T> {
		let key = id.key();
		self.slots
			.get_mut(key.index as usize)
			.filter(|slot| slot.generation == key.generation)
			.and_then(|slot| slot.value.as_mut())
	}

	pub(crate) fn remove(&mut self, id: I) -> Option<T> {
		let key = id.key();
		let slot = self.slots.get_mut(key.index as usize).filter(|slot| slot.generation == key.generation)?;
		let value = slot.value.take()?;
		slot.generation = slot.generation.wrapping_add(1);
		self.free.push(key.index);
		Some(value)
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (I, &T)> {
		self.slots.iter().enumerate().filter_map(|(index, slot)| {
			let value = slot.value.as_ref()?;
			Some((
				I::from_key(Key {
					index: index as u32,
					generation: slot.generation,
				}),
				value,
			))
		})
	}

	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
		self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
			let generation = slot.generation;
			let value = slot.value.as_mut()?;
			Some((
				I::from_key(Key {
					index: index as u32,
					generation,
				}),
				value,
			))
		})
	}

	pub(crate) fn len(&self) -> usize {
		self.slots.len() - self.free.len()
	}
}

#[cfg(test)]
mod tests {
	use super::{Arena, ArenaId, Key};

	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	struct Id(Key);

	impl ArenaId for Id {
		fn from_key(key: Key) -> Self {
			Self(key)
		}

		fn key(self) -> Key {
			self.0
		}
	}

	#[test]
	fn removed_handles_go_stale() {
		let mut arena: Arena<Id, &str> = Arena::default();
		let first = arena.insert("first");
		assert_eq!(arena.remove(first), Some("first"));

		let second = arena.insert("second");
		assert_eq!(first.0.index, second.0.index, "slot is reused");
		assert_eq!(arena.get(first), None, "old generation no longer resolves");
		assert_eq!(arena.get(second), Some(&"second"));
		assert_eq!(arena.len(), 1);
	}
}
