//! Object pool (arena со слотами + generational handles)
//!
//! Снаряды, ракеты и muzzle flash живут в фиксированных аренах:
//! - ёмкость задаётся при создании (PoolSettings), в hot path не растёт
//! - слот свободен → лежит во free list, занят → `active`
//! - слот возвращается в free list ТОЛЬКО в `reclaim()` и только если
//!   `can_be_reused()` == true
//!
//! Handle несёт generation: handle от переиспользованного слота больше не резолвится.

use bevy::prelude::*;

/// Контракт переиспользования объекта в пуле
pub trait Poolable {
    /// true → gameplay поля больше не читаются, слот можно отдать
    fn can_be_reused(&self) -> bool;
}

/// Handle слота пула
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    generation: u32,
    active: bool,
}

#[derive(Debug)]
pub struct Pool<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    exhausted_reported: bool,
}

impl<T: Poolable + Default> Pool<T> {
    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                item: T::default(),
                generation: 0,
                active: false,
            })
            .collect();

        // Стек: первым выдаётся слот 0
        let free = (0..capacity as u32).rev().collect();

        Self {
            name,
            slots,
            free,
            exhausted_reported: false,
        }
    }

    /// Берёт свободный слот. `None` если пул исчерпан (warning логируется один раз
    /// до следующего успешного acquire).
    pub fn acquire(&mut self) -> Option<(PoolHandle, &mut T)> {
        let Some(index) = self.free.pop() else {
            if !self.exhausted_reported {
                crate::log_warning(&format!(
                    "Pool '{}' exhausted ({} slots), dropping spawn",
                    self.name,
                    self.slots.len()
                ));
                self.exhausted_reported = true;
            }
            return None;
        };
        self.exhausted_reported = false;

        let slot = &mut self.slots[index as usize];
        slot.active = true;
        let handle = PoolHandle {
            index,
            generation: slot.generation,
        };
        Some((handle, &mut slot.item))
    }

    /// Возвращает в free list все активные слоты, чей объект `can_be_reused()`
    ///
    /// Returns количество освобождённых слотов.
    pub fn reclaim(&mut self) -> usize {
        let mut reclaimed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.active && slot.item.can_be_reused() {
                slot.active = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                reclaimed += 1;
            }
        }
        reclaimed
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .map(|slot| &slot.item)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation)
            .map(|slot| &mut slot.item)
    }

    /// Активные объекты в порядке индексов (детерминированно)
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &slot.item,
                )
            })
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &mut slot.item,
                )
            })
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Системный хелпер: reclaim по всем пулам в конце тика
pub fn reclaim_pools(
    mut projectiles: ResMut<crate::combat::ProjectilePool>,
    mut missiles: ResMut<crate::combat::MissilePool>,
    mut flashes: ResMut<crate::combat::MuzzleFlashPool>,
) {
    projectiles.reclaim();
    missiles.reclaim();
    flashes.reclaim();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Spark {
        time_left: f32,
    }

    impl Poolable for Spark {
        fn can_be_reused(&self) -> bool {
            self.time_left <= 0.0
        }
    }

    #[test]
    fn test_acquire_until_exhausted() {
        let mut pool = Pool::<Spark>::with_capacity("sparks", 2);

        let (first, spark) = pool.acquire().unwrap();
        spark.time_left = 10.0;
        let (second, spark) = pool.acquire().unwrap();
        spark.time_left = 10.0;

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert!(pool.acquire().is_none());
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_reclaim_only_reusable() {
        let mut pool = Pool::<Spark>::with_capacity("sparks", 3);

        let (alive, spark) = pool.acquire().unwrap();
        spark.time_left = 5.0;
        let (dead, spark) = pool.acquire().unwrap();
        spark.time_left = 0.0;

        assert_eq!(pool.reclaim(), 1);
        assert!(pool.get(alive).is_some());
        assert!(pool.get(dead).is_none(), "stale handle must not resolve");
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut pool = Pool::<Spark>::with_capacity("sparks", 1);

        let (old, _) = pool.acquire().unwrap();
        pool.reclaim();
        let (new, spark) = pool.acquire().unwrap();
        spark.time_left = 1.0;

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(pool.get(old).is_none());
        assert!(pool.get_mut(new).is_some());
    }

    #[test]
    fn test_iter_active_in_index_order() {
        let mut pool = Pool::<Spark>::with_capacity("sparks", 4);
        for i in 0..3 {
            let (_, spark) = pool.acquire().unwrap();
            spark.time_left = i as f32 + 1.0;
        }

        let order: Vec<usize> = pool.iter_active().map(|(handle, _)| handle.index()).collect();
        assert_eq!(order, vec![0, 1, 2]);

        for (_, spark) in pool.iter_active_mut() {
            spark.time_left = 0.0;
        }
        assert_eq!(pool.reclaim(), 3);
        assert_eq!(pool.active_count(), 0);
    }
}
