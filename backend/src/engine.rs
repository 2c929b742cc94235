//! Binding to the audio mixing engine.
//!
//! Each mixer owns one [`MixingUnit`] created by a [`MixingEngine`]. The
//! registry only reads the unit's bound state; attaching a unit to an output
//! sink is the engine's business.

use mixdesk_types::{ChannelId, MixerId};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Engine-side mixing unit backing a single mixer.
pub trait MixingUnit: Send + Sync + fmt::Debug {
    /// Number of output audio channels produced by this unit.
    fn channel_count(&self) -> u32;

    /// Whether the unit is currently attached to an output sink.
    fn is_bound(&self) -> bool;

    /// Allocate a new input slot, returning its identifier, or `None` once
    /// the identifier space is used up.
    ///
    /// Identifiers are never reused within a unit.
    fn add_channel_slot(&self) -> Option<ChannelId>;

    /// Release an input slot. Returns false if the slot was unknown.
    fn remove_channel_slot(&self, id: ChannelId) -> bool;
}

/// Factory and owner of mixing units.
pub trait MixingEngine: Send + Sync {
    fn create_unit(&self, mixer: MixerId, output_channels: u32) -> Arc<dyn MixingUnit>;

    fn release_unit(&self, mixer: MixerId);
}

#[derive(Debug, Default)]
struct SlotTable {
    next_id: ChannelId,
    active: BTreeSet<ChannelId>,
}

/// In-process mixing unit keeping slot bookkeeping and a bound flag.
#[derive(Debug)]
pub struct SoftwareUnit {
    output_channels: u32,
    bound: AtomicBool,
    slots: Mutex<SlotTable>,
}

impl SoftwareUnit {
    pub fn new(output_channels: u32) -> Self {
        Self {
            output_channels,
            bound: AtomicBool::new(false),
            slots: Mutex::new(SlotTable::default()),
        }
    }

    /// Attach the unit to an output sink.
    pub fn attach_sink(&self) {
        self.bound.store(true, Ordering::SeqCst);
    }

    /// Detach the unit from its output sink.
    pub fn detach_sink(&self) {
        self.bound.store(false, Ordering::SeqCst);
    }

    /// Identifiers of the slots currently allocated.
    pub fn active_slots(&self) -> Vec<ChannelId> {
        self.slots.lock().active.iter().copied().collect()
    }
}

impl MixingUnit for SoftwareUnit {
    fn channel_count(&self) -> u32 {
        self.output_channels
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    fn add_channel_slot(&self) -> Option<ChannelId> {
        let mut slots = self.slots.lock();
        let id = slots.next_id;
        slots.next_id = id.checked_add(1)?;
        slots.active.insert(id);
        Some(id)
    }

    fn remove_channel_slot(&self, id: ChannelId) -> bool {
        self.slots.lock().active.remove(&id)
    }
}

/// In-process engine handing out [`SoftwareUnit`]s keyed by mixer.
#[derive(Debug, Default)]
pub struct SoftwareEngine {
    units: RwLock<HashMap<MixerId, Arc<SoftwareUnit>>>,
}

impl SoftwareEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the unit backing a mixer.
    pub fn unit(&self, mixer: &MixerId) -> Option<Arc<SoftwareUnit>> {
        self.units.read().get(mixer).cloned()
    }

    /// Bind a mixer's unit to an output sink. Returns false for unknown mixers.
    pub fn attach_sink(&self, mixer: &MixerId) -> bool {
        match self.unit(mixer) {
            Some(unit) => {
                unit.attach_sink();
                info!(mixer_id = %mixer, "Mixer attached to output sink");
                true
            }
            None => false,
        }
    }

    /// Unbind a mixer's unit from its output sink. Returns false for unknown mixers.
    pub fn detach_sink(&self, mixer: &MixerId) -> bool {
        match self.unit(mixer) {
            Some(unit) => {
                unit.detach_sink();
                info!(mixer_id = %mixer, "Mixer detached from output sink");
                true
            }
            None => false,
        }
    }

    /// Number of live units.
    pub fn unit_count(&self) -> usize {
        self.units.read().len()
    }
}

impl MixingEngine for SoftwareEngine {
    fn create_unit(&self, mixer: MixerId, output_channels: u32) -> Arc<dyn MixingUnit> {
        let unit = Arc::new(SoftwareUnit::new(output_channels));
        self.units.write().insert(mixer, unit.clone());
        debug!(mixer_id = %mixer, output_channels, "Created mixing unit");
        unit
    }

    fn release_unit(&self, mixer: MixerId) {
        if self.units.write().remove(&mixer).is_some() {
            debug!(mixer_id = %mixer, "Released mixing unit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_slot_ids_are_not_reused() {
        let unit = SoftwareUnit::new(2);
        let a = unit.add_channel_slot().unwrap();
        let b = unit.add_channel_slot().unwrap();
        assert_ne!(a, b);

        assert!(unit.remove_channel_slot(b));
        assert!(!unit.remove_channel_slot(b));

        let c = unit.add_channel_slot().unwrap();
        assert_ne!(c, b);
        assert_eq!(unit.active_slots(), vec![a, c]);
    }

    #[test]
    fn test_slot_ids_exhausted() {
        let unit = SoftwareUnit::new(2);
        unit.slots.lock().next_id = ChannelId::MAX - 1;

        assert_eq!(unit.add_channel_slot(), Some(ChannelId::MAX - 1));
        assert_eq!(unit.add_channel_slot(), None);
        assert_eq!(unit.add_channel_slot(), None);
        assert_eq!(unit.active_slots(), vec![ChannelId::MAX - 1]);
    }

    #[test]
    fn test_bind_and_unbind() {
        let engine = SoftwareEngine::new();
        let mixer = Uuid::new_v4();
        let unit = engine.create_unit(mixer, 2);

        assert_eq!(unit.channel_count(), 2);
        assert!(!unit.is_bound());

        assert!(engine.attach_sink(&mixer));
        assert!(unit.is_bound());

        assert!(engine.detach_sink(&mixer));
        assert!(!unit.is_bound());
    }

    #[test]
    fn test_release_unit() {
        let engine = SoftwareEngine::new();
        let mixer = Uuid::new_v4();
        engine.create_unit(mixer, 1);
        assert_eq!(engine.unit_count(), 1);

        engine.release_unit(mixer);
        assert_eq!(engine.unit_count(), 0);
        assert!(!engine.attach_sink(&mixer));
    }
}
