//! Registry of all mixers.

use super::{Mixer, MixerError, Result};
use crate::engine::MixingEngine;
use crate::events::ChangeNotifier;
use mixdesk_types::mixer::MIN_OUTPUT_CHANNELS;
use mixdesk_types::{MixerEvent, MixerId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Source of truth for which mixers exist.
///
/// The registry is an ordinary owned value; the application state holds one
/// instance and hands out references to request handlers.
pub struct MixerRegistry {
    mixers: RwLock<HashMap<MixerId, Arc<Mixer>>>,
    next_sequence: AtomicU64,
    engine: Arc<dyn MixingEngine>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl MixerRegistry {
    /// Create an empty registry creating units on `engine` and publishing
    /// changes to `notifier`.
    pub fn new(engine: Arc<dyn MixingEngine>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            mixers: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            engine,
            notifier,
        }
    }

    /// Create a mixer with a fresh identifier and its own mixing unit.
    ///
    /// Display names need not be unique.
    pub fn add_mixer(
        &self,
        display_name: impl Into<String>,
        output_channels: u32,
    ) -> Result<Arc<Mixer>> {
        if output_channels < MIN_OUTPUT_CHANNELS {
            return Err(MixerError::InvalidArgument(format!(
                "output channel count must be at least {}, got {}",
                MIN_OUTPUT_CHANNELS, output_channels
            )));
        }

        let display_name = display_name.into();
        let mixer = {
            let mut mixers = self.mixers.write();
            let mut id = Uuid::new_v4();
            while mixers.contains_key(&id) {
                id = Uuid::new_v4();
            }
            let unit = self.engine.create_unit(id, output_channels);
            let mixer = Arc::new(Mixer::new(
                id,
                self.next_sequence.fetch_add(1, Ordering::Relaxed),
                display_name.clone(),
                unit,
                self.notifier.clone(),
            ));
            mixers.insert(id, mixer.clone());
            mixer
        };

        info!(
            mixer_id = %mixer.id(),
            output_channels,
            "Created mixer '{}'",
            display_name
        );
        self.notifier.publish(MixerEvent::MixerCreate {
            id: mixer.id(),
            display_name,
            output_channels,
        });
        Ok(mixer)
    }

    /// Look up a mixer by identifier.
    pub fn get_mixer(&self, id: &MixerId) -> Result<Arc<Mixer>> {
        self.mixers
            .read()
            .get(id)
            .cloned()
            .ok_or(MixerError::MixerNotFound(*id))
    }

    /// Snapshot of all mixers in creation order.
    pub fn get_all_mixers(&self) -> Vec<Arc<Mixer>> {
        let mut mixers: Vec<Arc<Mixer>> = self.mixers.read().values().cloned().collect();
        mixers.sort_by_key(|m| m.sequence());
        mixers
    }

    /// Delete a mixer previously obtained from this registry.
    ///
    /// Fails with [`MixerError::AlreadyDeleted`] if the mixer is no longer
    /// registered and with [`MixerError::InUse`] if it is bound to an output
    /// sink. Membership check, in-use check and removal happen under one
    /// write lock, so concurrent deletes of the same mixer succeed once.
    /// Once deleted, the mixer refuses further changes through handles
    /// obtained earlier.
    pub fn delete_mixer(&self, mixer: &Mixer) -> Result<()> {
        let id = mixer.id();
        {
            let mut mixers = self.mixers.write();
            match mixers.get(&id) {
                Some(current) if std::ptr::eq(current.as_ref(), mixer) => {}
                _ => return Err(MixerError::AlreadyDeleted(id)),
            }
            if let Err(err) = mixer.retire() {
                if let MixerError::InUse(_) = err {
                    warn!(mixer_id = %id, "Refusing to delete mixer in use");
                }
                return Err(err);
            }
            mixers.remove(&id);
        }

        self.engine.release_unit(id);
        info!(mixer_id = %id, "Deleted mixer '{}'", mixer.display_name());
        self.notifier.publish(MixerEvent::MixerRemove { id });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.mixers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixers.read().is_empty()
    }
}
