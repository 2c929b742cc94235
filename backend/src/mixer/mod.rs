//! Mixers and the mixer registry.
//!
//! A [`Mixer`] owns its channels and enforces that no two of its channels are
//! routed from the same input. Structural changes to a mixer are serialized
//! by a per-mixer lock; registry membership is serialized by the
//! [`MixerRegistry`] lock. A mixer's change events are published while its
//! lock is held, so subscribers see them in the order they were applied.

pub mod channel;
pub mod error;
pub mod registry;

pub use channel::Channel;
pub use error::{ErrorKind, MixerError, Result};
pub use registry::MixerRegistry;

use crate::engine::MixingUnit;
use crate::events::ChangeNotifier;
use crate::input::Input;
use mixdesk_types::{ChannelChange, ChannelId, MixerDetails, MixerEvent, MixerId, MixerSummary};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named aggregate of channels backed by one mixing unit.
pub struct Mixer {
    id: MixerId,
    /// Registry insertion order, used for stable listings
    sequence: u64,
    display_name: RwLock<String>,
    unit: Arc<dyn MixingUnit>,
    channels: Mutex<BTreeMap<ChannelId, Channel>>,
    /// Set by the registry on delete; only written with `channels` held
    removed: AtomicBool,
    notifier: Arc<dyn ChangeNotifier>,
}

impl Mixer {
    pub(crate) fn new(
        id: MixerId,
        sequence: u64,
        display_name: String,
        unit: Arc<dyn MixingUnit>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            id,
            sequence,
            display_name: RwLock::new(display_name),
            unit,
            channels: Mutex::new(BTreeMap::new()),
            removed: AtomicBool::new(false),
            notifier,
        }
    }

    pub fn id(&self) -> MixerId {
        self.id
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn display_name(&self) -> String {
        self.display_name.read().clone()
    }

    /// Number of output channels, fixed at creation.
    pub fn output_channel_count(&self) -> u32 {
        self.unit.channel_count()
    }

    /// Whether the mixing unit is bound to an output sink.
    pub fn in_use(&self) -> bool {
        self.unit.is_bound()
    }

    /// Whether the mixer has been deleted from its registry.
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Rename the mixer.
    pub fn rename(&self, display_name: impl Into<String>) -> Result<()> {
        let display_name = display_name.into();
        let _channels = self.channels.lock();
        self.ensure_live()?;
        *self.display_name.write() = display_name.clone();

        info!(mixer_id = %self.id, "Renamed mixer to '{}'", display_name);
        self.notifier.publish(MixerEvent::MixerUpdate {
            id: self.id,
            display_name,
        });
        Ok(())
    }

    /// Add an unrouted channel at unity gain.
    ///
    /// Refused while the mixer is bound to an output sink.
    pub fn add_channel(&self) -> Result<ChannelId> {
        let mut channels = self.channels.lock();
        self.ensure_live()?;
        if self.unit.is_bound() {
            warn!(mixer_id = %self.id, "Refusing to add channel to mixer in use");
            return Err(MixerError::InUse(self.id));
        }
        let id = self
            .unit
            .add_channel_slot()
            .ok_or(MixerError::ChannelsExhausted(self.id))?;
        channels.insert(id, Channel::new(id));

        info!(mixer_id = %self.id, channel_id = id, "Added channel");
        self.notifier.publish(MixerEvent::MixerChannelCreate {
            mixer: self.id,
            channel: id,
        });
        Ok(id)
    }

    /// Remove a channel. Allowed whether or not the mixer is in use.
    pub fn remove_channel(&self, channel_id: ChannelId) -> Result<()> {
        let mut channels = self.channels.lock();
        self.ensure_live()?;
        if channels.remove(&channel_id).is_none() {
            return Err(self.channel_not_found(channel_id));
        }
        if !self.unit.remove_channel_slot(channel_id) {
            warn!(
                mixer_id = %self.id,
                channel_id,
                "Mixing unit had no slot for removed channel"
            );
        }

        info!(mixer_id = %self.id, channel_id, "Removed channel");
        self.notifier.publish(MixerEvent::MixerChannelRemove {
            mixer: self.id,
            channel: channel_id,
        });
        Ok(())
    }

    /// Snapshot of a single channel.
    pub fn get_channel(&self, channel_id: ChannelId) -> Result<Channel> {
        self.channels
            .lock()
            .get(&channel_id)
            .cloned()
            .ok_or_else(|| self.channel_not_found(channel_id))
    }

    /// Identifiers of all channels, ascending.
    pub fn get_channel_ids(&self) -> Vec<ChannelId> {
        self.channels.lock().keys().copied().collect()
    }

    /// Snapshot of all channels, ascending by id.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.lock().values().cloned().collect()
    }

    /// Route `input` to a channel, or clear its routing with `None`.
    ///
    /// Fails with [`MixerError::Conflict`] when another channel of this mixer
    /// already consumes the same input; the target channel is left unchanged.
    pub fn set_channel_input(&self, channel_id: ChannelId, input: Option<Input>) -> Result<()> {
        self.update_channel(channel_id, Some(input), None)
    }

    /// Set a channel's gain. No range is enforced.
    pub fn set_channel_gain(&self, channel_id: ChannelId, gain: f64) -> Result<()> {
        self.update_channel(channel_id, None, Some(gain))
    }

    /// Change a channel's routing and gain in one step.
    ///
    /// `input` of `Some(None)` clears the routing and `None` leaves it alone.
    /// Either both changes are applied or, on error, neither is.
    pub fn update_channel(
        &self,
        channel_id: ChannelId,
        input: Option<Option<Input>>,
        gain: Option<f64>,
    ) -> Result<()> {
        let mut channels = self.channels.lock();
        self.ensure_live()?;
        if !channels.contains_key(&channel_id) {
            return Err(self.channel_not_found(channel_id));
        }

        if let Some(Some(new_input)) = &input {
            if let Some(other) = channels
                .values()
                .find(|c| c.id() != channel_id && c.is_routed_from(new_input))
            {
                warn!(
                    mixer_id = %self.id,
                    channel_id,
                    other_channel_id = other.id(),
                    input_id = %new_input.id(),
                    "Input already routed to another channel"
                );
                return Err(MixerError::Conflict {
                    mixer: self.id,
                    channel: other.id(),
                    input: new_input.id().to_string(),
                });
            }
        }

        let Some(channel) = channels.get_mut(&channel_id) else {
            return Err(self.channel_not_found(channel_id));
        };

        if let Some(input) = input {
            let input_id = input.as_ref().map(|i| i.id().to_string());
            channel.input = input;
            match &input_id {
                Some(input_id) => {
                    info!(mixer_id = %self.id, channel_id, input_id = %input_id, "Routed input to channel")
                }
                None => info!(mixer_id = %self.id, channel_id, "Cleared channel input"),
            }
            self.notifier.publish(MixerEvent::MixerChannelUpdate {
                mixer: self.id,
                channel: channel_id,
                change: ChannelChange::Input { input: input_id },
            });
        }
        if let Some(gain) = gain {
            channel.gain = gain;
            debug!(mixer_id = %self.id, channel_id, gain, "Set channel gain");
            self.notifier.publish(MixerEvent::MixerChannelUpdate {
                mixer: self.id,
                channel: channel_id,
                change: ChannelChange::Gain { gain },
            });
        }
        Ok(())
    }

    /// Mark the mixer deleted so that no further changes are accepted.
    ///
    /// Fails with [`MixerError::InUse`] while bound to an output sink. The
    /// bound check and the flag are taken under the channel lock, the same
    /// lock [`Mixer::add_channel`] checks the bound state under.
    pub(crate) fn retire(&self) -> Result<()> {
        let _channels = self.channels.lock();
        self.ensure_live()?;
        if self.unit.is_bound() {
            return Err(MixerError::InUse(self.id));
        }
        self.removed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn summary(&self) -> MixerSummary {
        MixerSummary {
            id: self.id,
            display_name: self.display_name(),
            output_channels: self.output_channel_count(),
            in_use: self.in_use(),
        }
    }

    pub fn details(&self) -> MixerDetails {
        MixerDetails {
            id: self.id,
            display_name: self.display_name(),
            output_channels: self.output_channel_count(),
            in_use: self.in_use(),
            channels: self.channels().iter().map(Into::into).collect(),
        }
    }

    /// Callers must hold the `channels` lock.
    fn ensure_live(&self) -> Result<()> {
        if self.is_removed() {
            return Err(MixerError::AlreadyDeleted(self.id));
        }
        Ok(())
    }

    fn channel_not_found(&self, channel: ChannelId) -> MixerError {
        MixerError::ChannelNotFound {
            mixer: self.id,
            channel,
        }
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("id", &self.id)
            .field("display_name", &*self.display_name.read())
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SoftwareEngine;
    use crate::events::RecordingNotifier;
    use crate::input::{InputCatalog, MemoryInputCatalog};

    struct Fixture {
        engine: Arc<SoftwareEngine>,
        notifier: Arc<RecordingNotifier>,
        registry: MixerRegistry,
        inputs: MemoryInputCatalog,
    }

    fn fixture() -> Fixture {
        let engine = Arc::new(SoftwareEngine::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let registry = MixerRegistry::new(engine.clone(), notifier.clone());
        let inputs = MemoryInputCatalog::new();
        inputs.register("mic1", "Microphone 1");
        inputs.register("mic2", "Microphone 2");
        Fixture {
            engine,
            notifier,
            registry,
            inputs,
        }
    }

    #[test]
    fn test_new_channel_defaults() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let id = mixer.add_channel().unwrap();

        let channel = mixer.get_channel(id).unwrap();
        assert_eq!(channel.id(), id);
        assert_eq!(channel.gain, mixdesk_types::DEFAULT_GAIN);
        assert!(channel.input.is_none());
    }

    #[test]
    fn test_channel_ids_unique_within_mixer() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let a = mixer.add_channel().unwrap();
        let b = mixer.add_channel().unwrap();
        mixer.remove_channel(a).unwrap();
        let c = mixer.add_channel().unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(mixer.get_channel_ids(), vec![b, c]);
    }

    #[test]
    fn test_routing_conflict_scenario() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let c2 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        mixer.set_channel_input(c1, Some(mic1.clone())).unwrap();

        let err = mixer.set_channel_input(c2, Some(mic1.clone())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(mixer.get_channel(c2).unwrap().input.is_none());

        mixer.set_channel_input(c1, None).unwrap();
        mixer.set_channel_input(c2, Some(mic1.clone())).unwrap();

        assert!(mixer.get_channel(c1).unwrap().input.is_none());
        assert_eq!(mixer.get_channel(c2).unwrap().input, Some(mic1));
    }

    #[test]
    fn test_conflict_leaves_existing_routing_unchanged() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let c2 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();
        let mic2 = f.inputs.resolve("mic2").unwrap();

        mixer.set_channel_input(c1, Some(mic1.clone())).unwrap();
        mixer.set_channel_input(c2, Some(mic2.clone())).unwrap();

        assert!(mixer.set_channel_input(c2, Some(mic1.clone())).is_err());
        assert_eq!(mixer.get_channel(c2).unwrap().input, Some(mic2));
    }

    #[test]
    fn test_reassigning_same_input_to_same_channel() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        mixer.set_channel_input(c1, Some(mic1.clone())).unwrap();
        mixer.set_channel_input(c1, Some(mic1.clone())).unwrap();
        assert_eq!(mixer.get_channel(c1).unwrap().input, Some(mic1));
    }

    #[test]
    fn test_same_input_allowed_across_mixers() {
        let f = fixture();
        let a = f.registry.add_mixer("A", 2).unwrap();
        let b = f.registry.add_mixer("B", 2).unwrap();
        let ca = a.add_channel().unwrap();
        let cb = b.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        a.set_channel_input(ca, Some(mic1.clone())).unwrap();
        b.set_channel_input(cb, Some(mic1)).unwrap();
    }

    #[test]
    fn test_clearing_input_always_succeeds() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let c2 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();
        mixer.set_channel_input(c1, Some(mic1)).unwrap();

        mixer.set_channel_input(c2, None).unwrap();
        mixer.set_channel_input(c2, None).unwrap();
    }

    #[test]
    fn test_missing_channel_is_not_found() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        for err in [
            mixer.get_channel(42).unwrap_err(),
            mixer.remove_channel(42).unwrap_err(),
            mixer.set_channel_gain(42, 0.5).unwrap_err(),
            mixer.set_channel_input(42, Some(mic1)).unwrap_err(),
            mixer.set_channel_input(42, None).unwrap_err(),
        ] {
            assert_eq!(
                err,
                MixerError::ChannelNotFound {
                    mixer: mixer.id(),
                    channel: 42
                }
            );
        }
    }

    #[test]
    fn test_gain_has_no_range() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();

        mixer.set_channel_gain(c1, 12.5).unwrap();
        assert_eq!(mixer.get_channel(c1).unwrap().gain, 12.5);
        mixer.set_channel_gain(c1, -3.0).unwrap();
        assert_eq!(mixer.get_channel(c1).unwrap().gain, -3.0);
    }

    #[test]
    fn test_add_channel_refused_while_bound() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let existing = mixer.add_channel().unwrap();

        f.engine.attach_sink(&mixer.id());
        assert!(mixer.in_use());
        assert_eq!(mixer.add_channel(), Err(MixerError::InUse(mixer.id())));
        assert_eq!(mixer.get_channel_ids(), vec![existing]);

        f.engine.detach_sink(&mixer.id());
        let added = mixer.add_channel().unwrap();
        assert_eq!(mixer.get_channel_ids(), vec![existing, added]);
    }

    #[test]
    fn test_remove_channel_allowed_while_bound() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();

        f.engine.attach_sink(&mixer.id());
        mixer.remove_channel(c1).unwrap();
        assert!(mixer.get_channel_ids().is_empty());

        let unit = f.engine.unit(&mixer.id()).unwrap();
        assert!(unit.active_slots().is_empty());
    }

    #[test]
    fn test_mutations_allowed_while_bound() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();
        f.engine.attach_sink(&mixer.id());

        mixer.rename("Live").unwrap();
        mixer.set_channel_gain(c1, 0.5).unwrap();
        mixer.set_channel_input(c1, Some(mic1)).unwrap();
        assert_eq!(mixer.display_name(), "Live");
    }

    #[test]
    fn test_events_published() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        mixer.rename("Renamed").unwrap();
        mixer.set_channel_gain(c1, 0.5).unwrap();
        mixer.set_channel_input(c1, Some(mic1)).unwrap();
        mixer.remove_channel(c1).unwrap();

        assert_eq!(
            f.notifier.names(),
            vec![
                "mixer_create",
                "mixer_channel_create",
                "mixer_update",
                "mixer_channel_update",
                "mixer_channel_update",
                "mixer_channel_remove",
            ]
        );

        let events = f.notifier.events();
        assert_eq!(
            events[4],
            MixerEvent::MixerChannelUpdate {
                mixer: mixer.id(),
                channel: c1,
                change: ChannelChange::Input {
                    input: Some("mic1".to_string())
                },
            }
        );
    }

    #[test]
    fn test_failed_operations_publish_nothing() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let c2 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();
        mixer.set_channel_input(c1, Some(mic1.clone())).unwrap();
        let before = f.notifier.events().len();

        assert!(mixer.set_channel_input(c2, Some(mic1)).is_err());
        assert!(mixer.remove_channel(99).is_err());
        f.engine.attach_sink(&mixer.id());
        assert!(mixer.add_channel().is_err());

        assert_eq!(f.notifier.events().len(), before);
    }

    #[test]
    fn test_details_snapshot() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        mixer
            .set_channel_input(c1, Some(f.inputs.resolve("mic2").unwrap()))
            .unwrap();

        let details = mixer.details();
        assert_eq!(details.display_name, "Main");
        assert_eq!(details.output_channels, 2);
        assert!(!details.in_use);
        assert_eq!(details.channels.len(), 1);
        assert_eq!(details.channels[0].input.as_deref(), Some("mic2"));
    }

    #[test]
    fn test_concurrent_routing_of_one_input() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let channels: Vec<ChannelId> = (0..8).map(|_| mixer.add_channel().unwrap()).collect();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        let successes: usize = std::thread::scope(|s| {
            let handles: Vec<_> = channels
                .iter()
                .map(|&channel| {
                    let mixer = mixer.clone();
                    let mic1 = mic1.clone();
                    s.spawn(move || mixer.set_channel_input(channel, Some(mic1)).is_ok())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, 1);
        let routed = mixer
            .channels()
            .iter()
            .filter(|c| c.is_routed_from(&mic1))
            .count();
        assert_eq!(routed, 1);
    }

    #[test]
    fn test_update_channel_applies_input_and_gain_together() {
        let f = fixture();
        let mixer = f.registry.add_mixer("Main", 2).unwrap();
        let c1 = mixer.add_channel().unwrap();
        let c2 = mixer.add_channel().unwrap();
        let mic1 = f.inputs.resolve("mic1").unwrap();

        mixer
            .update_channel(c1, Some(Some(mic1.clone())), Some(0.5))
            .unwrap();
        let channel = mixer.get_channel(c1).unwrap();
        assert_eq!(channel.input, Some(mic1.clone()));
        assert_eq!(channel.gain, 0.5);

        let before = f.notifier.events().len();
        assert!(matches!(
            mixer.update_channel(c2, Some(Some(mic1)), Some(0.25)),
            Err(MixerError::Conflict { .. })
        ));
        assert_eq!(mixer.get_channel(c2).unwrap().gain, mixdesk_types::DEFAULT_GAIN);
        assert_eq!(f.notifier.events().len(), before);

        mixer.update_channel(c1, Some(None), None).unwrap();
        assert_eq!(mixer.get_channel(c1).unwrap().input, None);
        assert_eq!(mixer.get_channel(c1).unwrap().gain, 0.5);
    }

    #[derive(Debug)]
    struct ExhaustedUnit;

    impl MixingUnit for ExhaustedUnit {
        fn channel_count(&self) -> u32 {
            2
        }

        fn is_bound(&self) -> bool {
            false
        }

        fn add_channel_slot(&self) -> Option<ChannelId> {
            None
        }

        fn remove_channel_slot(&self, _id: ChannelId) -> bool {
            false
        }
    }

    #[test]
    fn test_add_channel_when_ids_exhausted() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mixer = Mixer::new(
            uuid::Uuid::new_v4(),
            0,
            "Full".to_string(),
            Arc::new(ExhaustedUnit),
            notifier.clone(),
        );

        assert_eq!(
            mixer.add_channel(),
            Err(MixerError::ChannelsExhausted(mixer.id()))
        );
        assert!(mixer.get_channel_ids().is_empty());
        assert!(notifier.events().is_empty());
    }
}
