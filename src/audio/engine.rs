use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};
use std::sync::Arc;

use crate::audio::ring_buffer::ScopeProducer;
use crate::params::{ParameterSnapshot, ParameterStore};
use crate::sim::chain::DistortionChain;

const MESSAGE_CHANNEL_CAPACITY: usize = 8;

pub enum EngineMessage {
    /// Start feeding channel 0 to an oscilloscope.
    AttachScope(ScopeProducer),
    DetachScope,
}

/// Audio-thread side of the effect.
///
/// Owns the chain and its filter state outright; nothing else touches them.
pub struct Engine {
    chain: DistortionChain,
    params: Arc<ParameterStore>,
    /// Telemetry tap on channel 0, present while a scope is open.
    scope: Option<ScopeProducer>,
    rx_updates: Receiver<EngineMessage>,
    /// Replaced producers go back to the control side to be dropped there.
    tx_retired: Sender<ScopeProducer>,
}

/// Control-side handle for an [`Engine`] running elsewhere.
#[derive(Clone)]
pub struct EngineHandle {
    tx_updates: Sender<EngineMessage>,
    rx_retired: Receiver<ScopeProducer>,
    params: Arc<ParameterStore>,
}

impl Engine {
    pub fn new(params: Arc<ParameterStore>) -> (Self, EngineHandle) {
        let (tx_updates, rx_updates) = bounded(MESSAGE_CHANNEL_CAPACITY);
        let (tx_retired, rx_retired) = bounded(MESSAGE_CHANNEL_CAPACITY);

        (
            Self {
                chain: DistortionChain::new(),
                params: Arc::clone(&params),
                scope: None,
                rx_updates,
                tx_retired,
            },
            EngineHandle {
                tx_updates,
                rx_retired,
                params,
            },
        )
    }

    /// Process one host block in place.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) {
        self.handle_messages();

        let block_len = channels.first().map_or(0, |c| c.len());
        if block_len == 0 {
            return;
        }

        let params = self.params.snapshot();
        self.process_with(channels, &params);
    }

    /// Process one block with explicitly supplied parameters.
    pub fn process_with(&mut self, channels: &mut [&mut [f32]], params: &ParameterSnapshot) {
        self.chain.process_block(channels, params);

        if let (Some(scope), Some(first)) = (self.scope.as_mut(), channels.first()) {
            scope.push(first);
        }
    }

    pub fn handle_messages(&mut self) {
        while let Ok(message) = self.rx_updates.try_recv() {
            let previous = match message {
                EngineMessage::AttachScope(producer) => self.scope.replace(producer),
                EngineMessage::DetachScope => self.scope.take(),
            };
            if let Some(producer) = previous {
                self.retire(producer);
            }
        }
    }

    fn retire(&self, producer: ScopeProducer) {
        // Dropped here only if every handle is gone or the queue is full.
        let _ = self.tx_retired.try_send(producer);
    }

    pub fn has_scope(&self) -> bool {
        self.scope.is_some()
    }
}

impl EngineHandle {
    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn attach_scope(&self, producer: ScopeProducer) {
        self.send(EngineMessage::AttachScope(producer));
        debug!("Scope attach requested");
    }

    pub fn detach_scope(&self) {
        self.send(EngineMessage::DetachScope);
        debug!("Scope detach requested");
    }

    /// Drop scope producers the engine has let go of. The ring memory is freed
    /// here rather than on the audio thread.
    pub fn collect_retired(&self) -> usize {
        let count = self.rx_retired.try_iter().count();
        if count > 0 {
            debug!("Released {count} retired scope producer(s)");
        }
        count
    }

    fn send(&self, message: EngineMessage) {
        match self.tx_updates.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Engine message queue full, dropping message"),
            Err(TrySendError::Disconnected(_)) => warn!("Engine is gone, dropping message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ring_buffer::scope_buffer;
    use crate::params::ParameterId;

    #[test]
    fn reads_parameters_from_store() {
        let store = Arc::new(ParameterStore::default());
        let (mut engine, handle) = Engine::new(store);
        handle.params().set(ParameterId::DryWet, 0.0);
        handle.params().set(ParameterId::Drive, 300.0);

        let mut block = vec![0.3f32; 64];
        engine.process(&mut [&mut block]);
        assert!(block.iter().all(|&s| s == 0.3));
    }

    #[test]
    fn scope_receives_channel_zero_only_while_attached() {
        let (mut engine, handle) = Engine::new(Arc::new(ParameterStore::default()));
        let (tx, rx) = scope_buffer();

        let mut left = vec![0.25f32; 32];
        let mut right = vec![-0.75f32; 32];
        engine.process(&mut [&mut left, &mut right]);
        assert_eq!(rx.ready_count(), 0);

        handle.attach_scope(tx);
        engine.process(&mut [&mut left, &mut right]);
        assert!(engine.has_scope());
        assert_eq!(rx.ready_count(), 32);

        handle.detach_scope();
        engine.process(&mut [&mut left, &mut right]);
        assert!(!engine.has_scope());
        assert_eq!(rx.ready_count(), 32);
    }

    #[test]
    fn replaced_producers_are_handed_back() {
        let (mut engine, handle) = Engine::new(Arc::new(ParameterStore::default()));
        let (first, first_rx) = scope_buffer();
        let (second, _second_rx) = scope_buffer();
        drop(first_rx);

        handle.attach_scope(first);
        engine.handle_messages();
        assert_eq!(handle.collect_retired(), 0);

        // The consumer of the first ring is gone; the engine must not be the
        // one to free it.
        handle.attach_scope(second);
        engine.handle_messages();
        assert!(engine.has_scope());
        assert_eq!(handle.collect_retired(), 1);

        handle.detach_scope();
        engine.handle_messages();
        assert!(!engine.has_scope());
        assert_eq!(handle.collect_retired(), 1);
        assert_eq!(handle.collect_retired(), 0);
    }

    #[test]
    fn empty_block_pushes_nothing() {
        let (mut engine, handle) = Engine::new(Arc::new(ParameterStore::default()));
        let (tx, rx) = scope_buffer();
        handle.attach_scope(tx);

        let mut empty: Vec<f32> = Vec::new();
        engine.process(&mut [&mut empty]);
        engine.process(&mut []);
        assert!(engine.has_scope());
        assert_eq!(rx.ready_count(), 0);
    }
}
