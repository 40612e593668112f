//! Explicit runtime effect-queue executor for reducer-emitted side effects.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use crate::{reducer::RuntimeEffect, runtime_context::DesktopRuntime};

#[derive(Debug, Default)]
pub(crate) struct EffectQueue {
    pending: RefCell<VecDeque<RuntimeEffect>>,
    draining: Cell<bool>,
}

impl EffectQueue {
    /// Queues `effects` and drains the queue in order.
    ///
    /// A dispatch made while an effect runs only enqueues; the outer drain picks its effects up
    /// after the ones already queued.
    pub(crate) fn run(&self, runtime: &DesktopRuntime, effects: Vec<RuntimeEffect>) {
        self.pending.borrow_mut().extend(effects);
        if self.draining.replace(true) {
            return;
        }

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(effect) = next else {
                break;
            };
            runtime.host().run_runtime_effect(runtime, effect);
        }
        self.draining.set(false);
    }
}
