//! An in-memory driver that records every call and tracks handle validity.
//!
//! Used by tests and the sampler bench in place of a real GL context.
//! Calls that touch a handle which was never allocated, or was already
//! deleted, are recorded as violations instead of failing.

use crate::gfx::{Driver, SamplerParam, TextureId, TextureTarget};
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverCall {
    Bind {
        target: TextureTarget,
        id: TextureId,
    },
    Parameter {
        target: TextureTarget,
        param: SamplerParam,
    },
    Delete {
        id: TextureId,
    },
}

#[derive(Default)]
pub struct RecordingDriver {
    calls: RefCell<Vec<DriverCall>>,
    violations: RefCell<Vec<DriverCall>>,
    live: RefCell<FxHashSet<TextureId>>,
    bound: RefCell<FxHashMap<TextureTarget, TextureId>>,
    next_id: Cell<TextureId>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh, live texture name. Names are never reused.
    pub fn create_texture(&self) -> TextureId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.live.borrow_mut().insert(id);
        id
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.live.borrow().contains(&id)
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<DriverCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn violations(&self) -> Vec<DriverCall> {
        self.violations.borrow().clone()
    }

    pub fn bind_calls(&self) -> usize {
        self.count(|c| matches!(c, DriverCall::Bind { .. }))
    }

    pub fn parameter_calls(&self) -> usize {
        self.count(|c| matches!(c, DriverCall::Parameter { .. }))
    }

    pub fn delete_calls(&self) -> usize {
        self.count(|c| matches!(c, DriverCall::Delete { .. }))
    }

    pub fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(*c)).count()
    }

    fn record(&self, call: DriverCall, valid: bool) {
        if !valid {
            warn!("Driver call on an invalid texture handle: {call:?}");
            self.violations.borrow_mut().push(call);
        }
        self.calls.borrow_mut().push(call);
    }
}

impl Driver for RecordingDriver {
    fn bind_texture(&self, target: TextureTarget, id: TextureId) {
        let valid = self.is_live(id);
        self.bound.borrow_mut().insert(target, id);
        self.record(DriverCall::Bind { target, id }, valid);
    }

    fn tex_parameter(&self, target: TextureTarget, param: SamplerParam) {
        let valid = self
            .bound
            .borrow()
            .get(&target)
            .is_some_and(|id| self.is_live(*id));
        self.record(DriverCall::Parameter { target, param }, valid);
    }

    fn delete_texture(&self, id: TextureId) {
        let valid = self.live.borrow_mut().remove(&id);
        self.record(DriverCall::Delete { id }, valid);
    }
}
