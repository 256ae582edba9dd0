//! Call-site observers
//!
//! Every synthesized dynamic call site is reported to an injectable sink.
//! Observation is diagnostic only and has no effect on output bytes.

use crate::classfile::BootstrapRef;
use tracing::info;

/// Sink for call-site synthesis events.
pub trait CallSiteObserver {
    /// Called once per synthesized dynamic call site, after the replacement
    /// instruction has been emitted.
    fn call_site(&mut self, name: &str, descriptor: &str, bootstrap: &BootstrapRef);
}

/// Default observer: drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl CallSiteObserver for Discard {
    fn call_site(&mut self, _name: &str, _descriptor: &str, _bootstrap: &BootstrapRef) {}
}

/// Logs each synthesized call site through `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct Trace;

impl CallSiteObserver for Trace {
    fn call_site(&mut self, name: &str, descriptor: &str, bootstrap: &BootstrapRef) {
        info!(name, descriptor, bootstrap = %bootstrap, "invokedynamic");
    }
}

/// One recorded call-site synthesis event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSiteEvent {
    pub name: String,
    pub descriptor: String,
    pub bootstrap: BootstrapRef,
}

/// Collects every event; used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct Recording {
    pub events: Vec<CallSiteEvent>,
}

impl CallSiteObserver for Recording {
    fn call_site(&mut self, name: &str, descriptor: &str, bootstrap: &BootstrapRef) {
        self.events.push(CallSiteEvent {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            bootstrap: bootstrap.clone(),
        });
    }
}
