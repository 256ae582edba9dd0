//! Per-method instruction rewriting
//!
//! This is the core of the tool: one pass over one method body, forwarding
//! every instruction except direct calls, which are replaced one-for-one
//! with bootstrap-bound dynamic call sites.
//!
//! Signature rule: a receiver-bound call (interface/virtual/special) has no
//! receiver slot once it becomes a dynamic call site, so the owner type is
//! prepended as an explicit first parameter. Static calls keep their
//! parameter list unchanged. The original dispatch kind survives only as
//! the `<kind-tag>:` prefix of the call-site name.

use crate::classfile::{BootstrapRef, DispatchKind, Instruction};
use crate::descriptor::{object_descriptor, MethodDescriptor};
use crate::error::{Error, Result};
use crate::rewrite::observer::CallSiteObserver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Started,
    InBody,
    Ended,
}

/// Rewrites one method body into an output instruction sequence.
///
/// Lifecycle: construct, `visit` each input instruction in order, `finish`.
/// Any call after `finish` is a [`Error::Protocol`] violation.
pub struct MethodRewriter<'a> {
    out: &'a mut Vec<Instruction>,
    observer: &'a mut dyn CallSiteObserver,
    state: State,
}

impl<'a> MethodRewriter<'a> {
    pub fn new(out: &'a mut Vec<Instruction>, observer: &'a mut dyn CallSiteObserver) -> Self {
        MethodRewriter { out, observer, state: State::Started }
    }

    /// Process one input instruction, appending exactly one instruction to
    /// the output.
    pub fn visit(&mut self, insn: &Instruction) -> Result<()> {
        match self.state {
            State::Started => self.state = State::InBody,
            State::InBody => {}
            State::Ended => {
                return Err(Error::Protocol(
                    "instruction visited after method body ended".to_string(),
                ));
            }
        }

        match insn {
            Instruction::Call { opcode, owner, name, descriptor } => {
                match DispatchKind::from_opcode(*opcode) {
                    Some(kind) => self.rewrite_call(kind, owner, name, descriptor)?,
                    // Unknown dispatch opcode: forward verbatim rather than
                    // guess at a signature transformation.
                    None => self.out.push(insn.clone()),
                }
            }
            Instruction::Dynamic { .. } | Instruction::Opaque { .. } => {
                self.out.push(insn.clone());
            }
        }
        Ok(())
    }

    /// Mark the body complete. Terminal; a second `finish` is a protocol
    /// violation like any other post-end visit.
    pub fn finish(&mut self) -> Result<()> {
        if self.state == State::Ended {
            return Err(Error::Protocol("method body ended twice".to_string()));
        }
        self.state = State::Ended;
        Ok(())
    }

    fn rewrite_call(
        &mut self,
        kind: DispatchKind,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<()> {
        let mut parsed = MethodDescriptor::parse(descriptor)?;
        if kind.is_receiver_bound() {
            parsed.prepend_param(object_descriptor(owner));
        }

        let call_site_name = format!("{}:{}", kind.tag(), name);
        let call_site_descriptor = parsed.to_string();

        // Input strings are bounded by the container's u16 length fields,
        // but the tag prefix and the prepended receiver grow them. Reject
        // anything the encoder could not frame.
        if call_site_name.len() > u16::MAX as usize
            || call_site_descriptor.len() > u16::MAX as usize
        {
            return Err(Error::malformed_descriptor(
                descriptor,
                "synthesized call site exceeds the 65535-byte string limit",
            ));
        }

        let bootstrap = BootstrapRef::well_known();

        self.out.push(Instruction::Dynamic {
            name: call_site_name.clone(),
            descriptor: call_site_descriptor.clone(),
            bootstrap: bootstrap.clone(),
        });
        self.observer.call_site(&call_site_name, &call_site_descriptor, &bootstrap);
        Ok(())
    }
}
