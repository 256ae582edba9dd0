//! Binary encoder for the compiled-unit container format
//!
//! Exact mirror of [`reader`](super::reader). Strings and opaque payloads
//! must fit their u16 length fields: the reader only yields in-bounds
//! values for parsed input, and the rewriter rejects synthesized call
//! sites that would overflow, so encoding itself stays infallible.

use super::reader::{TAG_CALL, TAG_DYNAMIC, TAG_OPAQUE};
use super::{Attribute, ClassFile, Instruction, MAGIC};

/// Encode a compiled unit into its binary container form.
pub fn encode(unit: &ClassFile) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);

    out.extend_from_slice(&MAGIC.to_be_bytes());
    out.extend_from_slice(&unit.version.0.to_be_bytes());
    out.extend_from_slice(&unit.version.1.to_be_bytes());
    put_string(&mut out, &unit.name);
    put_string(&mut out, &unit.superclass);

    out.extend_from_slice(&(unit.interfaces.len() as u16).to_be_bytes());
    for iface in &unit.interfaces {
        put_string(&mut out, iface);
    }

    out.extend_from_slice(&unit.access.bits().to_be_bytes());

    out.extend_from_slice(&(unit.fields.len() as u16).to_be_bytes());
    for field in &unit.fields {
        out.extend_from_slice(&field.access.bits().to_be_bytes());
        put_string(&mut out, &field.name);
        put_string(&mut out, &field.descriptor);
        put_attributes(&mut out, &field.attributes);
    }

    out.extend_from_slice(&(unit.methods.len() as u16).to_be_bytes());
    for method in &unit.methods {
        out.extend_from_slice(&method.access.bits().to_be_bytes());
        put_string(&mut out, &method.name);
        put_string(&mut out, &method.descriptor);
        out.extend_from_slice(&(method.code.len() as u32).to_be_bytes());
        for insn in &method.code {
            put_instruction(&mut out, insn);
        }
        put_attributes(&mut out, &method.attributes);
    }

    put_attributes(&mut out, &unit.attributes);
    out
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn put_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attr in attributes {
        put_string(out, &attr.name);
        out.extend_from_slice(&(attr.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&attr.data);
    }
}

fn put_instruction(out: &mut Vec<u8>, insn: &Instruction) {
    match insn {
        Instruction::Call { opcode, owner, name, descriptor } => {
            out.push(TAG_CALL);
            out.push(*opcode);
            put_string(out, owner);
            put_string(out, name);
            put_string(out, descriptor);
        }
        Instruction::Dynamic { name, descriptor, bootstrap } => {
            out.push(TAG_DYNAMIC);
            put_string(out, name);
            put_string(out, descriptor);
            put_string(out, &bootstrap.owner);
            put_string(out, &bootstrap.name);
            put_string(out, &bootstrap.descriptor);
        }
        Instruction::Opaque { kind, payload } => {
            out.push(TAG_OPAQUE);
            out.push(*kind as u8);
            out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            out.extend_from_slice(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{AccessFlags, BootstrapRef, DispatchKind, Method, OpaqueKind};
    use super::*;

    #[test]
    fn test_empty_unit_layout() {
        let unit = ClassFile {
            version: (1, 0),
            name: "A".to_string(),
            superclass: String::new(),
            interfaces: vec![],
            access: AccessFlags::PUBLIC,
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        };
        let bytes = encode(&unit);
        // magic + version + name(2+1) + empty superclass(2) + interface
        // count + access + field count + method count + attribute count
        assert_eq!(bytes.len(), 4 + 4 + 3 + 2 + 2 + 4 + 2 + 2 + 2);
        assert_eq!(&bytes[..4], &[0xCA, 0x11, 0xAB, 0x1E]);
    }

    #[test]
    fn test_identical_bodies_encode_identically() {
        let body = vec![
            Instruction::opaque(OpaqueKind::Const, vec![0x03]),
            Instruction::Dynamic {
                name: "invokevirtual:size".to_string(),
                descriptor: "(LFoo;)I".to_string(),
                bootstrap: BootstrapRef::well_known(),
            },
        ];
        let method = |code: Vec<Instruction>| Method {
            access: AccessFlags::PUBLIC,
            name: "m".to_string(),
            descriptor: "()V".to_string(),
            code,
            attributes: vec![],
        };
        let unit = |code: Vec<Instruction>| ClassFile {
            version: (1, 0),
            name: "A".to_string(),
            superclass: String::new(),
            interfaces: vec![],
            access: AccessFlags::empty(),
            fields: vec![],
            methods: vec![method(code)],
            attributes: vec![],
        };
        assert_eq!(encode(&unit(body.clone())), encode(&unit(body)));
    }

    #[test]
    fn test_call_encoding_keeps_raw_opcode() {
        let mut out = Vec::new();
        put_instruction(&mut out, &Instruction::call(DispatchKind::Static, "I", "f", "()V"));
        assert_eq!(out[0], TAG_CALL);
        assert_eq!(out[1], 0xB8);
    }
}
