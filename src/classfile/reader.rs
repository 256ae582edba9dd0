//! Binary parser for the compiled-unit container format
//!
//! The whole unit is materialized from a byte slice before any
//! transformation runs. Every failure reports the byte offset at which
//! parsing stopped.

use super::{
    AccessFlags, Attribute, BootstrapRef, ClassFile, Field, Instruction, Method, OpaqueKind, MAGIC,
};
use crate::error::{Error, Result};

/// Instruction tag bytes in the container format.
pub(super) const TAG_CALL: u8 = 0x01;
pub(super) const TAG_DYNAMIC: u8 = 0x02;
pub(super) const TAG_OPAQUE: u8 = 0x03;

/// Parse a complete compiled unit from `bytes`.
pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
    let mut r = Reader { bytes, pos: 0 };

    let magic = r.u32("magic")?;
    if magic != MAGIC {
        return Err(Error::malformed_input(
            0,
            format!("bad magic 0x{:08X}, expected 0x{:08X}", magic, MAGIC),
        ));
    }

    let version = (r.u16("major version")?, r.u16("minor version")?);
    let name = r.string("class name")?;
    let superclass = r.string("superclass name")?;

    let interface_count = r.u16("interface count")?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(r.string("interface name")?);
    }

    let access = AccessFlags::from_bits_retain(r.u32("class access flags")?);

    let field_count = r.u16("field count")?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(r.field()?);
    }

    let method_count = r.u16("method count")?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(r.method()?);
    }

    let attributes = r.attributes()?;

    if r.pos != bytes.len() {
        return Err(Error::malformed_input(
            r.pos,
            format!("{} trailing bytes after class attributes", bytes.len() - r.pos),
        ));
    }

    Ok(ClassFile { version, name, superclass, interfaces, access, fields, methods, attributes })
}

/// Cursor over the input with offset tracking for error reporting.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        match self.bytes.get(self.pos..self.pos + n) {
            Some(slice) => {
                self.pos += n;
                Ok(slice)
            }
            None => Err(Error::malformed_input(self.pos, format!("truncated {}", what))),
        }
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self, what: &str) -> Result<String> {
        let len = self.u16(what)? as usize;
        let start = self.pos;
        let raw = self.take(len, what)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|e| Error::malformed_input(start, format!("invalid UTF-8 in {}: {}", what, e)))
    }

    fn field(&mut self) -> Result<Field> {
        Ok(Field {
            access: AccessFlags::from_bits_retain(self.u32("field access flags")?),
            name: self.string("field name")?,
            descriptor: self.string("field descriptor")?,
            attributes: self.attributes()?,
        })
    }

    fn method(&mut self) -> Result<Method> {
        let access = AccessFlags::from_bits_retain(self.u32("method access flags")?);
        let name = self.string("method name")?;
        let descriptor = self.string("method descriptor")?;

        let insn_count = self.u32("instruction count")?;
        let mut code = Vec::with_capacity(insn_count.min(1024) as usize);
        for _ in 0..insn_count {
            code.push(self.instruction()?);
        }

        Ok(Method { access, name, descriptor, code, attributes: self.attributes()? })
    }

    fn instruction(&mut self) -> Result<Instruction> {
        let tag_pos = self.pos;
        let tag = self.u8("instruction tag")?;
        match tag {
            TAG_CALL => Ok(Instruction::Call {
                opcode: self.u8("call opcode")?,
                owner: self.string("call owner")?,
                name: self.string("call name")?,
                descriptor: self.string("call descriptor")?,
            }),
            TAG_DYNAMIC => Ok(Instruction::Dynamic {
                name: self.string("call-site name")?,
                descriptor: self.string("call-site descriptor")?,
                bootstrap: BootstrapRef {
                    owner: self.string("bootstrap owner")?,
                    name: self.string("bootstrap name")?,
                    descriptor: self.string("bootstrap descriptor")?,
                },
            }),
            TAG_OPAQUE => {
                let kind_pos = self.pos;
                let kind_byte = self.u8("opaque kind")?;
                let kind = OpaqueKind::from_byte(kind_byte).ok_or_else(|| {
                    Error::malformed_input(
                        kind_pos,
                        format!("unknown opaque instruction kind 0x{:02X}", kind_byte),
                    )
                })?;
                let len = self.u16("opaque payload length")? as usize;
                let payload = self.take(len, "opaque payload")?.to_vec();
                Ok(Instruction::Opaque { kind, payload })
            }
            other => Err(Error::malformed_input(
                tag_pos,
                format!("unknown instruction tag 0x{:02X}", other),
            )),
        }
    }

    fn attributes(&mut self) -> Result<Vec<Attribute>> {
        let count = self.u16("attribute count")?;
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = self.string("attribute name")?;
            let len = self.u32("attribute length")? as usize;
            let data = self.take(len, "attribute data")?.to_vec();
            attributes.push(Attribute { name, data });
        }
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::super::encode;
    use super::*;
    use crate::classfile::DispatchKind;

    fn sample_unit() -> ClassFile {
        ClassFile {
            version: (1, 0),
            name: "com/example/Foo".to_string(),
            superclass: "java/lang/Object".to_string(),
            interfaces: vec!["java/lang/Iterable".to_string()],
            access: AccessFlags::PUBLIC | AccessFlags::FINAL,
            fields: vec![Field {
                access: AccessFlags::PRIVATE,
                name: "count".to_string(),
                descriptor: "I".to_string(),
                attributes: vec![],
            }],
            methods: vec![Method {
                access: AccessFlags::PUBLIC,
                name: "run".to_string(),
                descriptor: "()V".to_string(),
                code: vec![
                    Instruction::opaque(OpaqueKind::Local, vec![0x19, 0x01]),
                    Instruction::call(DispatchKind::Virtual, "Foo", "size", "()I"),
                    Instruction::opaque(OpaqueKind::Misc, vec![0xB1]),
                ],
                attributes: vec![Attribute { name: "Signature".to_string(), data: vec![1, 2] }],
            }],
            attributes: vec![Attribute { name: "SourceFile".to_string(), data: b"Foo.cu".to_vec() }],
        }
    }

    #[test]
    fn test_roundtrip() {
        let unit = sample_unit();
        let bytes = encode(&unit);
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed, unit);
        // Re-encoding the parse reproduces the bytes exactly.
        assert_eq!(encode(&parsed), bytes);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_unit());
        bytes[0] = 0x00;
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { offset: 0, .. }));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode(&sample_unit());
        for cut in [1, 7, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(parse(&bytes[..cut]), Err(Error::MalformedInput { .. })),
                "expected truncation error at {} bytes",
                cut
            );
        }
    }

    #[test]
    fn test_trailing_garbage() {
        let mut bytes = encode(&sample_unit());
        bytes.push(0xFF);
        assert!(matches!(parse(&bytes), Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn test_unknown_instruction_tag() {
        let unit = sample_unit();
        let bytes = encode(&unit);
        // The first instruction tag follows the method header; find it by
        // encoding a unit whose only difference is that tag byte.
        let probe = {
            let mut u = unit.clone();
            u.methods[0].code.clear();
            encode(&u)
        };
        // Locate where the encodings diverge: that is the instruction
        // count, instructions start 3 bytes later (count is u32).
        let div = bytes.iter().zip(probe.iter()).position(|(a, b)| a != b).unwrap();
        let insn_start = div + 1;
        let mut bad = bytes.clone();
        bad[insn_start] = 0x7F;
        assert!(matches!(parse(&bad), Err(Error::MalformedInput { .. })));
    }
}
