//! Shared test helpers for integration tests

use indify::classfile::{AccessFlags, Attribute, ClassFile, Instruction, Method, OpaqueKind};

/// Build a unit with a single `run()V` method holding `code`.
pub fn unit_with_body(code: Vec<Instruction>) -> ClassFile {
    ClassFile {
        version: (1, 0),
        name: "com/example/Foo".to_string(),
        superclass: "java/lang/Object".to_string(),
        interfaces: vec!["java/lang/Iterable".to_string()],
        access: AccessFlags::PUBLIC,
        fields: vec![],
        methods: vec![Method {
            access: AccessFlags::PUBLIC,
            name: "run".to_string(),
            descriptor: "()V".to_string(),
            code,
            attributes: vec![],
        }],
        attributes: vec![Attribute { name: "SourceFile".to_string(), data: b"Foo.cu".to_vec() }],
    }
}

/// A few representative opaque instructions.
#[allow(dead_code)]
pub fn opaque_body() -> Vec<Instruction> {
    vec![
        Instruction::opaque(OpaqueKind::Label, vec![0x00]),
        Instruction::opaque(OpaqueKind::Local, vec![0x19, 0x01]),
        Instruction::opaque(OpaqueKind::Const, vec![0x10, 0x2A]),
        Instruction::opaque(OpaqueKind::Branch, vec![0xA7, 0x00, 0x05]),
        Instruction::opaque(OpaqueKind::LineInfo, vec![0x00, 0x11]),
        Instruction::opaque(OpaqueKind::Misc, vec![0xB1]),
    ]
}
