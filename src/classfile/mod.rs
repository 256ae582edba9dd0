//! Compiled-unit data model
//!
//! This module defines the in-memory form of a compiled unit: a header
//! (name, version, supertype, interfaces), fields, methods, and attributes.
//! Method bodies are ordered instruction sequences. Instructions are a
//! closed tagged union: direct calls carry full symbolic information so the
//! rewriter can analyze them; everything else is opaque and carried
//! byte-for-byte.
//!
//! The binary container format is defined by [`reader`] and [`writer`],
//! which mirror each other exactly.

mod reader;
mod writer;

pub use reader::parse;
pub use writer::encode;

use bitflags::bitflags;
use std::fmt;

/// Magic number identifying a compiled unit ("callable").
pub const MAGIC: u32 = 0xCA11_AB1E;

/// Current container format version written by [`encode`].
pub const FORMAT_VERSION: (u16, u16) = (1, 0);

bitflags! {
    /// Access and property flags for classes, fields, and methods.
    ///
    /// Values follow the JVM access-flag bit assignments.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AccessFlags: u32 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE     = 0x0040;
        const TRANSIENT    = 0x0080;
        const NATIVE       = 0x0100;
        const INTERFACE    = 0x0200;
        const ABSTRACT     = 0x0400;
        const SYNTHETIC    = 0x1000;
    }
}

/// A complete compiled unit: header, fields, methods, attributes.
///
/// Read once, transformed once, written once. Everything except method
/// bodies passes through the rewriter unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Format version (major, minor) as read from the input
    pub version: (u16, u16),
    /// Internal name of this unit, e.g. `com/example/Foo`
    pub name: String,
    /// Internal name of the supertype; empty for a root type
    pub superclass: String,
    /// Internal names of implemented interfaces
    pub interfaces: Vec<String>,
    /// Class-level access flags
    pub access: AccessFlags,
    /// Ordered field declarations
    pub fields: Vec<Field>,
    /// Ordered method declarations
    pub methods: Vec<Method>,
    /// Class-level attributes, uninterpreted
    pub attributes: Vec<Attribute>,
}

/// A field declaration. Never inspected by the rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

/// A method declaration with its instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub access: AccessFlags,
    pub name: String,
    /// Method descriptor, e.g. `(I)Ljava/lang/Integer;`
    pub descriptor: String,
    /// Ordered body instructions; empty for abstract/native methods
    pub code: Vec<Instruction>,
    pub attributes: Vec<Attribute>,
}

/// An uninterpreted named attribute blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data: Vec<u8>,
}

/// How a direct call selects its target.
///
/// Interface, virtual, and special dispatch are receiver-bound: an implicit
/// object receives the call. Static dispatch is not. Discriminant values
/// keep the JVM invoke-opcode numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatchKind {
    /// `invokevirtual` dispatch on the runtime type of the receiver
    Virtual = 0xB6,
    /// `invokespecial` dispatch: constructors, super calls, private calls
    Special = 0xB7,
    /// `invokestatic` dispatch, no receiver
    Static = 0xB8,
    /// `invokeinterface` dispatch through an interface type
    Interface = 0xB9,
}

impl DispatchKind {
    /// Decode a raw opcode byte. Returns `None` for anything outside the
    /// closed four-element set; such calls are forwarded, never rewritten.
    pub fn from_opcode(opcode: u8) -> Option<DispatchKind> {
        match opcode {
            0xB6 => Some(DispatchKind::Virtual),
            0xB7 => Some(DispatchKind::Special),
            0xB8 => Some(DispatchKind::Static),
            0xB9 => Some(DispatchKind::Interface),
            _ => None,
        }
    }

    /// The raw opcode byte for this dispatch kind.
    pub fn opcode(self) -> u8 {
        self as u8
    }

    /// The tag embedded in synthesized call-site names. This is the single
    /// channel by which the original dispatch kind survives rewriting; the
    /// bootstrap procedure decodes it from the call-site name.
    pub fn tag(self) -> &'static str {
        match self {
            DispatchKind::Virtual => "invokevirtual",
            DispatchKind::Special => "invokespecial",
            DispatchKind::Static => "invokestatic",
            DispatchKind::Interface => "invokeinterface",
        }
    }

    /// Whether an implicit object receives the call. Receiver-bound calls
    /// get the owner type prepended to the rewritten parameter list.
    pub fn is_receiver_bound(self) -> bool {
        !matches!(self, DispatchKind::Static)
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Category of an opaque instruction.
///
/// The rewriter never looks inside these; the category exists so the
/// container format stays self-describing. Bijective with its wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpaqueKind {
    /// Branches and jumps
    Branch = 0x01,
    /// Local variable loads/stores
    Local = 0x02,
    /// Constant pushes
    Const = 0x03,
    /// Branch-target labels
    Label = 0x04,
    /// Exception-table entries
    ExceptionEntry = 0x05,
    /// Line-number debug metadata
    LineInfo = 0x06,
    /// Stack-map frames
    StackMapFrame = 0x07,
    /// Anything else (stack shuffles, arithmetic, returns, ...)
    Misc = 0x08,
}

impl OpaqueKind {
    pub fn from_byte(byte: u8) -> Option<OpaqueKind> {
        match byte {
            0x01 => Some(OpaqueKind::Branch),
            0x02 => Some(OpaqueKind::Local),
            0x03 => Some(OpaqueKind::Const),
            0x04 => Some(OpaqueKind::Label),
            0x05 => Some(OpaqueKind::ExceptionEntry),
            0x06 => Some(OpaqueKind::LineInfo),
            0x07 => Some(OpaqueKind::StackMapFrame),
            0x08 => Some(OpaqueKind::Misc),
            _ => None,
        }
    }
}

/// Reference to the bootstrap procedure a dynamic call site is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapRef {
    /// Internal name of the type hosting the bootstrap procedure
    pub owner: String,
    /// Name of the bootstrap procedure
    pub name: String,
    /// Descriptor of the bootstrap procedure
    pub descriptor: String,
}

impl BootstrapRef {
    /// The fixed, environment-provided bootstrap: a zero-argument static
    /// procedure on the root object type.
    ///
    /// Contract for the external implementation: given the call-site name
    /// (which embeds the original dispatch tag and method name) and the
    /// call-site descriptor, resolve a target consistent with the original
    /// dispatch semantics. For receiver-bound kinds the first argument is
    /// the former receiver. Note that `invokespecial:` sites include
    /// constructor and super/private calls; a bootstrap must not assume
    /// constructor calls were excluded.
    pub fn well_known() -> BootstrapRef {
        BootstrapRef {
            owner: "java/lang/Object".to_string(),
            name: "bootstrap".to_string(),
            descriptor: "()V".to_string(),
        }
    }
}

impl fmt::Display for BootstrapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// One instruction in a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// A direct method invocation. `opcode` is kept raw so calls with an
    /// unknown dispatch opcode remain representable and can be forwarded
    /// verbatim; decode with [`DispatchKind::from_opcode`].
    Call {
        opcode: u8,
        /// Internal name of the type owning the target method
        owner: String,
        /// Target method name
        name: String,
        /// Target method descriptor
        descriptor: String,
    },

    /// A dynamic call site resolved at run time through a bootstrap
    /// procedure. Synthesized by the rewriter; also accepted on input so an
    /// already-rewritten unit passes through untouched.
    Dynamic {
        /// Call-site name, `<dispatch-tag>:<method-name>` when synthesized
        name: String,
        /// Call-site descriptor
        descriptor: String,
        bootstrap: BootstrapRef,
    },

    /// Any other instruction, carried byte-for-byte.
    Opaque { kind: OpaqueKind, payload: Vec<u8> },
}

impl Instruction {
    /// Shorthand for building a direct call with a known dispatch kind.
    pub fn call(
        kind: DispatchKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Instruction {
        Instruction::Call {
            opcode: kind.opcode(),
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Shorthand for an opaque instruction.
    pub fn opaque(kind: OpaqueKind, payload: impl Into<Vec<u8>>) -> Instruction {
        Instruction::Opaque { kind, payload: payload.into() }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Call { opcode, owner, name, descriptor } => {
                match DispatchKind::from_opcode(*opcode) {
                    Some(kind) => write!(f, "{} {}.{}{}", kind, owner, name, descriptor),
                    None => write!(f, "call[0x{:02X}] {}.{}{}", opcode, owner, name, descriptor),
                }
            }
            Instruction::Dynamic { name, descriptor, bootstrap } => {
                write!(f, "invokedynamic {}{} bootstrap={}", name, descriptor, bootstrap)
            }
            Instruction::Opaque { kind, payload } => {
                write!(f, "opaque {:?} ({} bytes)", kind, payload.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_kind_opcode_roundtrip() {
        for kind in [
            DispatchKind::Virtual,
            DispatchKind::Special,
            DispatchKind::Static,
            DispatchKind::Interface,
        ] {
            assert_eq!(DispatchKind::from_opcode(kind.opcode()), Some(kind));
        }
        assert_eq!(DispatchKind::from_opcode(0x00), None);
        assert_eq!(DispatchKind::from_opcode(0xBA), None);
    }

    #[test]
    fn test_receiver_bound() {
        assert!(DispatchKind::Virtual.is_receiver_bound());
        assert!(DispatchKind::Special.is_receiver_bound());
        assert!(DispatchKind::Interface.is_receiver_bound());
        assert!(!DispatchKind::Static.is_receiver_bound());
    }

    #[test]
    fn test_well_known_bootstrap() {
        let bs = BootstrapRef::well_known();
        assert_eq!(bs.to_string(), "java/lang/Object.bootstrap()V");
    }

    #[test]
    fn test_instruction_display() {
        let insn = Instruction::call(DispatchKind::Virtual, "Foo", "size", "()I");
        assert_eq!(insn.to_string(), "invokevirtual Foo.size()I");
    }
}
