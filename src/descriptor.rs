//! Method-descriptor grammar
//!
//! Descriptors use the JVM surface syntax: `(II)V`, `(Ljava/util/List;)I`,
//! `([BLjava/lang/String;)[I`. A method descriptor is parsed into its
//! parameter field types and return type, transformed (the rewriter prepends
//! the former receiver as a leading parameter), and reassembled textually.
//! Parameters are kept as descriptor substrings so reassembly reproduces the
//! input byte-for-byte when nothing changed.

use crate::error::{Error, Result};
use std::fmt;

/// A parsed method descriptor: parameter field types plus a return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Parameter types, each a field-type descriptor like `I` or `LFoo;`
    pub params: Vec<String>,
    /// Return type descriptor; `V` for void
    pub ret: String,
}

impl MethodDescriptor {
    /// Parse a method descriptor of the form `(ParamType*)ReturnType`.
    pub fn parse(descriptor: &str) -> Result<MethodDescriptor> {
        let bytes = descriptor.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(Error::malformed_descriptor(descriptor, "expected '('"));
        }

        let mut params = Vec::new();
        let mut pos = 1;
        while pos < bytes.len() && bytes[pos] != b')' {
            let end = scan_field_type(descriptor, pos)?;
            params.push(descriptor[pos..end].to_string());
            pos = end;
        }
        if pos >= bytes.len() {
            return Err(Error::malformed_descriptor(descriptor, "missing ')'"));
        }
        pos += 1; // consume ')'

        if pos >= bytes.len() {
            return Err(Error::malformed_descriptor(descriptor, "missing return type"));
        }
        let ret_end = if bytes[pos] == b'V' {
            pos + 1
        } else {
            scan_field_type(descriptor, pos)?
        };
        if ret_end != bytes.len() {
            return Err(Error::malformed_descriptor(
                descriptor,
                "trailing characters after return type",
            ));
        }

        Ok(MethodDescriptor { params, ret: descriptor[pos..ret_end].to_string() })
    }

    /// Insert a field type as the new first parameter. Used to turn the
    /// implicit receiver of a receiver-bound call into an explicit argument.
    pub fn prepend_param(&mut self, field_type: String) {
        self.params.insert(0, field_type);
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for p in &self.params {
            write!(f, "{}", p)?;
        }
        write!(f, "){}", self.ret)
    }
}

/// Convert an owner's internal name (`java/util/List`) into a field-type
/// descriptor (`Ljava/util/List;`). Array owners are already descriptors
/// and pass through unchanged.
pub fn object_descriptor(internal_name: &str) -> String {
    if internal_name.starts_with('[') {
        internal_name.to_string()
    } else {
        format!("L{};", internal_name)
    }
}

/// Scan one field type starting at byte offset `pos`, returning the offset
/// one past its end.
fn scan_field_type(descriptor: &str, mut pos: usize) -> Result<usize> {
    let bytes = descriptor.as_bytes();

    // Array dimensions prefix the element type.
    while pos < bytes.len() && bytes[pos] == b'[' {
        pos += 1;
    }
    let Some(&c) = bytes.get(pos) else {
        return Err(Error::malformed_descriptor(descriptor, "dangling '['"));
    };

    match c {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Ok(pos + 1),
        b'L' => {
            let rest = &bytes[pos + 1..];
            match rest.iter().position(|&b| b == b';') {
                Some(semi) if semi > 0 => Ok(pos + 1 + semi + 1),
                Some(_) => Err(Error::malformed_descriptor(descriptor, "empty class name")),
                None => Err(Error::malformed_descriptor(descriptor, "unterminated 'L...;'")),
            }
        }
        other => Err(Error::malformed_descriptor(
            descriptor,
            format!("unexpected character {:?}", other as char),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_params() {
        let d = MethodDescriptor::parse("()V").unwrap();
        assert!(d.params.is_empty());
        assert_eq!(d.ret, "V");
    }

    #[test]
    fn test_parse_primitives() {
        let d = MethodDescriptor::parse("(IJZ)D").unwrap();
        assert_eq!(d.params, vec!["I", "J", "Z"]);
        assert_eq!(d.ret, "D");
    }

    #[test]
    fn test_parse_objects_and_arrays() {
        let d = MethodDescriptor::parse("([BLjava/lang/String;[[I)Ljava/util/Iterator;").unwrap();
        assert_eq!(d.params, vec!["[B", "Ljava/lang/String;", "[[I"]);
        assert_eq!(d.ret, "Ljava/util/Iterator;");
    }

    #[test]
    fn test_roundtrip_display() {
        for s in ["()V", "(I)I", "(Ljava/lang/Object;[J)[Ljava/lang/String;"] {
            let d = MethodDescriptor::parse(s).unwrap();
            assert_eq!(d.to_string(), s);
        }
    }

    #[test]
    fn test_prepend_param() {
        let mut d = MethodDescriptor::parse("(I)I").unwrap();
        d.prepend_param(object_descriptor("Foo"));
        assert_eq!(d.to_string(), "(LFoo;I)I");
    }

    #[test]
    fn test_object_descriptor_array_owner() {
        assert_eq!(object_descriptor("[Ljava/lang/Object;"), "[Ljava/lang/Object;");
        assert_eq!(object_descriptor("java/util/List"), "Ljava/util/List;");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "I", "(I", "()", "(Q)V", "([)V", "(LFoo)V", "(L;)V", "()VV", "()Ix"] {
            assert!(
                matches!(
                    MethodDescriptor::parse(bad),
                    Err(crate::Error::MalformedDescriptor { .. })
                ),
                "expected parse failure for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_void_only_valid_as_return() {
        assert!(MethodDescriptor::parse("(V)V").is_err());
    }
}
