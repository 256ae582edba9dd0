//! Whole-unit transformation
//!
//! [`ClassRewriter`] drives one pass over a compiled unit: header, fields,
//! and attributes are forwarded with no inspection; each method body is
//! rebuilt through a fresh [`MethodRewriter`] bound to that method's output
//! sequence. [`rewrite_file`] wraps the pass with file I/O and an atomic
//! write so no reader ever observes a partially rewritten unit.

mod method;
pub mod observer;

pub use method::MethodRewriter;
pub use observer::{CallSiteObserver, Discard, Recording, Trace};

use crate::classfile::{self, ClassFile, Method};
use crate::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Forwards a compiled unit's structure, delegating each method body to a
/// fresh [`MethodRewriter`].
pub struct ClassRewriter<'a> {
    observer: &'a mut dyn CallSiteObserver,
}

impl<'a> ClassRewriter<'a> {
    pub fn new(observer: &'a mut dyn CallSiteObserver) -> Self {
        ClassRewriter { observer }
    }

    /// Transform one unit. The input is never mutated; on any error the
    /// partially built output is discarded.
    pub fn transform(&mut self, unit: &ClassFile) -> Result<ClassFile> {
        let mut methods = Vec::with_capacity(unit.methods.len());
        for method in &unit.methods {
            methods.push(self.transform_method(method)?);
        }

        Ok(ClassFile {
            version: unit.version,
            name: unit.name.clone(),
            superclass: unit.superclass.clone(),
            interfaces: unit.interfaces.clone(),
            access: unit.access,
            fields: unit.fields.clone(),
            methods,
            attributes: unit.attributes.clone(),
        })
    }

    fn transform_method(&mut self, method: &Method) -> Result<Method> {
        debug!(method = %method.name, descriptor = %method.descriptor, "rewriting method body");

        let mut code = Vec::with_capacity(method.code.len());
        let mut rewriter = MethodRewriter::new(&mut code, self.observer);
        for insn in &method.code {
            rewriter.visit(insn)?;
        }
        rewriter.finish()?;

        Ok(Method {
            access: method.access,
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
            code,
            attributes: method.attributes.clone(),
        })
    }
}

/// Transform a single unit with the given observer.
pub fn transform(unit: &ClassFile, observer: &mut dyn CallSiteObserver) -> Result<ClassFile> {
    ClassRewriter::new(observer).transform(unit)
}

/// Read a compiled unit from `input`, rewrite it, and write the result to
/// `output`.
///
/// The whole input is materialized before the pass runs, and the output is
/// staged in a temporary file in the destination directory and persisted
/// over `output` only after a fully successful transformation. On any
/// failure `output` is not created and an existing file is left untouched.
pub fn rewrite_file(
    input: &Path,
    output: &Path,
    observer: &mut dyn CallSiteObserver,
) -> Result<()> {
    let bytes = fs::read(input)?;
    let unit = classfile::parse(&bytes)?;
    let rewritten = transform(&unit, observer)?;
    let out_bytes = classfile::encode(&rewritten);

    let dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    let mut staged = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    staged.write_all(&out_bytes)?;
    staged.persist(output).map_err(|e| e.error)?;
    Ok(())
}
