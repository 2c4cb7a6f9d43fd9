//! Ordered composite structures
//!
//! A structure is built in two steps: push every slot, then bind the
//! expressions that tie slots together. Expressions name siblings by
//! [`FieldId`], so a length prefix may refer to a payload declared after it.
//!
//! After a decode, computed scalars report the value read off the wire and
//! encode it unchanged. Editing the structure through any mutator drops
//! those wire values so the expressions take over again.
//!
//! ```
//! use rdp_codec::{to_u32, ScalarField, Structure, VariableBlob, Width};
//!
//! let mut blob = Structure::new("blob");
//! let len = blob.push("len", ScalarField::computed(Width::U16));
//! let data = blob.push("data", VariableBlob::new());
//! blob.bind(len, move |s| to_u32(s.size(data)?));
//! blob.bind(data, move |s| s.value(len));
//!
//! blob.set_bytes("data", &b"abc"[..]).unwrap();
//! assert_eq!(blob.to_bytes().unwrap().as_ref(), &[3, 0, b'a', b'b', b'c']);
//! ```

use crate::field::{Expr, Field, FieldPath, Length};
use crate::scope::{FieldId, Scope};
use crate::{ByteStream, CodecError, CodecResult};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Named, ordered collection of fields
#[derive(Debug, Clone)]
pub struct Structure {
    name: &'static str,
    tag: Option<u32>,
    read_length: Length,
    names: Vec<&'static str>,
    fields: Vec<Field>,
}

impl Structure {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tag: None,
            read_length: Length::Unbound,
            names: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Attach the discriminant an enclosing variant selects this shape by
    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> Option<u32> {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in wire order
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Append a field; its position is its wire position
    pub fn push(&mut self, name: &'static str, field: impl Into<Field>) -> FieldId {
        self.names.push(name);
        self.fields.push(field.into());
        FieldId(self.fields.len() - 1)
    }

    /// Bind an expression to a field
    ///
    /// - scalar: its value
    /// - blob: its decode length
    /// - structure: the length of the sub-stream it decodes from
    /// - list: its item count
    /// - variant: its discriminant
    ///
    /// # Panics
    ///
    /// Panics if `id` was not returned by [`Structure::push`] on this structure.
    pub fn bind<F>(&mut self, id: FieldId, expr: F)
    where
        F: Fn(&Scope<'_>) -> CodecResult<u32> + Send + Sync + 'static,
    {
        let expr: Expr = Arc::new(expr);
        match &mut self.fields[id.0] {
            Field::Scalar(scalar) => scalar.bind(expr),
            Field::Blob(blob) => blob.bind(expr),
            Field::Struct(structure) => structure.read_length = Length::Expr(expr),
            Field::List(list) => list.bind(expr),
            Field::Variant(variant) => variant.bind(expr),
        }
    }

    /// Limit decoding to a sub-stream of `length` bytes when nested
    pub fn with_read_length(mut self, length: Length) -> Self {
        self.read_length = length;
        self
    }

    pub fn id(&self, name: &str) -> CodecResult<FieldId> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(FieldId)
            .ok_or_else(|| CodecError::UnknownField(format!("{}.{}", self.name, name)))
    }

    pub fn field(&self, name: &str) -> CodecResult<&Field> {
        let id = self.id(name)?;
        Ok(&self.fields[id.0])
    }

    fn field_mut(&mut self, name: &str) -> CodecResult<(&'static str, &mut Field)> {
        let id = self.id(name)?;
        for field in &mut self.fields {
            if let Field::Scalar(scalar) = field {
                scalar.unpin();
            }
        }
        Ok((self.names[id.0], &mut self.fields[id.0]))
    }

    fn scope(&self) -> Scope<'_> {
        Scope::full(&self.names, &self.fields)
    }

    /// Current value of a scalar field, evaluating computed ones
    pub fn value(&self, name: &str) -> CodecResult<u32> {
        let id = self.id(name)?;
        self.scope().value(id)
    }

    /// Value the bound expression gives now, even after a decode
    pub fn computed_value(&self, name: &str) -> CodecResult<u32> {
        let id = self.id(name)?;
        self.scope().evaluate(id)
    }

    /// Overwrite a literal scalar
    pub fn set_value(&mut self, name: &str, value: u32) -> CodecResult<()> {
        match self.field_mut(name)? {
            (name, Field::Scalar(scalar)) => scalar.set(value, name),
            (name, _) => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "scalar",
            }),
        }
    }

    /// Payload of a blob field
    pub fn bytes(&self, name: &str) -> CodecResult<&Bytes> {
        let id = self.id(name)?;
        match &self.fields[id.0] {
            Field::Blob(blob) => blob.value().ok_or(CodecError::Unresolved(self.names[id.0])),
            _ => Err(CodecError::WrongFieldKind {
                field: self.names[id.0],
                expected: "blob",
            }),
        }
    }

    pub fn set_bytes(&mut self, name: &str, value: impl Into<Bytes>) -> CodecResult<()> {
        match self.field_mut(name)? {
            (_, Field::Blob(blob)) => {
                blob.set(value.into());
                Ok(())
            }
            (name, _) => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "blob",
            }),
        }
    }

    /// Nested structure, or the structure a variant resolved to
    pub fn child(&self, name: &str) -> CodecResult<&Structure> {
        let id = self.id(name)?;
        let name = self.names[id.0];
        match &self.fields[id.0] {
            Field::Struct(structure) => Ok(structure),
            Field::Variant(variant) => variant.get(name),
            _ => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "structure",
            }),
        }
    }

    pub fn child_mut(&mut self, name: &str) -> CodecResult<&mut Structure> {
        match self.field_mut(name)? {
            (_, Field::Struct(structure)) => Ok(structure),
            (name, Field::Variant(variant)) => variant.get_mut(name),
            (name, _) => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "structure",
            }),
        }
    }

    /// Items of a list field
    pub fn items(&self, name: &str) -> CodecResult<&[Structure]> {
        let id = self.id(name)?;
        match &self.fields[id.0] {
            Field::List(list) => Ok(list.items()),
            _ => Err(CodecError::WrongFieldKind {
                field: self.names[id.0],
                expected: "list",
            }),
        }
    }

    pub fn push_item(&mut self, name: &str, item: Structure) -> CodecResult<()> {
        match self.field_mut(name)? {
            (_, Field::List(list)) => {
                list.push(item);
                Ok(())
            }
            (name, _) => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "list",
            }),
        }
    }

    /// Assign the concrete shape of a variant field before encoding
    pub fn resolve(&mut self, name: &str, structure: Structure) -> CodecResult<()> {
        match self.field_mut(name)? {
            (name, Field::Variant(variant)) => variant.resolve(structure, name),
            (name, _) => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "variant",
            }),
        }
    }

    /// Encoded size of one field
    pub fn field_size(&self, name: &str) -> CodecResult<usize> {
        let id = self.id(name)?;
        self.scope().size(id)
    }

    /// Encoded size, without touching a stream
    pub fn size(&self) -> CodecResult<usize> {
        self.scope().total_size()
    }

    /// Write every field in declared order
    pub fn encode(&self, stream: &mut ByteStream) -> CodecResult<()> {
        let scope = self.scope();
        for (name, field) in self.names.iter().zip(&self.fields) {
            field.encode(stream, &scope, *name)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> CodecResult<Bytes> {
        let mut stream = ByteStream::with_capacity(self.size()?);
        self.encode(&mut stream)?;
        Ok(stream.into_bytes())
    }

    /// Read every field in declared order
    pub fn decode(&mut self, stream: &mut ByteStream) -> CodecResult<()> {
        for i in 0..self.fields.len() {
            let (head, rest) = self.fields.split_at_mut(i);
            let Some((field, tail)) = rest.split_first_mut() else {
                break;
            };
            let scope = Scope::decoding(&self.names, head, tail);
            let path = FieldPath {
                structure: self.name,
                field: self.names[i],
            };
            if let Err(e) = field.decode(stream, &scope, path) {
                debug!(
                    structure = self.name,
                    field = self.names[i],
                    position = stream.position(),
                    "decode failed: {}",
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Decode as a field of `parent`, honouring a bound read length
    pub(crate) fn decode_nested(&mut self, stream: &mut ByteStream, parent: &Scope<'_>, path: FieldPath) -> CodecResult<()> {
        if let Length::Unbound = self.read_length {
            return self.decode(stream);
        }
        let n = self.read_length.resolve(parent, path.field)?;
        let mut sub = stream.sub_stream(n)?;
        self.decode(&mut sub)?;
        if sub.remaining() > 0 {
            debug!(
                structure = self.name,
                skipped = sub.remaining(),
                "trailing bytes after nested structure"
            );
        }
        Ok(())
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let scope = self.scope();
        for (i, (name, field)) in self.names.iter().zip(&self.fields).enumerate() {
            let indent = "  ".repeat(depth);
            match field {
                Field::Scalar(_) => match scope.value(FieldId(i)) {
                    Ok(v) => writeln!(f, "{}{}: {:#x}", indent, name, v)?,
                    Err(_) => writeln!(f, "{}{}: <unresolved>", indent, name)?,
                },
                Field::Blob(blob) => match blob.value() {
                    Some(v) => writeln!(f, "{}{}: [{} bytes]", indent, name, v.len())?,
                    None => writeln!(f, "{}{}: <filler>", indent, name)?,
                },
                Field::Struct(child) => {
                    writeln!(f, "{}{}: {}", indent, name, child.name)?;
                    child.fmt_indented(f, depth + 1)?;
                }
                Field::List(list) => {
                    writeln!(f, "{}{}: {} items", indent, name, list.len())?;
                    for item in list.items() {
                        writeln!(f, "{}  - {}", indent, item.name)?;
                        item.fmt_indented(f, depth + 2)?;
                    }
                }
                Field::Variant(variant) => match variant.get(*name) {
                    Ok(child) => {
                        writeln!(f, "{}{}: {}", indent, name, child.name)?;
                        child.fmt_indented(f, depth + 1)?;
                    }
                    Err(_) => writeln!(f, "{}{}: <unresolved>", indent, name)?,
                },
            }
        }
        Ok(())
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.fmt_indented(f, 1)
    }
}
