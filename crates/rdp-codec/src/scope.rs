//! Sibling view handed to expressions
//!
//! While a structure decodes field `i`, the scope covers every other field
//! and computed scalars answer with the value they read off the wire. In
//! every other phase the scope covers the whole structure and computed
//! scalars are evaluated on demand. Evaluations in flight are tracked so a
//! field whose value depends on itself fails instead of recursing forever.

use std::cell::RefCell;

use crate::field::{Field, ScalarField};
use crate::{CodecError, CodecResult};

/// Stable handle of a field inside its structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Phase a scope was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Decode,
    Encode,
}

/// Read-only view of one structure's fields
pub struct Scope<'a> {
    names: &'a [&'static str],
    head: &'a [Field],
    tail: &'a [Field],
    hole: bool,
    phase: Phase,
    active: RefCell<Vec<usize>>,
}

impl<'a> Scope<'a> {
    /// Scope over all fields, used for size, encode and accessors
    pub(crate) fn full(names: &'a [&'static str], fields: &'a [Field]) -> Self {
        Self {
            names,
            head: fields,
            tail: &[],
            hole: false,
            phase: Phase::Encode,
            active: RefCell::new(Vec::new()),
        }
    }

    /// Scope over every field except the one at `head.len()`
    pub(crate) fn decoding(names: &'a [&'static str], head: &'a [Field], tail: &'a [Field]) -> Self {
        Self {
            names,
            head,
            tail,
            hole: true,
            phase: Phase::Decode,
            active: RefCell::new(Vec::new()),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_decoding(&self) -> bool {
        self.phase == Phase::Decode
    }

    fn name(&self, id: FieldId) -> &'static str {
        self.names.get(id.0).copied().unwrap_or("?")
    }

    fn get(&self, id: FieldId) -> CodecResult<&'a Field> {
        let i = id.0;
        if i < self.head.len() {
            return Ok(&self.head[i]);
        }
        if self.hole && i == self.head.len() {
            return Err(CodecError::SelfReference(self.name(id)));
        }
        let offset = self.head.len() + self.hole as usize;
        self.tail
            .get(i - offset)
            .ok_or_else(|| CodecError::UnknownField(format!("#{}", i)))
    }

    /// Run `eval` for `id`, failing if `id` is already being evaluated
    fn guarded<T>(&self, id: FieldId, eval: impl FnOnce() -> CodecResult<T>) -> CodecResult<T> {
        if self.active.borrow().contains(&id.0) {
            return Err(CodecError::SelfReference(self.name(id)));
        }
        self.active.borrow_mut().push(id.0);
        let result = eval();
        self.active.borrow_mut().pop();
        result
    }

    fn scalar(&self, id: FieldId) -> CodecResult<&'a ScalarField> {
        match self.get(id)? {
            Field::Scalar(scalar) => Ok(scalar),
            _ => Err(CodecError::WrongFieldKind {
                field: self.name(id),
                expected: "scalar",
            }),
        }
    }

    /// Integer value of a scalar sibling
    pub fn value(&self, id: FieldId) -> CodecResult<u32> {
        let scalar = self.scalar(id)?;
        self.guarded(id, || scalar.value(self, self.name(id)))
    }

    /// Value a computed scalar sibling would take now, ignoring what was decoded
    pub fn evaluate(&self, id: FieldId) -> CodecResult<u32> {
        let scalar = self.scalar(id)?;
        self.guarded(id, || scalar.evaluate(self, self.name(id)))
    }

    /// Wire value a scalar sibling read during the last decode
    pub fn decoded(&self, id: FieldId) -> Option<u32> {
        match self.get(id) {
            Ok(Field::Scalar(scalar)) => scalar.decoded(),
            _ => None,
        }
    }

    /// Encoded size of a sibling
    pub fn size(&self, id: FieldId) -> CodecResult<usize> {
        match self.get(id)? {
            Field::Scalar(scalar) => Ok(scalar.width().bytes()),
            field => self.guarded(id, || field.size(self, self.name(id))),
        }
    }

    /// Number of items held by a list sibling
    pub fn len(&self, id: FieldId) -> CodecResult<usize> {
        match self.get(id)? {
            Field::List(list) => Ok(list.len()),
            _ => Err(CodecError::WrongFieldKind {
                field: self.name(id),
                expected: "list",
            }),
        }
    }

    /// Discriminant tag of a nested structure or resolved variant
    pub fn tag(&self, id: FieldId) -> CodecResult<u32> {
        let name = self.name(id);
        let structure = match self.get(id)? {
            Field::Struct(structure) => structure,
            Field::Variant(variant) => variant.get(name)?,
            _ => {
                return Err(CodecError::WrongFieldKind {
                    field: name,
                    expected: "structure",
                })
            }
        };
        structure.tag().ok_or(CodecError::Unresolved(name))
    }

    /// Size of every field covered by this scope
    pub fn total_size(&self) -> CodecResult<usize> {
        let mut total = 0;
        for i in 0..self.names.len() {
            if self.hole && i == self.head.len() {
                continue;
            }
            total += self.size(FieldId(i))?;
        }
        Ok(total)
    }
}
