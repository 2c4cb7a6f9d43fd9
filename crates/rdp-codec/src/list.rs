//! Counted sequences of structures

use crate::field::{Expr, FieldPath, Length};
use crate::scope::Scope;
use crate::structure::Structure;
use crate::{ByteStream, CodecResult};

/// Sequence of same-shaped structures whose count comes from a sibling
#[derive(Debug, Clone)]
pub struct StructureList {
    element: fn() -> Structure,
    count: Length,
    items: Vec<Structure>,
}

impl StructureList {
    /// Empty list whose items are built by `element` when decoding
    pub fn new(element: fn() -> Structure) -> Self {
        Self {
            element,
            count: Length::Unbound,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Structure] {
        &self.items
    }

    pub fn push(&mut self, item: Structure) {
        self.items.push(item);
    }

    pub(crate) fn bind(&mut self, expr: Expr) {
        self.count = Length::Expr(expr);
    }

    pub fn size(&self) -> CodecResult<usize> {
        let mut total = 0;
        for item in &self.items {
            total += item.size()?;
        }
        Ok(total)
    }

    pub(crate) fn decode(&mut self, stream: &mut ByteStream, scope: &Scope<'_>, path: FieldPath) -> CodecResult<()> {
        let count = self.count.resolve(scope, path.field)?;
        // Every item takes at least one byte, so never reserve past the input
        let mut items = Vec::with_capacity(count.min(stream.remaining()));
        for _ in 0..count {
            let mut item = (self.element)();
            item.decode(stream)?;
            items.push(item);
        }
        self.items = items;
        Ok(())
    }

    pub(crate) fn encode(&self, stream: &mut ByteStream) -> CodecResult<()> {
        for item in &self.items {
            item.encode(stream)?;
        }
        Ok(())
    }
}
