//! Variant fields resolved at decode time
//!
//! A selector starts `Unresolved`. Decoding evaluates its discriminant over
//! already-decoded siblings and asks a closed registry for the matching
//! shape; a discriminant the registry does not know is fatal. Encoding
//! requires the caller to have resolved the slot first.

use crate::field::{Expr, FieldPath};
use crate::scope::Scope;
use crate::structure::Structure;
use crate::{ByteStream, CodecError, CodecResult};
use std::fmt;
use tracing::{debug, warn};

/// Closed mapping from discriminant to a fresh, empty structure
pub type Registry = fn(u32) -> Option<Structure>;

/// Resolution state of a [`VariantSelector`]
#[derive(Debug, Clone, Default)]
pub enum VariantState {
    #[default]
    Unresolved,
    Resolved(Box<Structure>),
}

/// Deferred field whose concrete structure is picked by a discriminant
#[derive(Clone)]
pub struct VariantSelector {
    registry: Registry,
    discriminant: Option<Expr>,
    state: VariantState,
}

impl VariantSelector {
    /// Selector dispatching through `registry`; bind its discriminant with
    /// [`Structure::bind`]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            discriminant: None,
            state: VariantState::Unresolved,
        }
    }

    /// Selector already resolved to `structure`, for the encode path
    pub fn resolved(registry: Registry, structure: Structure) -> Self {
        Self {
            registry,
            discriminant: None,
            state: VariantState::Resolved(Box::new(structure)),
        }
    }

    pub fn state(&self) -> &VariantState {
        &self.state
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, VariantState::Resolved(_))
    }

    pub(crate) fn bind(&mut self, expr: Expr) {
        self.discriminant = Some(expr);
    }

    pub(crate) fn get(&self, name: &'static str) -> CodecResult<&Structure> {
        match &self.state {
            VariantState::Resolved(structure) => Ok(structure),
            VariantState::Unresolved => Err(CodecError::Unresolved(name)),
        }
    }

    pub(crate) fn get_mut(&mut self, name: &'static str) -> CodecResult<&mut Structure> {
        match &mut self.state {
            VariantState::Resolved(structure) => Ok(structure),
            VariantState::Unresolved => Err(CodecError::Unresolved(name)),
        }
    }

    pub(crate) fn resolve(&mut self, structure: Structure, name: &'static str) -> CodecResult<()> {
        if self.is_resolved() {
            return Err(CodecError::AlreadyResolved(name));
        }
        self.state = VariantState::Resolved(Box::new(structure));
        Ok(())
    }

    pub(crate) fn decode(&mut self, stream: &mut ByteStream, scope: &Scope<'_>, path: FieldPath) -> CodecResult<()> {
        if self.is_resolved() {
            return Err(CodecError::AlreadyResolved(path.field));
        }
        let discriminant = match &self.discriminant {
            Some(expr) => expr(scope)?,
            None => return Err(CodecError::Unresolved(path.field)),
        };
        let Some(mut structure) = (self.registry)(discriminant) else {
            warn!(
                structure = path.structure,
                field = path.field,
                discriminant,
                "no variant registered for discriminant"
            );
            return Err(CodecError::UnsupportedVariant {
                structure: path.structure,
                field: path.field,
                discriminant,
            });
        };
        debug!(field = path.field, discriminant, variant = structure.name(), "variant selected");
        structure.decode(stream)?;
        self.state = VariantState::Resolved(Box::new(structure));
        Ok(())
    }
}

impl fmt::Debug for VariantSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantSelector")
            .field("state", &self.state)
            .finish()
    }
}
