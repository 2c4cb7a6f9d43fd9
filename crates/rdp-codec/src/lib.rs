//! Declarative binary structure codec for RDP PDUs
//!
//! Wire layouts are described as ordered [`Structure`]s of fields rather than
//! hand-written readers and writers, so length prefixes, total sizes and
//! discriminants stay consistent between decode and encode.
//!
//! # Field kinds
//!
//! - [`ScalarField`]: 1, 2 or 4 byte little-endian integer; literal,
//!   constant-validated, or computed from siblings
//! - [`VariableBlob`]: opaque bytes with a literal or computed length
//! - [`Structure`]: nested structure, optionally bounded to a computed length
//! - [`StructureList`]: counted sequence of structures
//! - [`VariantSelector`]: structure chosen at decode time from a closed
//!   registry, keyed by a previously decoded discriminant
//!
//! Computed values are expressions over a [`Scope`] and are re-evaluated on
//! every size or encode, never cached.

mod error;
mod field;
mod list;
mod scope;
mod stream;
mod structure;
mod variant;

pub use error::{checked_len, to_u32, CodecError, CodecResult, ErrorKind};
pub use field::{Expr, Field, FieldPath, Length, ScalarField, ScalarMode, VariableBlob, Width};
pub use list::StructureList;
pub use scope::{FieldId, Phase, Scope};
pub use stream::ByteStream;
pub use structure::Structure;
pub use variant::{Registry, VariantSelector, VariantState};

/// Re-export bytes for convenience
pub use bytes::Bytes;
