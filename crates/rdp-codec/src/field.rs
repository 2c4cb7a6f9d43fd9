//! Field kinds
//!
//! | Kind            | Wire size                    | Decode length source     |
//! |-----------------|------------------------------|--------------------------|
//! | ScalarField     | 1, 2 or 4 bytes (LE)         | width                    |
//! | VariableBlob    | payload length               | fixed or expression      |
//! | Structure       | sum of its fields            | its fields, or bounded   |
//! | StructureList   | sum of its items             | count expression         |
//! | VariantSelector | resolved structure           | resolved structure       |

use crate::list::StructureList;
use crate::scope::Scope;
use crate::structure::Structure;
use crate::variant::VariantSelector;
use crate::{ByteStream, CodecError, CodecResult};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Deferred computation over sibling fields
///
/// Evaluated on every use; the result is never cached.
pub type Expr = Arc<dyn Fn(&Scope<'_>) -> CodecResult<u32> + Send + Sync>;

/// Wire width of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U8 = 1,
    U16 = 2,
    U32 = 4,
}

impl Width {
    #[inline]
    pub fn bytes(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn max(self) -> u32 {
        match self {
            Width::U8 => u8::MAX as u32,
            Width::U16 => u16::MAX as u32,
            Width::U32 => u32::MAX,
        }
    }
}

/// Where and how a field is being processed, for error reporting
#[derive(Debug, Clone, Copy)]
pub struct FieldPath {
    pub structure: &'static str,
    pub field: &'static str,
}

/// Source of a decode length or count
#[derive(Clone, Default)]
pub enum Length {
    /// Nothing bound yet
    #[default]
    Unbound,
    /// Literal number of bytes
    Fixed(usize),
    /// Computed from siblings
    Expr(Expr),
}

impl Length {
    pub fn resolve(&self, scope: &Scope<'_>, field: &'static str) -> CodecResult<usize> {
        match self {
            Length::Unbound => Err(CodecError::Unresolved(field)),
            Length::Fixed(n) => Ok(*n),
            Length::Expr(expr) => Ok(expr(scope)? as usize),
        }
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Unbound => f.write_str("Unbound"),
            Length::Fixed(n) => write!(f, "Fixed({})", n),
            Length::Expr(_) => f.write_str("Expr"),
        }
    }
}

/// Value source of a scalar
#[derive(Clone)]
pub enum ScalarMode {
    /// Caller-settable value, overwritten by decode
    Literal(u32),
    /// Fixed value validated on decode
    Constant(u32),
    /// Evaluated from siblings; `None` until bound
    Computed(Option<Expr>),
}

impl fmt::Debug for ScalarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarMode::Literal(v) => write!(f, "Literal({:#x})", v),
            ScalarMode::Constant(v) => write!(f, "Constant({:#x})", v),
            ScalarMode::Computed(Some(_)) => f.write_str("Computed"),
            ScalarMode::Computed(None) => f.write_str("Computed(unbound)"),
        }
    }
}

/// Fixed-width little-endian integer field
#[derive(Debug, Clone)]
pub struct ScalarField {
    width: Width,
    mode: ScalarMode,
    decoded: Option<u32>,
    pinned: bool,
}

impl ScalarField {
    pub fn literal(width: Width, value: u32) -> Self {
        Self {
            width,
            mode: ScalarMode::Literal(value),
            decoded: None,
            pinned: false,
        }
    }

    pub fn constant(width: Width, value: u32) -> Self {
        Self {
            width,
            mode: ScalarMode::Constant(value),
            decoded: None,
            pinned: false,
        }
    }

    /// Computed scalar; bind its expression with [`Structure::bind`]
    pub fn computed(width: Width) -> Self {
        Self {
            width,
            mode: ScalarMode::Computed(None),
            decoded: None,
            pinned: false,
        }
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn mode(&self) -> &ScalarMode {
        &self.mode
    }

    /// Wire value seen by the last decode
    pub fn decoded(&self) -> Option<u32> {
        self.decoded
    }

    pub(crate) fn bind(&mut self, expr: Expr) {
        self.mode = ScalarMode::Computed(Some(expr));
    }

    pub(crate) fn set(&mut self, value: u32, name: &'static str) -> CodecResult<()> {
        match &mut self.mode {
            ScalarMode::Literal(v) => {
                *v = value;
                Ok(())
            }
            _ => Err(CodecError::WrongFieldKind {
                field: name,
                expected: "literal scalar",
            }),
        }
    }

    /// Forget that the wire value stands in for the expression
    pub(crate) fn unpin(&mut self) {
        self.pinned = false;
    }

    /// Current value; a decoded computed scalar keeps its wire value until
    /// its structure is edited, otherwise it is evaluated in `scope`
    pub fn value(&self, scope: &Scope<'_>, name: &'static str) -> CodecResult<u32> {
        match &self.mode {
            ScalarMode::Computed(_) if scope.is_decoding() => {
                self.decoded.ok_or(CodecError::Unresolved(name))
            }
            ScalarMode::Computed(_) if self.pinned => self.decoded.ok_or(CodecError::Unresolved(name)),
            _ => self.evaluate(scope, name),
        }
    }

    /// Value from the literal or the bound expression, ignoring the wire
    pub fn evaluate(&self, scope: &Scope<'_>, name: &'static str) -> CodecResult<u32> {
        match &self.mode {
            ScalarMode::Literal(v) | ScalarMode::Constant(v) => Ok(*v),
            ScalarMode::Computed(Some(expr)) => expr(scope),
            ScalarMode::Computed(None) => Err(CodecError::Unresolved(name)),
        }
    }

    pub(crate) fn decode(&mut self, stream: &mut ByteStream, path: FieldPath) -> CodecResult<()> {
        let found = match self.width {
            Width::U8 => stream.read_u8()? as u32,
            Width::U16 => stream.read_u16_le()? as u32,
            Width::U32 => stream.read_u32_le()?,
        };
        self.decoded = Some(found);
        self.pinned = true;
        match &mut self.mode {
            ScalarMode::Literal(v) => *v = found,
            ScalarMode::Constant(expected) if *expected != found => {
                return Err(CodecError::Format {
                    structure: path.structure,
                    field: path.field,
                    expected: *expected,
                    found,
                });
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn encode(&self, stream: &mut ByteStream, scope: &Scope<'_>, name: &'static str) -> CodecResult<()> {
        let value = self.value(scope, name)?;
        if value > self.width.max() {
            return Err(CodecError::ValueOutOfRange {
                value: value as u64,
                width: self.width.bytes(),
            });
        }
        match self.width {
            Width::U8 => stream.write_u8(value as u8),
            Width::U16 => stream.write_u16_le(value as u16),
            Width::U32 => stream.write_u32_le(value),
        }
        Ok(())
    }
}

/// Opaque byte sequence with a literal or computed decode length
#[derive(Debug, Clone, Default)]
pub struct VariableBlob {
    value: Option<Bytes>,
    length: Length,
}

impl VariableBlob {
    /// Blob with no value and no length yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Blob that decodes exactly `n` bytes
    pub fn fixed(n: usize) -> Self {
        Self {
            value: None,
            length: Length::Fixed(n),
        }
    }

    /// `n` zero bytes, decoding `n` bytes
    pub fn zeroed(n: usize) -> Self {
        Self {
            value: Some(Bytes::from(vec![0u8; n])),
            length: Length::Fixed(n),
        }
    }

    pub fn from_bytes(value: impl Into<Bytes>) -> Self {
        Self {
            value: Some(value.into()),
            length: Length::Unbound,
        }
    }

    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    pub fn length(&self) -> &Length {
        &self.length
    }

    pub(crate) fn set(&mut self, value: Bytes) {
        self.value = Some(value);
    }

    pub(crate) fn bind(&mut self, expr: Expr) {
        self.length = Length::Expr(expr);
    }

    /// Stored payload length, or the resolved filler length when unset
    pub fn size(&self, scope: &Scope<'_>, name: &'static str) -> CodecResult<usize> {
        match &self.value {
            Some(value) => Ok(value.len()),
            None => self.length.resolve(scope, name),
        }
    }

    pub(crate) fn decode(&mut self, stream: &mut ByteStream, scope: &Scope<'_>, path: FieldPath) -> CodecResult<()> {
        let n = self.length.resolve(scope, path.field)?;
        self.value = Some(stream.read(n)?);
        Ok(())
    }

    pub(crate) fn encode(&self, stream: &mut ByteStream, scope: &Scope<'_>, name: &'static str) -> CodecResult<()> {
        match &self.value {
            Some(value) => stream.write(value),
            None => stream.write_zeros(self.length.resolve(scope, name)?),
        }
        Ok(())
    }
}

/// One slot of a [`Structure`]
#[derive(Debug, Clone)]
pub enum Field {
    Scalar(ScalarField),
    Blob(VariableBlob),
    Struct(Structure),
    List(StructureList),
    Variant(VariantSelector),
}

impl Field {
    pub fn kind(&self) -> &'static str {
        match self {
            Field::Scalar(_) => "scalar",
            Field::Blob(_) => "blob",
            Field::Struct(_) => "structure",
            Field::List(_) => "list",
            Field::Variant(_) => "variant",
        }
    }

    pub fn size(&self, scope: &Scope<'_>, name: &'static str) -> CodecResult<usize> {
        match self {
            Field::Scalar(scalar) => Ok(scalar.width().bytes()),
            Field::Blob(blob) => blob.size(scope, name),
            Field::Struct(structure) => structure.size(),
            Field::List(list) => list.size(),
            Field::Variant(variant) => variant.get(name)?.size(),
        }
    }

    pub(crate) fn decode(&mut self, stream: &mut ByteStream, scope: &Scope<'_>, path: FieldPath) -> CodecResult<()> {
        match self {
            Field::Scalar(scalar) => scalar.decode(stream, path),
            Field::Blob(blob) => blob.decode(stream, scope, path),
            Field::Struct(structure) => structure.decode_nested(stream, scope, path),
            Field::List(list) => list.decode(stream, scope, path),
            Field::Variant(variant) => variant.decode(stream, scope, path),
        }
    }

    pub(crate) fn encode(&self, stream: &mut ByteStream, scope: &Scope<'_>, name: &'static str) -> CodecResult<()> {
        match self {
            Field::Scalar(scalar) => scalar.encode(stream, scope, name),
            Field::Blob(blob) => blob.encode(stream, scope, name),
            Field::Struct(structure) => structure.encode(stream),
            Field::List(list) => list.encode(stream),
            Field::Variant(variant) => variant.get(name)?.encode(stream),
        }
    }
}

impl From<ScalarField> for Field {
    fn from(field: ScalarField) -> Self {
        Field::Scalar(field)
    }
}

impl From<VariableBlob> for Field {
    fn from(field: VariableBlob) -> Self {
        Field::Blob(field)
    }
}

impl From<Structure> for Field {
    fn from(field: Structure) -> Self {
        Field::Struct(field)
    }
}

impl From<StructureList> for Field {
    fn from(field: StructureList) -> Self {
        Field::List(field)
    }
}

impl From<VariantSelector> for Field {
    fn from(field: VariantSelector) -> Self {
        Field::Variant(field)
    }
}
