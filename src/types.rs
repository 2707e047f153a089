//! Type descriptors: the shape of a model, described ahead of resolution.
//!
//! A [`TypeDef`] is a closed sum over the kinds the resolver understands.
//! Children are [`TypeRef`]s, thunks that produce their `TypeDef` on demand,
//! so a type that refers to itself is still a finite value.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::primitive::PrimitiveKind;
use crate::schema::Schema;

/// Per-model schema customization, run after the schema is built.
pub type SchemaHook = Arc<dyn Fn(&mut Schema) + Send + Sync>;

/// Where a type was declared: module path plus local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Origin {
    pub path: String,
    pub name: String,
}

impl Origin {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Origin of a builtin type (no module path).
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// Split a qualified name (`pets.models.Pet` or `pets::models::Pet`)
    /// at its last separator.
    pub fn parse_qualified(qualified: &str) -> Self {
        if let Some((path, name)) = qualified.rsplit_once("::") {
            return Self::new(path, name);
        }
        match qualified.rsplit_once('.') {
            Some((path, name)) => Self::new(path, name),
            None => Self::builtin(qualified),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.path, self.name)
        }
    }
}

/// Kinds that never describe data: they can appear in a type graph but not
/// in a query-bound input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueKind {
    Channel,
    Function,
    Interface,
    UnsafePointer,
}

impl fmt::Display for OpaqueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpaqueKind::Channel => "channel",
            OpaqueKind::Function => "function",
            OpaqueKind::Interface => "interface",
            OpaqueKind::UnsafePointer => "unsafe pointer",
        };
        f.write_str(s)
    }
}

/// Lazily produced child type.
#[derive(Clone)]
pub struct TypeRef(Arc<dyn Fn() -> TypeDef + Send + Sync>);

impl TypeRef {
    /// Reference to a Rust type's description.
    pub fn of<T: Describe + ?Sized>() -> Self {
        Self(Arc::new(TypeDef::of::<T> as fn() -> TypeDef))
    }

    /// Reference produced by an arbitrary function, for descriptions built at runtime.
    pub fn from_fn(f: impl Fn() -> TypeDef + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Reference to an already built description.
    pub fn from_def(def: TypeDef) -> Self {
        Self::from_fn(move || def.clone())
    }

    pub fn get(&self) -> TypeDef {
        (self.0)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeRef(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Kind {
    Primitive(PrimitiveKind),
    /// Pointer or `Option`: absence is a valid value.
    Optional(TypeRef),
    Sequence(TypeRef),
    Map {
        key: TypeRef,
        value: TypeRef,
    },
    Struct(Vec<Field>),
    /// A named primitive whose values are registered constants.
    Enum(PrimitiveKind),
    /// A type whose schema is known up front (timestamps, UUIDs, uploads).
    Known(Box<Schema>),
    Opaque(OpaqueKind),
}

impl Kind {
    /// Short name for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Primitive(_) => "primitive",
            Kind::Optional(_) => "optional",
            Kind::Sequence(_) => "sequence",
            Kind::Map { .. } => "map",
            Kind::Struct(_) => "struct",
            Kind::Enum(_) => "enum",
            Kind::Known(_) => "known",
            Kind::Opaque(_) => "opaque",
        }
    }
}

/// Description of one type.
#[derive(Clone)]
pub struct TypeDef {
    /// `None` for anonymous types.
    pub origin: Option<Origin>,
    pub kind: Kind,
    pub description: Option<String>,
    pub hook: Option<SchemaHook>,
}

impl TypeDef {
    pub fn new(origin: Option<Origin>, kind: Kind) -> Self {
        Self {
            origin,
            kind,
            description: None,
            hook: None,
        }
    }

    /// Description of a Rust type, with its schema hook attached.
    ///
    /// A hook set by `describe()` itself runs first, then
    /// `Describe::apply_custom_schema`.
    pub fn of<T: Describe + ?Sized>() -> Self {
        let mut def = T::describe();
        let custom = T::apply_custom_schema as fn(&mut Schema);
        let hook: SchemaHook = match def.hook.take() {
            Some(own) => Arc::new(move |schema: &mut Schema| {
                own(schema);
                custom(schema);
            }),
            None => Arc::new(custom),
        };
        def.hook = Some(hook);
        def
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        let name = match kind {
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "bool",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Float64 => "float64",
        };
        Self::primitive_named(name, kind)
    }

    pub fn primitive_named(name: &str, kind: PrimitiveKind) -> Self {
        Self::new(Some(Origin::builtin(name)), Kind::Primitive(kind))
    }

    pub fn optional(inner: TypeRef) -> Self {
        Self::new(None, Kind::Optional(inner))
    }

    pub fn sequence(element: TypeRef) -> Self {
        Self::new(None, Kind::Sequence(element))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::new(None, Kind::Map { key, value })
    }

    pub fn structure(origin: Origin, fields: Vec<Field>) -> Self {
        Self::new(Some(origin), Kind::Struct(fields))
    }

    pub fn anonymous_struct(fields: Vec<Field>) -> Self {
        Self::new(None, Kind::Struct(fields))
    }

    pub fn enumeration(origin: Origin, kind: PrimitiveKind) -> Self {
        Self::new(Some(origin), Kind::Enum(kind))
    }

    pub fn known(origin: Origin, schema: Schema) -> Self {
        Self::new(Some(origin), Kind::Known(Box::new(schema)))
    }

    pub fn opaque(kind: OpaqueKind) -> Self {
        Self::new(None, Kind::Opaque(kind))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hook(mut self, hook: impl Fn(&mut Schema) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Human readable type name for errors and logs.
    pub fn display_name(&self) -> String {
        match (&self.origin, &self.kind) {
            (Some(origin), _) => origin.to_string(),
            (None, Kind::Optional(inner)) => format!("*{}", inner.get().display_name()),
            (None, Kind::Sequence(element)) => format!("[]{}", element.get().display_name()),
            (None, Kind::Map { key, value }) => format!(
                "map[{}]{}",
                key.get().display_name(),
                value.get().display_name()
            ),
            (None, Kind::Opaque(kind)) => kind.to_string(),
            (None, kind) => format!("anonymous {}", kind.label()),
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("origin", &self.origin)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("hook", &self.hook.as_ref().map(|_| ".."))
            .finish()
    }
}

/// One field of a struct type.
#[derive(Debug, Clone)]
pub struct Field {
    /// Declared name.
    pub name: String,
    pub ty: TypeRef,
    /// Serialization name override.
    pub rename: Option<String>,
    /// Omitted from the payload when empty, so never required.
    pub omit_empty: bool,
    /// Hidden fields are not part of the serialized shape.
    pub visible: bool,
    /// Embedded fields have their properties promoted into the parent.
    pub embedded: bool,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            rename: None,
            omit_empty: false,
            visible: true,
            embedded: false,
            description: None,
            deprecated: false,
        }
    }

    pub fn of<T: Describe + ?Sized>(name: impl Into<String>) -> Self {
        Self::new(name, TypeRef::of::<T>())
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Attach a doc comment. A paragraph starting with `Deprecated:` marks
    /// the field deprecated.
    pub fn doc(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.deprecated = is_marked_deprecated(&text);
        self.description = Some(text);
        self
    }

    /// The name this field has in a serialized payload.
    pub fn serialized_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

/// Whether any line of a doc comment begins with `Deprecated:`.
pub fn is_marked_deprecated(comment: &str) -> bool {
    comment
        .lines()
        .any(|line| line.trim_start().starts_with("Deprecated:"))
}

/// A Rust type that can describe its own shape.
///
/// ```
/// use modelspec::{Describe, Field, Origin, Schema, TypeDef};
///
/// struct Pet {
///     name: String,
///     tags: Vec<String>,
/// }
///
/// impl Describe for Pet {
///     fn describe() -> TypeDef {
///         TypeDef::structure(
///             Origin::new("pets", "Pet"),
///             vec![Field::of::<String>("name"), Field::of::<Vec<String>>("tags")],
///         )
///     }
///
///     fn apply_custom_schema(schema: &mut Schema) {
///         schema.description = Some("A pet".into());
///     }
/// }
/// ```
pub trait Describe {
    fn describe() -> TypeDef;

    /// Adjust the generated schema for this type.
    fn apply_custom_schema(_schema: &mut Schema) {}
}

macro_rules! describe_primitive {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDef {
                    TypeDef::primitive_named(stringify!($ty), $kind)
                }
            }
        )+
    };
}

describe_primitive!(PrimitiveKind::String => String, str, char);
describe_primitive!(PrimitiveKind::Boolean => bool);
describe_primitive!(
    PrimitiveKind::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);
describe_primitive!(PrimitiveKind::Float64 => f32, f64);

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDef {
        TypeDef::optional(TypeRef::of::<T>())
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe() -> TypeDef {
        T::describe()
    }

    fn apply_custom_schema(schema: &mut Schema) {
        T::apply_custom_schema(schema)
    }
}

impl<T: Describe + ?Sized> Describe for Arc<T> {
    fn describe() -> TypeDef {
        T::describe()
    }

    fn apply_custom_schema(schema: &mut Schema) {
        T::apply_custom_schema(schema)
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDef {
        TypeDef::sequence(TypeRef::of::<T>())
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeDef {
        TypeDef::sequence(TypeRef::of::<T>())
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe() -> TypeDef {
        TypeDef::sequence(TypeRef::of::<T>())
    }
}

impl<T: Describe> Describe for HashSet<T> {
    fn describe() -> TypeDef {
        TypeDef::sequence(TypeRef::of::<T>())
    }
}

impl<T: Describe> Describe for BTreeSet<T> {
    fn describe() -> TypeDef {
        TypeDef::sequence(TypeRef::of::<T>())
    }
}

impl<K: Describe, V: Describe> Describe for HashMap<K, V> {
    fn describe() -> TypeDef {
        TypeDef::map(TypeRef::of::<K>(), TypeRef::of::<V>())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDef {
        TypeDef::map(TypeRef::of::<K>(), TypeRef::of::<V>())
    }
}

impl Describe for serde_json::Value {
    fn describe() -> TypeDef {
        TypeDef::opaque(OpaqueKind::Interface)
    }
}
