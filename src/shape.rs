//! Shape descriptors and the registry of shapes known to the process.
//!
//! A shape is built once (in code or from a definition file), has its
//! binding mode resolved once, and is read-only afterwards. Both the
//! registry and the per-type cache behind [`describe`] hand out shared
//! references, so request handling never takes a lock on the hot path
//! beyond the first lookup of a type.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::ShapeError;
use crate::resolver::resolve_mode;
use crate::types::{BindingMode, FieldSpec, ValueType};

/// Static field layout of a bindable object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Shape {
    /// Start building a shape.
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builder for [`Shape`].
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl ShapeBuilder {
    /// Append a field. Declaration order is preserved.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish the shape.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError` if the shape or a field is unnamed, a field name
    /// repeats, or an enum field has no variants.
    pub fn build(self) -> Result<Shape, ShapeError> {
        if self.name.trim().is_empty() {
            return Err(ShapeError::EmptyShapeName);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ShapeError::EmptyFieldName { shape: self.name });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ShapeError::DuplicateField {
                    shape: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if matches!(&field.value_type, ValueType::Enum(v) if v.is_empty()) {
                return Err(ShapeError::EmptyEnum {
                    shape: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(Shape {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// A shape together with its binding mode, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShape {
    shape: Shape,
    mode: BindingMode,
}

impl ResolvedShape {
    pub fn new(shape: Shape) -> Self {
        let mode = resolve_mode(shape.fields());
        debug!(shape = shape.name(), %mode, "resolved binding mode");
        Self { shape, mode }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn name(&self) -> &str {
        self.shape.name()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        self.shape.fields()
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }
}

/// A type with a statically declared shape.
pub trait Bindable: 'static {
    /// Build the shape descriptor for this type.
    fn shape() -> Result<Shape, ShapeError>;
}

fn type_cache() -> &'static RwLock<HashMap<TypeId, &'static ResolvedShape>> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, &'static ResolvedShape>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Describe a bindable type.
///
/// The shape is built and resolved on first use and cached for the lifetime
/// of the process; later calls return the same reference.
///
/// # Errors
///
/// Returns the `ShapeError` from [`Bindable::shape`]. Failures are not cached.
pub fn describe<T: Bindable>() -> Result<&'static ResolvedShape, ShapeError> {
    let id = TypeId::of::<T>();

    let cached = type_cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    if let Some(resolved) = cached {
        return Ok(resolved);
    }

    // Built without holding the lock: a shape may describe other types.
    let built = ResolvedShape::new(T::shape()?);

    let mut cache = type_cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let resolved: &'static ResolvedShape = *cache
        .entry(id)
        .or_insert_with(|| Box::leak(Box::new(built)));
    Ok(resolved)
}

/// Named shapes, resolved at registration and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: Vec<ResolvedShape>,
    index: HashMap<String, usize>,
}

impl ShapeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a shape by name.
    pub fn get(&self, name: &str) -> Option<&ResolvedShape> {
        self.index.get(name).map(|&i| &self.shapes[i])
    }

    /// Look up a shape by name, failing if it is unknown.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::UnknownShape` if no shape has that name.
    pub fn require(&self, name: &str) -> Result<&ResolvedShape, ShapeError> {
        self.get(name).ok_or_else(|| ShapeError::UnknownShape {
            shape: name.to_string(),
        })
    }

    /// Shapes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedShape> {
        self.shapes.iter()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Builder for [`ShapeRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: ShapeRegistry,
}

impl RegistryBuilder {
    /// Register a shape, resolving its binding mode.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::DuplicateShape` if the name is already taken.
    pub fn register(mut self, shape: Shape) -> Result<Self, ShapeError> {
        if self.registry.index.contains_key(shape.name()) {
            return Err(ShapeError::DuplicateShape {
                shape: shape.name().to_string(),
            });
        }
        let resolved = ResolvedShape::new(shape);
        self.registry
            .index
            .insert(resolved.name().to_string(), self.registry.shapes.len());
        self.registry.shapes.push(resolved);
        Ok(self)
    }

    /// Register the shape of a bindable type.
    ///
    /// # Errors
    ///
    /// Returns the type's `ShapeError`, or `ShapeError::DuplicateShape`.
    pub fn register_type<T: Bindable>(self) -> Result<Self, ShapeError> {
        let shape = describe::<T>()?.shape().clone();
        self.register(shape)
    }

    pub fn build(self) -> ShapeRegistry {
        info!(shapes = self.registry.len(), "shape registry built");
        self.registry
    }
}
