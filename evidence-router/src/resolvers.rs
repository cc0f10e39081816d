//! Typed field resolvers and the maps that hold them.
//!
//! Resolvers are registered per object type with an [`ObjectResolvers<P>`] builder, where `P`
//! is the Rust type of the parent value the type's fields are resolved against. The builder
//! has one method per kind of field ([`scalar`](ObjectResolvers::scalar),
//! [`object`](ObjectResolvers::object), [`objects`](ObjectResolvers::objects),
//! [`connection`](ObjectResolvers::connection), [`identity`](ObjectResolvers::identity), ...),
//! each taking a closure typed on `P`, so a resolver cannot be registered against the wrong
//! parent by accident. Registered resolvers are erased into a [`ResolverMap`] keyed by type
//! name and field name.
//!
//! Fields without a resolver are read by name: from [`Resolved::Leaf`] JSON, or from the
//! serialized parent when the type opted in with
//! [`project_fields`](ObjectResolvers::project_fields).

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::ConfigurationError;
use crate::error::FieldError;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// A parent value as seen by the execution engine.
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// The outcome of a field resolver.
#[derive(Clone)]
pub enum Resolved {
    Null,
    /// A JSON value: a scalar or enum, or data whose fields are read by name.
    Leaf(Value),
    /// A typed value whose fields have their own resolvers.
    Object(ObjectRef),
    List(Vec<Resolved>),
}

impl Resolved {
    pub fn object<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Resolved::Object(Arc::new(value))
    }

    pub fn leaf<T>(value: &T) -> Result<Self, FieldError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Resolved::Leaf(serde_json_bytes::to_value(value)?))
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Null => f.write_str("Null"),
            Resolved::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Resolved::Object(_) => f.write_str("Object(..)"),
            Resolved::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

type ErasedResolver = Arc<
    dyn Fn(ObjectRef, Object, Context) -> BoxFuture<'static, Result<Resolved, FieldError>>
        + Send
        + Sync,
>;

/// A registered field resolver.
#[derive(Clone)]
pub enum FieldResolver {
    /// Returns the parent unchanged.
    Identity,
    Compute(ErasedResolver),
}

impl FieldResolver {
    pub fn resolve(
        &self,
        parent: &ObjectRef,
        arguments: Object,
        context: &Context,
    ) -> BoxFuture<'static, Result<Resolved, FieldError>> {
        match self {
            FieldResolver::Identity => future::ready(Ok(Resolved::Object(parent.clone()))).boxed(),
            FieldResolver::Compute(resolver) => {
                resolver(parent.clone(), arguments, context.clone())
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, FieldResolver::Identity)
    }
}

impl fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldResolver::Identity => f.write_str("Identity"),
            FieldResolver::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

type Projection = Arc<dyn Fn(&ObjectRef) -> Result<Object, FieldError> + Send + Sync>;

/// The erased resolvers of one object type.
#[derive(Clone)]
pub struct TypeResolvers {
    type_name: String,
    fields: IndexMap<String, FieldResolver>,
    projection: Option<Projection>,
    duplicate_fields: Vec<String>,
}

impl TypeResolvers {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&FieldResolver> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldResolver)> {
        self.fields
            .iter()
            .map(|(name, resolver)| (name.as_str(), resolver))
    }

    /// Whether fields without a resolver are read from the serialized parent.
    pub fn projects_fields(&self) -> bool {
        self.projection.is_some()
    }

    /// The first field that was registered more than once, if any.
    pub fn duplicate_field(&self) -> Option<&str> {
        self.duplicate_fields.first().map(String::as_str)
    }

    /// Serialize `parent` so its remaining fields can be read by name, if the type allows it.
    pub fn project(&self, parent: &ObjectRef) -> Option<Result<Object, FieldError>> {
        self.projection.as_ref().map(|projection| projection(parent))
    }
}

impl fmt::Debug for TypeResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeResolvers")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("projection", &self.projection.is_some())
            .finish()
    }
}

/// Builds the resolvers of an object type whose parent values are `P`.
pub struct ObjectResolvers<P> {
    resolvers: TypeResolvers,
    parent: PhantomData<fn(P)>,
}

impl<P> ObjectResolvers<P>
where
    P: Send + Sync + 'static,
{
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            resolvers: TypeResolvers {
                type_name: type_name.into(),
                fields: IndexMap::new(),
                projection: None,
                duplicate_fields: Vec::new(),
            },
            parent: PhantomData,
        }
    }

    fn register(mut self, field: &str, resolver: FieldResolver) -> Self {
        if self
            .resolvers
            .fields
            .insert(field.to_string(), resolver)
            .is_some()
        {
            self.resolvers.duplicate_fields.push(field.to_string());
        }
        self
    }

    fn compute<F>(self, field: &str, resolver: F) -> Self
    where
        F: Fn(Arc<P>, Object, Context) -> BoxFuture<'static, Result<Resolved, FieldError>>
            + Send
            + Sync
            + 'static,
    {
        let type_name = self.resolvers.type_name.clone();
        let erased: ErasedResolver = Arc::new(
            move |parent: ObjectRef, arguments: Object, context: Context| {
                match parent.downcast::<P>() {
                    Ok(parent) => resolver(parent, arguments, context),
                    Err(_) => future::ready(Err(FieldError::ParentMismatch {
                        type_name: type_name.clone(),
                    }))
                    .boxed(),
                }
            },
        );
        self.register(field, FieldResolver::Compute(erased))
    }

    /// The field resolves to its parent, unchanged.
    pub fn identity(self, field: &str) -> Self {
        self.register(field, FieldResolver::Identity)
    }

    /// The field resolves to a serializable value: a scalar, an enum, a list of those, or data
    /// whose fields are read by name.
    pub fn scalar<R, F, Fut>(self, field: &str, resolver: F) -> Self
    where
        R: Serialize + Send + 'static,
        F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FieldError>> + Send + 'static,
    {
        self.compute(field, move |parent, _, context| {
            let resolved = resolver(parent, context);
            async move { Resolved::leaf(&resolved.await?) }.boxed()
        })
    }

    /// The field resolves to a typed value with resolvers of its own.
    pub fn object<C, F, Fut>(self, field: &str, resolver: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, FieldError>> + Send + 'static,
    {
        self.compute(field, move |parent, _, context| {
            let resolved = resolver(parent, context);
            async move { Ok::<_, FieldError>(Resolved::object(resolved.await?)) }.boxed()
        })
    }

    /// The field resolves to a list of typed values.
    pub fn objects<C, F, Fut>(self, field: &str, resolver: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<C>, FieldError>> + Send + 'static,
    {
        self.compute(field, move |parent, _, context| {
            let resolved = resolver(parent, context);
            async move {
                Ok::<_, FieldError>(Resolved::List(
                    resolved.await?.into_iter().map(Resolved::object).collect(),
                ))
            }
            .boxed()
        })
    }

    /// The field takes arguments `A` and resolves to a typed value.
    pub fn lookup<A, C, F, Fut>(self, field: &str, resolver: F) -> Self
    where
        A: DeserializeOwned,
        C: Send + Sync + 'static,
        F: Fn(Arc<P>, A, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, FieldError>> + Send + 'static,
    {
        let field_name = field.to_string();
        self.compute(field, move |parent, arguments, context| {
            match serde_json_bytes::from_value::<A>(Value::Object(arguments)) {
                Ok(arguments) => {
                    let resolved = resolver(parent, arguments, context);
                    async move { Ok::<_, FieldError>(Resolved::object(resolved.await?)) }.boxed()
                }
                Err(error) => future::ready(Err(FieldError::InvalidArguments {
                    field: field_name.clone(),
                    reason: error.to_string(),
                }))
                .boxed(),
            }
        })
    }

    /// A paginated connection: the field takes filter, sort and paging arguments `A` and
    /// resolves to a page `C` whose edges have resolvers of their own.
    pub fn connection<A, C, F, Fut>(self, field: &str, resolver: F) -> Self
    where
        A: DeserializeOwned,
        C: Send + Sync + 'static,
        F: Fn(Arc<P>, A, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, FieldError>> + Send + 'static,
    {
        self.lookup(field, resolver)
    }

    /// Fields without a resolver are read by name from the serialized parent.
    pub fn project_fields(mut self) -> Self
    where
        P: Serialize,
    {
        let type_name = self.resolvers.type_name.clone();
        self.resolvers.projection = Some(Arc::new(move |parent: &ObjectRef| {
            let parent = parent
                .downcast_ref::<P>()
                .ok_or_else(|| FieldError::ParentMismatch {
                    type_name: type_name.clone(),
                })?;
            match serde_json_bytes::to_value(parent)? {
                Value::Object(object) => Ok(object),
                _ => Err(FieldError::TypeMismatch {
                    expected: type_name.clone(),
                }),
            }
        }));
        self
    }

    pub fn build(self) -> TypeResolvers {
        self.resolvers
    }
}

impl<P> From<ObjectResolvers<P>> for ResolverMap
where
    P: Send + Sync + 'static,
{
    /// Duplicate fields survive the conversion and are rejected when the schema is composed.
    fn from(resolvers: ObjectResolvers<P>) -> Self {
        let resolvers = resolvers.build();
        let mut map = ResolverMap::default();
        map.types.insert(resolvers.type_name.clone(), resolvers);
        map
    }
}

/// Resolvers of many object types, by type name then field name.
///
/// Every type has a single owner: merging two maps that both contribute resolvers for the same
/// type is a [`ConfigurationError::ResolverCollision`], never a silent overwrite.
#[derive(Clone, Debug, Default)]
pub struct ResolverMap {
    types: IndexMap<String, TypeResolvers>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the resolvers of one type.
    pub fn insert(&mut self, resolvers: TypeResolvers) -> Result<(), ConfigurationError> {
        if let Some(field) = resolvers.duplicate_field() {
            return Err(ConfigurationError::ResolverCollision {
                type_name: format!("{}.{}", resolvers.type_name, field),
            });
        }
        if self.types.contains_key(&resolvers.type_name) {
            return Err(ConfigurationError::ResolverCollision {
                type_name: resolvers.type_name,
            });
        }
        self.types.insert(resolvers.type_name.clone(), resolvers);
        Ok(())
    }

    /// Move every type of `other` into this map.
    pub fn merge(&mut self, other: ResolverMap) -> Result<(), ConfigurationError> {
        for (_, resolvers) in other.types {
            self.insert(resolvers)?;
        }
        Ok(())
    }

    pub fn get(&self, type_name: &str, field: &str) -> Option<&FieldResolver> {
        self.types.get(type_name)?.get(field)
    }

    pub fn get_type(&self, type_name: &str) -> Option<&TypeResolvers> {
        self.types.get(type_name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeResolvers> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
