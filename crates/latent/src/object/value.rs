use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Instance, Method};
use crate::error::{Error, Result};
use crate::stub::Stub;

/// Physical shape of a storage cell or object body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
	/// Single-value cell.
	Scalar,
	/// Ordered-sequence cell.
	Sequence,
	/// Key-mapping cell.
	Mapping,
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Scalar => "scalar",
			Self::Sequence => "sequence",
			Self::Mapping => "mapping",
		})
	}
}

/// A dynamically typed value flowing through method calls and object bodies.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Undef,
	Bool(bool),
	Int(i64),
	Str(Arc<str>),
	List(Vec<Value>),
	Map(IndexMap<String, Value>),
	/// Strong reference to a realized object.
	Object(Arc<Instance>),
	/// Handle to a (possibly unrealized) stub cell.
	Stub(Stub),
	/// A callable.
	Method(Method),
}

impl Value {
	/// Short kind name for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Undef => "undef",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Str(_) => "string",
			Self::List(_) => "list",
			Self::Map(_) => "map",
			Self::Object(_) => "object",
			Self::Stub(_) => "stub",
			Self::Method(_) => "method",
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&Arc<Instance>> {
		match self {
			Self::Object(v) => Some(v),
			_ => None,
		}
	}

	pub fn is_undef(&self) -> bool {
		matches!(self, Self::Undef)
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Undef, Self::Undef) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Map(a), Self::Map(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
			(Self::Stub(a), Self::Stub(b)) => a.same_cell(b),
			(Self::Method(a), Self::Method(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undef => f.write_str("Undef"),
			Self::Bool(v) => write!(f, "Bool({v})"),
			Self::Int(v) => write!(f, "Int({v})"),
			Self::Str(v) => write!(f, "Str({v:?})"),
			Self::List(v) => f.debug_tuple("List").field(v).finish(),
			Self::Map(v) => f.debug_tuple("Map").field(v).finish(),
			Self::Object(v) => f.debug_tuple("Object").field(v).finish(),
			Self::Stub(v) => f.debug_tuple("Stub").field(v).finish(),
			Self::Method(v) => f.debug_tuple("Method").field(&v.name()).finish(),
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Self::Int(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::Str(Arc::from(v))
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Self::Str(Arc::from(v))
	}
}

impl From<Arc<Instance>> for Value {
	fn from(v: Arc<Instance>) -> Self {
		Self::Object(v)
	}
}

impl From<Stub> for Value {
	fn from(v: Stub) -> Self {
		Self::Stub(v)
	}
}

/// Physical storage of an object or stub: one value, a sequence, or a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
	Scalar(Value),
	Sequence(Vec<Value>),
	Mapping(IndexMap<String, Value>),
}

impl Body {
	pub fn shape(&self) -> Shape {
		match self {
			Self::Scalar(_) => Shape::Scalar,
			Self::Sequence(_) => Shape::Sequence,
			Self::Mapping(_) => Shape::Mapping,
		}
	}

	/// Builds a mapping body from key/value pairs.
	pub fn mapping<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		Self::Mapping(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	/// Builds a sequence body.
	pub fn sequence<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
		Self::Sequence(items.into_iter().map(Into::into).collect())
	}

	pub fn scalar(&self) -> Result<Value> {
		match self {
			Self::Scalar(v) => Ok(v.clone()),
			other => Err(mismatch(Shape::Scalar, other)),
		}
	}

	pub fn element(&self, index: usize) -> Result<Option<Value>> {
		match self {
			Self::Sequence(items) => Ok(items.get(index).cloned()),
			other => Err(mismatch(Shape::Sequence, other)),
		}
	}

	pub fn elements(&self) -> Result<Vec<Value>> {
		match self {
			Self::Sequence(items) => Ok(items.clone()),
			other => Err(mismatch(Shape::Sequence, other)),
		}
	}

	pub fn get(&self, key: &str) -> Result<Option<Value>> {
		match self {
			Self::Mapping(entries) => Ok(entries.get(key).cloned()),
			other => Err(mismatch(Shape::Mapping, other)),
		}
	}

	pub fn entries(&self) -> Result<IndexMap<String, Value>> {
		match self {
			Self::Mapping(entries) => Ok(entries.clone()),
			other => Err(mismatch(Shape::Mapping, other)),
		}
	}

	/// Inserts into a mapping body, returning the previous value.
	pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
		match self {
			Self::Mapping(entries) => Ok(entries.insert(key.into(), value)),
			other => Err(mismatch(Shape::Mapping, other)),
		}
	}

	/// Returns the callable held by a scalar body.
	pub fn callable(&self) -> Result<Method> {
		match self {
			Self::Scalar(Value::Method(method)) => Ok(method.clone()),
			Self::Scalar(other) => Err(Error::fault(format!("cannot call a {} value", other.kind()))),
			other => Err(mismatch(Shape::Scalar, other)),
		}
	}
}

fn mismatch(expected: Shape, found: &Body) -> Error {
	Error::ShapeMismatch {
		expected,
		found: found.shape(),
	}
}
