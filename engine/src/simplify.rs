//! Reference preserving conversion between object graphs and trees.
//!
//! An object graph is made of `Value`s where objects and containers are
//! shared handles. `simplify` flattens a graph into a `Node` tree that can
//! be written out with serde, giving every object and container an identity
//! number on first visit and emitting a `Node::Ref` on every later visit.
//! `unsimplify` rebuilds the graph with the same sharing, cycles included.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{prelude::*, registry::Registry, LoadError};

pub type Shared<T> = Rc<RefCell<T>>;

/// Node in an object graph.
#[derive(Clone, Debug)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(Shared<Object>),
    Container(Shared<Container>),
}

/// Instance of a registered type with its fields in schema order.
#[derive(Clone, Default, Debug)]
pub struct Object {
    pub tag: String,
    pub fields: Vec<Value>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerKind {
    Seq,
    Set,
    Tuple,
}

#[derive(Clone, Debug)]
pub struct Container {
    pub kind: ContainerKind,
    pub items: Vec<Value>,
}

/// Tree form of an object graph.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Node {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object {
        id: u32,
        tag: String,
        fields: Vec<Node>,
    },
    Container {
        id: u32,
        kind: ContainerKind,
        items: Vec<Node>,
    },
    /// An object or container that already appeared in the tree.
    Ref(u32),
}

impl Value {
    pub fn object(tag: &str, fields: Vec<Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(Object {
            tag: tag.into(),
            fields,
        })))
    }

    pub fn container(kind: ContainerKind, items: Vec<Value>) -> Value {
        Value::Container(Rc::new(RefCell::new(Container { kind, items })))
    }

    pub fn seq(items: Vec<Value>) -> Value {
        Value::container(ContainerKind::Seq, items)
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::container(ContainerKind::Tuple, items)
    }

    /// Do two values refer to the same shared object or container.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Container(a), Value::Container(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(a: Option<T>) -> Self {
        a.map_or(Value::None, Into::into)
    }
}

/// Flatten an object graph into a tree.
pub fn simplify(root: &Value) -> Node {
    let mut seen = HashMap::default();
    simplify_with(root, &mut seen)
}

fn simplify_with(value: &Value, seen: &mut HashMap<*const (), u32>) -> Node {
    match value {
        Value::None => Node::None,
        Value::Bool(b) => Node::Bool(*b),
        Value::Int(n) => Node::Int(*n),
        Value::Float(x) => Node::Float(*x),
        Value::Str(s) => Node::Str(s.clone()),
        Value::Object(o) => {
            let id = match first_visit(Rc::as_ptr(o) as *const (), seen) {
                Ok(id) => id,
                Err(id) => return Node::Ref(id),
            };
            let o = o.borrow();
            Node::Object {
                id,
                tag: o.tag.clone(),
                fields: o
                    .fields
                    .iter()
                    .map(|v| simplify_with(v, seen))
                    .collect(),
            }
        }
        Value::Container(c) => {
            let id = match first_visit(Rc::as_ptr(c) as *const (), seen) {
                Ok(id) => id,
                Err(id) => return Node::Ref(id),
            };
            let c = c.borrow();
            Node::Container {
                id,
                kind: c.kind,
                items: c
                    .items
                    .iter()
                    .map(|v| simplify_with(v, seen))
                    .collect(),
            }
        }
    }
}

/// Give a new identity to an unseen object, or return the existing one as
/// an error.
fn first_visit(
    key: *const (),
    seen: &mut HashMap<*const (), u32>,
) -> Result<u32, u32> {
    if let Some(&id) = seen.get(&key) {
        return Err(id);
    }
    let id = seen.len() as u32;
    seen.insert(key, id);
    Ok(id)
}

/// Rebuild an object graph from a tree.
///
/// Objects must have tags known to `registry` and the field counts their
/// schema expects.
pub fn unsimplify(node: &Node, registry: &Registry) -> Result<Value, LoadError> {
    let mut table = HashMap::default();
    unsimplify_with(node, registry, &mut table)
}

fn unsimplify_with(
    node: &Node,
    registry: &Registry,
    table: &mut HashMap<u32, Value>,
) -> Result<Value, LoadError> {
    match node {
        Node::None => Ok(Value::None),
        Node::Bool(b) => Ok(Value::Bool(*b)),
        Node::Int(n) => Ok(Value::Int(*n)),
        Node::Float(x) => Ok(Value::Float(*x)),
        Node::Str(s) => Ok(Value::Str(s.clone())),
        Node::Ref(id) => {
            table.get(id).cloned().ok_or(LoadError::DanglingReference(*id))
        }
        Node::Object { id, tag, fields } => {
            let schema = registry
                .get(tag)
                .ok_or_else(|| LoadError::UnregisteredTag(tag.clone()))?;
            if schema.fields.len() != fields.len() {
                return Err(LoadError::FieldCount {
                    tag: tag.clone(),
                    expected: schema.fields.len(),
                    found: fields.len(),
                });
            }

            // Register before filling in fields, they may point back here.
            let object = Rc::new(RefCell::new(schema.blank()));
            claim(table, *id, Value::Object(object.clone()))?;
            let fields = fields
                .iter()
                .map(|n| unsimplify_with(n, registry, table))
                .collect::<Result<Vec<_>, _>>()?;
            object.borrow_mut().fields = fields;
            Ok(Value::Object(object))
        }
        Node::Container { id, kind, items } => {
            let container = Rc::new(RefCell::new(Container {
                kind: *kind,
                items: Vec::new(),
            }));
            claim(table, *id, Value::Container(container.clone()))?;
            let items = items
                .iter()
                .map(|n| unsimplify_with(n, registry, table))
                .collect::<Result<Vec<_>, _>>()?;
            container.borrow_mut().items = items;
            Ok(Value::Container(container))
        }
    }
}

fn claim(
    table: &mut HashMap<u32, Value>,
    id: u32,
    value: Value,
) -> Result<(), LoadError> {
    if table.contains_key(&id) {
        return Err(LoadError::DuplicateIdentity(id));
    }
    table.insert(id, value);
    Ok(())
}

/// Empty out every object and container reachable from `root`.
///
/// Graphs with cycles keep themselves alive otherwise.
pub fn dismantle(root: Value) {
    let mut stack = vec![root];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(o) => {
                stack.extend(std::mem::take(&mut o.borrow_mut().fields));
            }
            Value::Container(c) => {
                stack.extend(std::mem::take(&mut c.borrow_mut().items));
            }
            _ => {}
        }
    }
}
