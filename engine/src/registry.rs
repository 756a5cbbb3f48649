//! Types the object graph loader knows how to construct.

use std::sync::OnceLock;

use crate::{
    prelude::*,
    simplify::{Object, Value},
};

/// Field layout of a registered type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Schema {
    pub tag: &'static str,
    pub fields: &'static [&'static str],
}

impl Schema {
    /// Construct an instance with every field still unset.
    pub fn blank(&self) -> Object {
        Object {
            tag: self.tag.into(),
            fields: vec![Value::None; self.fields.len()],
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct Registry {
    types: HashMap<&'static str, Schema>,
}

impl Registry {
    pub fn register(
        &mut self,
        tag: &'static str,
        fields: &'static [&'static str],
    ) -> &mut Self {
        if self.types.insert(tag, Schema { tag, fields }).is_some() {
            log::warn!("Registry::register: {tag:?} registered twice");
        }
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Schema> {
        self.types.get(tag)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Build a registry from tags and their field names.
///
/// ```
/// let r = engine::registry! {
///     "point" => ["x", "y"],
/// };
/// assert_eq!(r.get("point").map(|s| s.fields.len()), Some(2));
/// ```
#[macro_export]
macro_rules! registry {
    {
        $($tag:literal => [$($field:literal),* $(,)?],)+
    } => {{
        let mut ret = $crate::registry::Registry::default();
        $(ret.register($tag, &[$($field),*]);)+
        ret
    }}
}

static TYPES: OnceLock<Registry> = OnceLock::new();

/// Process wide registry of the types in save files.
///
/// Built on first use, never changes afterwards.
pub fn types() -> &'static Registry {
    TYPES.get_or_init(crate::save::registry)
}
