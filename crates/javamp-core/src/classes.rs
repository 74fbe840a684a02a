//! Arena-backed model of the classes discovered in one compilation unit.
//!
//! The class graph is cyclic (a class knows its enclosing class, the
//! enclosing class body contains it), so classes live in a flat arena and
//! refer to each other by index. The arena is built once per unit and
//! frozen before translation starts.

use serde::Serialize;

use crate::vars::{Variable, array_less};

/// A lightweight handle to a class in the [`ClassArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a class declaration sits in the source.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ClassKind {
    /// Declared directly in the compilation unit.
    Top,
    /// Member class of another class.
    Inner,
    /// Declared inside a method or block.
    Local,
    /// Body of an instance-creation expression or enum constant.
    Anonymous,
}

/// One discovered class: identity, position in the class graph, and the
/// fields it declares.
#[derive(Clone, Debug)]
pub struct ClassEntry {
    pub name: String,
    pub kind: ClassKind,
    /// Resolved `extends` target, when the supertype is declared in the
    /// same unit. External supertypes stay `None`; their fields are simply
    /// not resolvable.
    pub superclass: Option<ClassId>,
    /// Lexically enclosing class, `None` for top-level classes.
    pub enclosing: Option<ClassId>,
    pub fields: Vec<Variable>,
}

/// All classes of one compilation unit.
#[derive(Debug, Default)]
pub struct ClassArena {
    entries: Vec<ClassEntry>,
}

impl ClassArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ClassEntry) -> ClassId {
        let id = ClassId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: ClassId) -> &ClassEntry {
        &self.entries[id.index()]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassEntry {
        &mut self.entries[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (ClassId(i as u32), e))
    }

    /// Find a class by simple name, in discovery order.
    pub fn find_by_name(&self, name: &str) -> Option<ClassId> {
        self.iter().find(|(_, e)| e.name == name).map(|(id, _)| id)
    }

    /// The inheritance chain starting at `id`, innermost first. Bounded by
    /// the arena size so a malformed `extends` cycle cannot loop forever.
    pub fn inheritance_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if chain.len() > self.entries.len() {
                break;
            }
            chain.push(c);
            current = self.get(c).superclass;
        }
        chain
    }

    /// Resolve a field by name along the inheritance chain of `start`.
    ///
    /// `private` fields of proper ancestors are skipped: a reference to one
    /// could not have compiled in the source class either.
    pub fn find_field(&self, start: ClassId, name: &str) -> Option<Variable> {
        let bare = array_less(name);
        for (depth, cid) in self.inheritance_chain(start).into_iter().enumerate() {
            for field in &self.get(cid).fields {
                if field.name == bare && (depth == 0 || !field.is_private) {
                    return Some(field.clone());
                }
            }
        }
        None
    }
}
