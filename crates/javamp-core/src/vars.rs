//! Captured-variable model.
//!
//! A [`Variable`] names one storage location a region may capture: a local,
//! a parameter, or a field somewhere on an inheritance chain. Two variables
//! are the same capture iff their array-less name and resolved kind match;
//! everything else (declared type, flags) is payload carried along for code
//! synthesis.

use serde::Serialize;

use crate::classes::ClassId;

/// Strip a C-style array suffix from a declarator name (`a[]` -> `a`).
pub fn array_less(name: &str) -> &str {
    match name.find('[') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Where a name resolved.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum VarKind {
    Local,
    Param,
    /// Field declared by the given class.
    Field(ClassId),
}

/// A named storage location, as resolved for one region.
#[derive(Clone, Debug, Serialize)]
pub struct Variable {
    /// Simple, array-less name.
    pub name: String,
    /// Declared type text with any declarator dimensions folded in
    /// (`int a[]` carries `jtype == "int[]"`).
    pub jtype: String,
    pub kind: VarKind,
    /// Declaring class for fields; the directive class for locals and
    /// parameters. Feeds the mangled name.
    pub owner: ClassId,
    pub is_final: bool,
    pub is_static: bool,
    pub is_private: bool,
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name {
            return false;
        }
        match (self.kind, other.kind) {
            (VarKind::Local, VarKind::Local) => true,
            (VarKind::Param, VarKind::Param) => true,
            (VarKind::Field(a), VarKind::Field(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        match self.kind {
            VarKind::Local => 0u8.hash(state),
            VarKind::Param => 1u8.hash(state),
            VarKind::Field(c) => {
                2u8.hash(state);
                c.hash(state);
            }
        }
    }
}

impl Variable {
    pub fn local(name: impl Into<String>, jtype: impl Into<String>, owner: ClassId) -> Self {
        Self::new(name, jtype, VarKind::Local, owner)
    }

    pub fn param(name: impl Into<String>, jtype: impl Into<String>, owner: ClassId) -> Self {
        Self::new(name, jtype, VarKind::Param, owner)
    }

    pub fn field(name: impl Into<String>, jtype: impl Into<String>, declaring: ClassId) -> Self {
        Self::new(name, jtype, VarKind::Field(declaring), declaring)
    }

    fn new(name: impl Into<String>, jtype: impl Into<String>, kind: VarKind, owner: ClassId) -> Self {
        let name = name.into();
        debug_assert_eq!(name, array_less(&name), "declarator dimensions must be folded into the type");
        Self {
            name,
            jtype: jtype.into(),
            kind,
            owner,
            is_final: false,
            is_static: false,
            is_private: false,
        }
    }

    pub fn with_flags(mut self, is_final: bool, is_static: bool, is_private: bool) -> Self {
        self.is_final = is_final;
        self.is_static = is_static;
        self.is_private = is_private;
        self
    }

    /// The field name this variable gets inside a generated context class.
    ///
    /// Pure function of (kind, owner, name): equal variables mangle equally,
    /// distinct ones cannot collide because the kind tag and owner id are
    /// both part of the name.
    pub fn full_name(&self) -> String {
        let tag = match self.kind {
            VarKind::Local => 'L',
            VarKind::Param => 'P',
            VarKind::Field(_) => 'F',
        };
        format!("{}_{}_{}", tag, self.owner.as_u32(), self.name)
    }

    /// Find the variable in `set` whose array-less name equals `name`.
    pub fn find<'a, I>(name: &str, set: I) -> Option<&'a Variable>
    where
        I: IntoIterator<Item = &'a Variable>,
    {
        let bare = array_less(name);
        set.into_iter().find(|v| v.name == bare)
    }
}
