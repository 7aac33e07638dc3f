//! Variable environments
//!
//! An environment is one scope frame plus a link to the frame that
//! encloses it. A frame stores its bindings in one of two ways, chosen
//! when it is created and never changed:
//!
//! - **named**: an ordered name → value map. Backs the global scope and any
//!   scope the resolver did not size (frame size 0).
//! - **slotted**: a fixed array indexed by the slot numbers the resolver
//!   assigned. Backs resolved blocks and call frames.
//!
//! Frames are shared (`Rc<RefCell<_>>`): closures keep their defining frame
//! alive and see every later write made through any other alias.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Token;
use crate::diagnostics::RuntimeError;

use super::value::Value;

/// Shared handle to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug)]
enum Storage {
    Named(IndexMap<String, Value>),
    Slotted(Vec<Value>),
}

#[derive(Debug)]
pub struct Environment {
    enclosing: Option<EnvRef>,
    storage: Storage,
}

impl Environment {
    /// The outermost, named frame
    pub fn global() -> Self {
        Environment {
            enclosing: None,
            storage: Storage::Named(IndexMap::new()),
        }
    }

    /// A frame nested in `enclosing`; `frame_size == 0` selects named mode
    pub fn new(enclosing: Option<EnvRef>, frame_size: usize) -> Self {
        let storage = if frame_size == 0 {
            Storage::Named(IndexMap::new())
        } else {
            Storage::Slotted(vec![Value::Nil; frame_size])
        };
        Environment { enclosing, storage }
    }

    /// Allocate a shared child frame of `enclosing`
    pub fn child(enclosing: &EnvRef, frame_size: usize) -> EnvRef {
        Environment::new(Some(Rc::clone(enclosing)), frame_size).into_ref()
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<&EnvRef> {
        self.enclosing.as_ref()
    }

    pub fn is_slotted(&self) -> bool {
        matches!(self.storage, Storage::Slotted(_))
    }

    /// Slot count of a slotted frame, 0 for a named one
    pub fn frame_size(&self) -> usize {
        match &self.storage {
            Storage::Named(_) => 0,
            Storage::Slotted(slots) => slots.len(),
        }
    }

    /// Bind `name`. Redefinition overwrites.
    pub fn define(&mut self, name: &str, slot: Option<usize>, value: Value) {
        match &mut self.storage {
            Storage::Named(values) => {
                values.insert(name.to_string(), value);
            }
            Storage::Slotted(slots) => slots[slot_of(name, slot)] = value,
        }
    }

    /// Read `name`, searching enclosing frames while the frames are named
    pub fn get(&self, name: &Token, slot: Option<usize>) -> Result<Value, RuntimeError> {
        match &self.storage {
            Storage::Slotted(slots) => Ok(slots[slot_of(&name.lexeme, slot)].clone()),
            Storage::Named(values) => {
                if let Some(value) = values.get(&name.lexeme) {
                    return Ok(value.clone());
                }
                match &self.enclosing {
                    Some(parent) => parent.borrow().get(name, slot),
                    None => Err(RuntimeError::UndefinedVariable { name: name.clone() }),
                }
            }
        }
    }

    /// Overwrite an existing binding of `name`; never creates one
    pub fn assign(
        &mut self,
        name: &Token,
        slot: Option<usize>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match &mut self.storage {
            Storage::Slotted(slots) => {
                slots[slot_of(&name.lexeme, slot)] = value;
                Ok(())
            }
            Storage::Named(values) => {
                if let Some(existing) = values.get_mut(&name.lexeme) {
                    *existing = value;
                    return Ok(());
                }
                match &self.enclosing {
                    Some(parent) => parent.borrow_mut().assign(name, slot, value),
                    None => Err(RuntimeError::UndefinedVariable { name: name.clone() }),
                }
            }
        }
    }

    /// Walk `distance` links outward; 0 is `env` itself.
    ///
    /// The resolver guarantees the chain is at least that deep.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            let parent = match current.borrow().enclosing() {
                Some(parent) => Rc::clone(parent),
                None => panic!("scope chain is shorter than resolved distance {distance}"),
            };
            current = parent;
        }
        current
    }

    pub fn get_at(
        env: &EnvRef,
        distance: usize,
        name: &Token,
        slot: Option<usize>,
    ) -> Result<Value, RuntimeError> {
        Environment::ancestor(env, distance).borrow().get(name, slot)
    }

    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &Token,
        slot: Option<usize>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        Environment::ancestor(env, distance)
            .borrow_mut()
            .assign(name, slot, value)
    }

    /// Names bound in a named frame, in definition order
    pub fn names(&self) -> Vec<&str> {
        match &self.storage {
            Storage::Named(values) => values.keys().map(String::as_str).collect(),
            Storage::Slotted(_) => Vec::new(),
        }
    }
}

/// Slotted frames are only ever addressed with a resolver-assigned slot
fn slot_of(name: &str, slot: Option<usize>) -> usize {
    match slot {
        Some(slot) => slot,
        None => panic!("slotted frame accessed by name `{name}` without a resolved slot"),
    }
}
