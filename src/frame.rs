//! Frame store: the three-frame variable model (global / local stack / temporary).

use std::collections::HashMap;

use crate::errors::{Frame, InterpreterError};
use crate::value::Value;

/// A resolved reference to a variable, parsed once at document-load time
/// from the `FRAME@NAME` payload of a `var`-typed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub frame: Frame,
    pub name: String,
}

impl VarRef {
    pub fn parse(text: &str) -> Option<Self> {
        let (prefix, name) = text.split_once('@')?;
        let frame = match prefix {
            "GF" => Frame::Global,
            "LF" => Frame::Local,
            "TF" => Frame::Temporary,
            _ => return None,
        };
        Some(VarRef { frame, name: name.to_string() })
    }
}

/// A single frame: a name-to-value mapping, keys unique within the frame.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
}

impl Scope {
    fn new() -> Self {
        Self::default()
    }
}

/// Owns the global frame, the local-frame stack, and the optional
/// temporary frame, and implements the define/get/set contract with the
/// 55-before-54 error precedence spec.md §7 requires.
#[derive(Debug, Default)]
pub struct FrameStore {
    global: Scope,
    locals: Vec<Scope>,
    temporary: Option<Scope>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self { global: Scope::new(), locals: Vec::new(), temporary: None }
    }

    fn scope(&self, frame: Frame) -> Result<&Scope, InterpreterError> {
        match frame {
            Frame::Global => Ok(&self.global),
            Frame::Local => self.locals.last().ok_or(InterpreterError::FrameMissing(Frame::Local)),
            Frame::Temporary => self.temporary.as_ref().ok_or(InterpreterError::FrameMissing(Frame::Temporary)),
        }
    }

    fn scope_mut(&mut self, frame: Frame) -> Result<&mut Scope, InterpreterError> {
        match frame {
            Frame::Global => Ok(&mut self.global),
            Frame::Local => self.locals.last_mut().ok_or(InterpreterError::FrameMissing(Frame::Local)),
            Frame::Temporary => self.temporary.as_mut().ok_or(InterpreterError::FrameMissing(Frame::Temporary)),
        }
    }

    /// `DEFVAR`: binds `var.name` to `Undefined` in its frame.
    pub fn define(&mut self, var: &VarRef) -> Result<(), InterpreterError> {
        let scope = self.scope_mut(var.frame)?;
        if scope.bindings.contains_key(&var.name) {
            return Err(InterpreterError::VariableRedefined {
                frame: var.frame,
                name: var.name.clone(),
            });
        }
        scope.bindings.insert(var.name.clone(), Value::Undefined);
        Ok(())
    }

    /// Fetch the bound value, frame-missing (55) before name-missing (54).
    pub fn get(&self, var: &VarRef) -> Result<&Value, InterpreterError> {
        let scope = self.scope(var.frame)?;
        scope.bindings.get(&var.name).ok_or_else(|| InterpreterError::VariableUndefined {
            frame: var.frame,
            name: var.name.clone(),
        })
    }

    /// Update an existing binding; fails 55/54 analogously to `get`.
    pub fn set(&mut self, var: &VarRef, value: Value) -> Result<(), InterpreterError> {
        let scope = self.scope_mut(var.frame)?;
        if !scope.bindings.contains_key(&var.name) {
            return Err(InterpreterError::VariableUndefined {
                frame: var.frame,
                name: var.name.clone(),
            });
        }
        scope.bindings.insert(var.name.clone(), value);
        Ok(())
    }

    /// `CREATEFRAME`: replaces any previous temporary frame, no error.
    pub fn create_frame(&mut self) {
        self.temporary = Some(Scope::new());
    }

    /// `PUSHFRAME`: consumes the temporary frame onto the local stack.
    pub fn push_frame(&mut self) -> Result<(), InterpreterError> {
        let frame = self.temporary.take().ok_or(InterpreterError::FrameMissing(Frame::Temporary))?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: the top local frame becomes the temporary frame.
    pub fn pop_frame(&mut self) -> Result<(), InterpreterError> {
        let frame = self.locals.pop().ok_or(InterpreterError::FrameMissing(Frame::Local))?;
        self.temporary = Some(frame);
        Ok(())
    }

    /// Ordered `(name, value)` pairs for `BREAK`'s diagnostic dump.
    pub fn dump_global(&self) -> Vec<(&str, &Value)> {
        self.global.bindings.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    pub fn dump_locals(&self) -> Vec<Vec<(&str, &Value)>> {
        self.locals
            .iter()
            .map(|scope| scope.bindings.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .collect()
    }

    pub fn dump_temporary(&self) -> Option<Vec<(&str, &Value)>> {
        self.temporary.as_ref().map(|scope| scope.bindings.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }
}
