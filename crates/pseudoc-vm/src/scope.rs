//! Scope stack and name resolution (`spec.md` §3 "Runtime scope").

use crate::value::Value;
use pseudoc_ir::{Place, TempId};
use pseudoc_util::Symbol;
use rustc_hash::FxHashMap;

/// One active call's local bindings, by-ref write-back targets, and
/// temporary storage. Temporaries live per frame (rather than in one
/// flat map keyed only by `TempId`) because the IR generator numbers
/// temporaries monotonically across the *whole* program: a recursive
/// call re-enters code that reuses the same `Tn` ids while an outer
/// activation is still paused on the call stack, so a shared map would
/// let the inner call clobber the outer one's in-flight temporaries.
#[derive(Debug, Default)]
pub struct Frame {
    pub locals: FxHashMap<Symbol, Value>,
    pub byref_map: FxHashMap<Symbol, Place>,
    temps: FxHashMap<TempId, Value>,
}

/// Globals plus a stack of call frames (`spec.md` §3). `scope_stack`
/// is empty at program start and after top-level completion, per the
/// invariant in `spec.md` §3.
#[derive(Debug, Default)]
pub struct Scopes {
    pub globals: FxHashMap<Symbol, Value>,
    pub frames: Vec<Frame>,
    top_level_temps: FxHashMap<TempId, Value>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn exit_scope(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn get_temp(&self, id: TempId) -> Option<&Value> {
        match self.frames.last() {
            Some(frame) => frame.temps.get(&id),
            None => self.top_level_temps.get(&id),
        }
    }

    pub fn set_temp(&mut self, id: TempId, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => frame.temps.insert(id, value),
            None => self.top_level_temps.insert(id, value),
        };
    }

    /// `spec.md` §3: "current frame locals first, else globals."
    pub fn get_var(&self, name: Symbol) -> Option<&Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(v) = frame.locals.get(&name) {
                return Some(v);
            }
        }
        self.globals.get(&name)
    }

    pub fn get_var_mut(&mut self, name: Symbol) -> Option<&mut Value> {
        let in_frame = self.frames.last().is_some_and(|f| f.locals.contains_key(&name));
        if in_frame {
            self.frames.last_mut().and_then(|f| f.locals.get_mut(&name))
        } else {
            self.globals.get_mut(&name)
        }
    }

    /// `spec.md` §3: "Assignment: if name exists in current frame
    /// locals, set there; else if a local frame exists and the name is
    /// not in globals, create it in the frame; else set global."
    pub fn set_var(&mut self, name: Symbol, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.locals.contains_key(&name) {
                frame.locals.insert(name, value);
                return;
            }
            if !self.globals.contains_key(&name) {
                frame.locals.insert(name, value);
                return;
            }
        }
        self.globals.insert(name, value);
    }

    /// Declares a name as local to the current frame without giving it
    /// a value yet, matching `LOCAL name`'s purpose (`spec.md` §4.4):
    /// "pre-reserves a local binding so it cannot accidentally shadow a
    /// global of the same name at first *assignment*."
    pub fn declare_local(&mut self, name: Symbol, default: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.entry(name).or_insert(default);
        }
    }
}
