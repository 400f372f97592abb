//! Per-function bytecode emission.
//!
//! [`FunctionEmitter`] owns the instruction vector, the flat local-slot
//! table, and a symbolic-label table for branches. Jumps are emitted
//! against labels rather than hand-computed offsets; one backpatch pass in
//! [`finish`](FunctionEmitter::finish) resolves every label to a signed
//! offset relative to the instruction after the branch.

use rustc_hash::FxHashMap;

use crate::bytecode::{Instr, Opcode};

/// A symbolic jump target within one function.
///
/// Created with [`FunctionEmitter::new_label`], positioned with
/// [`FunctionEmitter::bind`], referenced by the branch emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Emits the body of a single function.
///
/// Slot allocation is flat over the whole function: the first use of a
/// name allocates the next free slot, later uses reuse it, and blocks do
/// not open slot frames. `nlocals` tracks the high-water mark.
#[derive(Debug, Default)]
pub struct FunctionEmitter {
    code: Vec<Instr>,
    slots: FxHashMap<String, i32>,
    next_slot: i32,
    nlocals: usize,
    /// Bound position of each label, by label index.
    labels: Vec<Option<usize>>,
    /// Branch instructions waiting for a label offset.
    patches: Vec<(usize, Label)>,
}

impl FunctionEmitter {
    /// Create an emitter with no code and no slots.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Slots
    // ==========================================================================

    /// Get the slot for a name, allocating the next free one on first use.
    pub fn alloc_slot(&mut self, name: &str) -> i32 {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.slots.insert(name.to_string(), slot);
        self.nlocals = self.nlocals.max(self.next_slot as usize);
        slot
    }

    /// Look up the slot for a name without allocating.
    pub fn slot(&self, name: &str) -> Option<i32> {
        self.slots.get(name).copied()
    }

    // ==========================================================================
    // Emission
    // ==========================================================================

    /// Emit an instruction with no operands.
    pub fn emit(&mut self, op: Opcode) {
        self.code.push(Instr::new(op));
    }

    /// Emit an instruction with one operand.
    pub fn emit_a(&mut self, op: Opcode, a: i32) {
        self.code.push(Instr::with_a(op, a));
    }

    /// Emit an instruction with two operands.
    pub fn emit_ab(&mut self, op: Opcode, a: i32, b: i32) {
        self.code.push(Instr::with_ab(op, a, b));
    }

    // ==========================================================================
    // Labels and branches
    // ==========================================================================

    /// Allocate a fresh, unbound label.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind a label to the current end of code.
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0] = Some(self.code.len());
    }

    /// Emit an unconditional branch to a label.
    pub fn jump(&mut self, label: Label) {
        self.patches.push((self.code.len(), label));
        self.emit_a(Opcode::Jmp, 0);
    }

    /// Emit a branch-if-false to a label.
    pub fn jump_if_false(&mut self, label: Label) {
        self.patches.push((self.code.len(), label));
        self.emit_a(Opcode::JmpIfFalse, 0);
    }

    // ==========================================================================
    // Finish
    // ==========================================================================

    /// Resolve all branches and return the code plus the slot high-water
    /// mark.
    ///
    /// # Panics
    ///
    /// Panics if a referenced label was never bound.
    pub fn finish(mut self) -> (Vec<Instr>, usize) {
        for &(at, label) in &self.patches {
            let target = self.labels[label.0]
                .unwrap_or_else(|| panic!("label L{} referenced but never bound", label.0));
            // Offsets are relative to the instruction after the branch.
            self.code[at].a = target as i32 - (at as i32 + 1);
        }
        (self.code, self.nlocals)
    }
}
