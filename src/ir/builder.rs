//! Fluent builder for constructing IR functions
//!
//! Keeps track of the block being filled so callers emit instructions
//! positionally instead of assembling vectors by hand:
//!
//! ```
//! use parity_probe::ir::{FunctionBuilder, Operand, Ty};
//!
//! let mut b = FunctionBuilder::new("main");
//! b.store(Ty::I32, Operand::const_i32(0), Operand::global("g"));
//! b.ret(None);
//! let func = b.build();
//! assert_eq!(func.block(func.entry()).instructions.len(), 1);
//! ```

use super::instruction::{BlockId, Instruction, Operand, Terminator, Ty, ValueId};
use super::module::Function;

/// Builder positioned at one block of a function under construction
pub struct FunctionBuilder {
    func: Function,
    current: BlockId,
}

impl FunctionBuilder {
    /// Start building a function; positioned at its entry block
    pub fn new(name: impl Into<String>) -> Self {
        let func = Function::new(name);
        let current = func.entry();
        Self { func, current }
    }

    /// Declare a function parameter
    pub fn param(&mut self, ty: Ty) -> ValueId {
        self.func.add_param(ty)
    }

    /// Append a new block (terminated by `ret void` until overwritten)
    pub fn block(&mut self, label: impl Into<String>) -> BlockId {
        self.func.append_block(label, Terminator::Ret(None))
    }

    /// Reposition the builder at an existing block
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Block the builder is currently positioned at
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    fn push(&mut self, instr: Instruction) {
        self.func.block_mut(self.current).instructions.push(instr);
    }

    /// Emit a stack slot allocation
    pub fn alloca(&mut self, ty: Ty) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::Alloca { dst, ty });
        dst
    }

    /// Emit a load
    pub fn load(&mut self, ty: Ty, addr: Operand) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::Load { dst, ty, addr });
        dst
    }

    /// Emit a store
    pub fn store(&mut self, ty: Ty, value: Operand, addr: Operand) {
        self.push(Instruction::Store { ty, value, addr });
    }

    /// Emit a pointer displacement
    pub fn ptr_offset(&mut self, base: Operand, offset: i64) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::PtrOffset { dst, base, offset });
        dst
    }

    /// Emit a pointer-to-integer conversion
    pub fn ptr_to_int(&mut self, addr: Operand) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::PtrToInt { dst, addr });
        dst
    }

    /// Emit a bitwise AND
    pub fn and(&mut self, lhs: Operand, rhs: Operand) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::And { dst, lhs, rhs });
        dst
    }

    /// Emit an integer equality comparison
    pub fn icmp_eq(&mut self, lhs: Operand, rhs: Operand) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::ICmpEq { dst, lhs, rhs });
        dst
    }

    /// Emit a call whose result is used
    pub fn call(&mut self, callee: impl Into<String>, args: Vec<Operand>) -> ValueId {
        let dst = self.func.fresh_value();
        self.push(Instruction::Call {
            dst: Some(dst),
            callee: callee.into(),
            args,
        });
        dst
    }

    /// Emit a call whose result is ignored
    pub fn call_void(&mut self, callee: impl Into<String>, args: Vec<Operand>) {
        self.push(Instruction::Call {
            dst: None,
            callee: callee.into(),
            args,
        });
    }

    /// Terminate the current block with an unconditional branch
    pub fn br(&mut self, dest: BlockId) {
        self.func.block_mut(self.current).terminator = Terminator::Br(dest);
    }

    /// Terminate the current block with a two-way branch
    pub fn cond_br(&mut self, cond: Operand, then_dest: BlockId, else_dest: BlockId) {
        self.func.block_mut(self.current).terminator = Terminator::CondBr {
            cond,
            then_dest,
            else_dest,
        };
    }

    /// Terminate the current block with a return
    pub fn ret(&mut self, value: Option<Operand>) {
        self.func.block_mut(self.current).terminator = Terminator::Ret(value);
    }

    /// Finish and return the constructed function
    pub fn build(self) -> Function {
        self.func
    }
}
