//! IR value, instruction, and terminator definitions

/// Primitive value types carried by the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    /// 1-bit boolean (comparison results)
    I1,
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// Pointer (64-bit on this target)
    Ptr,
    /// No value
    Void,
}

impl Ty {
    /// Size of a value of this type in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            Ty::I1 => 1,
            Ty::I32 => 4,
            Ty::I64 => 8,
            Ty::Ptr => 8,
            Ty::Void => 0,
        }
    }

    /// Textual type name used in IR dumps
    pub fn name(&self) -> &'static str {
        match self {
            Ty::I1 => "i1",
            Ty::I32 => "i32",
            Ty::I64 => "i64",
            Ty::Ptr => "ptr",
            Ty::Void => "void",
        }
    }
}

/// Virtual value handle (per-function supply, assigned once)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

impl ValueId {
    /// Creates a new value handle with the given ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Basic block handle (stable arena index within a function)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// Instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Result of another instruction or a function parameter
    Value(ValueId),
    /// Integer constant
    ConstInt {
        /// Value type
        ty: Ty,
        /// Constant value
        value: i64,
    },
    /// Address of a named module global
    Global(String),
}

impl Operand {
    /// Operand referring to an instruction result
    pub fn value(id: ValueId) -> Self {
        Operand::Value(id)
    }

    /// 64-bit integer constant operand
    pub fn const_i64(value: i64) -> Self {
        Operand::ConstInt { ty: Ty::I64, value }
    }

    /// 32-bit integer constant operand
    pub fn const_i32(value: i64) -> Self {
        Operand::ConstInt { ty: Ty::I32, value }
    }

    /// Operand holding the address of a named global
    pub fn global(name: impl Into<String>) -> Self {
        Operand::Global(name.into())
    }
}

/// Non-terminator instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Memory read: dst = *addr
    Load {
        /// Destination value
        dst: ValueId,
        /// Width of the loaded value
        ty: Ty,
        /// Pointer operand identifying the accessed address
        addr: Operand,
    },
    /// Memory write: *addr = value
    Store {
        /// Width of the stored value
        ty: Ty,
        /// Value being stored
        value: Operand,
        /// Pointer operand identifying the accessed address
        addr: Operand,
    },
    /// Stack slot allocation: dst = address of a fresh slot
    Alloca {
        /// Destination value (the slot address)
        dst: ValueId,
        /// Slot type
        ty: Ty,
    },
    /// Pointer displacement in bytes: dst = base + offset
    PtrOffset {
        /// Destination value
        dst: ValueId,
        /// Base pointer
        base: Operand,
        /// Byte offset (may be negative)
        offset: i64,
    },
    /// Pointer-to-integer conversion, sized to the native 64-bit width
    PtrToInt {
        /// Destination value
        dst: ValueId,
        /// Pointer being converted
        addr: Operand,
    },
    /// Bitwise AND: dst = lhs & rhs
    And {
        /// Destination value
        dst: ValueId,
        /// Left operand
        lhs: Operand,
        /// Right operand
        rhs: Operand,
    },
    /// Integer equality: dst = (lhs == rhs), i1 result
    ICmpEq {
        /// Destination value
        dst: ValueId,
        /// Left operand
        lhs: Operand,
        /// Right operand
        rhs: Operand,
    },
    /// Direct call, result in optional dst
    Call {
        /// Destination value (None when the result is ignored)
        dst: Option<ValueId>,
        /// Callee symbol name
        callee: String,
        /// Call arguments in order
        args: Vec<Operand>,
    },
}

impl Instruction {
    /// Lowercase opcode name, used as the diagnostic label
    pub fn opcode_name(&self) -> &'static str {
        match self {
            Instruction::Load { .. } => "load",
            Instruction::Store { .. } => "store",
            Instruction::Alloca { .. } => "alloca",
            Instruction::PtrOffset { .. } => "ptroffset",
            Instruction::PtrToInt { .. } => "ptrtoint",
            Instruction::And { .. } => "and",
            Instruction::ICmpEq { .. } => "icmp",
            Instruction::Call { .. } => "call",
        }
    }

    /// Pointer operand of a memory access, if this instruction is one
    pub fn access_addr(&self) -> Option<&Operand> {
        match self {
            Instruction::Load { addr, .. } | Instruction::Store { addr, .. } => Some(addr),
            _ => None,
        }
    }
}

/// Block terminator (exactly one per basic block)
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Unconditional branch
    Br(BlockId),
    /// Two-way branch on an i1 condition
    CondBr {
        /// Branch condition
        cond: Operand,
        /// Successor taken when the condition is nonzero
        then_dest: BlockId,
        /// Successor taken when the condition is zero
        else_dest: BlockId,
    },
    /// Function return with optional value
    Ret(Option<Operand>),
}

impl Terminator {
    /// Successor blocks of this terminator, in branch order
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(dest) => vec![*dest],
            Terminator::CondBr {
                then_dest,
                else_dest,
                ..
            } => vec![*then_dest, *else_dest],
            Terminator::Ret(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_names() {
        let load = Instruction::Load {
            dst: ValueId(0),
            ty: Ty::I64,
            addr: Operand::global("g"),
        };
        let store = Instruction::Store {
            ty: Ty::I32,
            value: Operand::const_i32(0),
            addr: Operand::global("g"),
        };
        assert_eq!(load.opcode_name(), "load");
        assert_eq!(store.opcode_name(), "store");
    }

    #[test]
    fn test_access_addr_only_for_memory_ops() {
        let load = Instruction::Load {
            dst: ValueId(0),
            ty: Ty::I64,
            addr: Operand::global("g"),
        };
        assert_eq!(load.access_addr(), Some(&Operand::global("g")));

        let and = Instruction::And {
            dst: ValueId(1),
            lhs: Operand::value(ValueId(0)),
            rhs: Operand::const_i64(1),
        };
        assert_eq!(and.access_addr(), None);

        let call = Instruction::Call {
            dst: None,
            callee: "printf".to_string(),
            args: vec![],
        };
        assert_eq!(call.access_addr(), None);
    }

    #[test]
    fn test_terminator_successors() {
        let br = Terminator::Br(BlockId(3));
        assert_eq!(br.successors(), vec![BlockId(3)]);

        let cond = Terminator::CondBr {
            cond: Operand::value(ValueId(0)),
            then_dest: BlockId(1),
            else_dest: BlockId(2),
        };
        assert_eq!(cond.successors(), vec![BlockId(1), BlockId(2)]);

        assert!(Terminator::Ret(None).successors().is_empty());
    }
}
