//! IR module, function, and basic block definitions

use std::collections::HashMap;

use super::instruction::{BlockId, Instruction, Terminator, Ty, ValueId};

/// Basic block: straight-line instructions plus exactly one terminator
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Label identifying this block in dumps
    pub label: String,
    /// Instructions in execution order
    pub instructions: Vec<Instruction>,
    /// Control transfer ending the block
    pub terminator: Terminator,
}

impl BasicBlock {
    /// Create a new empty block with the given label and terminator
    pub fn new(label: impl Into<String>, terminator: Terminator) -> Self {
        Self {
            label: label.into(),
            instructions: Vec::new(),
            terminator,
        }
    }
}

/// Function definition: an arena of blocks plus an explicit layout order
///
/// Blocks are addressed by stable [`BlockId`]s; `layout` carries the textual
/// order, so new blocks can be inserted before an existing one without
/// invalidating any handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name (diagnostic context for instrumentation)
    pub name: String,
    /// Parameter values, bound by the caller before the entry block runs
    pub params: Vec<(ValueId, Ty)>,
    blocks: Vec<BasicBlock>,
    layout: Vec<BlockId>,
    entry: BlockId,
    next_value: u32,
}

impl Function {
    /// Create a function with a single empty `entry` block returning void
    pub fn new(name: impl Into<String>) -> Self {
        let entry = BlockId(0);
        Self {
            name: name.into(),
            params: Vec::new(),
            blocks: vec![BasicBlock::new("entry", Terminator::Ret(None))],
            layout: vec![entry],
            entry,
            next_value: 0,
        }
    }

    /// Allocate a fresh value handle
    pub fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// Declare a function parameter and return its value handle
    pub fn add_param(&mut self, ty: Ty) -> ValueId {
        let id = self.fresh_value();
        self.params.push((id, ty));
        id
    }

    /// Entry block handle
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Number of blocks in the function
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block handles in layout (textual) order
    pub fn layout(&self) -> &[BlockId] {
        &self.layout
    }

    /// Shared access to a block
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    /// Mutable access to a block
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    /// Append a new block at the end of the layout
    pub fn append_block(&mut self, label: impl Into<String>, terminator: Terminator) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(label, terminator));
        self.layout.push(id);
        id
    }

    /// Insert a new block into the layout immediately before `before`
    pub fn insert_block_before(
        &mut self,
        before: BlockId,
        label: impl Into<String>,
        terminator: Terminator,
    ) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(label, terminator));
        let pos = self
            .layout
            .iter()
            .position(|b| *b == before)
            .unwrap_or(self.layout.len());
        self.layout.insert(pos, id);
        id
    }

    /// Split `block` at instruction index `at`, preserving CFG consistency.
    ///
    /// Everything from `at` onward, including the terminator and therefore
    /// every existing successor edge, moves into a fresh tail block placed
    /// right after the head in the layout. The head is left terminated by an
    /// unconditional branch to the tail.
    pub fn split_block(&mut self, block: BlockId, at: usize, tail_label: impl Into<String>) -> BlockId {
        let tail = BlockId(self.blocks.len() as u32);
        let head = &mut self.blocks[block.0 as usize];
        let moved = head.instructions.split_off(at);
        let terminator = std::mem::replace(&mut head.terminator, Terminator::Br(tail));
        self.blocks.push(BasicBlock {
            label: tail_label.into(),
            instructions: moved,
            terminator,
        });
        let pos = self
            .layout
            .iter()
            .position(|b| *b == block)
            .map_or(self.layout.len(), |p| p + 1);
        self.layout.insert(pos, tail);
        tail
    }
}

/// Global variable initializer
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalInit {
    /// Raw bytes (string literals are NUL-terminated here)
    Bytes(Vec<u8>),
    /// Integer scalar
    Int {
        /// Value type
        ty: Ty,
        /// Initial value
        value: i64,
    },
    /// Zero-filled region of the given byte size
    Zero {
        /// Region size in bytes
        size: usize,
    },
}

impl GlobalInit {
    /// Byte size of the initialized region
    pub fn size(&self) -> usize {
        match self {
            GlobalInit::Bytes(bytes) => bytes.len(),
            GlobalInit::Int { ty, .. } => ty.size_bytes(),
            GlobalInit::Zero { size } => *size,
        }
    }
}

/// Module-level global variable
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVar {
    /// Global name (unique within the module)
    pub name: String,
    /// Initializer
    pub init: GlobalInit,
}

/// Attributes asserted on a declared parameter
///
/// These are contracts the caller asserts to the optimizer, not checked
/// invariants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamAttrs {
    /// Callee only reads through this pointer
    pub readonly: bool,
    /// Callee does not retain this pointer
    pub nocapture: bool,
}

/// External function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// Symbol name
    pub name: String,
    /// Return type
    pub ret: Ty,
    /// Fixed parameter types
    pub params: Vec<Ty>,
    /// Accepts additional variadic arguments
    pub variadic: bool,
    /// Declared never to unwind
    pub nounwind: bool,
    /// Per-parameter attributes, parallel to `params`
    pub param_attrs: Vec<ParamAttrs>,
}

/// Unit of code: globals, external declarations, function definitions
///
/// Named lookups are get-or-create: the name-to-index tables guarantee a
/// declaration or global is created at most once per module no matter how
/// many times a pass asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module name
    pub name: String,
    globals: Vec<GlobalVar>,
    declarations: Vec<FuncDecl>,
    functions: Vec<Function>,
    global_index: HashMap<String, usize>,
    declaration_index: HashMap<String, usize>,
    interned: HashMap<Vec<u8>, String>,
    next_str: u32,
}

impl Module {
    /// Create a new empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            globals: Vec::new(),
            declarations: Vec::new(),
            functions: Vec::new(),
            global_index: HashMap::new(),
            declaration_index: HashMap::new(),
            interned: HashMap::new(),
            next_str: 0,
        }
    }

    /// Add a function definition
    pub fn add_function(&mut self, func: Function) {
        self.functions.push(func);
    }

    /// Function definitions in insertion order
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Mutable function definitions
    pub fn functions_mut(&mut self) -> &mut [Function] {
        &mut self.functions
    }

    /// Look up a function definition by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Globals in insertion order
    pub fn globals(&self) -> &[GlobalVar] {
        &self.globals
    }

    /// External declarations in insertion order
    pub fn declarations(&self) -> &[FuncDecl] {
        &self.declarations
    }

    /// Look up a global by name
    pub fn global(&self, name: &str) -> Option<&GlobalVar> {
        self.global_index.get(name).map(|&i| &self.globals[i])
    }

    /// Look up a declaration by name
    pub fn declaration(&self, name: &str) -> Option<&FuncDecl> {
        self.declaration_index
            .get(name)
            .map(|&i| &self.declarations[i])
    }

    /// Get the named global, creating it with `init` if absent
    pub fn get_or_insert_global(&mut self, name: &str, init: GlobalInit) -> &GlobalVar {
        if let Some(&i) = self.global_index.get(name) {
            return &self.globals[i];
        }
        let i = self.globals.len();
        self.global_index.insert(name.to_string(), i);
        self.globals.push(GlobalVar {
            name: name.to_string(),
            init,
        });
        &self.globals[i]
    }

    /// Get the named declaration, creating it from `decl` if absent.
    ///
    /// Returns a mutable handle so callers can assert attributes on an
    /// existing declaration. A pre-existing declaration with an incompatible
    /// signature is a contract violation of the caller, not detected here.
    pub fn get_or_insert_declaration(&mut self, decl: FuncDecl) -> &mut FuncDecl {
        if let Some(&i) = self.declaration_index.get(&decl.name) {
            return &mut self.declarations[i];
        }
        let i = self.declarations.len();
        self.declaration_index.insert(decl.name.clone(), i);
        self.declarations.push(decl);
        &mut self.declarations[i]
    }

    /// Materialize a NUL-terminated string literal as an addressable global,
    /// reusing an existing global with identical contents
    pub fn intern_string(&mut self, text: &str) -> String {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        if let Some(name) = self.interned.get(&bytes) {
            return name.clone();
        }
        // Skip counter values already taken by user-defined globals.
        let name = loop {
            let candidate = format!(".str.{}", self.next_str);
            self.next_str += 1;
            if !self.global_index.contains_key(&candidate) {
                break candidate;
            }
        };
        self.interned.insert(bytes.clone(), name.clone());
        let i = self.globals.len();
        self.global_index.insert(name.clone(), i);
        self.globals.push(GlobalVar {
            name: name.clone(),
            init: GlobalInit::Bytes(bytes),
        });
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Operand;

    fn two_instr_block() -> Function {
        let mut func = Function::new("f");
        let entry = func.entry();
        let v0 = func.fresh_value();
        func.block_mut(entry).instructions.push(Instruction::Alloca {
            dst: v0,
            ty: Ty::I64,
        });
        func.block_mut(entry).instructions.push(Instruction::Store {
            ty: Ty::I64,
            value: Operand::const_i64(7),
            addr: Operand::value(v0),
        });
        func
    }

    #[test]
    fn test_split_block_moves_suffix_and_terminator() {
        let mut func = two_instr_block();
        let entry = func.entry();
        func.block_mut(entry).terminator = Terminator::Ret(Some(Operand::const_i64(0)));

        let tail = func.split_block(entry, 1, "entry.cont");

        assert_eq!(func.block(entry).instructions.len(), 1);
        assert_eq!(func.block(tail).instructions.len(), 1);
        assert_eq!(func.block(entry).terminator, Terminator::Br(tail));
        assert_eq!(
            func.block(tail).terminator,
            Terminator::Ret(Some(Operand::const_i64(0)))
        );
        // Tail sits right after the head in layout order
        assert_eq!(func.layout(), &[entry, tail]);
    }

    #[test]
    fn test_split_block_at_end_leaves_empty_tail() {
        let mut func = two_instr_block();
        let entry = func.entry();
        let tail = func.split_block(entry, 2, "entry.cont");
        assert_eq!(func.block(entry).instructions.len(), 2);
        assert!(func.block(tail).instructions.is_empty());
        assert_eq!(func.block(tail).terminator, Terminator::Ret(None));
    }

    #[test]
    fn test_insert_block_before_ordering() {
        let mut func = Function::new("f");
        let entry = func.entry();
        let exit = func.append_block("exit", Terminator::Ret(None));
        let mid = func.insert_block_before(exit, "mid", Terminator::Br(exit));
        assert_eq!(func.layout(), &[entry, mid, exit]);
        // Handles stay stable across insertion
        assert_eq!(func.block(exit).label, "exit");
    }

    #[test]
    fn test_get_or_insert_global_is_idempotent() {
        let mut module = Module::new("m");
        module.get_or_insert_global("fmt", GlobalInit::Bytes(vec![37, 0]));
        module.get_or_insert_global("fmt", GlobalInit::Bytes(vec![1, 2, 3]));
        assert_eq!(module.globals().len(), 1);
        assert_eq!(
            module.global("fmt").map(|g| &g.init),
            Some(&GlobalInit::Bytes(vec![37, 0]))
        );
    }

    #[test]
    fn test_get_or_insert_declaration_is_idempotent() {
        let mut module = Module::new("m");
        let decl = FuncDecl {
            name: "printf".to_string(),
            ret: Ty::I32,
            params: vec![Ty::Ptr],
            variadic: true,
            nounwind: false,
            param_attrs: vec![ParamAttrs::default()],
        };
        module.get_or_insert_declaration(decl.clone()).nounwind = true;
        module.get_or_insert_declaration(decl);
        assert_eq!(module.declarations().len(), 1);
        // Attributes asserted on the first lookup survive the second
        assert!(module.declarations()[0].nounwind);
    }

    #[test]
    fn test_intern_string_dedupes_by_content() {
        let mut module = Module::new("m");
        let a = module.intern_string("Even");
        let b = module.intern_string("Even");
        let c = module.intern_string("Odd");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(module.globals().len(), 2);
        assert_eq!(
            module.global(&a).map(|g| &g.init),
            Some(&GlobalInit::Bytes(b"Even\0".to_vec()))
        );
    }

    #[test]
    fn test_intern_string_avoids_user_global_names() {
        let mut module = Module::new("m");
        module.get_or_insert_global(".str.0", GlobalInit::Int { ty: Ty::I64, value: 1 });
        let name = module.intern_string("Even");

        assert_ne!(name, ".str.0");
        assert_eq!(module.globals().len(), 2);
        // The user's global is untouched and names stay unique.
        assert_eq!(
            module.global(".str.0").map(|g| &g.init),
            Some(&GlobalInit::Int { ty: Ty::I64, value: 1 })
        );
        assert_eq!(
            module.global(&name).map(|g| &g.init),
            Some(&GlobalInit::Bytes(b"Even\0".to_vec()))
        );
    }
}
