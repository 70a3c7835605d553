//! # Module Interpreter
//!
//! Deterministic in-memory executor used to observe the runtime behavior of
//! instrumented modules. Globals are laid out at fixed addresses, an entry
//! function is run to completion, and calls to the diagnostic entry point
//! (`printf`) are intercepted: the format template is read back out of
//! module memory, rendered against the call arguments, and captured so tests
//! can assert on the emitted diagnostic lines.
//!
//! The machine is intentionally small: flat byte-addressed memory, one
//! register file per call frame, and a step budget guarding against runaway
//! control flow.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ir::{GlobalInit, Instruction, Module, Operand, Terminator, ValueId};

/// Base address of the global region
const GLOBAL_BASE: u64 = 0x1000;

/// Base address of the stack (alloca) region
const STACK_BASE: u64 = 0x10_0000;

/// Default execution step budget
const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// In-memory executor for one module
pub struct Machine<'m> {
    module: &'m Module,
    memory: HashMap<u64, u8>,
    global_addrs: HashMap<String, u64>,
    stack_top: u64,
    stdout: String,
    steps: usize,
    step_limit: usize,
}

impl<'m> Machine<'m> {
    /// Create a machine and lay out the module's globals
    pub fn new(module: &'m Module) -> Self {
        let mut machine = Self {
            module,
            memory: HashMap::new(),
            global_addrs: HashMap::new(),
            stack_top: STACK_BASE,
            stdout: String::new(),
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        };
        machine.layout_globals();
        machine
    }

    /// Override the execution step budget
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Address assigned to a named global, if it exists
    pub fn global_address(&self, name: &str) -> Option<u64> {
        self.global_addrs.get(name).copied()
    }

    /// Everything written through the diagnostic entry point so far
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured output split into lines
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }

    /// Run the named entry function with no arguments
    pub fn run(&mut self, entry: &str) -> Result<Option<i64>> {
        tracing::debug!(module = %self.module.name, entry, "executing");
        self.call_function(entry, &[])
    }

    fn layout_globals(&mut self) {
        let mut cursor = GLOBAL_BASE;
        for global in self.module.globals() {
            // 8-byte alignment, so every global starts on an even address;
            // odd addresses are reached through explicit displacements.
            cursor = (cursor + 7) & !7;
            self.global_addrs.insert(global.name.clone(), cursor);
            match &global.init {
                GlobalInit::Bytes(bytes) => {
                    for (i, &b) in bytes.iter().enumerate() {
                        self.memory.insert(cursor + i as u64, b);
                    }
                }
                GlobalInit::Int { ty, value } => {
                    let width = ty.size_bytes();
                    for (i, b) in value.to_le_bytes().iter().take(width).enumerate() {
                        self.memory.insert(cursor + i as u64, *b);
                    }
                }
                GlobalInit::Zero { size } => {
                    for i in 0..*size {
                        self.memory.insert(cursor + i as u64, 0);
                    }
                }
            }
            cursor += global.init.size().max(1) as u64;
        }
    }

    fn call_function(&mut self, name: &str, args: &[i64]) -> Result<Option<i64>> {
        let module = self.module;
        let func = module.function(name).ok_or_else(|| Error::UnknownFunction {
            name: name.to_string(),
        })?;
        if args.len() != func.params.len() {
            return Err(Error::runtime(format!(
                "call to {} with {} arguments, expected {}",
                name,
                args.len(),
                func.params.len()
            )));
        }

        let mut regs: HashMap<ValueId, i64> = HashMap::new();
        for ((id, _ty), &arg) in func.params.iter().zip(args) {
            regs.insert(*id, arg);
        }

        let mut block = func.entry();
        loop {
            for instr in &func.block(block).instructions {
                self.tick()?;
                self.exec_instruction(&mut regs, instr)?;
            }
            self.tick()?;
            match &func.block(block).terminator {
                Terminator::Br(dest) => block = *dest,
                Terminator::CondBr {
                    cond,
                    then_dest,
                    else_dest,
                } => {
                    block = if self.eval(&regs, cond)? != 0 {
                        *then_dest
                    } else {
                        *else_dest
                    };
                }
                Terminator::Ret(value) => {
                    return match value {
                        Some(op) => Ok(Some(self.eval(&regs, op)?)),
                        None => Ok(None),
                    };
                }
            }
        }
    }

    fn exec_instruction(
        &mut self,
        regs: &mut HashMap<ValueId, i64>,
        instr: &Instruction,
    ) -> Result<()> {
        match instr {
            Instruction::Load { dst, ty, addr } => {
                let addr = self.eval(regs, addr)? as u64;
                let value = self.read_mem(addr, ty.size_bytes())?;
                regs.insert(*dst, value);
            }
            Instruction::Store { ty, value, addr } => {
                let value = self.eval(regs, value)?;
                let addr = self.eval(regs, addr)? as u64;
                self.write_mem(addr, ty.size_bytes(), value);
            }
            Instruction::Alloca { dst, ty } => {
                self.stack_top = (self.stack_top + 7) & !7;
                let slot = self.stack_top;
                for i in 0..ty.size_bytes().max(1) as u64 {
                    self.memory.insert(slot + i, 0);
                }
                self.stack_top += ty.size_bytes().max(1) as u64;
                regs.insert(*dst, slot as i64);
            }
            Instruction::PtrOffset { dst, base, offset } => {
                let base = self.eval(regs, base)?;
                regs.insert(*dst, base.wrapping_add(*offset));
            }
            Instruction::PtrToInt { dst, addr } => {
                let addr = self.eval(regs, addr)?;
                regs.insert(*dst, addr);
            }
            Instruction::And { dst, lhs, rhs } => {
                let value = self.eval(regs, lhs)? & self.eval(regs, rhs)?;
                regs.insert(*dst, value);
            }
            Instruction::ICmpEq { dst, lhs, rhs } => {
                let equal = self.eval(regs, lhs)? == self.eval(regs, rhs)?;
                regs.insert(*dst, i64::from(equal));
            }
            Instruction::Call { dst, callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(regs, arg)?);
                }
                let result = if callee == "printf" {
                    Some(self.do_printf(&values)?)
                } else if self.module.function(callee).is_some() {
                    self.call_function(callee, &values)?
                } else {
                    return Err(Error::UndefinedCallee {
                        name: callee.clone(),
                    });
                };
                if let Some(dst) = dst {
                    match result {
                        Some(value) => {
                            regs.insert(*dst, value);
                        }
                        None => {
                            return Err(Error::runtime(format!(
                                "void result of {callee} used as a value"
                            )))
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, regs: &HashMap<ValueId, i64>, op: &Operand) -> Result<i64> {
        match op {
            Operand::Value(id) => regs
                .get(id)
                .copied()
                .ok_or(Error::UnassignedValue(id.0)),
            Operand::ConstInt { value, .. } => Ok(*value),
            Operand::Global(name) => self
                .global_addrs
                .get(name)
                .map(|&addr| addr as i64)
                .ok_or_else(|| Error::runtime(format!("unknown global @{name}"))),
        }
    }

    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(Error::StepLimitExceeded {
                limit: self.step_limit,
            });
        }
        Ok(())
    }

    fn read_mem(&self, addr: u64, width: usize) -> Result<i64> {
        let mut bytes = [0u8; 8];
        for (i, slot) in bytes.iter_mut().enumerate().take(width) {
            *slot = *self
                .memory
                .get(&(addr + i as u64))
                .ok_or(Error::MemoryFault { address: addr, width })?;
        }
        Ok(i64::from_le_bytes(bytes))
    }

    fn write_mem(&mut self, addr: u64, width: usize, value: i64) {
        for (i, b) in value.to_le_bytes().iter().take(width).enumerate() {
            self.memory.insert(addr + i as u64, *b);
        }
    }

    fn read_cstring(&self, addr: u64) -> Result<String> {
        let mut bytes = Vec::new();
        let mut cursor = addr;
        loop {
            let b = *self
                .memory
                .get(&cursor)
                .ok_or(Error::MemoryFault { address: cursor, width: 1 })?;
            if b == 0 {
                break;
            }
            bytes.push(b);
            cursor += 1;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Render the template against the remaining arguments and capture the
    /// result. Supports the specifiers the diagnostic contract uses
    /// (`%s`, `%p`, `%d`/`%ld`/`%u`/`%lu`, `%%`).
    fn do_printf(&mut self, args: &[i64]) -> Result<i64> {
        let template_addr = *args.first().ok_or_else(|| {
            Error::runtime("printf called without a format argument")
        })? as u64;
        let template = self.read_cstring(template_addr)?;

        let mut rendered = String::new();
        let mut next_arg = 1;
        let mut take = || -> Result<i64> {
            let value = args.get(next_arg).copied().ok_or_else(|| {
                Error::runtime("printf format consumed more arguments than supplied")
            })?;
            next_arg += 1;
            Ok(value)
        };

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                rendered.push(c);
                continue;
            }
            let mut conv = chars.next().ok_or_else(|| {
                Error::runtime("printf format ends with a bare %")
            })?;
            if conv == 'l' {
                conv = chars.next().ok_or_else(|| {
                    Error::runtime("printf format ends with a bare %l")
                })?;
            }
            match conv {
                '%' => rendered.push('%'),
                's' => {
                    let addr = take()? as u64;
                    rendered.push_str(&self.read_cstring(addr)?);
                }
                'p' => {
                    let addr = take()? as u64;
                    rendered.push_str(&format!("0x{addr:x}"));
                }
                'd' => rendered.push_str(&take()?.to_string()),
                'u' => rendered.push_str(&(take()? as u64).to_string()),
                other => {
                    return Err(Error::runtime(format!(
                        "unsupported printf specifier %{other}"
                    )))
                }
            }
        }

        let written = rendered.len() as i64;
        self.stdout.push_str(&rendered);
        Ok(written)
    }
}
