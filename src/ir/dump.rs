//! Textual IR listing for debugging and test diagnostics

use std::fmt::Write;

use super::instruction::{Instruction, Operand, Terminator};
use super::module::{Function, FuncDecl, GlobalInit, Module};

/// Render a whole module as a human-readable listing
pub fn dump_module(module: &Module) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; module {}", module.name);

    for global in module.globals() {
        let _ = writeln!(out, "@{} = {}", global.name, fmt_init(&global.init));
    }
    for decl in module.declarations() {
        let _ = writeln!(out, "{}", fmt_decl(decl));
    }
    for func in module.functions() {
        let _ = writeln!(out);
        out.push_str(&dump_function(func));
    }
    out
}

/// Render one function, blocks in layout order
pub fn dump_function(func: &Function) -> String {
    let mut out = String::new();
    let params = func
        .params
        .iter()
        .map(|(id, ty)| format!("{} %{}", ty.name(), id.0))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "define @{}({}) {{", func.name, params);

    for &id in func.layout() {
        let block = func.block(id);
        let _ = writeln!(out, "{}:", block.label);
        for instr in &block.instructions {
            let _ = writeln!(out, "  {}", fmt_instruction(instr));
        }
        let _ = writeln!(out, "  {}", fmt_terminator(func, &block.terminator));
    }
    out.push_str("}\n");
    out
}

fn fmt_init(init: &GlobalInit) -> String {
    match init {
        GlobalInit::Bytes(bytes) => {
            let mut text = String::new();
            for &b in bytes {
                match b {
                    0 => text.push_str("\\00"),
                    b'\n' => text.push_str("\\n"),
                    b'"' => text.push_str("\\\""),
                    0x20..=0x7e => text.push(b as char),
                    other => {
                        let _ = write!(text, "\\{other:02x}");
                    }
                }
            }
            format!("[{} x i8] c\"{}\"", bytes.len(), text)
        }
        GlobalInit::Int { ty, value } => format!("{} {}", ty.name(), value),
        GlobalInit::Zero { size } => format!("zeroinitializer [{size} x i8]"),
    }
}

fn fmt_decl(decl: &FuncDecl) -> String {
    let mut params = Vec::new();
    for (i, ty) in decl.params.iter().enumerate() {
        let mut p = ty.name().to_string();
        if let Some(attrs) = decl.param_attrs.get(i) {
            if attrs.nocapture {
                p.push_str(" nocapture");
            }
            if attrs.readonly {
                p.push_str(" readonly");
            }
        }
        params.push(p);
    }
    if decl.variadic {
        params.push("...".to_string());
    }
    let mut line = format!(
        "declare {} @{}({})",
        decl.ret.name(),
        decl.name,
        params.join(", ")
    );
    if decl.nounwind {
        line.push_str(" nounwind");
    }
    line
}

fn fmt_operand(op: &Operand) -> String {
    match op {
        Operand::Value(id) => format!("%{}", id.0),
        Operand::ConstInt { ty, value } => format!("{} {}", ty.name(), value),
        Operand::Global(name) => format!("@{name}"),
    }
}

fn fmt_instruction(instr: &Instruction) -> String {
    match instr {
        Instruction::Load { dst, ty, addr } => {
            format!("%{} = load {}, {}", dst.0, ty.name(), fmt_operand(addr))
        }
        Instruction::Store { value, addr, .. } => {
            format!("store {}, {}", fmt_operand(value), fmt_operand(addr))
        }
        Instruction::Alloca { dst, ty } => format!("%{} = alloca {}", dst.0, ty.name()),
        Instruction::PtrOffset { dst, base, offset } => {
            format!("%{} = ptroffset {}, {}", dst.0, fmt_operand(base), offset)
        }
        Instruction::PtrToInt { dst, addr } => {
            format!("%{} = ptrtoint {} to i64", dst.0, fmt_operand(addr))
        }
        Instruction::And { dst, lhs, rhs } => {
            format!("%{} = and {}, {}", dst.0, fmt_operand(lhs), fmt_operand(rhs))
        }
        Instruction::ICmpEq { dst, lhs, rhs } => {
            format!(
                "%{} = icmp eq {}, {}",
                dst.0,
                fmt_operand(lhs),
                fmt_operand(rhs)
            )
        }
        Instruction::Call { dst, callee, args } => {
            let args = args.iter().map(fmt_operand).collect::<Vec<_>>().join(", ");
            match dst {
                Some(dst) => format!("%{} = call @{}({})", dst.0, callee, args),
                None => format!("call @{callee}({args})"),
            }
        }
    }
}

fn fmt_terminator(func: &Function, term: &Terminator) -> String {
    match term {
        Terminator::Br(dest) => format!("br label %{}", func.block(*dest).label),
        Terminator::CondBr {
            cond,
            then_dest,
            else_dest,
        } => format!(
            "br {}, label %{}, label %{}",
            fmt_operand(cond),
            func.block(*then_dest).label,
            func.block(*else_dest).label
        ),
        Terminator::Ret(Some(value)) => format!("ret {}", fmt_operand(value)),
        Terminator::Ret(None) => "ret void".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncDecl, FunctionBuilder, GlobalInit, Operand, ParamAttrs, Ty};

    #[test]
    fn test_dump_lists_globals_and_declarations() {
        let mut module = Module::new("m");
        module.get_or_insert_global("fmt", GlobalInit::Bytes(b"hi\n\0".to_vec()));
        module.get_or_insert_declaration(FuncDecl {
            name: "printf".to_string(),
            ret: Ty::I32,
            params: vec![Ty::Ptr],
            variadic: true,
            nounwind: true,
            param_attrs: vec![ParamAttrs {
                readonly: true,
                nocapture: true,
            }],
        });

        let text = dump_module(&module);
        assert!(text.contains("; module m"));
        assert!(text.contains("@fmt = [4 x i8] c\"hi\\n\\00\""));
        assert!(text.contains("declare i32 @printf(ptr nocapture readonly, ...) nounwind"));
    }

    #[test]
    fn test_dump_function_shows_blocks_in_layout_order() {
        let mut b = FunctionBuilder::new("main");
        let exit = b.block("exit");
        b.store(Ty::I32, Operand::const_i32(1), Operand::global("g"));
        b.br(exit);
        b.switch_to(exit);
        b.ret(None);

        let text = dump_function(&b.build());
        let entry_pos = text.find("entry:").expect("entry label");
        let exit_pos = text.find("exit:").expect("exit label");
        assert!(entry_pos < exit_pos);
        assert!(text.contains("store i32 1, @g"));
        assert!(text.contains("br label %exit"));
    }
}
