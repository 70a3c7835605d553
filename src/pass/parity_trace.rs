//! # Address-Parity Instrumentation
//!
//! The module rewriting engine. For every memory access (load or store) in a
//! module it injects a runtime diagnostic conditioned on the parity of the
//! accessed address: the access's block is split right after a synthesized
//! parity comparison, two arm blocks are inserted, and each arm calls the
//! external diagnostic entry point with the enclosing function name, the
//! opcode label, the address, and an `"Even"`/`"Odd"` label before rejoining
//! the original control flow.
//!
//! The engine asserts no preconditions of its own: malformed modules or a
//! conflicting pre-existing declaration under the diagnostic symbol name are
//! contract violations of the caller, left to a separate verification layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ir::{
    FuncDecl, GlobalInit, Instruction, Module, Operand, ParamAttrs, Terminator, Ty,
};
use crate::pass::{ModulePass, PassOutcome};

/// Pipeline name of the pass
pub const PASS_NAME: &str = "parity-trace";

/// Symbol name of the external diagnostic entry point
pub const PRINTF_SYMBOL: &str = "printf";

/// Name of the module global holding the format template
pub const FORMAT_GLOBAL: &str = "parity.fmt";

/// The 5-field diagnostic template: function name, opcode label, address,
/// literal "it is", parity label
pub const FORMAT_TEMPLATE: &str = "In function %s, %s in address %p, it is %s\n";

/// One qualifying instruction, captured before any mutation
struct ProbeSite {
    func: usize,
    block: crate::ir::BlockId,
    index: usize,
    opcode: &'static str,
    addr: Operand,
}

/// Per-function site counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSites {
    /// Function name
    pub function: String,
    /// Number of instrumented loads
    pub loads: usize,
    /// Number of instrumented stores
    pub stores: usize,
}

/// Summary of one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationStats {
    /// Total qualifying instructions rewritten
    pub sites: usize,
    /// Number of functions containing at least one site
    pub functions_touched: usize,
    /// Breakdown per function, in module order
    pub per_function: Vec<FunctionSites>,
}

impl InstrumentationStats {
    /// Whether the run mutated the module
    pub fn changed(&self) -> bool {
        self.sites > 0
    }
}

/// Instrument every memory access in `module` with an address-parity
/// diagnostic. Returns whether anything changed, i.e. whether at least one
/// qualifying instruction was found; a module without memory accesses is
/// left untouched.
pub fn instrument(module: &mut Module) -> bool {
    instrument_with_stats(module).changed()
}

/// Like [`instrument`], returning per-function site counts
pub fn instrument_with_stats(module: &mut Module) -> InstrumentationStats {
    // Phase one: capture every qualifying instruction in program order,
    // before any block is mutated.
    let sites = collect_sites(module);
    if sites.is_empty() {
        tracing::debug!(module = %module.name, "no memory accesses, module left unchanged");
        return InstrumentationStats::default();
    }

    let stats = summarize(module, &sites);
    tracing::debug!(
        module = %module.name,
        sites = stats.sites,
        functions = stats.functions_touched,
        "instrumenting memory accesses"
    );

    ensure_diagnostic_entry(module);
    ensure_format_template(module);

    // Intern every string the rewrites will reference up front, so the
    // per-site loop can hold the function mutably.
    let even_label = module.intern_string("Even");
    let odd_label = module.intern_string("Odd");
    let mut opcode_globals: HashMap<&'static str, String> = HashMap::new();
    let mut name_globals: HashMap<usize, String> = HashMap::new();
    for site in &sites {
        if !opcode_globals.contains_key(site.opcode) {
            let interned = module.intern_string(site.opcode);
            opcode_globals.insert(site.opcode, interned);
        }
        if !name_globals.contains_key(&site.func) {
            let fn_name = module.functions()[site.func].name.clone();
            let interned = module.intern_string(&fn_name);
            name_globals.insert(site.func, interned);
        }
    }

    // Phase two: rewrite in reverse program order, so splits at later
    // positions never shift the indices of sites still to be processed.
    for (k, site) in sites.iter().enumerate().rev() {
        let fn_name_global = &name_globals[&site.func];
        let opcode_global = &opcode_globals[site.opcode];
        rewrite_site(
            module,
            site,
            k,
            fn_name_global,
            opcode_global,
            &even_label,
            &odd_label,
        );
    }

    stats
}

fn collect_sites(module: &Module) -> Vec<ProbeSite> {
    let mut sites = Vec::new();
    for (fi, func) in module.functions().iter().enumerate() {
        for &block in func.layout() {
            for (index, instr) in func.block(block).instructions.iter().enumerate() {
                if let Some(addr) = instr.access_addr() {
                    sites.push(ProbeSite {
                        func: fi,
                        block,
                        index,
                        opcode: instr.opcode_name(),
                        addr: addr.clone(),
                    });
                }
            }
        }
    }
    sites
}

fn summarize(module: &Module, sites: &[ProbeSite]) -> InstrumentationStats {
    let mut per_function: Vec<FunctionSites> = Vec::new();
    let mut by_func: HashMap<usize, usize> = HashMap::new();
    for site in sites {
        let slot = match by_func.get(&site.func) {
            Some(&i) => i,
            None => {
                let i = per_function.len();
                by_func.insert(site.func, i);
                per_function.push(FunctionSites {
                    function: module.functions()[site.func].name.clone(),
                    ..FunctionSites::default()
                });
                i
            }
        };
        match site.opcode {
            "load" => per_function[slot].loads += 1,
            _ => per_function[slot].stores += 1,
        }
    }
    InstrumentationStats {
        sites: sites.len(),
        functions_touched: per_function.len(),
        per_function,
    }
}

/// Declare (or reuse) the variadic diagnostic entry point and assert its
/// calling attributes, as a library-call inference would
fn ensure_diagnostic_entry(module: &mut Module) {
    let decl = module.get_or_insert_declaration(FuncDecl {
        name: PRINTF_SYMBOL.to_string(),
        ret: Ty::I32,
        params: vec![Ty::Ptr],
        variadic: true,
        nounwind: false,
        param_attrs: vec![ParamAttrs::default()],
    });
    decl.nounwind = true;
    if decl.param_attrs.is_empty() {
        decl.param_attrs.push(ParamAttrs::default());
    }
    decl.param_attrs[0].readonly = true;
    decl.param_attrs[0].nocapture = true;
}

/// Create (or reuse) the single format-template global
fn ensure_format_template(module: &mut Module) {
    let mut bytes = FORMAT_TEMPLATE.as_bytes().to_vec();
    bytes.push(0);
    module.get_or_insert_global(FORMAT_GLOBAL, GlobalInit::Bytes(bytes));
}

#[allow(clippy::too_many_arguments)]
fn rewrite_site(
    module: &mut Module,
    site: &ProbeSite,
    seq: usize,
    fn_name_global: &str,
    opcode_global: &str,
    even_label: &str,
    odd_label: &str,
) {
    let func = &mut module.functions_mut()[site.func];

    // Parity probe, inserted immediately after the access (never before, so
    // the captured site positions stay valid).
    let addr_int = func.fresh_value();
    let low_bit = func.fresh_value();
    let is_even = func.fresh_value();
    {
        let block = func.block_mut(site.block);
        block.instructions.insert(
            site.index + 1,
            Instruction::PtrToInt {
                dst: addr_int,
                addr: site.addr.clone(),
            },
        );
        block.instructions.insert(
            site.index + 2,
            Instruction::And {
                dst: low_bit,
                lhs: Operand::value(addr_int),
                rhs: Operand::const_i64(1),
            },
        );
        block.instructions.insert(
            site.index + 3,
            Instruction::ICmpEq {
                dst: is_even,
                lhs: Operand::value(low_bit),
                rhs: Operand::const_i64(0),
            },
        );
    }

    // Split right after the comparison; the tail keeps the original
    // terminator and successors.
    let head_label = func.block(site.block).label.clone();
    let tail = func.split_block(site.block, site.index + 4, format!("{head_label}.cont.{seq}"));
    let even_arm = func.insert_block_before(
        tail,
        format!("{head_label}.even.{seq}"),
        Terminator::Br(tail),
    );
    let odd_arm = func.insert_block_before(
        tail,
        format!("{head_label}.odd.{seq}"),
        Terminator::Br(tail),
    );

    // is_even == true routes to the even arm; the single, fixed tie-break.
    func.block_mut(site.block).terminator = Terminator::CondBr {
        cond: Operand::value(is_even),
        then_dest: even_arm,
        else_dest: odd_arm,
    };

    for (arm, parity_global) in [(even_arm, even_label), (odd_arm, odd_label)] {
        func.block_mut(arm).instructions.push(Instruction::Call {
            dst: None,
            callee: PRINTF_SYMBOL.to_string(),
            args: vec![
                Operand::global(FORMAT_GLOBAL),
                Operand::global(fn_name_global),
                Operand::global(opcode_global),
                Operand::value(addr_int),
                Operand::global(parity_global),
            ],
        });
    }
}

/// Pipeline-registrable wrapper around [`instrument`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ParityTracePass;

impl ModulePass for ParityTracePass {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn run(&self, module: &mut Module) -> PassOutcome {
        if instrument(module) {
            PassOutcome::Changed
        } else {
            PassOutcome::Unchanged
        }
    }
}
