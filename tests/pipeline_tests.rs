//! Pass registry and pipeline assembly tests.

use parity_probe::ir::{FunctionBuilder, GlobalInit, Module, Operand, Ty};
use parity_probe::{Error, Machine, PassManager, PassOutcome, PassRegistry};

fn store_module() -> Module {
    let mut module = Module::new("m");
    module.get_or_insert_global("g", GlobalInit::Int { ty: Ty::I64, value: 0 });
    let mut b = FunctionBuilder::new("main");
    b.store(Ty::I64, Operand::const_i64(1), Operand::global("g"));
    b.ret(None);
    module.add_function(b.build());
    module
}

#[test]
fn test_default_registry_knows_parity_trace() {
    let registry = PassRegistry::with_default_passes();
    let pass = registry.create("parity-trace").expect("registered pass");
    assert_eq!(pass.name(), "parity-trace");
}

#[test]
fn test_unknown_pass_name_is_rejected() {
    let registry = PassRegistry::with_default_passes();
    match PassManager::parse("parity-trace,bogus", &registry) {
        Ok(_) => panic!("expected UnknownPass, pipeline parsed"),
        Err(Error::UnknownPass { name }) => assert_eq!(name, "bogus"),
        Err(other) => panic!("expected UnknownPass, got {other:?}"),
    }
}

#[test]
fn test_pipeline_runs_and_reports_invalidation() {
    let registry = PassRegistry::with_default_passes();
    let manager = PassManager::parse(" parity-trace ", &registry).expect("pipeline");
    assert_eq!(manager.len(), 1);

    let mut module = store_module();
    assert_eq!(manager.run(&mut module), PassOutcome::Changed);

    // The instrumented module executes and emits its diagnostic.
    let mut machine = Machine::new(&module);
    machine.run("main").expect("run");
    assert_eq!(machine.lines().len(), 1);
}

#[test]
fn test_pipeline_reports_unchanged_for_access_free_module() {
    let registry = PassRegistry::with_default_passes();
    let manager = PassManager::parse("parity-trace", &registry).expect("pipeline");

    let mut module = Module::new("m");
    let mut b = FunctionBuilder::new("main");
    b.ret(None);
    module.add_function(b.build());

    let before = module.clone();
    assert_eq!(manager.run(&mut module), PassOutcome::Unchanged);
    assert_eq!(module, before);
}
