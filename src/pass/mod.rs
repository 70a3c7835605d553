//! # Pass Framework
//!
//! Named module transforms and pipeline assembly. A pass is exposed to
//! embedders as a fixed identifier string that a pipeline description can
//! reference; running it reports whether the module's analyses should be
//! considered invalidated ([`PassOutcome::Changed`]) or may be reused
//! ([`PassOutcome::Unchanged`]).

pub mod parity_trace;

pub use parity_trace::{
    instrument, instrument_with_stats, FunctionSites, InstrumentationStats, ParityTracePass,
    FORMAT_GLOBAL, FORMAT_TEMPLATE, PASS_NAME, PRINTF_SYMBOL,
};

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ir::Module;

/// Analyses-invalidation signal returned by a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The module was mutated; dependent analyses must be recomputed
    Changed,
    /// The module is untouched; analyses may be reused
    Unchanged,
}

impl PassOutcome {
    /// Whether the module was mutated
    pub fn changed(self) -> bool {
        matches!(self, PassOutcome::Changed)
    }
}

/// A named transformation over a whole module
pub trait ModulePass {
    /// Fixed identifier referenced by pipeline descriptions
    fn name(&self) -> &'static str;

    /// Run the pass, mutating the module in place
    fn run(&self, module: &mut Module) -> PassOutcome;
}

type PassFactory = fn() -> Box<dyn ModulePass>;

/// Registry of constructible passes, keyed by pipeline name
pub struct PassRegistry {
    factories: HashMap<String, PassFactory>,
}

impl PassRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-seeded with the passes this crate ships
    pub fn with_default_passes() -> Self {
        let mut registry = Self::new();
        registry.register(PASS_NAME, || Box::new(ParityTracePass));
        registry
    }

    /// Register a pass constructor under a pipeline name
    pub fn register(&mut self, name: &str, factory: PassFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Construct the pass registered under `name`
    pub fn create(&self, name: &str) -> Result<Box<dyn ModulePass>> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnknownPass {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_default_passes()
    }
}

/// Ordered pipeline of module passes
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn ModulePass>>,
}

impl PassManager {
    /// Empty pipeline
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Append a pass to the pipeline
    pub fn add_pass(&mut self, pass: Box<dyn ModulePass>) {
        self.passes.push(pass);
    }

    /// Build a pipeline from a comma-separated description, e.g.
    /// `"parity-trace"`, resolving names against `registry`
    pub fn parse(pipeline: &str, registry: &PassRegistry) -> Result<Self> {
        let mut manager = Self::new();
        for name in pipeline.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            manager.add_pass(registry.create(name)?);
        }
        if manager.passes.is_empty() {
            return Err(Error::EmptyPipeline);
        }
        Ok(manager)
    }

    /// Number of passes in the pipeline
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether the pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass in order; `Changed` if any pass changed the module
    pub fn run(&self, module: &mut Module) -> PassOutcome {
        let mut outcome = PassOutcome::Unchanged;
        for pass in &self.passes {
            let result = pass.run(module);
            tracing::debug!(pass = pass.name(), changed = result.changed(), "pass finished");
            if result.changed() {
                outcome = PassOutcome::Changed;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FunctionBuilder, GlobalInit, Operand, Ty};

    fn store_module() -> Module {
        let mut module = Module::new("m");
        module.get_or_insert_global("g", GlobalInit::Int { ty: Ty::I64, value: 0 });
        let mut b = FunctionBuilder::new("main");
        b.store(Ty::I64, Operand::const_i64(0), Operand::global("g"));
        b.ret(None);
        module.add_function(b.build());
        module
    }

    #[test]
    fn test_registry_creates_registered_pass() {
        let registry = PassRegistry::with_default_passes();
        let pass = registry.create(PASS_NAME).expect("registered");
        assert_eq!(pass.name(), PASS_NAME);
    }

    #[test]
    fn test_registry_rejects_unknown_pass() {
        let registry = PassRegistry::with_default_passes();
        match registry.create("no-such-pass") {
            Ok(_) => panic!("expected UnknownPass"),
            Err(Error::UnknownPass { name }) => assert_eq!(name, "no-such-pass"),
            Err(other) => panic!("expected UnknownPass, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_pipeline() {
        let registry = PassRegistry::with_default_passes();
        assert!(matches!(
            PassManager::parse("", &registry),
            Err(Error::EmptyPipeline)
        ));
        assert!(matches!(
            PassManager::parse(" , ", &registry),
            Err(Error::EmptyPipeline)
        ));
    }

    #[test]
    fn test_pipeline_outcome_reflects_module_contents() {
        let registry = PassRegistry::with_default_passes();
        let manager = PassManager::parse(PASS_NAME, &registry).expect("pipeline");

        let mut with_access = store_module();
        assert_eq!(manager.run(&mut with_access), PassOutcome::Changed);

        let mut without_access = Module::new("m");
        let mut b = FunctionBuilder::new("main");
        b.ret(None);
        without_access.add_function(b.build());
        assert_eq!(manager.run(&mut without_access), PassOutcome::Unchanged);
    }
}
