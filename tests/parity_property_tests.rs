//! Property tests: the emitted parity label always matches the low bit of
//! the accessed address.

use proptest::prelude::*;

use parity_probe::ir::{FunctionBuilder, GlobalInit, Module, Operand, Ty};
use parity_probe::{instrument, Machine};

fn probe_module(offset: i64) -> Module {
    let mut module = Module::new("m");
    module.get_or_insert_global("buf", GlobalInit::Zero { size: 128 });
    let mut b = FunctionBuilder::new("main");
    let p = b.ptr_offset(Operand::global("buf"), offset);
    let loaded = b.load(Ty::I64, Operand::value(p));
    b.ret(Some(Operand::value(loaded)));
    module.add_function(b.build());
    module
}

proptest! {
    #[test]
    fn parity_label_matches_low_bit(offset in 0i64..120) {
        let mut module = probe_module(offset);
        prop_assert!(instrument(&mut module));

        let mut machine = Machine::new(&module);
        let addr = machine.global_address("buf").expect("buf mapped") + offset as u64;
        machine.run("main").expect("run");

        let lines = machine.lines();
        prop_assert_eq!(lines.len(), 1);
        let expected_parity = if addr & 1 == 0 { "Even" } else { "Odd" };
        let suffix = format!("it is {expected_parity}");
        let hex_addr = format!("0x{addr:x}");
        prop_assert!(lines[0].ends_with(&suffix));
        prop_assert!(lines[0].contains(&hex_addr));
    }

    #[test]
    fn store_and_load_to_same_offset_agree_on_parity(offset in 0i64..120) {
        let mut module = Module::new("m");
        module.get_or_insert_global("buf", GlobalInit::Zero { size: 128 });
        let mut b = FunctionBuilder::new("main");
        let p = b.ptr_offset(Operand::global("buf"), offset);
        b.store(Ty::I1, Operand::const_i64(1), Operand::value(p));
        let loaded = b.load(Ty::I1, Operand::value(p));
        b.ret(Some(Operand::value(loaded)));
        module.add_function(b.build());

        prop_assert!(instrument(&mut module));

        let mut machine = Machine::new(&module);
        prop_assert_eq!(machine.run("main").expect("run"), Some(1));

        let lines: Vec<String> = machine.lines().iter().map(|l| l.to_string()).collect();
        prop_assert_eq!(lines.len(), 2);
        let store_parity = lines[0].rsplit(' ').next().map(str::to_string);
        let load_parity = lines[1].rsplit(' ').next().map(str::to_string);
        prop_assert_eq!(store_parity, load_parity);
    }
}
