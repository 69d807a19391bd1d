use std::sync::Arc;

use super::*;

const FDEF: u8 = 0x2C;
const ENDF: u8 = 0x2D;
const CALL: u8 = 0x2B;
const DUP: u8 = 0x20;
const ADD: u8 = 0x60;

fn vm_for_font(fpgm: Vec<u8>) -> VirtualMachine {
    let font = FontTables::new().with_font_program(fpgm);
    VirtualMachine::with_font(VmConfig::default(), font.shared())
}

#[test]
fn call_builds_function_lazily_from_font_program() {
    let mut vm = vm_for_font(vec![FDEF, DUP, ENDF]);
    for v in [42, 5, 5] {
        vm.stack_mut().push(v).unwrap();
    }
    assert!(!vm.font_program_loaded());

    vm.execute(&[ControlOp::Call.into()]).unwrap();

    assert!(vm.font_program_loaded());
    assert!(vm.functions().contains(5));
    assert_eq!(pop(&mut vm), Value::Int(42));
    assert_eq!(pop(&mut vm), Value::Int(42));
    assert!(vm.stack().is_empty());
}

#[test]
fn font_program_scan_defines_every_function() {
    // fpgm pops ids 1 then 2; the glyph calls 2
    let fpgm = vec![FDEF, DUP, ENDF, FDEF, ADD, ENDF];
    let mut vm = vm_for_font(fpgm);
    for v in [10, 20, 2, 1, 2] {
        vm.stack_mut().push(v).unwrap();
    }
    vm.execute(&[ControlOp::Call.into()]).unwrap();
    assert_eq!(vm.functions().ids(), vec![1, 2]);
    assert_eq!(stack_ints(&vm), vec![30]);
}

#[test]
fn each_miss_reruns_font_program() {
    let mut vm = vm_for_font(vec![FDEF, DUP, ENDF]);
    for v in [42, 5, 5] {
        vm.stack_mut().push(v).unwrap();
    }
    vm.execute_bytes(&[CALL]).unwrap();
    assert_eq!(stack_ints(&vm), vec![42, 42]);

    // the rerun pops 7 as its FDEF id
    vm.stack_mut().clear();
    for v in [11, 7, 7] {
        vm.stack_mut().push(v).unwrap();
    }
    vm.execute_bytes(&[CALL]).unwrap();
    assert_eq!(vm.functions().ids(), vec![5, 7]);
    assert_eq!(stack_ints(&vm), vec![11, 11]);
}

#[test]
fn rerun_keeps_existing_bodies() {
    let mut vm = vm_for_font(vec![FDEF, ADD, ENDF]);
    vm.stack_mut().push(5).unwrap();
    vm.load_font_program().unwrap();
    vm.load_font_program().unwrap();
    assert_eq!(vm.functions().ids(), vec![5]);

    // the miss on 6 reruns the fpgm, whose FDEF 5 is ignored
    vm.stack_mut().push(5).unwrap();
    vm.stack_mut().push(6).unwrap();
    let err = vm.execute_bytes(&[CALL]).unwrap_err();
    assert_eq!(vm_error(err), VmError::UnresolvedFunction(6));
    assert_eq!(&vm.functions().get(5).unwrap()[..], &[Instruction::Arith(ArithOp::Add)]);
    assert!(vm.stack().is_empty());
}

#[test]
fn miss_inside_font_program_does_not_recurse() {
    // fpgm: PUSHB[1] 9, CALL
    let mut vm = vm_for_font(vec![0xB0, 9, CALL]);
    vm.stack_mut().push(3).unwrap();
    let err = vm.execute_bytes(&[CALL]).unwrap_err();
    assert!(format!("{err:#}").contains("font program failed"));
    assert_eq!(vm_error(err), VmError::UnresolvedFunction(9));
}

#[test]
fn unresolved_without_font() {
    let mut vm = vm_with(&[3]);
    let err = exec_one(&mut vm, ControlOp::Call).unwrap_err();
    assert_eq!(vm_error(err), VmError::UnresolvedFunction(3));
}

#[test]
fn functions_defined_by_glyph_program() {
    let mut vm = VirtualMachine::default();
    // PUSHB[1] 0, FDEF, PUSHB[1] 1, ADD, ENDF
    vm.execute_bytes(&[0xB0, 0, FDEF, 0xB0, 1, ADD, ENDF]).unwrap();
    assert!(vm.stack().is_empty());
    assert!(!vm.is_capturing());

    // PUSHB[2] 41 0, CALL
    vm.execute_bytes(&[0xB1, 41, 0, CALL]).unwrap();
    assert_eq!(stack_ints(&vm), vec![42]);
}

#[test]
fn captured_body_is_not_executed() {
    let mut vm = vm_with(&[7]);
    // FDEF 7 { CLEAR } must not clear the caller's stack
    vm.stack_mut().push(7).unwrap();
    vm.execute(&[ControlOp::Fdef.into(), StackOp::Clear.into(), ControlOp::Endf.into()])
        .unwrap();
    assert_eq!(stack_ints(&vm), vec![7]);
    let body = vm.functions().get(7).unwrap();
    assert_eq!(&body[..], &[Instruction::Stack(StackOp::Clear)]);
}

#[test]
fn body_side_effects_visible_to_caller() {
    let mut vm = VirtualMachine::default();
    // function 1: WS
    vm.stack_mut().push(1).unwrap();
    vm.execute(&[ControlOp::Fdef.into(), StorageOp::Ws.into(), ControlOp::Endf.into()])
        .unwrap();
    for v in [4, 44, 1] {
        vm.stack_mut().push(v).unwrap();
    }
    exec_one(&mut vm, ControlOp::Call).unwrap();
    assert_eq!(vm.storage_value(4), Some(Value::Int(44)));
    assert!(vm.stack().is_empty());
}

#[test]
fn redefinition_keeps_first_body() {
    let mut vm = VirtualMachine::default();
    vm.execute(&[
        PushOp::bytes([3]).into(),
        ControlOp::Fdef.into(),
        StackOp::Dup.into(),
        ControlOp::Endf.into(),
        PushOp::bytes([3]).into(),
        ControlOp::Fdef.into(),
        StackOp::Pop.into(),
        ControlOp::Endf.into(),
    ])
    .unwrap();
    let body = vm.functions().get(3).unwrap();
    assert_eq!(&body[..], &[Instruction::Stack(StackOp::Dup)]);
}

#[test]
fn nested_fdef_is_illegal() {
    let mut vm = vm_with(&[1, 2]);
    let err = vm
        .execute(&[ControlOp::Fdef.into(), ControlOp::Fdef.into(), ControlOp::Endf.into()])
        .unwrap_err();
    assert_eq!(
        vm_error(err),
        VmError::IllegalStateTransition {
            opcode: "FDEF",
            state: VmState::Capturing(2),
        }
    );
    assert!(!vm.is_capturing());
    assert!(vm.functions().is_empty());
}

#[test]
fn endf_outside_definition_is_illegal() {
    let mut vm = VirtualMachine::default();
    let err = exec_one(&mut vm, ControlOp::Endf).unwrap_err();
    assert_eq!(
        vm_error(err),
        VmError::IllegalStateTransition {
            opcode: "ENDF",
            state: VmState::Normal,
        }
    );
}

#[test]
fn program_ending_inside_definition() {
    let mut vm = vm_with(&[8]);
    let err = vm.execute(&[ControlOp::Fdef.into(), StackOp::Dup.into()]).unwrap_err();
    assert_eq!(vm_error(err), VmError::UnterminatedFunction(8));
    assert!(!vm.is_capturing());
    assert!(!vm.functions().contains(8));
}

#[test]
fn call_cycle_hits_depth_limit() {
    let config = VmConfig {
        max_call_depth: 8,
        ..VmConfig::default()
    };
    let mut vm = VirtualMachine::new(config);
    // function 0 calls itself: PUSHB[1] 0, CALL
    vm.stack_mut().push(0).unwrap();
    vm.execute(&[
        ControlOp::Fdef.into(),
        PushOp::bytes([0]).into(),
        ControlOp::Call.into(),
        ControlOp::Endf.into(),
    ])
    .unwrap();
    vm.stack_mut().push(0).unwrap();
    let err = exec_one(&mut vm, ControlOp::Call).unwrap_err();
    assert_eq!(vm_error(err), VmError::CallDepthExceeded { limit: 8 });
}

#[test]
fn shared_font_serves_independent_vms() {
    let font: Arc<dyn crate::font::FontContext> = FontTables::new().with_font_program(vec![FDEF, DUP, ENDF]).shared();
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let font = Arc::clone(&font);
            std::thread::spawn(move || {
                let mut vm = VirtualMachine::with_font(VmConfig::default(), font);
                for v in [n, 5, 5] {
                    vm.stack_mut().push(v).unwrap();
                }
                vm.execute_bytes(&[CALL]).unwrap();
                stack_ints(&vm)
            })
        })
        .collect();
    for (n, handle) in handles.into_iter().enumerate() {
        let n = n as i64;
        assert_eq!(handle.join().unwrap(), vec![n, n]);
    }
}
