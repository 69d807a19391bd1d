use super::*;

fn binary(a: impl Into<Value>, b: impl Into<Value>, op: ArithOp) -> Value {
    let mut vm = VirtualMachine::default();
    vm.stack_mut().push(a).unwrap();
    vm.stack_mut().push(b).unwrap();
    exec_one(&mut vm, op).unwrap();
    assert_eq!(vm.stack().len(), 1);
    pop(&mut vm)
}

fn unary(a: impl Into<Value>, op: ArithOp) -> Value {
    let mut vm = VirtualMachine::default();
    vm.stack_mut().push(a).unwrap();
    exec_one(&mut vm, op).unwrap();
    pop(&mut vm)
}

#[test]
fn and_truth_table() {
    assert_eq!(binary(2, 3, ArithOp::And), Value::Int(1));
    assert_eq!(binary(0, 3, ArithOp::And), Value::Int(0));
    assert_eq!(binary(3, 0, ArithOp::And), Value::Int(0));
    assert_eq!(binary(0, 0, ArithOp::And), Value::Int(0));
    // fixed operands still give a plain boolean
    assert_eq!(binary(0.5, -1.0, ArithOp::And), Value::Int(1));
}

#[test]
fn or_and_not() {
    assert_eq!(binary(0, 7, ArithOp::Or), Value::Int(1));
    assert_eq!(binary(0, 0, ArithOp::Or), Value::Int(0));
    assert_eq!(unary(0, ArithOp::Not), Value::Int(1));
    assert_eq!(unary(9, ArithOp::Not), Value::Int(0));
}

#[test]
fn abs_of_negative_fixed() {
    let v = unary(-31.4, ArithOp::Abs);
    assert!(v.is_fixed());
    assert!((v.to_f64() - 31.4).abs() <= 1.0 / 64.0);
    assert_eq!(unary(-7, ArithOp::Abs), Value::Int(7));
}

#[test]
fn comparisons_promote_mixed_operands() {
    assert_eq!(binary(1, 2, ArithOp::Lt), Value::Int(1));
    assert_eq!(binary(2, 2, ArithOp::LtEq), Value::Int(1));
    assert_eq!(binary(3, 2, ArithOp::Gt), Value::Int(1));
    assert_eq!(binary(2, 3, ArithOp::GtEq), Value::Int(0));
    assert_eq!(binary(1, 1.0, ArithOp::Eq), Value::Int(1));
    assert_eq!(binary(1, 1.5, ArithOp::Neq), Value::Int(1));
    assert_eq!(binary(1.5, 1, ArithOp::Gt), Value::Int(1));
}

#[test]
fn add_sub_keep_mode() {
    assert_eq!(binary(40, 2, ArithOp::Add), Value::Int(42));
    assert_eq!(binary(1.5, 1, ArithOp::Add), Value::F26Dot6(160));
    // a - b with b on top
    assert_eq!(binary(10, 3, ArithOp::Sub), Value::Int(7));
    assert_eq!(binary(1.0, 0.25, ArithOp::Sub), Value::F26Dot6(48));
}

#[test]
fn mul_and_div_are_fixed_point_aware() {
    assert_eq!(binary(6, 7, ArithOp::Mul), Value::Int(42));
    assert_eq!(binary(1.5, 2.0, ArithOp::Mul), Value::F26Dot6(192));
    assert_eq!(binary(1.5, 2, ArithOp::Mul), Value::F26Dot6(192));
    assert_eq!(binary(7, 2, ArithOp::Div), Value::Int(3));
    assert_eq!(binary(-7, 2, ArithOp::Div), Value::Int(-3));
    assert_eq!(binary(3.0, 2.0, ArithOp::Div), Value::F26Dot6(96));
}

#[test]
fn negative_fixed_products_round_away_from_zero() {
    // -0.5 * 1/64 = -1/128, half a unit below zero
    assert_eq!(binary(Value::F26Dot6(-32), Value::F26Dot6(1), ArithOp::Mul), Value::F26Dot6(-1));
    assert_eq!(binary(Value::F26Dot6(32), Value::F26Dot6(1), ArithOp::Mul), Value::F26Dot6(1));
    // -1.5 * 2.25 = -3.375
    assert_eq!(binary(-1.5, 2.25, ArithOp::Mul), Value::F26Dot6(-216));
    assert_eq!(binary(-1.5, 2, ArithOp::Mul), Value::F26Dot6(-192));
}

#[test]
fn divide_by_zero_keeps_operands() {
    let mut vm = vm_with(&[5, 0]);
    let err = exec_one(&mut vm, ArithOp::Div).unwrap_err();
    assert_eq!(vm_error(err), VmError::DivisionByZero);
    assert_eq!(stack_ints(&vm), vec![5, 0]);
}

#[test]
fn neg_floor_ceiling_max_min() {
    assert_eq!(unary(2.25, ArithOp::Neg), Value::F26Dot6(-144));
    assert_eq!(unary(2.25, ArithOp::Floor), Value::F26Dot6(128));
    assert_eq!(unary(2.25, ArithOp::Ceiling), Value::F26Dot6(192));
    assert_eq!(unary(5, ArithOp::Floor), Value::Int(5));
    assert_eq!(binary(-4, 9, ArithOp::Max), Value::Int(9));
    assert_eq!(binary(-4, 0.5, ArithOp::Min), Value::F26Dot6(-256));
}

#[test]
fn binary_underflow_leaves_stack() {
    let mut vm = vm_with(&[1]);
    let err = exec_one(&mut vm, ArithOp::Add).unwrap_err();
    assert_eq!(vm_error(err), VmError::StackUnderflow { needed: 2, available: 1 });
    assert_eq!(stack_ints(&vm), vec![1]);
}

#[test]
fn write_then_read_store() {
    let mut vm = vm_with(&[5, 55]);
    exec_one(&mut vm, StorageOp::Ws).unwrap();
    assert!(vm.stack().is_empty());
    assert_eq!(vm.storage_value(5), Some(Value::Int(55)));

    vm.stack_mut().push(5).unwrap();
    exec_one(&mut vm, StorageOp::Rs).unwrap();
    assert_eq!(pop(&mut vm), Value::Int(55));
}

#[test]
fn read_store_seeded_by_caller() {
    let mut vm = vm_with(&[55]);
    vm.set_storage_value(55, 42);
    exec_one(&mut vm, StorageOp::Rs).unwrap();
    assert_eq!(pop(&mut vm), Value::Int(42));
}

#[test]
fn read_of_unwritten_location_fails() {
    let mut vm = vm_with(&[3]);
    let err = exec_one(&mut vm, StorageOp::Rs).unwrap_err();
    assert_eq!(vm_error(err), VmError::UninitializedStorage(3));
    assert_eq!(stack_ints(&vm), vec![3]);
}

#[test]
fn negative_location_rejected() {
    let mut vm = vm_with(&[-1, 9]);
    let err = exec_one(&mut vm, StorageOp::Ws).unwrap_err();
    assert_eq!(
        vm_error(err),
        VmError::InvalidIndex {
            kind: IndexKind::Storage,
            index: -1
        }
    );
    assert_eq!(stack_ints(&vm), vec![-1, 9]);
}

#[test]
fn storage_reaches_past_u32_locations() {
    let far = u32::MAX as i64 + 10;
    let mut vm = vm_with(&[far, 3]);
    exec_one(&mut vm, StorageOp::Ws).unwrap();
    assert_eq!(vm.storage_value(far as u64), Some(Value::Int(3)));

    vm.stack_mut().push(far).unwrap();
    exec_one(&mut vm, StorageOp::Rs).unwrap();
    assert_eq!(stack_ints(&vm), vec![3]);
}

#[test]
fn storage_survives_between_programs() {
    let mut vm = VirtualMachine::default();
    // PUSHB[2] 7 99, WS
    vm.execute_bytes(&[0xB1, 7, 99, 0x42]).unwrap();
    // PUSHB[1] 7, RS
    vm.execute_bytes(&[0xB0, 7, 0x43]).unwrap();
    assert_eq!(pop(&mut vm), Value::Int(99));
}

#[test]
fn control_value_access() {
    let font = FontTables::new().with_control_values(vec![100, -20, 8]);
    let mut vm = VirtualMachine::with_font(VmConfig::default(), font.shared());
    vm.stack_mut().push(1).unwrap();
    exec_one(&mut vm, StorageOp::Rcvt).unwrap();
    assert_eq!(pop(&mut vm), Value::Int(-20));

    vm.stack_mut().push(2).unwrap();
    vm.stack_mut().push(Value::from_f64(1.5)).unwrap();
    exec_one(&mut vm, StorageOp::Wcvtp).unwrap();
    assert_eq!(vm.control_values().get(2).unwrap(), Value::F26Dot6(96));

    vm.stack_mut().push(0).unwrap();
    vm.stack_mut().push(Value::from_f64(12.75)).unwrap();
    exec_one(&mut vm, StorageOp::Wcvtf).unwrap();
    assert_eq!(vm.control_values().get(0).unwrap(), Value::Int(12));

    vm.stack_mut().push(3).unwrap();
    vm.stack_mut().push(1).unwrap();
    let err = exec_one(&mut vm, StorageOp::Wcvtp).unwrap_err();
    assert_eq!(
        vm_error(err),
        VmError::InvalidIndex {
            kind: IndexKind::ControlValue,
            index: 3
        }
    );
    assert_eq!(stack_ints(&vm), vec![3, 1]);
}
