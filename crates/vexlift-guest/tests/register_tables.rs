use vexlift_guest::{Amd64GuestState, ArmGuestState, GuestState, X86GuestState};
use vexlift_types::IrType;

#[test]
fn x86_word_type_is_i32_and_amd64_is_i64() {
    assert_eq!(X86GuestState::new().word_type(), IrType::I32);
    assert_eq!(Amd64GuestState::new().word_type(), IrType::I64);
}

#[test]
fn every_architecture_rejects_unknown_register_names() {
    let x86 = X86GuestState::new();
    let amd64 = Amd64GuestState::new();
    let arm = ArmGuestState::new();

    assert!(x86.register_offset("R8").is_err());
    assert!(amd64.register_offset("NOTAREAL").is_err());
    assert!(arm.register_offset("R16").is_err());
}

#[test]
fn amd64_stack_pointer_region_requires_precise_memory_exceptions() {
    let gs = Amd64GuestState::new();
    let rsp = gs.register_offset("RSP").unwrap();
    assert!(gs.requires_precise_memory_exceptions(rsp, rsp + 8));
    assert!(!gs.requires_precise_memory_exceptions(rsp + 1000, rsp + 1008));
}

#[test]
fn deep_copy_of_amd64_state_is_independent() {
    let mut gs = Amd64GuestState::new();
    gs.rax = 7;
    let copy = gs.deep_copy();
    gs.rax = 99;
    assert_eq!(copy.rax, 7);
}
