//! End-to-end programs: assemble, load at 0, run to a halt and inspect
//! memory and registers.

use pretty_assertions::assert_eq;
use tritcpu::{assemble, Cpu, CpuError, CpuOptions, Flag, Trit, Tryte};

fn run_source(source: &str) -> Cpu {
    let mut cpu = Cpu::new();
    run_on(&mut cpu, source);
    cpu
}

fn run_on(cpu: &mut Cpu, source: &str) -> usize {
    let program = assemble(source).unwrap();
    cpu.load(&program).unwrap();
    cpu.run().unwrap();
    program.len()
}

fn assert_passed(cpu: &Cpu) {
    assert!(cpu.is_halted());
    assert_eq!(cpu.regs.flags.get(Flag::H), Trit::O, "program took the fail path");
}

fn peek(cpu: &Cpu, address: i32) -> i32 {
    cpu.mem.peek(address).unwrap().to_i32()
}

#[test]
fn test_execute_basic_program() {
    let mut cpu = Cpu::new();
    let len = run_on(
        &mut cpu,
        "
        LDA #$ijk
        LDA #%ii1i0
        LDA #&QF
        NOP
        NOP
        NOP
        LDA #0
        BNE #-1     ; not taken
        BEQ #+2     ; taken
        HALTN
        HALTP
        LDA #42
        STA 0

        LDA #%00i01
        PTI A

        TAX
        INX
        DEX
        DEX

        HALTZ
        ",
    );

    assert_eq!(peek(&cpu, 0), 42);
    assert_eq!(cpu.regs.accum, 119);
    assert_eq!(cpu.regs.index, 118);
    assert_eq!(cpu.regs.yindex, 0);
    assert_eq!(cpu.regs.pc, len as i32 - 1);
    assert_eq!(cpu.regs.flags.get(Flag::R), Trit::O);
    assert_passed(&cpu);
}

#[test]
fn test_adc_carry_in() {
    let cpu = run_source(
        "
        LDA #2
        CLC
        ADC #3
        CMP #5
        BNE fail

        LDA #2
        SECP
        ADC #3
        CMP #6
        BNE fail

        LDA #2
        SECN
        ADC #3
        CMP #4
        BNE fail

        HALTZ
    fail:
        HALTN
        ",
    );
    assert_passed(&cpu);
}

#[test]
fn test_adc_overflow_flag() {
    let cpu = run_source("LDA #121\nSECN\nADC #121\nHALTZ");
    assert_eq!(cpu.regs.accum, -2);
    assert_eq!(cpu.regs.flags.get(Flag::V), Trit::P);
}

#[test]
fn test_clear_overflow_flag() {
    let cpu = run_source("LDA #121\nADC #121\nCLV\nSECN\nHALTZ");
    assert_eq!(cpu.regs.flags.get(Flag::V), Trit::O);
    assert_eq!(cpu.regs.flags.get(Flag::C), Trit::N);
}

#[test]
fn test_interrupt_handler_runs_when_unmasked() {
    let mut cpu = Cpu::new();
    let source = format!(
        "
        INTN        ; masked by I=-1
        INTP

        .equ {} intN_L
        .equ {} intN_H
        LDA #<handle_intN
        STA intN_L
        LDA #>handle_intN
        STA intN_H

        CLI
        INTN
        HALTZ

    handle_intN:
        LDA #42
        STA 1000
        HALTZ
        ",
        cpu.mem.min_address(),
        cpu.mem.min_address() + 1,
    );
    run_on(&mut cpu, &source);

    assert_eq!(peek(&cpu, 1000), 42);
    assert_passed(&cpu);
}

#[test]
fn test_positive_mask_drops_interrupt_and_continues() {
    let mut cpu = Cpu::new();
    let source = format!(
        "
        .equ {} intP_L
        .equ {} intP_H
        LDA #<handle_intP
        STA intP_L
        LDA #>handle_intP
        STA intP_H

        SEIP
        INTP        ; masked by I=1
        LDA #7
        STA 500

        CLI
        INTP
        HALTZ

    handle_intP:
        INC 501
        HALTZ
        ",
        cpu.mem.min_address() + 4,
        cpu.mem.min_address() + 5,
    );
    run_on(&mut cpu, &source);

    assert_passed(&cpu);
    assert_eq!(peek(&cpu, 500), 7);
    assert_eq!(peek(&cpu, 501), 1, "handler should run exactly once");
    assert_eq!(cpu.regs.accum, 7);
    assert_eq!(cpu.regs.flags.get(Flag::I), Trit::O);
}

#[test]
fn test_trit_shifts() {
    let cpu = run_source(
        "
        LDA #%001i1
        SECN
        SHR A
        BRDNP fail      ; D=1 shifted out
        BRLNN fail      ; L=i
        CMP #%i001i
        BNE fail

        LDA #%00iii
        SEDP
        SHL A
        BRCNZ fail      ; C=0 shifted out
        CMP #%0iii1
        BNE fail

        LDA #%00iii
        CLD
        SHL A
        CMP #%0iii0
        BNE fail

        HALTZ
    fail:
        HALTN
        ",
    );
    assert_passed(&cpu);
}

#[test]
fn test_branch_always() {
    let cpu = run_source("BRA end\nHALTN\nend:\nHALTZ\nNOP\nHALTP");
    assert_passed(&cpu);
}

#[test]
fn test_stack_push_and_pull() {
    let cpu = run_source(
        "
        LDY #0
        LDX #100
        TXYS
        LDA #33
        PHA
        INC A
        PLA
        STA -99
        HALTZ
        ",
    );
    assert_eq!(peek(&cpu, 100), 33);
    assert_eq!(peek(&cpu, 101), 0);
    assert_eq!(peek(&cpu, -99), 33);
    assert_eq!(cpu.regs.stackptr, 100);
}

#[test]
fn test_push_flags() {
    let mut cpu = run_source(
        "
        LDY #0
        LDX #100
        TXYS
        PHP

        PLA
        STA 111
        PLA
        STA 110
        HALTZ
        ",
    );
    assert_eq!(cpu.mem.read_word(110).unwrap().to_i32(), 6640);
}

#[test]
fn test_dnop_traps_when_enabled() {
    let options = CpuOptions { dnop_traps: true, ..CpuOptions::default() };
    let mut cpu = Cpu::with_options(options).unwrap();
    let program = assemble("NOP\nLDA #33\nDNOP A\nHALTN").unwrap();
    cpu.load(&program).unwrap();

    let err = cpu.run().unwrap_err();
    assert!(matches!(err, CpuError::DebugTrap { pc: 3 }), "got {:?}", err);
    assert!(!cpu.is_halted());
}

#[test]
fn test_dnop_is_a_no_op_by_default() {
    let cpu = run_source("NOP\nLDA #33\nDNOP A\nHALTZ");
    assert_eq!(cpu.regs.accum, 33);
    assert_passed(&cpu);
}

#[test]
fn test_jsr_and_rts() {
    let cpu = run_source(
        "
        NOP
        NOP
        NOP
        JSR subroutine
        DEC -99
        HALTZ

    subroutine:
        LDA #33
        STA -99
        RTS
        HALTN
        ",
    );
    assert_eq!(peek(&cpu, -99), 32);
    assert_passed(&cpu);
}

#[test]
fn test_multiple_returns() {
    let cpu = run_source(
        "
        LDA #10
        STA -90
        JSR sub2
        STA -91
        JSR sub2
        STA -92
        JSR sub2
        STA -93
        JSR sub2
        STA -94
        JSR sub2
        STA -95
        JSR sub2
        STA -96
        HALTZ

    sub2:
        DEC A
        DEC A
        RTS
        ",
    );
    let values: Vec<i32> = (-96..=-90).rev().map(|a| peek(&cpu, a)).collect();
    assert_eq!(values, vec![10, 8, 6, 4, 2, 0, -2]);
    assert_passed(&cpu);
}

#[test]
fn test_load_indirect_indexed() {
    let cpu = run_source(
        "
        LDY #0
        LDA (table_ptr),Y
        STA -1
        INY
        LDA (table_ptr),Y
        STA -2
        INY
        LDA (table_ptr),Y
        STA -3
        HALTZ

    table_ptr:
        .word table
    table:
        .tryte 33
        .tryte 66
        .tryte 99
        ",
    );
    assert_eq!([peek(&cpu, -1), peek(&cpu, -2), peek(&cpu, -3)], [33, 66, 99]);
}

#[test]
fn test_absolute_indexed_read() {
    let cpu = run_source(
        "
        LDY #0
        LDA table,Y
        STA -1
        LDY #1
        LDA table,Y
        STA -2
        LDY #2
        LDA table,Y
        STA -3

        LDX #2
        LDA table,X
        STA -4
        HALTZ

    table:
        .tryte 33
        .tryte 66
        .tryte 99
        ",
    );
    let values: Vec<i32> = (-4..=-1).rev().map(|a| peek(&cpu, a)).collect();
    assert_eq!(values, vec![33, 66, 99, 99]);
}

#[test]
fn test_absolute_indexed_write() {
    let cpu = run_source(
        "
        JMP start
    table:
        .tryte 0
        .tryte 0
        .tryte 0
    start:
        LDA #33
        LDX #0
        STA table,X
        LDA #66
        LDX #1
        STA table,X
        LDA #99
        LDY #2
        STA table,Y
        HALTZ
        ",
    );
    assert_eq!([peek(&cpu, 3), peek(&cpu, 4), peek(&cpu, 5)], [33, 66, 99]);
}

#[test]
fn test_index_registers_indexed_by_each_other() {
    let cpu = run_source(
        "
    start:
        LDY #-1
        LDX foo,Y
        CPX #33
        BNE fail

        LDX #-1
        LDY foo,X
        CPY #33
        BNE fail

        LDY #-1
        LDX #99
        STX start,Y

        LDX #-2
        LDY #88
        STY start,X
        BRA pass

    before_foo:
        .tryte 33
    foo:
        .tryte 66
    after_foo:
        .tryte 0
    pass:
        HALTZ
    fail:
        HALTN
        ",
    );
    assert_passed(&cpu);
    assert_eq!(peek(&cpu, -1), 99);
    assert_eq!(peek(&cpu, -2), 88);
}

#[test]
fn test_jump_indirect() {
    let cpu = run_source(
        "
        JMP (over_ptr)
        HALTN
    over_ptr:
        .word over
        HALTN
    over:
        HALTZ
        ",
    );
    assert_passed(&cpu);
}

#[test]
fn test_push_index_registers() {
    let cpu = run_source(
        "
        .equ 10000 stack
        LDY #>stack
        LDX #<stack
        TXYS

        LDA #33
        PHA
        LDX #34
        PHX
        LDY #35
        PHY
        HALTZ
        ",
    );
    assert_eq!(
        [peek(&cpu, 10000), peek(&cpu, 10001), peek(&cpu, 10002)],
        [33, 34, 35]
    );
    assert_eq!(cpu.regs.stackptr, 10003);
}

#[test]
fn test_pull_index_registers() {
    let cpu = run_source(
        "
        .equ 10000 stack
        LDY #>stack
        LDX #<stack
        TXYS

        LDA #%iiiii
        PHA
        LDA #%11111
        PHA

        PLX
        CPX #%11111
        BNE fail
        PLY
        CPY #%iiiii
        BNE fail
        HALTZ
    fail:
        HALTN
        ",
    );
    assert_passed(&cpu);
    assert_eq!(cpu.regs.stackptr, 10000);
}

#[test]
fn test_parameter_control_block() {
    let cpu = run_source(
        "
        .equ 10000 stack
        LDY #>stack
        LDX #<stack
        TXYS

        LDA #10
        STA write_params
        LDA #<write_params
        LDX #>write_params
        JSR write

        LDA #20
        STA write_params
        LDA #<write_params
        LDX #>write_params
        JSR write

        LDA #30
        STA write_params
        LDA #<write_params
        LDX #>write_params
        JSR write

        HALTZ

    write_params:
        .tryte 0

    write:
        STA _write_param
        STX _write_param+1
        LDY #0
        LDA (_write_param),Y
        LDX _write_offset
        STA _write_buffer,X
        INC _write_offset
        RTS
        HALTN

    _write_param:
        .word 0
        .equ -100 _write_buffer
    _write_offset:
        .tryte 0
        HALTN
        ",
    );
    assert_passed(&cpu);
    assert_eq!(
        [peek(&cpu, -100), peek(&cpu, -99), peek(&cpu, -98)],
        [10, 20, 30]
    );
}

#[test]
fn test_store_zero() {
    let mut cpu = Cpu::new();
    cpu.mem.write(-99, Tryte::from_i32(42)).unwrap();
    run_on(&mut cpu, "STZ -99\nHALTZ");
    assert_eq!(peek(&cpu, -99), 0);
}

#[test]
fn test_store_zero_addressing_modes() {
    let mut cpu = Cpu::new();
    for address in [-90, -80, -70, -60] {
        cpu.mem.write(address, Tryte::from_i32(42)).unwrap();
    }
    run_on(
        &mut cpu,
        "
        STZ -90
        LDX #-40
        STZ -40,X
        LDY #-35
        STZ -35,Y
        LDY #-30
        STZ (ptr),Y
        HALTZ
    ptr:
        .word -30
        ",
    );
    for address in [-90, -80, -70, -60] {
        assert_eq!(peek(&cpu, address), 0, "address {}", address);
    }
}

#[test]
fn test_inline_immediate_after_jsr() {
    let cpu = run_source(
        "
        JSR getimm
        .tryte 33
        HALTZ

    getimm:
        PLA
        STA _getimm_param+1
        PLX
        INX
        STX _getimm_param
        PHX
        PHA
        LDY #0
        LDA (_getimm_param),Y
        CMP #33
        BNE fail
        RTS

    _getimm_param:
        .word 0
    fail:
        HALTN
        ",
    );
    assert_passed(&cpu);
}

#[test]
fn test_inline_string_length() {
    let cpu = run_source(
        "
        JSR strlen
        .data \"foobar\"
        .tryte 0
        CPY #6
        BNE fail
        HALTZ

    strlen:
        PLA
        STA _strlen_param+1
        PLX
        INX
        STX _strlen_param
        LDY #0
    _strlen_next_char:
        INX
        INY
        LDA (_strlen_param),Y
        BNE _strlen_next_char
        PHX
        LDA _strlen_param+1
        PHA
        RTS

    _strlen_param:
        .word 0
    fail:
        HALTN
        ",
    );
    assert_passed(&cpu);
    assert_eq!(cpu.regs.yindex, 6);
}

fn logic_result(op: &str, a: &str, b: &str) -> String {
    let cpu = run_source(&format!("LDA #%{}\n{} #%{}\nHALTZ", a, op, b));
    cpu.regs.accum.to_string()
}

#[test]
fn test_ora_truth_table() {
    assert_eq!(logic_result("ORA", "i010i", "iiiii"), "i010i");
    assert_eq!(logic_result("ORA", "i010i", "iii11"), "i0111");
    assert_eq!(logic_result("ORA", "10i10", "iii11"), "10i11");
    assert_eq!(logic_result("ORA", "10i10", "11iii"), "11i10");
    assert_eq!(logic_result("ORA", "10i10", "11111"), "11111");
    assert_eq!(logic_result("ORA", "10i10", "00000"), "10010");
}

#[test]
fn test_and_truth_table() {
    assert_eq!(logic_result("AND", "i010i", "iiiii"), "iiiii");
    assert_eq!(logic_result("AND", "i010i", "111ii"), "i01ii");
    assert_eq!(logic_result("AND", "i010i", "11111"), "i010i");
    assert_eq!(logic_result("AND", "i010i", "00000"), "i000i");
}

#[test]
fn test_but_truth_table() {
    assert_eq!(logic_result("BUT", "i010i", "00000"), "00000");
    assert_eq!(logic_result("BUT", "i010i", "00111"), "0010i");
    assert_eq!(logic_result("BUT", "i010i", "11100"), "i0100");
    assert_eq!(logic_result("BUT", "i010i", "iiiii"), "i0i0i");
}

#[test]
fn test_logic_aliases_match() {
    assert_eq!(
        logic_result("TOR", "10i10", "iii11"),
        logic_result("ORA", "10i10", "iii11")
    );
    assert_eq!(
        logic_result("TAND", "i010i", "111ii"),
        logic_result("AND", "i010i", "111ii")
    );
}
