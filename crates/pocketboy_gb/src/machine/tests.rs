use super::GameBoy;
use crate::cpu::Bus;

use once_cell::sync::OnceCell;

/// Build a 32 KiB cartridge image with `program` placed at the entry point
/// (0x0100).
fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom
}

fn machine_with_program(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new();
    gb.load_rom(&rom_with_program(program));
    gb
}

/// Step until the CPU halts or stops, with a safety cap.
fn run_to_halt(gb: &mut GameBoy, max_steps: u32) {
    for _ in 0..max_steps {
        gb.step();
        if gb.is_halted() || gb.is_stopped() {
            return;
        }
    }
    panic!("program did not halt within {max_steps} steps");
}

#[test]
fn serial_program_writes_hi_to_the_log() {
    // For each character: LD A,ch; LDH (0x01),A; LD A,0x81; LDH (0x02),A.
    let gb = &mut machine_with_program(&[
        0x3E, b'H', // LD A, 'H'
        0xE0, 0x01, // LDH (SB), A
        0x3E, 0x81, // LD A, 0x81
        0xE0, 0x02, // LDH (SC), A
        0x3E, b'i', // LD A, 'i'
        0xE0, 0x01, // LDH (SB), A
        0x3E, 0x81, // LD A, 0x81
        0xE0, 0x02, // LDH (SC), A
        0x76, // HALT
    ]);

    for _ in 0..50 {
        gb.step();
    }
    assert_eq!(gb.serial_output(), b"Hi");
    assert_eq!(gb.serial_text(), "Hi");
    assert_eq!(gb.peek(0xFF02), 0x00, "SC is cleared after each transfer");
}

#[test]
fn relative_back_branch_counts_to_five() {
    // LD A,0; INC A; CP 5; JR NZ,-5; HALT
    let gb = &mut machine_with_program(&[0x3E, 0x00, 0x3C, 0xFE, 0x05, 0x20, 0xFB, 0x76]);

    run_to_halt(gb, 100);
    assert_eq!(gb.cpu.regs.a, 5);
    assert_eq!(gb.cpu.regs.f & 0x80, 0x80, "Z set by the final CP");
    assert!(gb.is_halted());
}

#[test]
fn call_and_return_restore_pc_and_sp() {
    // 0x0100: CALL 0x0110 ... 0x0110: RET
    let mut program = [0u8; 0x11];
    program[0x00] = 0xCD;
    program[0x01] = 0x10;
    program[0x02] = 0x01;
    program[0x10] = 0xC9;
    let gb = &mut machine_with_program(&program);

    gb.step();
    assert_eq!(gb.cpu.regs.pc, 0x0110);
    gb.step();
    assert_eq!(gb.cpu.regs.pc, 0x0103);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn stack_is_lifo_through_push_pop_pairs() {
    // PUSH BC; PUSH DE; POP DE; POP BC
    let gb = &mut machine_with_program(&[0xC5, 0xD5, 0xD1, 0xC1]);
    gb.cpu.regs.set_bc(0x1234);
    gb.cpu.regs.set_de(0x5678);

    for _ in 0..4 {
        gb.step();
    }
    assert_eq!(gb.cpu.regs.bc(), 0x1234);
    assert_eq!(gb.cpu.regs.de(), 0x5678);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn vblank_interrupt_vectors_through_the_bus() {
    let gb = &mut machine_with_program(&[0x00, 0x00]);
    gb.cpu.ime = true;
    gb.bus.write8(0xFFFF, 0x01);
    gb.bus.write8(0xFF0F, 0x01);

    gb.step();
    assert_eq!(gb.cpu.regs.pc, 0x0040);
    assert!(!gb.cpu.ime);
    assert_eq!(gb.peek(0xFF0F), 0x00);
    // Old PC (0x0100) was pushed.
    assert_eq!(gb.peek(0xFFFC), 0x00);
    assert_eq!(gb.peek(0xFFFD), 0x01);
}

#[test]
fn halt_wake_without_ime_takes_a_full_step() {
    let gb = &mut machine_with_program(&[0x76, 0x3C]); // HALT; INC A
    gb.cpu.regs.a = 0;

    gb.step();
    assert!(gb.is_halted());
    assert!(gb.is_wedged());

    gb.bus.write8(0xFFFF, 0x01);
    gb.bus.write8(0xFF0F, 0x01);
    assert!(!gb.is_wedged());

    gb.step();
    assert!(!gb.is_halted(), "pending interrupt releases HALT");
    assert_eq!(gb.cpu.regs.a, 0, "wake step does not fetch");

    gb.step();
    assert_eq!(gb.cpu.regs.a, 1, "fetch resumes after the HALT");
}

#[test]
fn rom_range_is_write_protected() {
    let mut rom = rom_with_program(&[0x00]);
    rom[0x2345] = 0x5A;
    let mut gb = GameBoy::new();
    gb.load_rom(&rom);

    gb.bus.write8(0x2345, 0xAA);
    assert_eq!(gb.peek(0x2345), 0x5A);

    gb.bus.write8(0x7FFF, 0xAA);
    assert_eq!(gb.peek(0x7FFF), 0x00);
}

#[test]
fn ram_enable_latch_gates_external_ram() {
    let gb = &mut GameBoy::new();

    // Disabled by default: open-bus reads, dropped writes.
    assert_eq!(gb.peek(0xA123), 0xFF);
    gb.bus.write8(0xA123, 0x42);
    assert_eq!(gb.peek(0xA123), 0xFF);

    // 0x0A in the low nibble enables; the byte itself is not stored.
    gb.bus.write8(0x0000, 0x0A);
    assert_eq!(gb.peek(0x0000), 0x00);
    assert_eq!(gb.peek(0xA123), 0x00);

    gb.bus.write8(0xA123, 0x42);
    assert_eq!(gb.peek(0xA123), 0x42);

    // Any other value disables again; the data survives behind the gate.
    gb.bus.write8(0x1FFF, 0x00);
    assert_eq!(gb.peek(0xA123), 0xFF);
    gb.bus.write8(0x0042, 0x1A); // low nibble 0x0A enables too
    assert_eq!(gb.peek(0xA123), 0x42);
}

#[test]
fn load_rom_truncates_banked_images() {
    let mut rom = vec![0u8; 0x9000];
    rom[0x7FFF] = 0x11;
    rom[0x8000] = 0x22;
    let mut gb = GameBoy::new();
    gb.load_rom(&rom);

    assert_eq!(gb.peek(0x7FFF), 0x11);
    // 0x8000 is VRAM, not cartridge space; the tail of the image must not
    // land there.
    assert_eq!(gb.peek(0x8000), 0x00);
}

#[test]
fn serial_transfer_needs_both_start_and_clock_bits() {
    let gb = &mut GameBoy::new();
    gb.bus.write8(0xFF01, b'x');

    gb.bus.write8(0xFF02, 0x80); // start without internal clock
    gb.bus.write8(0xFF02, 0x01); // clock without start
    assert!(gb.serial_output().is_empty());
    assert_eq!(gb.peek(0xFF02), 0x01);

    gb.bus.write8(0xFF02, 0x81);
    assert_eq!(gb.serial_output(), b"x");
    assert_eq!(gb.peek(0xFF02), 0x00);
}

#[test]
fn echo_oam_and_hram_behave_as_plain_ram() {
    let gb = &mut GameBoy::new();
    for addr in [0xE012u16, 0xFE05, 0xFEA5, 0xFF80, 0xFFFE] {
        gb.bus.write8(addr, 0x6D);
        assert_eq!(gb.peek(addr), 0x6D, "addr 0x{addr:04X}");
    }
}

#[test]
fn reset_returns_the_machine_to_power_on() {
    let gb = &mut machine_with_program(&[0x76]);
    gb.bus.write8(0xC000, 0x42);
    gb.step();
    assert!(gb.is_halted());

    gb.reset();
    assert!(!gb.is_halted());
    assert_eq!(gb.peek(0xC000), 0x00);
    assert_eq!(gb.peek(0x0100), 0x00, "cartridge ROM is cleared too");
    assert_eq!(gb.cpu.regs.pc, 0x0100);
}

// --- Blargg cpu_instrs (optional, needs the ROM on disk) ---

static LD_RR_ROM: OnceCell<Vec<u8>> = OnceCell::new();

/// Load one of Blargg's individual cpu_instrs ROMs from the workspace.
///
/// These are 32 KiB images that fit the unbanked ROM window and report
/// their verdict over the serial port. The test is ignored by default and
/// only meaningful when a checkout of the test ROMs is present.
fn load_blargg_individual(filename: &str) -> Vec<u8> {
    use std::path::PathBuf;

    let candidates = [
        PathBuf::from("assets/roms/blargg/cpu_instrs/individual").join(filename),
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/roms/blargg/cpu_instrs/individual")
            .join(filename),
    ];

    for path in &candidates {
        if let Ok(data) = std::fs::read(path) {
            return data;
        }
    }

    panic!(
        "failed to read blargg ROM {:?} (tried {:?})",
        filename, candidates
    );
}

fn run_blargg(rom: &[u8]) -> String {
    let mut gb = GameBoy::new();
    gb.load_rom(rom);

    let mut seen = 0;
    for _ in 0..50_000_000u64 {
        gb.step();
        if gb.is_wedged() {
            break;
        }
        // Only rescan the log when a new byte arrived.
        let out = gb.serial_output();
        if out.len() != seen {
            seen = out.len();
            let text = gb.serial_text();
            if text.contains("Passed") || text.contains("Failed") {
                break;
            }
        }
    }
    gb.serial_text()
}

#[test]
#[ignore]
fn blargg_ld_r_r_passes() {
    let rom = LD_RR_ROM.get_or_init(|| load_blargg_individual("06-ld r,r.gb"));
    let text = run_blargg(rom);
    assert!(text.contains("Passed"), "serial output: {text:?}");
}

#[test]
#[ignore]
fn blargg_op_rp_passes() {
    let rom = load_blargg_individual("03-op sp,hl.gb");
    let text = run_blargg(&rom);
    assert!(text.contains("Passed"), "serial output: {text:?}");
}
