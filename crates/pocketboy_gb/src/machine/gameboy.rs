use crate::cpu::{Bus, Cpu};

use super::SystemBus;

/// High-level Game Boy machine.
///
/// Owns the CPU core and the system bus; this is the entry point consumed
/// by the host driver. The bus is owned exclusively here and has no
/// back-reference to the CPU: peripherals that want to interrupt communicate
/// through the memory-mapped IF/IE registers instead.
pub struct GameBoy {
    pub cpu: Cpu,
    pub(crate) bus: SystemBus,
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBoy {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: SystemBus::default(),
        }
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus = SystemBus::default();
    }

    /// Load a ROM image into the cartridge ROM area.
    ///
    /// PC is already initialised to 0x0100 by the simulated boot state, so
    /// execution starts at the cartridge entry point on the next `step`.
    pub fn load_rom(&mut self, rom: &[u8]) {
        self.bus.load_rom(rom);
    }

    /// Execute one instruction or interrupt service.
    pub fn step(&mut self) {
        self.cpu.step(&mut self.bus);
    }

    /// Non-mutating bus read, mainly for the host driver and tests.
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.read8(addr)
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.halted
    }

    pub fn is_stopped(&self) -> bool {
        self.cpu.is_stopped()
    }

    /// True when the CPU is halted with no enabled-and-requested interrupt
    /// line left to wake it. Nothing can make progress past this point.
    pub fn is_wedged(&self) -> bool {
        (self.cpu.halted && self.cpu.pending_interrupts(&self.bus) == 0) || self.is_stopped()
    }

    /// Raw bytes published through the serial port observer.
    pub fn serial_output(&self) -> &[u8] {
        &self.bus.serial.output
    }

    /// Serial output as text. Test ROMs write ASCII; anything else is
    /// replaced lossily.
    pub fn serial_text(&self) -> String {
        String::from_utf8_lossy(&self.bus.serial.output).into_owned()
    }
}
