use crate::cpu::Bus;

use super::{serial::Serial, EXT_RAM_SIZE, MEMORY_SIZE, ROM_WINDOW};

/// System bus: a 64 KiB byte-addressable store with range-specific
/// semantics.
///
/// Most of the address space (work RAM, VRAM, echo RAM, OAM, high RAM and
/// the IO page) behaves as flat RAM in this core. The exceptions:
///
/// - 0x0000-0x7FFF holds the cartridge ROM copy and is write-protected;
///   writes into 0x0000-0x1FFF drive the MBC1/MBC3-style RAM-enable latch
///   instead of storing the byte.
/// - 0xA000-0xBFFF is external cartridge RAM behind that latch: disabled
///   reads see open bus (0xFF) and disabled writes are dropped.
/// - 0xFF01/0xFF02 route to the serial port, whose observer externalises
///   test ROM output.
pub(crate) struct SystemBus {
    pub(crate) memory: [u8; MEMORY_SIZE],
    pub(crate) ext_ram: [u8; EXT_RAM_SIZE],
    pub(crate) ram_enabled: bool,
    pub(crate) serial: Serial,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self {
            memory: [0; MEMORY_SIZE],
            ext_ram: [0; EXT_RAM_SIZE],
            ram_enabled: false,
            serial: Serial::default(),
        }
    }
}

impl SystemBus {
    /// Copy a cartridge image into the ROM area.
    ///
    /// Only the first 0x8000 bytes are observed by this core; larger images
    /// (banked cartridges) are truncated.
    pub(super) fn load_rom(&mut self, rom: &[u8]) {
        let len = rom.len().min(ROM_WINDOW);
        if len < rom.len() {
            log::warn!(
                "cartridge image is {} bytes; only the first {} bytes are mapped",
                rom.len(),
                len
            );
        }
        self.memory[..len].copy_from_slice(&rom[..len]);
        log::info!("loaded {len} bytes of cartridge ROM");
    }
}

impl Bus for SystemBus {
    fn read8(&self, addr: u16) -> u8 {
        match addr {
            // External cartridge RAM, gated by the enable latch. Disabled
            // reads see open bus.
            0xA000..=0xBFFF => {
                if self.ram_enabled {
                    self.ext_ram[(addr - 0xA000) as usize]
                } else {
                    0xFF
                }
            }

            // Serial transfer registers.
            0xFF01 => self.serial.sb,
            0xFF02 => self.serial.sc,

            _ => self.memory[addr as usize],
        }
    }

    fn write8(&mut self, addr: u16, value: u8) {
        match addr {
            // RAM-enable window: lower nibble 0x0A enables, anything else
            // disables. The byte itself is never stored.
            0x0000..=0x1FFF => self.ram_enabled = (value & 0x0F) == 0x0A,

            // Rest of the ROM area is read-only; writes are dropped, not
            // errors (matches hardware).
            0x2000..=0x7FFF => {}

            0xA000..=0xBFFF => {
                if self.ram_enabled {
                    self.ext_ram[(addr - 0xA000) as usize] = value;
                }
            }

            // Serial transfer registers.
            0xFF01 => self.serial.write_sb(value),
            0xFF02 => self.serial.write_sc(value),

            _ => self.memory[addr as usize] = value,
        }
    }
}
