mod bus;
mod gameboy;
mod serial;

pub(crate) use bus::SystemBus;
pub use gameboy::GameBoy;

/// Total addressable memory for the Game Boy (64 KiB).
pub(crate) const MEMORY_SIZE: usize = 0x10000;

/// Size of the external cartridge RAM window at 0xA000-0xBFFF (8 KiB).
pub(crate) const EXT_RAM_SIZE: usize = 0x2000;

/// Number of cartridge ROM bytes visible to this core (banks 0 and 1,
/// 0x0000-0x7FFF). Larger images are truncated on load.
pub(crate) const ROM_WINDOW: usize = 0x8000;

#[cfg(test)]
mod tests;
