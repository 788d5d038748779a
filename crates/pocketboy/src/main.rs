use anyhow::Result;

const DEFAULT_ROM_PATH: &str = "assets/roms/blargg/cpu_instrs/individual/06-ld r,r.gb";

fn main() -> Result<()> {
    env_logger::init();

    let mut rom_path = std::env::args().nth(1).unwrap_or_default();
    if rom_path.is_empty() {
        rom_path = DEFAULT_ROM_PATH.to_string();
        log::info!("no ROM path provided, using default: {rom_path}");
    }

    let config = pocketboy::RunConfig::default();
    let outcome = pocketboy::run_rom(&rom_path, &config)?;

    print!("{}", outcome.serial);
    if !outcome.serial.ends_with('\n') {
        println!();
    }
    log::info!(
        "done after {} steps (halted={} stopped={})",
        outcome.steps,
        outcome.halted,
        outcome.stopped,
    );
    Ok(())
}
