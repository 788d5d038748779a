use anyhow::{Context, Result};
use typed_builder::TypedBuilder;

use pocketboy_gb::GameBoy;

/// Parameters for a headless run.
#[derive(Clone, Debug, TypedBuilder)]
pub struct RunConfig {
    /// Upper bound on executed CPU steps; the run is cut off here even if
    /// the program never halts.
    #[builder(default = 5_000_000)]
    pub max_steps: u64,
    /// Stop as soon as the serial log contains a Blargg-style verdict
    /// ("Passed" or "Failed").
    #[builder(default = true)]
    pub stop_on_serial_verdict: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// What a finished run looked like.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Steps actually executed.
    pub steps: u64,
    /// CPU ended in HALT (including the illegal-opcode case).
    pub halted: bool,
    /// CPU ended in STOP.
    pub stopped: bool,
    /// Everything the program published through the serial port.
    pub serial: String,
}

/// Load a cartridge image from disk and run it to a termination condition.
pub fn run_rom(rom_path: &str, config: &RunConfig) -> Result<RunOutcome> {
    let rom = std::fs::read(rom_path)
        .with_context(|| format!("failed to read ROM file {rom_path}"))?;
    log::info!("read {} bytes from {rom_path}", rom.len());
    Ok(run(&rom, config))
}

/// Drive a fresh machine until the CPU halts or stops, the step cap is hit,
/// or (optionally) the serial log carries a test verdict.
pub fn run(rom: &[u8], config: &RunConfig) -> RunOutcome {
    let mut gb = GameBoy::new();
    gb.load_rom(rom);

    let mut steps = 0u64;
    let mut serial_seen = 0usize;

    while steps < config.max_steps {
        gb.step();
        steps += 1;

        // A halted CPU with no interrupt line left to wake it (or a stopped
        // one) can never make progress again.
        if gb.is_wedged() {
            break;
        }

        if config.stop_on_serial_verdict {
            // Only rescan the log when a new byte arrived.
            let output = gb.serial_output();
            if output.len() != serial_seen {
                serial_seen = output.len();
                if has_verdict(output) {
                    break;
                }
            }
        }
    }

    let outcome = RunOutcome {
        steps,
        halted: gb.is_halted(),
        stopped: gb.is_stopped(),
        serial: gb.serial_text(),
    };
    log::info!(
        "run finished: steps={} halted={} stopped={} serial_bytes={}",
        outcome.steps,
        outcome.halted,
        outcome.stopped,
        outcome.serial.len(),
    );
    outcome
}

/// Blargg test ROMs end their serial transcript with one of these markers.
fn has_verdict(output: &[u8]) -> bool {
    const MARKERS: [&[u8]; 2] = [b"Passed", b"Failed"];
    MARKERS
        .iter()
        .any(|marker| output.windows(marker.len()).any(|window| window == *marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_program(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
        rom
    }

    #[test]
    fn config_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.max_steps, 5_000_000);
        assert!(config.stop_on_serial_verdict);
    }

    #[test]
    fn run_terminates_on_halt() {
        let rom = rom_with_program(&[0x3C, 0x76]); // INC A; HALT
        let outcome = run(&rom, &RunConfig::default());
        assert!(outcome.halted);
        assert!(!outcome.stopped);
        assert_eq!(outcome.steps, 2);
    }

    #[test]
    fn run_respects_the_step_cap() {
        let rom = rom_with_program(&[0x18, 0xFE]); // JR -2: spins forever
        let config = RunConfig::builder().max_steps(100).build();
        let outcome = run(&rom, &config);
        assert_eq!(outcome.steps, 100);
        assert!(!outcome.halted);
    }

    #[test]
    fn run_stops_on_a_serial_verdict() {
        // Publish "Failed" one byte at a time over the serial port, then
        // spin. The verdict check must cut the loop short.
        let mut program = Vec::new();
        for ch in b"Failed" {
            program.extend_from_slice(&[0x3E, *ch, 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02]);
        }
        program.extend_from_slice(&[0x18, 0xFE]); // JR -2

        let rom = rom_with_program(&program);
        let config = RunConfig::builder().max_steps(10_000).build();
        let outcome = run(&rom, &config);
        assert_eq!(outcome.serial, "Failed");
        assert!(outcome.steps < 100);

        // With the verdict check off, the cap is what ends the run.
        let config = RunConfig::builder()
            .max_steps(10_000)
            .stop_on_serial_verdict(false)
            .build();
        let outcome = run(&rom, &config);
        assert_eq!(outcome.steps, 10_000);
    }

    #[test]
    fn run_rom_reports_missing_files() {
        let err = run_rom("does/not/exist.gb", &RunConfig::default()).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.gb"));
    }
}
