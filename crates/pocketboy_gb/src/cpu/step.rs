use super::{Bus, Cpu};

impl Cpu {
    /// Execute one unit of work: service a pending interrupt, observe the
    /// HALT state, or fetch and execute a single opcode.
    ///
    /// The EI delay latch is sampled before the step and committed after it,
    /// so IME turns on at the end of the instruction following EI. Interrupt
    /// entry does not advance the latch.
    pub fn step<B: Bus>(&mut self, bus: &mut B) {
        // STOP has no exit in this core; the host's termination condition is
        // expected to fire.
        if self.stopped {
            return;
        }

        let ime_was_pending = self.ime_pending;

        if self.service_interrupts(bus) {
            return;
        }

        if self.halted {
            // In HALT the CPU idles; it only polls for a pending interrupt,
            // which the check above already did.
            self.commit_ime_delay(ime_was_pending);
            return;
        }

        let opcode = self.fetch8(bus);
        self.exec_opcode(bus, opcode);
        self.commit_ime_delay(ime_was_pending);
    }
}
