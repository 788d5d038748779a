use crate::cpu::{Bus, Cpu};

impl Cpu {
    pub(super) fn exec_stop<B: Bus>(&mut self, bus: &B) {
        // STOP is officially a 2-byte instruction; the second byte is often 0
        // and ignored. We always fetch and discard the padding byte so that
        // PC matches hardware.
        let _padding = self.fetch8(bus);

        // Enter STOP low-power mode. This core models no joypad, so nothing
        // can release the state; it behaves like a terminal HALT.
        self.stopped = true;
        self.halted = false;
    }

    pub(super) fn exec_di(&mut self) {
        self.ime = false;
        // A DI also cancels a not-yet-committed EI.
        self.ime_pending = false;
    }

    pub(super) fn exec_ei(&mut self) {
        // IME becomes 1 after the *next* instruction completes.
        self.ime_pending = true;
    }
}
