use core::marker::PhantomData;

use critical_section::CriticalSection;

use crate::{
    usi::{self, UsiPort},
    State,
};

/// Application-side view of the state shared with the ISRs.
pub trait RegisterBridge {
    fn state(&self) -> State;

    /// True while a write transaction has committed bytes the application
    /// has not collected yet.
    fn write_pending(&self) -> bool;

    /// End the write transaction: back to idle, returning and clearing
    /// the update count. Callers hold the critical section so increments
    /// cannot slip between the snapshot and the clear.
    fn finish_write(&self, cs: CriticalSection) -> u8;

    fn register(&self, cs: CriticalSection, offset: usize) -> u8;

    fn set_register(&self, cs: CriticalSection, offset: usize, value: u8);

    fn copy_registers(&self, cs: CriticalSection, out: &mut [u8]);
}

/// The slave engine bound to one USI peripheral.
///
/// Construction brings the hardware up; the application installs the two
/// vector trampolines around [`handle_start_interrupt`] and
/// [`handle_overflow_interrupt`], enables interrupts, and polls
/// [`check_stop`](UsiSlave::check_stop) from its main loop.
///
/// [`handle_start_interrupt`]: crate::handle_start_interrupt
/// [`handle_overflow_interrupt`]: crate::handle_overflow_interrupt
pub struct UsiSlave<'d, U: UsiPort, B: RegisterBridge> {
    bridge: &'d B,
    _usi: PhantomData<U>,
}

impl<'d, U: UsiPort, B: RegisterBridge> UsiSlave<'d, U, B> {
    /// Bring up the USI in two-wire slave mode and leave the engine idle,
    /// waiting for a START.
    pub fn new(bridge: &'d B) -> Self {
        U::configure();
        U::write_status(usi::STATUS_EXPECT_BYTE);

        Self {
            bridge,
            _usi: PhantomData,
        }
    }

    /// Poll for the end of a write transaction.
    ///
    /// Non-zero means at least one register write has committed and the
    /// bus has released; the engine is idle again when this returns. Only
    /// zero versus non-zero is meaningful. The hardware cannot raise an
    /// interrupt for a stop condition, hence polling; call this every
    /// main-loop iteration.
    pub fn check_stop(&self) -> u8 {
        // Cheap gate first; the flag re-check and the state mutation sit
        // in one critical section. A START that slipped in between has
        // already cleared the stop flag, so we report nothing and the
        // pending count rides into the next transaction.
        if !self.bridge.write_pending() {
            return 0;
        }

        critical_section::with(|cs| {
            if U::read_status() & usi::STATUS_STOP != 0 {
                self.bridge.finish_write(cs)
            } else {
                0
            }
        })
    }

    /// True from a matched address until the transaction ends. A single
    /// atomic read; gate long-running work on it to keep the ISR windows
    /// open.
    pub fn transaction_ongoing(&self) -> bool {
        !matches!(self.bridge.state(), State::Idle | State::AddressMatch)
    }

    pub fn read_cs(&self, cs: CriticalSection, offset: usize) -> u8 {
        self.bridge.register(cs, offset)
    }

    pub fn read(&self, offset: usize) -> u8 {
        critical_section::with(|cs| self.read_cs(cs, offset))
    }

    pub fn write_cs(&self, cs: CriticalSection, offset: usize, value: u8) {
        self.bridge.set_register(cs, offset, value)
    }

    pub fn write(&self, offset: usize, value: u8) {
        critical_section::with(|cs| self.write_cs(cs, offset, value))
    }

    /// Copy out up to `out.len()` registers from the start of the file in
    /// one critical section, for multi-byte fields that must be read
    /// coherently.
    pub fn snapshot_cs(&self, cs: CriticalSection, out: &mut [u8]) {
        self.bridge.copy_registers(cs, out)
    }

    pub fn snapshot(&self, out: &mut [u8]) {
        critical_section::with(|cs| self.snapshot_cs(cs, out))
    }
}
