//! A software USI for host builds, driven by the test harness the way
//! the bus drives the real peripheral.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::usi::{self, SdaDirection, UsiPort};

/// The mock register block: shift register, write-one-to-clear status
/// flags, 4-bit counter, and the two pins the engine observes or steers.
#[derive(Debug, Clone, Copy)]
pub struct MockRegs {
    pub shift: u8,
    pub flags: u8,
    pub counter: u8,
    pub sda_is_output: bool,
    pub scl_high: bool,
    pub configured: bool,
}

impl MockRegs {
    const fn new() -> Self {
        Self {
            shift: 0,
            flags: 0,
            counter: 0,
            sda_is_output: false,
            scl_high: true,
            configured: false,
        }
    }
}

static REGS: Mutex<RefCell<MockRegs>> = Mutex::new(RefCell::new(MockRegs::new()));

/// `UsiPort` backed by one process-wide [`MockRegs`]. Tests sharing it
/// must take turns, just like firmware sharing one peripheral.
pub struct MockUsi;

impl MockUsi {
    pub fn reset() {
        Self::with_regs(|regs| *regs = MockRegs::new());
    }

    pub fn with_regs<R>(f: impl FnOnce(&mut MockRegs) -> R) -> R {
        critical_section::with(|cs| f(&mut REGS.borrow_ref_mut(cs)))
    }

    /// A start condition: the detector flag comes up and the master pulls
    /// SCL low to begin the address byte.
    pub fn raise_start() {
        Self::with_regs(|regs| {
            regs.flags |= usi::STATUS_START;
            regs.scl_high = false;
        });
    }

    pub fn raise_stop() {
        Self::with_regs(|regs| regs.flags |= usi::STATUS_STOP);
    }
}

impl UsiPort for MockUsi {
    fn read_shift_register() -> u8 {
        Self::with_regs(|regs| regs.shift)
    }

    fn write_shift_register(byte: u8) {
        Self::with_regs(|regs| regs.shift = byte);
    }

    fn read_status() -> u8 {
        Self::with_regs(|regs| regs.flags | (regs.counter & 0x0F))
    }

    fn write_status(byte: u8) {
        Self::with_regs(|regs| {
            regs.flags &= !(byte & 0xF0);
            regs.counter = byte & 0x0F;
        });
    }

    fn set_sda_direction(direction: SdaDirection) {
        Self::with_regs(|regs| regs.sda_is_output = matches!(direction, SdaDirection::Output));
    }

    fn scl_high() -> bool {
        Self::with_regs(|regs| regs.scl_high)
    }

    fn configure() {
        Self::with_regs(|regs| regs.configured = true);
    }
}
