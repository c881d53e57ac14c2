use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use critical_section::{CriticalSection, Mutex};

use crate::{
    interrupts::InterruptBridge, slave::RegisterBridge, state_holder::StateHolder,
    write_mask::WriteMask, State,
};

pub const STATES_HISTORY_SIZE: usize = 8;

#[cfg(feature = "dump")]
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateDump {
    pub state_history: [State; STATES_HISTORY_SIZE],
    pub current_state: State,
    pub register_offset: u8,
    pub update_count: u8,
}

/// Everything the ISRs and the application share, one static per USI:
/// the register file, the protocol state, and the bookkeeping around
/// them. Intended to live in a `static` so the interrupt trampolines can
/// reach it.
pub struct Bridge<M: WriteMask, const N_REG: usize> {
    own_address: u8,
    general_call: bool,
    mask: M,

    registers: Mutex<RefCell<[u8; N_REG]>>,
    state_holder: StateHolder<STATES_HISTORY_SIZE>,
    post_ack_phase: AtomicBool,
    register_offset: AtomicU8,
    update_count: AtomicU8,
}

impl<M: WriteMask, const N_REG: usize> Bridge<M, N_REG> {
    /// A bridge answering to `own_address`, and to the general-call
    /// address as well, matching the wire behavior this engine inherited;
    /// see [`with_strict_addressing`](Bridge::with_strict_addressing).
    pub const fn new(own_address: u8, mask: M) -> Self {
        assert!(own_address <= 127, "own address must fit in 7 bits");
        assert!(
            N_REG >= 1 && N_REG <= 256,
            "register file must hold between 1 and 256 bytes"
        );

        Self {
            own_address,
            general_call: true,
            mask,
            registers: Mutex::new(RefCell::new([0; N_REG])),
            state_holder: StateHolder::new(),
            post_ack_phase: AtomicBool::new(false),
            register_offset: AtomicU8::new(0),
            update_count: AtomicU8::new(0),
        }
    }

    /// Answer only to `own_address`, rejecting the general call.
    pub const fn with_strict_addressing(mut self) -> Self {
        self.general_call = false;
        self
    }

    /// Current offset, advanced by one with wrap-around at the end of the
    /// register file. Division-free; this runs in the overflow ISR.
    fn advance_offset(&self) -> u8 {
        let current = self.register_offset.load(Ordering::SeqCst);
        let next = current.wrapping_add(1);
        self.register_offset.store(
            if (next as usize) < N_REG { next } else { 0 },
            Ordering::SeqCst,
        );
        current
    }

    #[cfg(feature = "dump")]
    pub fn dump_state(&self) -> StateDump {
        let mut state_history = [State::Idle; STATES_HISTORY_SIZE];

        critical_section::with(|cs| {
            let history = self.state_holder.history(cs);
            let start = STATES_HISTORY_SIZE - history.len();
            for (slot, state) in state_history[start..].iter_mut().zip(history.iter()) {
                *slot = *state;
            }
        });

        StateDump {
            state_history,
            current_state: self.state_holder.current(),
            register_offset: self.register_offset.load(Ordering::SeqCst),
            update_count: self.update_count.load(Ordering::SeqCst),
        }
    }
}

impl<M: WriteMask, const N_REG: usize> InterruptBridge for Bridge<M, N_REG> {
    fn own_address(&self) -> u8 {
        self.own_address
    }

    fn accepts_general_call(&self) -> bool {
        self.general_call
    }

    fn get_state(&self) -> State {
        self.state_holder.current()
    }

    fn set_state(&self, state: State) {
        self.state_holder.transition_to(state)
    }

    fn post_ack_phase(&self) -> bool {
        self.post_ack_phase.load(Ordering::SeqCst)
    }

    fn set_post_ack_phase(&self, armed: bool) {
        self.post_ack_phase.store(armed, Ordering::SeqCst)
    }

    fn reset_offset(&self) {
        self.register_offset.store(0, Ordering::SeqCst)
    }

    fn select_register(&self, index: u8) {
        self.register_offset.store(index, Ordering::SeqCst)
    }

    fn register_in_range(&self, index: u8) -> bool {
        (index as usize) < N_REG
    }

    fn commit_write(&self, cs: CriticalSection, byte: u8) {
        let offset = self.advance_offset() as usize;
        let mask = self.mask.mask_for(offset);

        let mut registers = self.registers.borrow_ref_mut(cs);
        registers[offset] = (registers[offset] & !mask) | (byte & mask);

        // Only the ISR writes this; the poller clears it with interrupts
        // off, so plain load/store is enough.
        let count = self.update_count.load(Ordering::SeqCst);
        self.update_count.store(count.wrapping_add(1), Ordering::SeqCst);
    }

    fn next_read_byte(&self, cs: CriticalSection) -> u8 {
        let offset = self.advance_offset() as usize;
        self.registers.borrow_ref(cs)[offset]
    }
}

impl<M: WriteMask, const N_REG: usize> RegisterBridge for Bridge<M, N_REG> {
    fn state(&self) -> State {
        self.state_holder.current()
    }

    fn write_pending(&self) -> bool {
        matches!(self.state_holder.current(), State::MasterWrite)
            && self.update_count.load(Ordering::SeqCst) != 0
    }

    fn finish_write(&self, _cs: CriticalSection) -> u8 {
        self.state_holder.transition_to(State::Idle);
        let count = self.update_count.load(Ordering::SeqCst);
        self.update_count.store(0, Ordering::SeqCst);
        count
    }

    fn register(&self, cs: CriticalSection, offset: usize) -> u8 {
        self.registers.borrow_ref(cs)[offset]
    }

    fn set_register(&self, cs: CriticalSection, offset: usize, value: u8) {
        self.registers.borrow_ref_mut(cs)[offset] = value;
    }

    fn copy_registers(&self, cs: CriticalSection, out: &mut [u8]) {
        let registers = self.registers.borrow_ref(cs);
        let n = out.len().min(registers.len());
        out[..n].copy_from_slice(&registers[..n]);
    }
}
