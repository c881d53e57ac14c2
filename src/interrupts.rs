use critical_section::CriticalSection;

use crate::{
    usi::{self, SdaDirection, UsiPort},
    State,
};

/// ISR-side view of the state shared with the application.
pub trait InterruptBridge {
    fn own_address(&self) -> u8;

    fn accepts_general_call(&self) -> bool;

    fn get_state(&self) -> State;

    fn set_state(&self, state: State);

    fn post_ack_phase(&self) -> bool;

    fn set_post_ack_phase(&self, armed: bool);

    fn reset_offset(&self);

    /// Adopt a master-supplied register index. The caller has checked it
    /// with [`register_in_range`](InterruptBridge::register_in_range).
    fn select_register(&self, index: u8);

    fn register_in_range(&self, index: u8) -> bool;

    /// Merge one master-write byte into the current register under its
    /// write mask, bump the update count, and advance the offset.
    fn commit_write(&self, cs: CriticalSection, byte: u8);

    /// Fetch the current register byte for the master and advance the
    /// offset.
    fn next_read_byte(&self, cs: CriticalSection) -> u8;
}

/// Body of the start condition ISR.
///
/// Whatever the machine was doing, a START means the next byte is an
/// address byte. The hardware keeps SCL stretched until the start flag is
/// cleared, so the one bounded wait here, for the master to finish the
/// start condition and pull SCL low, is the only busy-wait in the engine.
pub fn handle_start_interrupt<U: UsiPort, B: InterruptBridge>(bridge: &B) {
    bridge.set_state(State::AddressMatch);

    while U::scl_high() {}

    U::write_status(usi::STATUS_EXPECT_BYTE);
}

/// Body of the counter overflow ISR.
///
/// Fires twice per byte: once when eight data bits have shifted through,
/// and once more after the single ACK-slot bit. The phase flag tells the
/// two apart and survives between entries.
///
/// In the first phase the slave owns the ninth clock: the address byte is
/// matched (ACK, or NAK and back to idle), a register index is validated
/// and adopted, or a data byte is committed under its write mask. A
/// master-read is the exception: the master owns that ACK slot, so SDA is
/// released and the shift register zeroed so a sampled ACK reads back as
/// zero.
///
/// In the second phase only a master-read has work left: sample the slot.
/// Zero means the master ACKed and wants another byte; anything else is
/// its NAK and the transaction is over.
pub fn handle_overflow_interrupt<U: UsiPort, B: InterruptBridge>(bridge: &B) {
    // The status register is write-sensitive; collect the flag-clear
    // pattern and counter value here and commit once on the way out.
    let mut status = usi::STATUS_KEEP_STOP;
    let mut sda = SdaDirection::Output;

    if !bridge.post_ack_phase() {
        match bridge.get_state() {
            State::AddressMatch => {
                let byte = U::read_shift_register();
                let target = byte >> 1;
                let matched = target == bridge.own_address()
                    || (target == 0 && bridge.accepts_general_call());

                if !matched {
                    bridge.set_state(State::Idle);
                    U::write_shift_register(usi::NAK);
                } else {
                    if byte & 1 != 0 {
                        bridge.set_state(State::MasterRead);
                    } else {
                        bridge.reset_offset();
                        bridge.set_state(State::RegisterSelect);
                    }
                    U::write_shift_register(usi::ACK);
                }
            }
            State::RegisterSelect => {
                let index = U::read_shift_register();
                if bridge.register_in_range(index) {
                    bridge.select_register(index);
                    bridge.set_state(State::MasterWrite);
                    U::write_shift_register(usi::ACK);
                } else {
                    bridge.set_state(State::Idle);
                    U::write_shift_register(usi::NAK);
                }
            }
            State::MasterRead => {
                U::write_shift_register(0);
                sda = SdaDirection::Input;
            }
            State::MasterWrite => {
                let byte = U::read_shift_register();
                critical_section::with(|cs| bridge.commit_write(cs, byte));
                U::write_shift_register(usi::ACK);
            }
            State::Idle => {
                // Overflow without a transaction; the next START resyncs.
                U::write_shift_register(usi::NAK);
            }
        }

        status |= usi::COUNTER_ACK_SLOT;
        bridge.set_post_ack_phase(true);
    } else {
        sda = SdaDirection::Input;

        if matches!(bridge.get_state(), State::MasterRead) {
            if U::read_shift_register() != 0 {
                bridge.reset_offset();
                bridge.set_state(State::Idle);
            } else {
                sda = SdaDirection::Output;
                let byte = critical_section::with(|cs| bridge.next_read_byte(cs));
                U::write_shift_register(byte);
            }
        }

        bridge.set_post_ack_phase(false);
    }

    U::set_sda_direction(sda);
    U::write_status(status);
}
