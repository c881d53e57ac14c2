#![cfg_attr(not(test), no_std)]

mod bridge;
mod interrupts;
mod slave;
mod state_holder;
pub mod usi;
mod write_mask;

#[cfg(all(target_arch = "avr", feature = "attiny85"))]
mod attiny85;
#[cfg(not(target_arch = "avr"))]
pub mod mock;

pub use bridge::Bridge;
pub use interrupts::{handle_overflow_interrupt, handle_start_interrupt, InterruptBridge};
pub use slave::{RegisterBridge, UsiSlave};
pub use usi::{SdaDirection, UsiPort};
pub use write_mask::{GlobalMask, RegisterMask, WriteMask};

#[cfg(all(target_arch = "avr", feature = "attiny85"))]
pub use attiny85::Attiny85Usi;

#[cfg(feature = "dump")]
pub use bridge::StateDump;

/// Position of the slave within an I2C transaction.
///
/// Only the start and overflow handlers move the machine, with one
/// exception: the stop poller returns it to `Idle` when a write
/// transaction ends.
#[derive(Debug, Clone, Copy, bytemuck::NoUninit)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum State {
    /// Nothing on the wire for us.
    Idle,
    /// START seen, waiting for the address byte.
    AddressMatch,
    /// Addressed for write, waiting for the register index.
    RegisterSelect,
    /// Sourcing register bytes onto the bus.
    MasterRead,
    /// Committing register bytes from the bus.
    MasterWrite,
}
