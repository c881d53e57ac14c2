#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use avr_usi_i2c_slave::{
    handle_overflow_interrupt, handle_start_interrupt, Attiny85Usi, Bridge, RegisterMask, UsiSlave,
};
use panic_halt as _;

const SLAVE_ADDR: u8 = 0x40;
const N_REG: usize = 2;

// Register 0 drives the LED; register 1 has a read-only upper nibble.
static BRIDGE: Bridge<RegisterMask<N_REG>, N_REG> =
    Bridge::new(SLAVE_ADDR, RegisterMask([0xFF, 0x0F]));

#[avr_device::interrupt(attiny85)]
fn USI_START() {
    handle_start_interrupt::<Attiny85Usi, _>(&BRIDGE);
}

#[avr_device::interrupt(attiny85)]
fn USI_OVF() {
    handle_overflow_interrupt::<Attiny85Usi, _>(&BRIDGE);
}

#[avr_device::entry]
fn main() -> ! {
    let dp = avr_device::attiny85::Peripherals::take().unwrap();

    // LED on PB1.
    dp.PORTB.ddrb.modify(|_, w| w.pb1().set_bit());

    let slave = UsiSlave::<Attiny85Usi, _>::new(&BRIDGE);

    // Enable global interrupts
    unsafe { avr_device::interrupt::enable() };

    loop {
        if slave.check_stop() != 0 {
            if slave.read(0) != 0 {
                dp.PORTB.portb.modify(|_, w| w.pb1().set_bit());
            } else {
                dp.PORTB.portb.modify(|_, w| w.pb1().clear_bit());
            }
        }
    }
}
