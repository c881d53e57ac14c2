//! The real USI on the ATtiny85: SDA on PB0, SCL on PB2.

use avr_device::attiny85::{PORTB, USI};

use crate::usi::{self, SdaDirection, UsiPort};

fn regs() -> &'static avr_device::attiny85::usi::RegisterBlock {
    unsafe { &*USI::ptr() }
}

fn port() -> &'static avr_device::attiny85::portb::RegisterBlock {
    unsafe { &*PORTB::ptr() }
}

pub struct Attiny85Usi;

impl UsiPort for Attiny85Usi {
    fn read_shift_register() -> u8 {
        regs().usidr.read().bits()
    }

    fn write_shift_register(byte: u8) {
        regs().usidr.write(|w| w.bits(byte));
    }

    fn read_status() -> u8 {
        regs().usisr.read().bits()
    }

    fn write_status(byte: u8) {
        regs().usisr.write(|w| {
            w.usisif().bit(byte & usi::STATUS_START != 0);
            w.usioif().bit(byte & usi::STATUS_OVERFLOW != 0);
            w.usipf().bit(byte & usi::STATUS_STOP != 0);
            w.usidc().bit(byte & usi::STATUS_COLLISION != 0);
            w.usicnt().bits(byte & 0x0F)
        });
    }

    fn set_sda_direction(direction: SdaDirection) {
        match direction {
            SdaDirection::Output => port().ddrb.modify(|_, w| w.pb0().set_bit()),
            SdaDirection::Input => port().ddrb.modify(|_, w| w.pb0().clear_bit()),
        }
    }

    fn scl_high() -> bool {
        port().pinb.read().pb2().bit_is_set()
    }

    fn configure() {
        regs().usicr.write(|w| {
            w.usisie().set_bit();
            w.usioie().set_bit();
            w.usiwm().two_wire_slave();
            w.usics().ext_pos()
        });

        // SCL driven so the USI can stretch it, SDA released; pull-ups on
        // both lines.
        port().ddrb.modify(|_, w| {
            w.pb2().set_bit();
            w.pb0().clear_bit()
        });
        port().portb.modify(|_, w| {
            w.pb0().set_bit();
            w.pb2().set_bit()
        });
    }
}
