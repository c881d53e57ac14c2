/// Direction of the SDA pin as seen from the slave.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdaDirection {
    /// The bus (or the master) drives SDA; we sample it.
    Input,
    /// We drive SDA from the shift register's MSB.
    Output,
}

/// Status flag: a start condition was detected.
pub const STATUS_START: u8 = 1 << 7;
/// Status flag: the bit counter overflowed.
pub const STATUS_OVERFLOW: u8 = 1 << 6;
/// Status flag: a stop condition was detected. Never raises an interrupt.
pub const STATUS_STOP: u8 = 1 << 5;
/// Status flag: data collision on SDA.
pub const STATUS_COLLISION: u8 = 1 << 4;

/// Status write that clears every flag and arms the counter for a full
/// byte (eight shift edges).
pub const STATUS_EXPECT_BYTE: u8 = 0xF0;
/// Status write that clears the overflow flag but leaves the stop flag
/// for the poller. The low nibble is free for a counter value.
pub const STATUS_KEEP_STOP: u8 = 0xD0;
/// Counter value that overflows after a single shift edge, the ACK slot.
pub const COUNTER_ACK_SLOT: u8 = 14;

/// Shift register payload for driving the ninth clock low.
pub const ACK: u8 = 0x00;
/// Shift register payload that leaves the ninth clock high (MSB first).
pub const NAK: u8 = 0x80;

/// Access to one USI peripheral.
///
/// Associated functions rather than methods: the interrupt bodies have no
/// instance to carry, the same way the hardware registers have no owner.
/// The status register is write-sensitive: writing 1 to a flag bit
/// clears it, and the low nibble loads the bit counter. Implementations
/// must not turn [`write_status`](UsiPort::write_status) into a
/// read-modify-write.
pub trait UsiPort {
    /// Sample the shift register.
    fn read_shift_register() -> u8;

    /// Load the shift register. The MSB appears on SDA while the
    /// direction is [`SdaDirection::Output`].
    fn write_shift_register(byte: u8);

    /// Read the status register: flags in the high nibble, counter low.
    fn read_status() -> u8;

    /// Write the status register (see the trait docs for the semantics).
    fn write_status(byte: u8);

    /// Steer the SDA pin.
    fn set_sda_direction(direction: SdaDirection);

    /// Sample the SCL pin.
    fn scl_high() -> bool;

    /// One-time bring-up: start + overflow interrupts enabled, two-wire
    /// mode with SCL held low on counter overflow, shift clock from the
    /// external positive edge; SCL pin driven, SDA released, pull-ups on
    /// both.
    fn configure();
}
