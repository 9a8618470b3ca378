//! Registered adder device.

use crate::sim::ClockedDevice;
use std::fmt;

/// Widest operand the adder supports; the sum needs one extra bit.
pub const MAX_WIDTH: u32 = 63;

/// Default operand width.
pub const DEFAULT_WIDTH: u32 = 32;

/// Names of the device's signals, as used in logs.
pub mod signal {
    pub const INA: &str = "ina";
    pub const INB: &str = "inb";
    pub const RES: &str = "res";
    pub const RST_N: &str = "rst_n";
}

/// A `width`-bit adder with a registered `width + 1`-bit output.
///
/// On every rising edge `res` takes `ina + inb`, or zero while `rst_n` is low.
pub struct Adder {
    width: u32,
    ina: u64,
    inb: u64,
    rst_n: bool,
    res: u64,
}

impl Adder {
    /// Creates an adder out of reset with all signals at zero.
    ///
    /// `width` is clamped to `1..=MAX_WIDTH`.
    pub fn new(width: u32) -> Self {
        Self {
            width: width.clamp(1, MAX_WIDTH),
            ina: 0,
            inb: 0,
            rst_n: true,
            res: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Largest value accepted on an input.
    pub fn max_operand(&self) -> u64 {
        (1u64 << self.width) - 1
    }

    /// Returns true if `value` fits on an input.
    pub fn accepts(&self, value: u64) -> bool {
        value <= self.max_operand()
    }

    pub fn set_ina(&mut self, value: u64) {
        self.ina = value & self.max_operand();
    }

    pub fn set_inb(&mut self, value: u64) {
        self.inb = value & self.max_operand();
    }

    pub fn rst_n(&self) -> bool {
        self.rst_n
    }

    /// Registered output.
    pub fn res(&self) -> u64 {
        self.res
    }
}

impl Default for Adder {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

impl ClockedDevice for Adder {
    fn rising_edge(&mut self) {
        self.res = if self.rst_n { self.ina + self.inb } else { 0 };
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst_n = !asserted;
    }
}

impl fmt::Debug for Adder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adder")
            .field("width", &self.width)
            .field(signal::INA, &self.ina)
            .field(signal::INB, &self.inb)
            .field(signal::RST_N, &self.rst_n)
            .field(signal::RES, &self.res)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_registered() {
        let mut adder = Adder::default();
        adder.set_ina(3);
        adder.set_inb(4);
        assert_eq!(adder.res(), 0, "output must not change before the edge");

        adder.rising_edge();
        assert_eq!(adder.res(), 7);
    }

    #[test]
    fn test_reset_forces_zero() {
        let mut adder = Adder::default();
        adder.set_ina(1);
        adder.set_inb(1);
        adder.rising_edge();
        assert_eq!(adder.res(), 2);

        adder.set_reset(true);
        assert!(!adder.rst_n());
        adder.rising_edge();
        assert_eq!(adder.res(), 0);

        adder.set_reset(false);
        adder.rising_edge();
        assert_eq!(adder.res(), 2);
    }

    #[test]
    fn test_sum_uses_carry_bit() {
        let mut adder = Adder::new(8);
        assert_eq!(adder.max_operand(), 255);
        adder.set_ina(255);
        adder.set_inb(255);
        adder.rising_edge();
        assert_eq!(adder.res(), 510);
    }

    #[test]
    fn test_width_is_clamped() {
        assert_eq!(Adder::new(0).width(), 1);
        assert_eq!(Adder::new(64).width(), MAX_WIDTH);
        let wide = Adder::new(MAX_WIDTH);
        assert!(wide.accepts(wide.max_operand()));
        assert!(!wide.accepts(u64::MAX));
    }
}
