use std::fmt;

/// Modem status bitmask as reported by the serial driver.
///
/// Bit values follow the Win32 `GetCommModemStatus` layout so that hosts which
/// already understand those numbers keep working on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModemStatus(u32);

impl ModemStatus {
    /// Clear-to-send is on.
    pub const CTS: u32 = 0x0010;
    /// Data-set-ready is on.
    pub const DSR: u32 = 0x0020;
    /// Ring indicator is on.
    pub const RING: u32 = 0x0040;
    /// Receive-line-signal-detect (carrier) is on.
    pub const RLSD: u32 = 0x0080;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Build a snapshot from the four individual input lines.
    pub fn from_lines(cts: bool, dsr: bool, ring: bool, carrier: bool) -> Self {
        let mut bits = 0;
        if cts {
            bits |= Self::CTS;
        }
        if dsr {
            bits |= Self::DSR;
        }
        if ring {
            bits |= Self::RING;
        }
        if carrier {
            bits |= Self::RLSD;
        }
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn cts(self) -> bool {
        self.0 & Self::CTS != 0
    }

    pub fn dsr(self) -> bool {
        self.0 & Self::DSR != 0
    }

    pub fn ring(self) -> bool {
        self.0 & Self::RING != 0
    }

    pub fn carrier(self) -> bool {
        self.0 & Self::RLSD != 0
    }
}

impl From<u32> for ModemStatus {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

/// Decimal rendering, which is what the state sink receives.
impl fmt::Display for ModemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
