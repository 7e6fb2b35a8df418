//! Cartridge (ROM) related functions and structures.

use core::fmt;
use std::{
    cmp::max,
    fmt::{Display, Formatter},
};

use dotmatrix_common::{error::Error, util::read_file};

use crate::{debugln, mmu::BusComponent, warnln};

pub const ROM_BANK_SIZE: usize = 16384;
pub const RAM_BANK_SIZE: usize = 8192;

/// The size of the internal (half-byte) RAM built into
/// the MBC2 controller chip.
pub const MBC2_RAM_SIZE: usize = 512;

/// The boot logo magic that must be present in the cartridge
/// header (0x0104-0x0133) for the cartridge to be considered
/// valid, the real console verifies it at boot time.
pub const LOGO: [u8; 48] = [
    0xce, 0xed, 0x66, 0x66, 0xcc, 0x0d, 0x00, 0x0b, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0c, 0x00, 0x0d,
    0x00, 0x08, 0x11, 0x1f, 0x88, 0x89, 0x00, 0x0e, 0xdc, 0xcc, 0x6e, 0xe6, 0xdd, 0xdd, 0xd9, 0x99,
    0xbb, 0xbb, 0x67, 0x63, 0x6e, 0x0e, 0xec, 0xcc, 0xdd, 0xdc, 0x99, 0x9f, 0xbb, 0xb9, 0x33, 0x3e,
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MbcType {
    NoMbc,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
    Unknown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomType {
    RomOnly = 0x00,
    Mbc1 = 0x01,
    Mbc1Ram = 0x02,
    Mbc1RamBattery = 0x03,
    Mbc2 = 0x05,
    Mbc2Battery = 0x06,
    RomRam = 0x08,
    RomRamBattery = 0x09,
    Mmm01 = 0x0b,
    Mmm01Ram = 0x0c,
    Mmm01RamBattery = 0x0d,
    Mbc3TimerBattery = 0x0f,
    Mbc3TimerRamBattery = 0x10,
    Mbc3 = 0x11,
    Mbc3Ram = 0x12,
    Mbc3RamBattery = 0x13,
    Mbc5 = 0x19,
    Mbc5Ram = 0x1a,
    Mbc5RamBattery = 0x1b,
    Mbc5Rumble = 0x1c,
    Mbc5RumbleRam = 0x1d,
    Mbc5RumbleRamBattery = 0x1e,
    Mbc6 = 0x20,
    Mbc7SensorRumbleRamBattery = 0x22,
    PocketCamera = 0xfc,
    BandaiTama5 = 0xfd,
    HuC3 = 0xfe,
    HuC1RamBattery = 0xff,
    Unknown = 0xef,
}

impl RomType {
    pub fn description(&self) -> &'static str {
        match self {
            RomType::RomOnly => "ROM Only",
            RomType::Mbc1 => "MBC1",
            RomType::Mbc1Ram => "MBC1 + RAM",
            RomType::Mbc1RamBattery => "MBC1 + RAM + Battery",
            RomType::Mbc2 => "MBC2",
            RomType::Mbc2Battery => "MBC2 + Battery",
            RomType::RomRam => "ROM + RAM",
            RomType::RomRamBattery => "ROM + RAM + BATTERY",
            RomType::Mmm01 => "MMM01",
            RomType::Mmm01Ram => "MMM01 + RAM",
            RomType::Mmm01RamBattery => "MMM01 + RAM + BATTERY",
            RomType::Mbc3TimerBattery => "MBC3 + TIMER + BATTERY",
            RomType::Mbc3TimerRamBattery => "MBC3 + TIMER + RAM + BATTERY",
            RomType::Mbc3 => "MBC3",
            RomType::Mbc3Ram => "MBC3 + RAM",
            RomType::Mbc3RamBattery => "MBC3 + RAM + BATTERY",
            RomType::Mbc5 => "MBC5",
            RomType::Mbc5Ram => "MBC5 + RAM",
            RomType::Mbc5RamBattery => "MBC5 + RAM + BATTERY",
            RomType::Mbc5Rumble => "MBC5 + RUMBLE",
            RomType::Mbc5RumbleRam => "MBC5 + RUMBLE + RAM",
            RomType::Mbc5RumbleRamBattery => "MBC5 + RUMBLE + RAM + BATTERY",
            RomType::Mbc6 => "MBC6",
            RomType::Mbc7SensorRumbleRamBattery => "MBC7 + SENSOR + RUMBLE + RAM + BATTERY",
            RomType::PocketCamera => "POCKET CAMERA",
            RomType::BandaiTama5 => "BANDAI TAMA5",
            RomType::HuC3 => "HuC3",
            RomType::HuC1RamBattery => "HuC1 + RAM + BATTERY",
            RomType::Unknown => "Unknown",
        }
    }

    pub fn mbc_type(&self) -> MbcType {
        match self {
            RomType::RomOnly | RomType::RomRam | RomType::RomRamBattery => MbcType::NoMbc,
            RomType::Mbc1 | RomType::Mbc1Ram | RomType::Mbc1RamBattery => MbcType::Mbc1,
            RomType::Mbc2 | RomType::Mbc2Battery => MbcType::Mbc2,
            RomType::Mbc3
            | RomType::Mbc3Ram
            | RomType::Mbc3RamBattery
            | RomType::Mbc3TimerBattery
            | RomType::Mbc3TimerRamBattery => MbcType::Mbc3,
            RomType::Mbc5
            | RomType::Mbc5Ram
            | RomType::Mbc5RamBattery
            | RomType::Mbc5Rumble
            | RomType::Mbc5RumbleRam
            | RomType::Mbc5RumbleRamBattery => MbcType::Mbc5,
            _ => MbcType::Unknown,
        }
    }
}

impl Display for RomType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomSize {
    Size32K,
    Size64K,
    Size128K,
    Size256K,
    Size512K,
    Size1M,
    Size2M,
    Size4M,
    Size8M,
    SizeUnknown,
}

impl RomSize {
    pub fn description(&self) -> &'static str {
        match self {
            RomSize::Size32K => "32 KB",
            RomSize::Size64K => "64 KB",
            RomSize::Size128K => "128 KB",
            RomSize::Size256K => "256 KB",
            RomSize::Size512K => "512 KB",
            RomSize::Size1M => "1 MB",
            RomSize::Size2M => "2 MB",
            RomSize::Size4M => "4 MB",
            RomSize::Size8M => "8 MB",
            RomSize::SizeUnknown => "Unknown",
        }
    }

    pub fn rom_banks(&self) -> u16 {
        match self {
            RomSize::Size32K => 2,
            RomSize::Size64K => 4,
            RomSize::Size128K => 8,
            RomSize::Size256K => 16,
            RomSize::Size512K => 32,
            RomSize::Size1M => 64,
            RomSize::Size2M => 128,
            RomSize::Size4M => 256,
            RomSize::Size8M => 512,
            RomSize::SizeUnknown => 0,
        }
    }
}

impl Display for RomSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RamSize {
    NoRam,
    Size2K,
    Size8K,
    Size32K,
    Size64K,
    Size128K,
    SizeUnknown,
}

impl RamSize {
    pub fn description(&self) -> &'static str {
        match self {
            RamSize::NoRam => "No RAM",
            RamSize::Size2K => "2 KB",
            RamSize::Size8K => "8 KB",
            RamSize::Size32K => "32 KB",
            RamSize::Size64K => "64 KB",
            RamSize::Size128K => "128 KB",
            RamSize::SizeUnknown => "Unknown",
        }
    }

    pub fn ram_banks(&self) -> u16 {
        match self {
            RamSize::NoRam => 0,
            RamSize::Size2K => 1,
            RamSize::Size8K => 1,
            RamSize::Size32K => 4,
            RamSize::Size64K => 8,
            RamSize::Size128K => 16,
            RamSize::SizeUnknown => 0,
        }
    }
}

impl Display for RamSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Structure that defines the ROM and RAM contents of a Game Boy
/// cartridge. Should correctly address the specifics of all the
/// major MBCs (Memory Bank Controllers).
#[derive(Clone)]
pub struct Cartridge {
    /// The complete data of the ROM cartridge, should
    /// include the complete set of ROM banks.
    rom_data: Vec<u8>,

    /// The base RAM that is going to be used to store
    /// the external (cartridge) RAM contents.
    ram_data: Vec<u8>,

    /// The MBC (Memory Bank Controller) to be used for
    /// RAM and ROM access on the current cartridge.
    mbc: &'static Mbc,

    /// The number of ROM banks (of 16KB) that are available
    /// to the current cartridge, this is a computed value
    /// to allow improved performance.
    rom_bank_count: u16,

    /// The number of RAM banks (of 8KB) that are available
    /// to the current cartridge, this is a computed value
    /// to allow improved performance.
    ram_bank_count: u16,

    /// The offset address to the switchable ROM bank that is
    /// currently visible through the 0x4000-0x7FFF window.
    rom_offset: usize,

    /// The offset address to the ROM bank visible through the
    /// 0x0000-0x3FFF window, non zero only for MBC1 cartridges
    /// operating in banking mode 1 with large ROMs.
    rom_offset_low: usize,

    /// The offset address to the ERAM bank that is
    /// currently in use by the ROM cartridge.
    ram_offset: usize,

    /// If the RAM access is enabled, this flag allows
    /// control of memory access to avoid corruption.
    ram_enabled: bool,

    /// The 5-bit ROM bank latch of the MBC1 controller, kept
    /// raw so the effective bank can be recomputed whenever
    /// the upper latch or the banking mode change.
    rom_bank_low: u8,

    /// The 2-bit upper latch of the MBC1 controller, feeds
    /// either the RAM bank or the high ROM bank bits
    /// depending on the banking mode.
    rom_bank_high: u8,

    /// The banking mode flag of the MBC1 controller, mode 1
    /// enables RAM banking and low window bank switching.
    banking_mode: u8,

    /// If the RTC register file of the MBC3 is currently mapped
    /// over the RAM window, reads are undefined (0xFF) while set.
    rtc_selected: bool,

    /// The final offset of the last character of the title
    /// that is considered to be non zero (0x0) so that a
    /// proper safe conversion to UTF-8 string can be done.
    title_offset: usize,
}

impl Cartridge {
    pub fn new() -> Self {
        Self {
            rom_data: vec![],
            ram_data: vec![],
            mbc: &NO_MBC,
            rom_bank_count: 0,
            ram_bank_count: 0,
            rom_offset: 0x4000,
            rom_offset_low: 0x0000,
            ram_offset: 0x0000,
            ram_enabled: false,
            rom_bank_low: 0x1,
            rom_bank_high: 0x0,
            banking_mode: 0x0,
            rtc_selected: false,
            title_offset: 0x0143,
        }
    }

    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        let mut cartridge = Cartridge::new();
        cartridge.set_data(data)?;
        Ok(cartridge)
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let data = read_file(path)?;
        Self::from_data(&data)
    }

    /// Builds a header-valid cartridge backed by a zero filled
    /// 32KB ROM only image, useful for machine operation without
    /// a concrete ROM loaded.
    pub fn empty() -> Self {
        let mut data = vec![0x00u8; 2 * ROM_BANK_SIZE];
        data[0x0104..0x0134].copy_from_slice(&LOGO);
        data[0x014d] = Self::compute_checksum(&data);
        Self::from_data(&data).unwrap()
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x7FFF: 16 KiB ROM bank 00 & 16 KiB ROM Bank 01-NN
            0x0000..=0x7fff => (self.mbc.read_rom)(self, addr),
            // 0xA000-0xBFFF: 8 KiB External RAM
            0xa000..=0xbfff => (self.mbc.read_ram)(self, addr),
            _ => {
                debugln!("Reading from unknown Cartridge control 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x7FFF: 16 KiB ROM bank 00 & 16 KiB ROM Bank 01-NN
            0x0000..=0x7fff => (self.mbc.write_rom)(self, addr, value),
            // 0xA000-0xBFFF: 8 KiB External RAM
            0xa000..=0xbfff => (self.mbc.write_ram)(self, addr, value),
            _ => debugln!("Writing to unknown Cartridge address 0x{:04x}", addr),
        }
    }

    pub fn reset(&mut self) {
        self.rom_data = vec![];
        self.ram_data = vec![];
        self.mbc = &NO_MBC;
        self.rom_bank_count = 0;
        self.ram_bank_count = 0;
        self.rom_offset = 0x4000;
        self.rom_offset_low = 0x0000;
        self.ram_offset = 0x0000;
        self.ram_enabled = false;
        self.rom_bank_low = 0x1;
        self.rom_bank_high = 0x0;
        self.banking_mode = 0x0;
        self.rtc_selected = false;
        self.title_offset = 0x0143;
    }

    pub fn mbc(&self) -> Result<&'static Mbc, Error> {
        Ok(match self.rom_type().mbc_type() {
            MbcType::NoMbc => &NO_MBC,
            MbcType::Mbc1 => &MBC1,
            MbcType::Mbc2 => &MBC2,
            MbcType::Mbc3 => &MBC3,
            MbcType::Mbc5 => &MBC5,
            MbcType::Unknown => {
                return Err(Error::UnsupportedMapper(String::from(
                    self.rom_type().description(),
                )))
            }
        })
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn set_ram_enabled(&mut self, ram_enabled: bool) {
        self.ram_enabled = ram_enabled
    }

    pub fn ram_bank(&self) -> u8 {
        (self.ram_offset / RAM_BANK_SIZE) as u8
    }

    pub fn set_ram_bank(&mut self, ram_bank: u8) {
        self.ram_offset = ram_bank as usize * RAM_BANK_SIZE;
    }

    pub fn rom_bank(&self) -> u16 {
        (self.rom_offset / ROM_BANK_SIZE) as u16
    }

    pub fn set_rom_bank(&mut self, rom_bank: u16) {
        self.rom_offset = rom_bank as usize * ROM_BANK_SIZE;
    }

    pub fn rom_bank_low(&self) -> u16 {
        (self.rom_offset_low / ROM_BANK_SIZE) as u16
    }

    pub fn set_rom_bank_low(&mut self, rom_bank: u16) {
        self.rom_offset_low = rom_bank as usize * ROM_BANK_SIZE;
    }

    /// Re-computes the effective ROM and RAM offsets for the MBC1
    /// from its raw latches, masking the resulting bank numbers to
    /// the sizes available on the cartridge (out of range wraps).
    fn update_mbc1_banks(&mut self) {
        let rom_mask = self.rom_bank_count.saturating_sub(1);

        // the zero to one promotion applies to the raw 5-bit latch,
        // masking to the available banks happens only afterwards
        let mut rom_bank_low = self.rom_bank_low as u16 & 0x1f;
        if rom_bank_low == 0 {
            rom_bank_low = 1;
        }
        let rom_bank = (((self.rom_bank_high as u16) << 5) | rom_bank_low) & rom_mask;
        self.set_rom_bank(rom_bank);

        if self.banking_mode == 0x1 {
            self.set_rom_bank_low(((self.rom_bank_high as u16) << 5) & rom_mask);
            let ram_mask = self.ram_bank_count.saturating_sub(1) as u8;
            self.set_ram_bank(self.rom_bank_high & 0x03 & ram_mask);
        } else {
            self.set_rom_bank_low(0);
            self.set_ram_bank(0);
        }
    }

    fn set_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.ensure_data(data)?;
        self.rom_data = data.to_vec();
        self.ensure_header()?;
        self.rom_offset = 0x4000;
        self.rom_offset_low = 0x0000;
        self.ram_offset = 0x0000;
        self.set_mbc()?;
        self.set_computed();
        self.set_title_offset();
        self.allocate_ram();
        self.set_rom_bank(1);
        self.set_ram_bank(0);
        Ok(())
    }

    fn set_mbc(&mut self) -> Result<(), Error> {
        self.mbc = self.mbc()?;
        Ok(())
    }

    fn set_computed(&mut self) {
        self.rom_bank_count = self.rom_size().rom_banks();
        self.ram_bank_count = self.ram_size().ram_banks();
    }

    pub fn set_title_offset(&mut self) {
        let mut offset: usize = 0;
        for byte in &self.rom_data[0x0134..=0x0143] {
            if *byte == 0u8 {
                break;
            }
            // the final byte of the title is reserved for CGB
            // compatibility testing, must be ignored for title
            // processing purposes when it carries flag values
            if offset > 14 && (*byte == 0x80 || *byte == 0xc0) {
                break;
            }
            offset += 1;
        }
        self.title_offset = 0x0134 + offset;
    }

    fn allocate_ram(&mut self) {
        if self.rom_type().mbc_type() == MbcType::Mbc2 {
            self.ram_data = vec![0u8; MBC2_RAM_SIZE];
            return;
        }
        let ram_banks = max(self.ram_size().ram_banks(), 1);
        self.ram_data = vec![0u8; ram_banks as usize * RAM_BANK_SIZE];
    }

    /// Ensures that the data provided is of a valid Game Boy ROM
    /// and that it's size is within the expected range.
    fn ensure_data(&self, data: &[u8]) -> Result<(), Error> {
        if data.len() < 2 * ROM_BANK_SIZE {
            return Err(Error::RomSize);
        }
        if data.len() % ROM_BANK_SIZE != 0 {
            return Err(Error::RomSize);
        }
        Ok(())
    }

    /// Runs the set of header validations expected at cartridge
    /// loading: boot logo magic, size codes within the documented
    /// tables and (non fatal) header checksum matching.
    fn ensure_header(&self) -> Result<(), Error> {
        if !self.valid_logo() {
            return Err(Error::InvalidHeader);
        }
        if self.rom_size() == RomSize::SizeUnknown {
            return Err(Error::InvalidHeader);
        }
        if self.ram_size() == RamSize::SizeUnknown {
            return Err(Error::InvalidHeader);
        }
        if !self.valid_checksum() {
            warnln!(
                "Cartridge header checksum mismatch (expected 0x{:02x}, got 0x{:02x})",
                self.checksum(),
                self.rom_data[0x014d]
            );
        }
        Ok(())
    }
}

impl Cartridge {
    pub fn title(&self) -> String {
        String::from(
            std::str::from_utf8(&self.rom_data[0x0134..self.title_offset])
                .unwrap_or("")
                .trim(),
        )
    }

    pub fn rom_type(&self) -> RomType {
        match self.rom_data[0x0147] {
            0x00 => RomType::RomOnly,
            0x01 => RomType::Mbc1,
            0x02 => RomType::Mbc1Ram,
            0x03 => RomType::Mbc1RamBattery,
            0x05 => RomType::Mbc2,
            0x06 => RomType::Mbc2Battery,
            0x08 => RomType::RomRam,
            0x09 => RomType::RomRamBattery,
            0x0b => RomType::Mmm01,
            0x0c => RomType::Mmm01Ram,
            0x0d => RomType::Mmm01RamBattery,
            0x0f => RomType::Mbc3TimerBattery,
            0x10 => RomType::Mbc3TimerRamBattery,
            0x11 => RomType::Mbc3,
            0x12 => RomType::Mbc3Ram,
            0x13 => RomType::Mbc3RamBattery,
            0x19 => RomType::Mbc5,
            0x1a => RomType::Mbc5Ram,
            0x1b => RomType::Mbc5RamBattery,
            0x1c => RomType::Mbc5Rumble,
            0x1d => RomType::Mbc5RumbleRam,
            0x1e => RomType::Mbc5RumbleRamBattery,
            0x20 => RomType::Mbc6,
            0x22 => RomType::Mbc7SensorRumbleRamBattery,
            0xfc => RomType::PocketCamera,
            0xfd => RomType::BandaiTama5,
            0xfe => RomType::HuC3,
            0xff => RomType::HuC1RamBattery,
            _ => RomType::Unknown,
        }
    }

    pub fn rom_size(&self) -> RomSize {
        match self.rom_data[0x0148] {
            0x00 => RomSize::Size32K,
            0x01 => RomSize::Size64K,
            0x02 => RomSize::Size128K,
            0x03 => RomSize::Size256K,
            0x04 => RomSize::Size512K,
            0x05 => RomSize::Size1M,
            0x06 => RomSize::Size2M,
            0x07 => RomSize::Size4M,
            0x08 => RomSize::Size8M,
            _ => RomSize::SizeUnknown,
        }
    }

    pub fn ram_size(&self) -> RamSize {
        match self.rom_data[0x0149] {
            0x00 => RamSize::NoRam,
            0x01 => RamSize::Size2K,
            0x02 => RamSize::Size8K,
            0x03 => RamSize::Size32K,
            0x04 => RamSize::Size128K,
            0x05 => RamSize::Size64K,
            _ => RamSize::SizeUnknown,
        }
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc1RamBattery
                | RomType::Mbc2Battery
                | RomType::RomRamBattery
                | RomType::Mmm01RamBattery
                | RomType::Mbc3TimerBattery
                | RomType::Mbc3TimerRamBattery
                | RomType::Mbc3RamBattery
                | RomType::Mbc5RamBattery
                | RomType::Mbc5RumbleRamBattery
                | RomType::Mbc7SensorRumbleRamBattery
                | RomType::HuC1RamBattery
        )
    }

    pub fn valid_logo(&self) -> bool {
        self.rom_data[0x0104..0x0134] == LOGO
    }

    pub fn checksum(&self) -> u8 {
        Self::compute_checksum(&self.rom_data)
    }

    pub fn valid_checksum(&self) -> bool {
        self.rom_data[0x014d] == self.checksum()
    }

    fn compute_checksum(data: &[u8]) -> u8 {
        let mut sum: u8 = 0;
        for byte in &data[0x0134..=0x014c] {
            sum = sum.wrapping_sub(*byte).wrapping_sub(1);
        }
        sum
    }

    pub fn rom_type_s(&self) -> String {
        String::from(self.rom_type().description())
    }

    pub fn rom_size_s(&self) -> String {
        String::from(self.rom_size().description())
    }

    pub fn ram_size_s(&self) -> String {
        String::from(self.ram_size().description())
    }

    pub fn rom_data_eager(&self) -> Vec<u8> {
        self.rom_data.clone()
    }

    pub fn ram_data_eager(&self) -> Vec<u8> {
        self.ram_data.clone()
    }

    pub fn set_ram_data(&mut self, data: &[u8]) {
        self.ram_data = data.to_vec();
    }

    pub fn clear_ram_data(&mut self) {
        self.ram_data = vec![0u8; self.ram_data.len()];
    }

    pub fn rom_data(&self) -> &Vec<u8> {
        &self.rom_data
    }

    pub fn rom_data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.rom_data
    }

    pub fn ram_data(&self) -> &Vec<u8> {
        &self.ram_data
    }

    pub fn ram_data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.ram_data
    }

    pub fn description(&self, column_length: usize) -> String {
        let title_l = format!("{:width$}", "Title", width = column_length);
        let type_l = format!("{:width$}", "Type", width = column_length);
        let rom_size_l = format!("{:width$}", "ROM Size", width = column_length);
        let ram_size_l = format!("{:width$}", "RAM Size", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}",
            title_l,
            self.title(),
            type_l,
            self.rom_type(),
            rom_size_l,
            self.rom_size(),
            ram_size_l,
            self.ram_size(),
        )
    }
}

impl BusComponent for Cartridge {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}

pub struct Mbc {
    pub name: &'static str,
    pub read_rom: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_rom: fn(rom: &mut Cartridge, addr: u16, value: u8),
    pub read_ram: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_ram: fn(rom: &mut Cartridge, addr: u16, value: u8),
}

pub static NO_MBC: Mbc = Mbc {
    name: "No MBC",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.rom_data.get(addr as usize).unwrap_or(&0xff)
    },
    write_rom: |_rom: &mut Cartridge, addr: u16, _value: u8| {
        // some games write to the banking range even on plain
        // cartridges, the writes are simply dropped
        debugln!("Ignored write to Cartridge ROM location 0x{:04x}", addr);
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.ram_data.get((addr - 0xa000) as usize).unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        let index = (addr - 0xa000) as usize;
        if index < rom.ram_data.len() {
            rom.ram_data[index] = value;
        }
    },
};

pub static MBC1: Mbc = Mbc {
    name: "MBC1",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank X0 (mode dependent)
            0x0000..=0x3fff => *rom
                .rom_data
                .get(rom.rom_offset_low + addr as usize)
                .unwrap_or(&0xff),
            // 0x4000-0x7FFF - ROM bank 01-7F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM enabled flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
            }
            // 0x2000-0x3FFF - ROM bank selection 5 lower bits
            0x2000..=0x3fff => {
                rom.rom_bank_low = value & 0x1f;
                rom.update_mbc1_banks();
            }
            // 0x4000-0x5FFF - RAM bank selection and ROM bank selection upper bits
            0x4000..=0x5fff => {
                rom.rom_bank_high = value & 0x03;
                rom.update_mbc1_banks();
            }
            // 0x6000-0x7FFF - Banking mode selection
            0x6000..=0x7fff => {
                rom.banking_mode = value & 0x01;
                rom.update_mbc1_banks();
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled || rom.ram_bank_count == 0 {
            return 0xff;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize]
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled || rom.ram_bank_count == 0 {
            return;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize] = value;
    },
};

pub static MBC2: Mbc = Mbc {
    name: "MBC2",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => *rom.rom_data.get(addr as usize).unwrap_or(&0xff),
            // 0x4000-0x7FFF - ROM bank 01-0F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x3FFF - RAM enable or ROM bank selection,
            // multiplexed over bit 8 of the written address
            0x0000..=0x3fff => {
                if addr & 0x0100 == 0x0000 {
                    rom.ram_enabled = (value & 0x0f) == 0x0a;
                } else {
                    let mut rom_bank = (value & 0x0f) as u16;
                    rom_bank &= rom.rom_bank_count.saturating_sub(1);
                    if rom_bank == 0 {
                        rom_bank = 1;
                    }
                    rom.set_rom_bank(rom_bank);
                }
            }
            _ => debugln!("Ignored write to Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        // only the lower nibble is stored, the 512 half-bytes
        // are echoed through the complete 0xA000-0xBFFF window
        0xf0 | (rom.ram_data[(addr as usize - 0xa000) % MBC2_RAM_SIZE] & 0x0f)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            return;
        }
        rom.ram_data[(addr as usize - 0xa000) % MBC2_RAM_SIZE] = value & 0x0f;
    },
};

pub static MBC3: Mbc = Mbc {
    name: "MBC3",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => *rom.rom_data.get(addr as usize).unwrap_or(&0xff),
            // 0x4000-0x7FFF - ROM bank 01-7F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM enabled flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
            }
            // 0x2000-0x3FFF - ROM bank selection
            0x2000..=0x3fff => {
                let mut rom_bank = value as u16 & 0x7f;
                rom_bank &= rom.rom_bank_count.saturating_sub(1);
                if rom_bank == 0 {
                    rom_bank = 1;
                }
                rom.set_rom_bank(rom_bank);
            }
            // 0x4000-0x5FFF - RAM bank selection or RTC register
            // selection (0x08-0x0C), RTC is not emulated so those
            // codes only unmap the RAM window
            0x4000..=0x5fff => {
                if (0x08..=0x0c).contains(&value) {
                    rom.rtc_selected = true;
                    return;
                }
                rom.rtc_selected = false;
                let ram_bank = value & 0x03;
                if ram_bank as u16 >= rom.ram_bank_count {
                    return;
                }
                rom.set_ram_bank(ram_bank);
            }
            // 0x6000-0x7FFF - RTC latch sequence, ignored
            0x6000..=0x7fff => (),
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled || rom.rtc_selected || rom.ram_bank_count == 0 {
            return 0xff;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize]
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled || rom.rtc_selected || rom.ram_bank_count == 0 {
            return;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize] = value;
    },
};

pub static MBC5: Mbc = Mbc {
    name: "MBC5",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => *rom.rom_data.get(addr as usize).unwrap_or(&0xff),
            // 0x4000-0x7FFF - ROM bank 00-1FF
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM enabled flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
            }
            // 0x2000-0x2FFF - ROM bank selection 8 lower bits
            0x2000..=0x2fff => {
                let rom_bank =
                    ((rom.rom_bank() & 0x0100) | value as u16) & rom.rom_bank_count.saturating_sub(1);
                rom.set_rom_bank(rom_bank);
            }
            // 0x3000-0x3FFF - ROM bank selection 9th bit
            0x3000..=0x3fff => {
                let rom_bank = ((rom.rom_bank() & 0x00ff) | (((value & 0x01) as u16) << 8))
                    & rom.rom_bank_count.saturating_sub(1);
                rom.set_rom_bank(rom_bank);
            }
            // 0x4000-0x5FFF - RAM bank selection
            0x4000..=0x5fff => {
                let ram_bank = value & 0x0f;
                if ram_bank as u16 >= rom.ram_bank_count {
                    return;
                }
                rom.set_ram_bank(ram_bank);
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled || rom.ram_bank_count == 0 {
            return 0xff;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize]
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled || rom.ram_bank_count == 0 {
            return;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize] = value;
    },
};

#[cfg(test)]
mod tests {
    use dotmatrix_common::error::Error;

    use super::{Cartridge, MbcType, RamSize, RomSize, RomType, LOGO, ROM_BANK_SIZE};

    fn build_rom(rom_type: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
        let banks = 2usize << rom_size;
        let mut data = vec![0x00u8; banks * ROM_BANK_SIZE];
        data[0x0104..0x0134].copy_from_slice(&LOGO);
        data[0x0147] = rom_type;
        data[0x0148] = rom_size;
        data[0x0149] = ram_size;
        let mut sum: u8 = 0;
        for index in 0x0134..=0x014c {
            sum = sum.wrapping_sub(data[index]).wrapping_sub(1);
        }
        data[0x014d] = sum;
        data
    }

    #[test]
    fn test_header_parsing() {
        let data = build_rom(0x01, 0x01, 0x02);
        let rom = Cartridge::from_data(&data).unwrap();
        assert_eq!(rom.rom_type(), RomType::Mbc1);
        assert_eq!(rom.rom_type().mbc_type(), MbcType::Mbc1);
        assert_eq!(rom.rom_size(), RomSize::Size64K);
        assert_eq!(rom.ram_size(), RamSize::Size8K);
        assert!(rom.valid_logo());
        assert!(rom.valid_checksum());
    }

    #[test]
    fn test_invalid_logo() {
        let mut data = build_rom(0x00, 0x00, 0x00);
        data[0x0104] = 0x00;
        let result = Cartridge::from_data(&data);
        assert_eq!(result.err(), Some(Error::InvalidHeader));
    }

    #[test]
    fn test_unsupported_mapper() {
        let data = build_rom(0xff, 0x00, 0x00);
        let result = Cartridge::from_data(&data);
        assert_eq!(
            result.err(),
            Some(Error::UnsupportedMapper(String::from(
                "HuC1 + RAM + BATTERY"
            )))
        );
    }

    #[test]
    fn test_rom_size_error() {
        let result = Cartridge::from_data(&vec![0x00u8; 0x1000]);
        assert_eq!(result.err(), Some(Error::RomSize));
    }

    #[test]
    fn test_mbc1_bank_switch() {
        let mut data = build_rom(0x01, 0x02, 0x00);
        data[4 * ROM_BANK_SIZE] = 0x42;
        let mut rom = Cartridge::from_data(&data).unwrap();

        assert_eq!(rom.rom_bank(), 1);
        rom.write(0x2000, 0x04);
        assert_eq!(rom.rom_bank(), 4);
        assert_eq!(rom.read(0x4000), 0x42);

        // a written value of zero is promoted to bank 1
        rom.write(0x2000, 0x00);
        assert_eq!(rom.rom_bank(), 1);
    }

    #[test]
    fn test_mbc1_bank_wrap() {
        // 64 KB image has 4 banks, bank 6 wraps to bank 2
        let mut data = build_rom(0x01, 0x01, 0x00);
        data[2 * ROM_BANK_SIZE] = 0x24;
        let mut rom = Cartridge::from_data(&data).unwrap();
        rom.write(0x2000, 0x06);
        assert_eq!(rom.rom_bank(), 2);
        assert_eq!(rom.read(0x4000), 0x24);
    }

    #[test]
    fn test_mbc1_ram_enable() {
        let data = build_rom(0x03, 0x00, 0x02);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0xa000, 0x42);
        assert_eq!(rom.read(0xa000), 0xff);

        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0x42);
        assert_eq!(rom.read(0xa000), 0x42);

        rom.write(0x0000, 0x00);
        assert_eq!(rom.read(0xa000), 0xff);
    }

    #[test]
    fn test_mbc2_ram_nibbles() {
        let data = build_rom(0x06, 0x00, 0x00);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0xff);
        assert_eq!(rom.read(0xa000), 0xff);
        rom.write(0xa001, 0x05);
        assert_eq!(rom.read(0xa001), 0xf5);

        // the 512 half-bytes echo through the complete window
        assert_eq!(rom.read(0xa200), 0xff);
        assert_eq!(rom.read(0xa201), 0xf5);
    }

    #[test]
    fn test_mbc2_bank_select() {
        let mut data = build_rom(0x05, 0x02, 0x00);
        data[3 * ROM_BANK_SIZE] = 0x77;
        let mut rom = Cartridge::from_data(&data).unwrap();

        // bit 8 of the address selects between RAM enable and
        // ROM bank selection
        rom.write(0x2100, 0x03);
        assert_eq!(rom.rom_bank(), 3);
        assert_eq!(rom.read(0x4000), 0x77);
        assert!(!rom.ram_enabled());
    }

    #[test]
    fn test_mbc3_rtc_select() {
        let data = build_rom(0x10, 0x00, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0x13);
        assert_eq!(rom.read(0xa000), 0x13);

        rom.write(0x4000, 0x08);
        assert_eq!(rom.read(0xa000), 0xff);

        rom.write(0x4000, 0x00);
        assert_eq!(rom.read(0xa000), 0x13);
    }

    #[test]
    fn test_mbc5_nine_bit_bank() {
        let mut data = build_rom(0x19, 0x08, 0x00);
        data[0x101 * ROM_BANK_SIZE] = 0x99;
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x2000, 0x01);
        rom.write(0x3000, 0x01);
        assert_eq!(rom.rom_bank(), 0x101);
        assert_eq!(rom.read(0x4000), 0x99);

        // bank zero is allowed on MBC5
        rom.write(0x2000, 0x00);
        rom.write(0x3000, 0x00);
        assert_eq!(rom.rom_bank(), 0);
    }
}
