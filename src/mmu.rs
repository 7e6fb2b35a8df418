//! MMU (Memory Management Unit) functions and structures.

use crate::{
    apu::Apu, dma::Dma, gb::Components, pad::Pad, ppu::Ppu, rom::Cartridge, serial::Serial,
    timer::Timer, warnln,
};

/// The size of the work RAM (WRAM) of the system.
pub const RAM_SIZE: usize = 8192;

pub trait BusComponent {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
    fn read_many(&self, addr: u16, count: usize) -> Vec<u8> {
        (0..count)
            .map(|offset| self.read(addr + offset as u16))
            .collect()
    }
    fn write_many(&mut self, addr: u16, values: &[u8]) {
        for (offset, &value) in values.iter().enumerate() {
            self.write(addr + offset as u16, value);
        }
    }
}

/// The memory bus of the system, owns every memory mapped
/// component and routes the 16-bit address space into them.
pub struct Mmu {
    /// Register that controls the interrupts that are considered
    /// to be enabled and should be triggered.
    pub ie: u8,

    /// Reference to the PPU (Pixel Processing Unit) that is going
    /// to be used both for VRAM reading/writing and to forward
    /// some of the access operations.
    ppu: Ppu,

    /// Reference to the APU (Audio Processing Unit) that is going
    /// to be used both for register reading/writing and to forward
    /// some of the access operations.
    apu: Apu,

    /// Reference to the DMA (Direct Memory Access) controller that is
    /// going to be used for CPU offloaded OAM memory transfers.
    dma: Dma,

    /// Reference to the Gamepad structure that is going to control
    /// the I/O access to this device.
    pad: Pad,

    /// The timer controller to be used as part of the I/O access
    /// that is memory mapped.
    timer: Timer,

    /// The serial data transfer controller to be used to control the
    /// link cable connection, this component is memory mapped.
    serial: Serial,

    /// The cartridge ROM that is currently loaded into the system,
    /// going to be used to access ROM and external RAM banks.
    rom: Cartridge,

    /// Buffer that is used to store the work RAM of the system,
    /// mapped in range 0xC000-0xDFFF and echoed at 0xE000-0xFDFF.
    ram: Vec<u8>,
}

impl Mmu {
    pub fn new(components: Components) -> Self {
        Self {
            ppu: components.ppu,
            apu: components.apu,
            dma: components.dma,
            pad: components.pad,
            timer: components.timer,
            serial: components.serial,
            rom: Cartridge::new(),
            ram: vec![],
            ie: 0x0,
        }
    }

    pub fn reset(&mut self) {
        self.rom = Cartridge::new();
        self.ram = vec![0x00; RAM_SIZE];
        self.ie = 0x0;
    }

    pub fn allocate(&mut self) {
        self.ram = vec![0x00; RAM_SIZE];
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn ppu_i(&self) -> &Ppu {
        &self.ppu
    }

    pub fn apu(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn apu_i(&self) -> &Apu {
        &self.apu
    }

    pub fn dma(&mut self) -> &mut Dma {
        &mut self.dma
    }

    pub fn dma_i(&self) -> &Dma {
        &self.dma
    }

    pub fn pad(&mut self) -> &mut Pad {
        &mut self.pad
    }

    pub fn pad_i(&self) -> &Pad {
        &self.pad
    }

    pub fn timer(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn timer_i(&self) -> &Timer {
        &self.timer
    }

    pub fn serial(&mut self) -> &mut Serial {
        &mut self.serial
    }

    pub fn serial_i(&self) -> &Serial {
        &self.serial
    }

    /// Advances the OAM DMA transfer by the provided number of
    /// cycles, once the complete 640 cycle period has elapsed the
    /// 160 byte block is copied into OAM in a single operation.
    pub fn clock_dma(&mut self, cycles: u16) {
        if !self.dma.active() {
            return;
        }

        let cycles_dma = self.dma.cycles_dma().saturating_sub(cycles);
        if cycles_dma == 0x0 {
            let base = (self.dma.value_dma() as u16) << 8;
            for index in 0..160u16 {
                let byte = self.read_raw(base.wrapping_add(index));
                self.ppu.write_raw(0xfe00 + index, byte);
            }
            self.dma.set_active_dma(false);
        }
        self.dma.set_cycles_dma(cycles_dma);
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM 0 (16 KB)
            // 0x4000-0x7FFF - ROM 1 (Banked) (16 KB)
            0x0000..=0x7fff => self.rom.read(addr),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.read(addr),

            // 0xA000-0xBFFF - External RAM (8 KB)
            0xa000..=0xbfff => self.rom.read(addr),

            // 0xC000-0xDFFF - Working RAM (8 KB)
            0xc000..=0xdfff => self.ram[(addr & 0x1fff) as usize],

            // 0xE000-0xFDFF - Working RAM Shadow
            0xe000..=0xfdff => self.ram[(addr & 0x1fff) as usize],

            // 0xFE00-0xFE9F - Object attribute memory (OAM)
            0xfe00..=0xfe9f => self.ppu.read(addr),

            // 0xFEA0-0xFEFF - Not Usable
            0xfea0..=0xfeff => 0xff,

            // 0xFF00 - Joypad input
            0xff00 => self.pad.read(addr),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.read(addr),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.read(addr),

            // 0xFF0F — IF: Interrupt flag
            0xff0f => {
                (if self.ppu.int_vblank() { 0x01 } else { 0x00 }
                    | if self.ppu.int_stat() { 0x02 } else { 0x00 }
                    | if self.timer.int_tima() { 0x04 } else { 0x00 }
                    | if self.serial.int_serial() { 0x08 } else { 0x00 }
                    | if self.pad.int_pad() { 0x10 } else { 0x00 })
                    | 0xe0
            }

            // 0xFF10-0xFF26 — Audio
            // 0xFF30-0xFF3F — Wave pattern
            0xff10..=0xff26 | 0xff30..=0xff3f => self.apu.read(addr),

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.read(addr),

            // 0xFF46 — DMA: OAM DMA source address & start
            0xff46 => self.dma.read(addr),

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.ppu.read(addr),

            // 0xFFFF — IE: Interrupt enable
            0xffff => self.ie,

            addr => {
                warnln!("Reading from unknown location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x3FFF - ROM 0 (16 KB)
            // 0x4000-0x7FFF - ROM 1 (Banked) (16 KB)
            0x0000..=0x7fff => self.rom.write(addr, value),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.write(addr, value),

            // 0xA000-0xBFFF - External RAM (8 KB)
            0xa000..=0xbfff => self.rom.write(addr, value),

            // 0xC000-0xDFFF - Working RAM (8 KB)
            0xc000..=0xdfff => self.ram[(addr & 0x1fff) as usize] = value,

            // 0xE000-0xFDFF - Working RAM Shadow
            0xe000..=0xfdff => self.ram[(addr & 0x1fff) as usize] = value,

            // 0xFE00-0xFE9F - Object attribute memory (OAM)
            0xfe00..=0xfe9f => self.ppu.write(addr, value),

            // 0xFEA0-0xFEFF - Not Usable
            0xfea0..=0xfeff => {}

            // 0xFF00 - Joypad input
            0xff00 => self.pad.write(addr, value),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.write(addr, value),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.write(addr, value),

            // 0xFF0F — IF: Interrupt flag
            0xff0f => {
                self.ppu.set_int_vblank(value & 0x01 == 0x01);
                self.ppu.set_int_stat(value & 0x02 == 0x02);
                self.timer.set_int_tima(value & 0x04 == 0x04);
                self.serial.set_int_serial(value & 0x08 == 0x08);
                self.pad.set_int_pad(value & 0x10 == 0x10);
            }

            // 0xFF10-0xFF26 — Audio
            // 0xFF30-0xFF3F — Wave pattern
            0xff10..=0xff26 | 0xff30..=0xff3f => self.apu.write(addr, value),

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.write(addr, value),

            // 0xFF46 — DMA: OAM DMA source address & start
            0xff46 => self.dma.write(addr, value),

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.ppu.write(addr, value),

            // 0xFFFF — IE: Interrupt enable
            0xffff => self.ie = value,

            addr => warnln!("Writing to unknown location 0x{:04x}", addr),
        }
    }

    /// Reads a byte from a certain memory address, without the
    /// PPU mode driven access verifications, allowing deep reads.
    pub fn read_raw(&self, addr: u16) -> u8 {
        match addr {
            0x8000..=0x9fff | 0xfe00..=0xfe9f => self.ppu.read_raw(addr),
            _ => self.read(addr),
        }
    }

    /// Writes a byte to a certain memory address without the PPU
    /// mode driven access verification process.
    pub fn write_raw(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000..=0x9fff | 0xfe00..=0xfe9f => self.ppu.write_raw(addr, value),
            _ => self.write(addr, value),
        }
    }

    /// Reads a 16 bit word from the bus using the little endian
    /// byte order (low byte at the provided address).
    pub fn read_u16(&self, addr: u16) -> u16 {
        self.read(addr) as u16 | ((self.read(addr.wrapping_add(1)) as u16) << 8)
    }

    /// Writes a 16 bit word into the bus using the little endian
    /// byte order (low byte at the provided address).
    pub fn write_u16(&mut self, addr: u16, value: u16) {
        self.write(addr, value as u8);
        self.write(addr.wrapping_add(1), (value >> 8) as u8);
    }

    pub fn read_many(&self, addr: u16, count: u16) -> Vec<u8> {
        let mut data: Vec<u8> = vec![];

        for index in 0..count {
            let byte = self.read(addr + index);
            data.push(byte);
        }

        data
    }

    pub fn write_many(&mut self, addr: u16, data: &[u8]) {
        for (index, byte) in data.iter().enumerate() {
            self.write(addr + index as u16, *byte)
        }
    }

    pub fn write_ram(&mut self, addr: u16, buffer: &[u8]) {
        self.ram[addr as usize..addr as usize + buffer.len()].clone_from_slice(buffer);
    }

    pub fn ram(&mut self) -> &mut Vec<u8> {
        &mut self.ram
    }

    pub fn ram_i(&self) -> &Vec<u8> {
        &self.ram
    }

    pub fn set_ram(&mut self, value: Vec<u8>) {
        self.ram = value;
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        &mut self.rom
    }

    pub fn rom_i(&self) -> &Cartridge {
        &self.rom
    }

    pub fn set_rom(&mut self, rom: Cartridge) {
        self.rom = rom;
    }
}

impl Default for Mmu {
    fn default() -> Self {
        let components = Components {
            ppu: Ppu::default(),
            apu: Apu::default(),
            dma: Dma::default(),
            pad: Pad::default(),
            timer: Timer::default(),
            serial: Serial::default(),
        };
        let mut mmu = Mmu::new(components);
        mmu.allocate();
        mmu
    }
}

#[cfg(test)]
mod tests {
    use super::Mmu;

    #[test]
    fn test_wram_round_trip() {
        let mut mmu = Mmu::default();
        mmu.write(0xc000, 0x12);
        assert_eq!(mmu.read(0xc000), 0x12);
        mmu.write(0xdfff, 0x34);
        assert_eq!(mmu.read(0xdfff), 0x34);
    }

    #[test]
    fn test_echo_ram_alias() {
        let mut mmu = Mmu::default();
        mmu.write(0xc100, 0x55);
        assert_eq!(mmu.read(0xe100), 0x55);
        mmu.write(0xe200, 0x66);
        assert_eq!(mmu.read(0xc200), 0x66);
    }

    #[test]
    fn test_prohibited_region() {
        let mut mmu = Mmu::default();
        mmu.write(0xfea0, 0x12);
        assert_eq!(mmu.read(0xfea0), 0xff);
        assert_eq!(mmu.read(0xfeff), 0xff);
    }

    #[test]
    fn test_hram_round_trip() {
        let mut mmu = Mmu::default();
        mmu.write(0xff80, 0x77);
        assert_eq!(mmu.read(0xff80), 0x77);
        mmu.write(0xfffe, 0x88);
        assert_eq!(mmu.read(0xfffe), 0x88);
    }

    #[test]
    fn test_word_order() {
        let mut mmu = Mmu::default();
        mmu.write_u16(0xc000, 0x1234);
        assert_eq!(mmu.read(0xc000), 0x34);
        assert_eq!(mmu.read(0xc001), 0x12);
        assert_eq!(mmu.read_u16(0xc000), 0x1234);
    }

    #[test]
    fn test_if_register_composition() {
        let mut mmu = Mmu::default();
        assert_eq!(mmu.read(0xff0f), 0xe0);
        mmu.timer().set_int_tima(true);
        assert_eq!(mmu.read(0xff0f), 0xe4);
        mmu.write(0xff0f, 0x00);
        assert_eq!(mmu.read(0xff0f), 0xe0);
    }

    #[test]
    fn test_oam_dma_transfer() {
        let mut mmu = Mmu::default();
        for index in 0..160u16 {
            mmu.write(0xc000 + index, index as u8);
        }
        mmu.write(0xff46, 0xc0);
        assert!(mmu.dma_i().active());

        mmu.clock_dma(640);
        assert!(!mmu.dma_i().active());
        assert_eq!(mmu.ppu_i().read_raw(0xfe00), 0x00);
        assert_eq!(mmu.ppu_i().read_raw(0xfe9f), 159);
    }
}
