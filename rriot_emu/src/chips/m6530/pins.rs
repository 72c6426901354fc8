use crate::chips::bits::Field;

/// Pin positions within the 64-bit pin vector.
///
/// The address, control, and data positions are shared with the 6502 pin layout, so a CPU pin
/// vector can be passed straight through. The chip selects sit next to port B because on the
/// physical part CS1/CS2 are mask options on PB6/PB5.
pub mod pin {
    pub const A0: u8 = 0;
    pub const RS0: u8 = 10;
    pub const RW: u8 = 11;
    pub const RES: u8 = 12;
    pub const D0: u8 = 16;
    pub const PA0: u8 = 24;
    pub const PB0: u8 = 32;
    pub const CS2: u8 = 41;
    pub const CS1: u8 = 42;
    pub const IRQ: u8 = 43;
    pub const CA1: u8 = 44;
    pub const CA2: u8 = 45;
    pub const CB1: u8 = 46;
    pub const CB2: u8 = 47;
}

const ADDR: Field = Field::new(pin::A0, 10);
const RS0: Field = Field::bit(pin::RS0);
const RW: Field = Field::bit(pin::RW);
const RES: Field = Field::bit(pin::RES);
const DATA: Field = Field::byte(pin::D0);
const PA: Field = Field::byte(pin::PA0);
const PB: Field = Field::byte(pin::PB0);
const CS2: Field = Field::bit(pin::CS2);
const CS1: Field = Field::bit(pin::CS1);
const IRQ: Field = Field::bit(pin::IRQ);
const CA1: Field = Field::bit(pin::CA1);
const CA2: Field = Field::bit(pin::CA2);
const CB1: Field = Field::bit(pin::CB1);
const CB2: Field = Field::bit(pin::CB2);

/// The 6530 view of a system pin vector.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct M6530Pins(pub u64);

impl std::fmt::Debug for M6530Pins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("M6530Pins")
            .field(&format!("{:048b}", self.0))
            .finish()
    }
}

impl std::fmt::Display for M6530Pins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "a={a:03x} rs0={rs0} rw={rw} cs={cs1}{cs2} d={d:02x} ",
            a = self.get_addr(),
            rs0 = self.get_rs0() as u8,
            rw = self.get_rw() as u8,
            cs1 = self.get_cs1() as u8,
            cs2 = self.get_cs2() as u8,
            d = self.get_data(),
        )?;
        write!(
            f,
            "pa={pa:02x} pb={pb:02x} ca={ca1}{ca2} cb={cb1}{cb2} irq={irq}",
            pa = self.get_pa(),
            pb = self.get_pb(),
            ca1 = self.get_ca1() as u8,
            ca2 = self.get_ca2() as u8,
            cb1 = self.get_cb1() as u8,
            cb2 = self.get_cb2() as u8,
            irq = self.get_irq() as u8,
        )
    }
}

impl M6530Pins {
    /// Mask of every pin the chip reads or drives.
    pub const fn mask_all() -> u64 {
        ADDR.mask()
            | RS0.mask()
            | RW.mask()
            | RES.mask()
            | DATA.mask()
            | PA.mask()
            | PB.mask()
            | CS2.mask()
            | CS1.mask()
            | IRQ.mask()
            | CA1.mask()
            | CA2.mask()
            | CB1.mask()
            | CB2.mask()
    }

    /// Address lines A0..A9.
    pub fn get_addr(self) -> u16 {
        ADDR.get(self.0)
    }
    pub fn set_addr(&mut self, val: u16) {
        self.0 = ADDR.set(self.0, val);
    }

    /// RAM select.
    pub fn get_rs0(self) -> bool {
        RS0.get_1(self.0)
    }
    pub fn set_rs0(&mut self, val: bool) {
        self.0 = RS0.set_1(self.0, val);
    }

    /// Read (1) or write (0).
    pub fn get_rw(self) -> bool {
        RW.get_1(self.0)
    }
    pub fn set_rw(&mut self, val: bool) {
        self.0 = RW.set_1(self.0, val);
    }

    /// Reset request.
    pub fn get_res(self) -> bool {
        RES.get_1(self.0)
    }
    pub fn set_res(&mut self, val: bool) {
        self.0 = RES.set_1(self.0, val);
    }

    pub fn get_data(self) -> u8 {
        DATA.get(self.0) as u8
    }
    pub fn set_data(&mut self, val: u8) {
        self.0 = DATA.set(self.0, val.into());
    }

    pub fn get_pa(self) -> u8 {
        PA.get(self.0) as u8
    }
    pub fn set_pa(&mut self, val: u8) {
        self.0 = PA.set(self.0, val.into());
    }

    pub fn get_pb(self) -> u8 {
        PB.get(self.0) as u8
    }
    pub fn set_pb(&mut self, val: u8) {
        self.0 = PB.set(self.0, val.into());
    }

    pub fn get_cs1(self) -> bool {
        CS1.get_1(self.0)
    }
    pub fn set_cs1(&mut self, val: bool) {
        self.0 = CS1.set_1(self.0, val);
    }

    pub fn get_cs2(self) -> bool {
        CS2.get_1(self.0)
    }
    pub fn set_cs2(&mut self, val: bool) {
        self.0 = CS2.set_1(self.0, val);
    }

    /// Interrupt request, active high.
    pub fn get_irq(self) -> bool {
        IRQ.get_1(self.0)
    }
    pub fn set_irq(&mut self, val: bool) {
        self.0 = IRQ.set_1(self.0, val);
    }

    pub fn get_ca1(self) -> bool {
        CA1.get_1(self.0)
    }
    pub fn set_ca1(&mut self, val: bool) {
        self.0 = CA1.set_1(self.0, val);
    }

    pub fn get_ca2(self) -> bool {
        CA2.get_1(self.0)
    }
    pub fn set_ca2(&mut self, val: bool) {
        self.0 = CA2.set_1(self.0, val);
    }

    pub fn get_cb1(self) -> bool {
        CB1.get_1(self.0)
    }
    pub fn set_cb1(&mut self, val: bool) {
        self.0 = CB1.set_1(self.0, val);
    }

    pub fn get_cb2(self) -> bool {
        CB2.get_1(self.0)
    }
    pub fn set_cb2(&mut self, val: bool) {
        self.0 = CB2.set_1(self.0, val);
    }
}
