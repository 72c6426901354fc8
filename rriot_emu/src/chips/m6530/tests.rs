use assert_matches::assert_matches;
use rand::Rng;

use super::config::Config;
use super::decode::Register;
use super::interrupt::{IRQ_ANY, IRQ_CA1, IRQ_CB2, IRQ_TIMER};
use super::pins::M6530Pins;
use super::port::PortId;
use super::timer::Prescale;
use super::M6530;

const PAD: u16 = 0x0;
const PADD: u16 = 0x1;
const PBD: u16 = 0x2;
const PBDD: u16 = 0x3;
const TIMER_DIV1: u16 = 0x4;
const TIMER_DIV8: u16 = 0x5;
const TIMER_DIV1024: u16 = 0x7;
const TIMER_DIV1_IRQ: u16 = 0xc;
const TIMER_READ: u16 = 0x6;
const FLAGS_READ: u16 = 0x7;
const PCR: u16 = 0x8;
const ACR: u16 = 0x9;
const IER: u16 = 0xa;

/// Presents a selected register access and ticks once.
fn access(chip: &mut M6530, pins: &mut M6530Pins, addr: u16, read: bool) -> M6530Pins {
    pins.set_cs1(true);
    pins.set_cs2(false);
    pins.set_rs0(false);
    pins.set_addr(addr);
    pins.set_rw(read);
    let out = M6530Pins(chip.tick(pins.0));
    pins.set_cs1(false);
    out
}

/// Writes a register.
fn write_reg(chip: &mut M6530, pins: &mut M6530Pins, addr: u16, val: u8) -> M6530Pins {
    pins.set_data(val);
    access(chip, pins, addr, false)
}

/// Reads a register.
fn read_reg(chip: &mut M6530, pins: &mut M6530Pins, addr: u16) -> u8 {
    pins.set_data(0);
    access(chip, pins, addr, true).get_data()
}

/// Ticks once without selecting the chip.
fn idle(chip: &mut M6530, pins: &mut M6530Pins) -> M6530Pins {
    pins.set_cs1(false);
    pins.set_data(0);
    M6530Pins(chip.tick(pins.0))
}

fn setup() -> (M6530, M6530Pins) {
    (M6530::new(), M6530Pins::default())
}

/// Like [`setup`], with the timer parked on its longest interval so no timer flag lands.
fn setup_quiet() -> (M6530, M6530Pins) {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1024, 0xff);
    (chip, pins)
}

#[test]
fn test_reset_idempotent() {
    let mut once = M6530::new();
    let mut twice = M6530::new();
    twice.reset();
    assert_eq!(once, twice);

    let mut rng = rand::rng();
    for _ in 0..100 {
        let mut chip: M6530 = rng.random();
        chip.reset();
        once.ram = chip.ram;
        assert_eq!(chip, once);
        chip.reset();
        assert_eq!(chip, once);
    }
}

#[test]
fn test_reset_keeps_ram() {
    let (mut chip, _) = setup();
    chip.randomize_ram(&mut rand::rng());
    let ram = *chip.ram();
    chip.reset();
    assert_eq!(*chip.ram(), ram);
}

#[test]
fn test_timer_counts_from_reset() {
    let (mut chip, mut pins) = setup();
    // 0 -> ffff on the first tick; the flag lands on the second.
    idle(&mut chip, &mut pins);
    assert_eq!(chip.timer().counter(), 0xffff);
    assert_eq!(chip.interrupts().pending(), IRQ_TIMER);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.interrupts().flag_mask(), IRQ_TIMER);
    for _ in 0..3 {
        idle(&mut chip, &mut pins);
    }
    assert_eq!(read_reg(&mut chip, &mut pins, TIMER_READ), 0xfb);
    assert_eq!(chip.timer().prescale(), Prescale::Div1);
    assert_eq!(chip.interrupts().flag_mask(), 0);
}

#[test]
fn test_timer_reads_back_latch() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1, 0x20);
    assert_eq!(read_reg(&mut chip, &mut pins, TIMER_READ), 0x20);
    for expect in (0x10..0x20).rev() {
        assert_eq!(read_reg(&mut chip, &mut pins, TIMER_READ), expect);
    }
}

#[test]
fn test_timer_flag_one_tick_after_underflow() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1, 2);
    // 2 -> 1 -> 0 -> ffff
    for _ in 0..3 {
        idle(&mut chip, &mut pins);
        assert_eq!(chip.interrupts().flag_mask(), 0);
    }
    assert_eq!(chip.timer().counter(), 0xffff);
    assert!(chip.timer().underflow_pulse());
    assert_eq!(chip.interrupts().pending(), IRQ_TIMER);
    idle(&mut chip, &mut pins);
    assert_eq!(chip.interrupts().flag_mask(), IRQ_TIMER);
    assert!(!chip.timer().underflow_pulse());
}

#[test]
fn test_timer_free_runs_past_zero() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV8, 1);
    for _ in 0..(2 * 8) {
        idle(&mut chip, &mut pins);
    }
    assert_eq!(chip.timer().counter(), 0xffff);
    assert_eq!(chip.timer().prescale(), Prescale::Div1);
    assert_eq!(read_reg(&mut chip, &mut pins, TIMER_READ), 0xff);
    assert_eq!(read_reg(&mut chip, &mut pins, TIMER_READ), 0xfe);
    assert_eq!(read_reg(&mut chip, &mut pins, TIMER_READ), 0xfd);
    assert_eq!(chip.timer().latch(), 1);
}

#[test]
fn test_timer_read_clears_flag() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 0);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert!(idle(&mut chip, &mut pins).get_irq());
    read_reg(&mut chip, &mut pins, TIMER_READ);
    assert!(!chip.irq());
    assert_eq!(chip.interrupts().flag_mask(), 0);
}

#[test]
fn test_timer_write_cancels_flag() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 0);
    // Underflow this tick, flag in flight.
    idle(&mut chip, &mut pins);
    assert_eq!(chip.interrupts().pending(), IRQ_TIMER);
    assert!(!write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 10).get_irq());
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.interrupts().flag_mask(), 0);
}

#[test]
fn test_timer_irq_enable_from_address() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 5);
    assert_eq!(chip.interrupts().enable_mask(), IRQ_TIMER);
    write_reg(&mut chip, &mut pins, TIMER_DIV1, 5);
    assert_eq!(chip.interrupts().enable_mask(), 0);
}

#[test]
fn test_port_all_output() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, PADD, 0xff);
    write_reg(&mut chip, &mut pins, PAD, 0x96);
    for input in [0x00, 0xff, 0x69] {
        pins.set_pa(input);
        assert_eq!(read_reg(&mut chip, &mut pins, PAD), 0x96);
    }
}

#[test]
fn test_port_all_input() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, PBD, 0x96);
    for input in [0x00, 0xff, 0x69] {
        pins.set_pb(input);
        assert_eq!(read_reg(&mut chip, &mut pins, PBD), input);
    }
}

#[test]
fn test_port_mixed_direction() {
    let (mut chip, mut pins) = setup();
    let mut rng = rand::rng();
    for _ in 0..100 {
        let (d, o, i): (u8, u8, u8) = rng.random();
        write_reg(&mut chip, &mut pins, PADD, d);
        write_reg(&mut chip, &mut pins, PAD, o);
        pins.set_pa(i);
        let expect = (o & d) | (i & !d);
        assert_eq!(read_reg(&mut chip, &mut pins, PAD), expect);
        assert_eq!(idle(&mut chip, &mut pins).get_pa(), expect);
    }
}

#[test]
fn test_direction_read_back() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, PBDD, 0x3c);
    assert_eq!(read_reg(&mut chip, &mut pins, PBDD), 0x3c);
    assert_eq!(read_reg(&mut chip, &mut pins, PADD), 0x00);
}

#[test]
fn test_interrupt_or_semantics() {
    let (mut chip, mut pins) = setup_quiet();
    // Rising CA1 edge.
    write_reg(&mut chip, &mut pins, PCR, 0x01);
    idle(&mut chip, &mut pins);
    pins.set_ca1(true);
    idle(&mut chip, &mut pins);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.interrupts().flag_mask(), IRQ_CA1);

    write_reg(&mut chip, &mut pins, IER, IRQ_ANY | IRQ_CA1);
    assert!(idle(&mut chip, &mut pins).get_irq());
    write_reg(&mut chip, &mut pins, IER, IRQ_CA1);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.interrupts().flag_mask(), IRQ_CA1);
    write_reg(&mut chip, &mut pins, IER, IRQ_ANY | IRQ_TIMER);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(read_reg(&mut chip, &mut pins, IER), IRQ_ANY | IRQ_TIMER);
}

#[test]
fn test_flag_read_spares_in_flight_flags() {
    let (mut chip, mut pins) = setup_quiet();
    write_reg(&mut chip, &mut pins, PCR, 0x01);
    write_reg(&mut chip, &mut pins, IER, IRQ_ANY | IRQ_CA1);
    pins.set_ca1(true);
    // Edge on this tick, flag lands on the next.
    idle(&mut chip, &mut pins);
    pins.set_ca1(false);
    idle(&mut chip, &mut pins);
    assert_eq!(chip.interrupts().flag_mask(), IRQ_CA1);

    // Second edge while reading the flags: the old flag is cleared, the new one lands later.
    pins.set_ca1(true);
    let flags = read_reg(&mut chip, &mut pins, FLAGS_READ);
    assert_eq!(flags, IRQ_ANY | IRQ_CA1);
    assert_eq!(chip.interrupts().flag_mask(), 0);
    assert_eq!(chip.interrupts().pending(), IRQ_CA1);
    assert!(idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.interrupts().flag_mask(), IRQ_CA1);
}

#[test]
fn test_flag_read_acknowledges_edge_in_flight() {
    let (mut chip, mut pins) = setup_quiet();
    write_reg(&mut chip, &mut pins, PCR, 0x01);
    write_reg(&mut chip, &mut pins, IER, IRQ_ANY | IRQ_CA1);
    pins.set_ca1(true);
    idle(&mut chip, &mut pins);
    assert_eq!(chip.interrupts().pending(), IRQ_CA1);

    // The latch reports the edge before its flag lands; reading acknowledges both.
    assert_eq!(read_reg(&mut chip, &mut pins, FLAGS_READ), IRQ_CA1);
    assert!(!chip.irq());
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(read_reg(&mut chip, &mut pins, FLAGS_READ), 0);
    assert!(!chip.irq());
}

#[test]
fn test_flag_read_keeps_timer_flag() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 0);
    idle(&mut chip, &mut pins);
    idle(&mut chip, &mut pins);
    idle(&mut chip, &mut pins);
    assert_eq!(read_reg(&mut chip, &mut pins, FLAGS_READ), IRQ_ANY | IRQ_TIMER);
    assert_eq!(chip.interrupts().flag_mask(), IRQ_TIMER);
}

#[test]
fn test_edges_latch_without_interrupts() {
    let config = Config {
        edge_interrupts: false,
        ..Default::default()
    };
    let mut chip = M6530::with_config(&config).unwrap();
    let mut pins = M6530Pins::default();
    write_reg(&mut chip, &mut pins, TIMER_DIV1024, 0xff);
    write_reg(&mut chip, &mut pins, IER, IRQ_ANY | IRQ_CB2);
    pins.set_cb2(true);
    idle(&mut chip, &mut pins);
    pins.set_cb2(false);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert!(chip.port(PortId::B).c2.edge_latched);
    assert_eq!(read_reg(&mut chip, &mut pins, FLAGS_READ), IRQ_CB2);
    assert!(!chip.port(PortId::B).c2.edge_latched);
}

#[test]
fn test_no_edge_on_first_tick() {
    let (mut chip, mut pins) = setup();
    pins.set_ca1(true);
    idle(&mut chip, &mut pins);
    pins.set_ca1(false);
    idle(&mut chip, &mut pins);
    // Falling edge is detected once primed.
    assert!(chip.port(PortId::A).c1.edge_latched);

    // A high level on the first tick is not a rising edge.
    pins.set_ca1(true);
    let mut chip = M6530::new();
    write_reg(&mut chip, &mut pins, PCR, 0x01);
    assert!(!chip.port(PortId::A).c1.edge_latched);
}

#[test]
fn test_ca2_output() {
    let (mut chip, mut pins) = setup();
    pins.set_ca2(false);
    assert!(write_reg(&mut chip, &mut pins, PCR, 0x0e).get_ca2());
    assert!(!write_reg(&mut chip, &mut pins, PCR, 0x0c).get_ca2());
    pins.set_ca2(true);
    assert!(!idle(&mut chip, &mut pins).get_ca2());
    assert!(!chip.port(PortId::A).c2.edge_latched);
    write_reg(&mut chip, &mut pins, PCR, 0x00);
    assert!(idle(&mut chip, &mut pins).get_ca2());
}

#[test]
fn test_aux_control_storage() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, ACR, 0xc3);
    assert_eq!(read_reg(&mut chip, &mut pins, ACR), 0xc3);
    assert_eq!(chip.acr(), 0xc3);
}

#[test]
fn test_ram() {
    let (mut chip, mut pins) = setup();
    pins.set_rs0(true);
    pins.set_cs1(true);
    pins.set_rw(false);
    for offset in 0..64u16 {
        pins.set_addr(offset);
        pins.set_data(offset as u8 ^ 0xa5);
        chip.tick(pins.0);
    }
    pins.set_rw(true);
    for offset in 0..64u16 {
        pins.set_addr(offset | 0x40);
        pins.set_data(0);
        let out = M6530Pins(chip.tick(pins.0));
        assert_eq!(out.get_data(), offset as u8 ^ 0xa5);
    }
    assert_eq!(chip.ram()[0x3f], 0x3f ^ 0xa5);
}

#[test]
fn test_unselected_still_counts() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, TIMER_DIV1, 10);
    for _ in 0..5 {
        pins.set_addr(PAD);
        pins.set_rw(false);
        pins.set_data(0xff);
        pins.set_cs2(true);
        pins.set_cs1(true);
        chip.tick(pins.0);
    }
    pins.set_cs2(false);
    assert_eq!(chip.timer().counter(), 5);
    assert_eq!(chip.port(PortId::A).output_register(), 0);
}

#[test]
fn test_undefined_register_is_noop() {
    let (mut chip, mut pins) = setup_quiet();
    write_reg(&mut chip, &mut pins, PADD, 0x0f);
    let before = chip.clone();
    write_reg(&mut chip, &mut pins, 0xb, 0xff);
    assert_eq!(read_reg(&mut chip, &mut pins, 0xb), 0);
    assert_eq!(chip.port(PortId::A).direction(), before.port(PortId::A).direction());
    assert_eq!(chip.interrupts(), before.interrupts());
    assert_eq!(chip.pcr(), before.pcr());
}

#[test]
fn test_register_override() {
    let config: Config = Config::from_json(
        r#"{ "registers": [
            { "index": 11, "access": "write", "register": { "kind": "port-data", "port": "a" } },
            { "index": 11, "access": "read", "register": { "kind": "port-data", "port": "a" } }
        ] }"#,
    )
    .unwrap();
    let mut chip = M6530::with_config(&config).unwrap();
    let mut pins = M6530Pins::default();
    write_reg(&mut chip, &mut pins, PADD, 0xff);
    write_reg(&mut chip, &mut pins, 0xb, 0x42);
    assert_eq!(read_reg(&mut chip, &mut pins, 0xb), 0x42);
    assert_matches!(
        chip.decoder().slots().nth(0xb),
        Some((0xb, Some(Register::PortData { port: PortId::A }), _))
    );
}

#[test]
fn test_res_pin() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, PADD, 0xff);
    write_reg(&mut chip, &mut pins, PAD, 0xff);
    write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 0);
    for _ in 0..4 {
        idle(&mut chip, &mut pins);
    }
    assert!(chip.irq());

    pins.set_res(true);
    pins.set_pa(0x12);
    let out = idle(&mut chip, &mut pins);
    assert!(!out.get_irq());
    assert_eq!(out.get_pa(), 0x12);
    assert_eq!(chip.port(PortId::A).direction(), 0);
    assert_eq!(chip.timer().counter(), 0);

    pins.set_res(false);
    assert!(!idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.timer().counter(), 0xffff);
}

#[test]
fn test_data_bus_only_on_read() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, PADD, 0xff);
    write_reg(&mut chip, &mut pins, PAD, 0x5a);
    pins.set_data(0x11);
    assert_eq!(M6530Pins(chip.tick(pins.0)).get_data(), 0x11);
    assert_eq!(access(&mut chip, &mut pins, PAD, true).get_data(), 0x5a);
}

#[test]
fn test_random_pins_never_panic() {
    let mut rng = rand::rng();
    let mut chip: M6530 = rng.random();
    let unused = !M6530Pins::mask_all();
    for _ in 0..10_000 {
        let input: u64 = rng.random();
        let out = chip.tick(input);
        assert_eq!(out & unused, input & unused);
    }
    chip.reset();
    for _ in 0..10_000 {
        chip.tick(rng.random());
    }
}

#[test]
fn test_scenario_port_output() {
    let (mut chip, mut pins) = setup();
    write_reg(&mut chip, &mut pins, PADD, 0xff);
    write_reg(&mut chip, &mut pins, PAD, 0x5a);
    assert_eq!(idle(&mut chip, &mut pins).get_pa(), 0x5a);
}

/// Timer loaded with 3 at the undivided rate, IRQ enabled. The counter holds 3 for the write
/// tick, then counts 3 -> 2 -> 1 -> 0 -> ffff over the next four. The 4th vector after the write
/// is the underflow tick: counter at ffff, timer flag in flight, IRQ still low. The flag lands and
/// IRQ asserts on the 5th.
#[test]
fn test_scenario_timer_irq() {
    let (mut chip, mut pins) = setup();
    let out = write_reg(&mut chip, &mut pins, TIMER_DIV1_IRQ, 3);
    assert!(!out.get_irq());
    let mut irq: Vec<bool> = (0..3).map(|_| idle(&mut chip, &mut pins).get_irq()).collect();
    assert_eq!(chip.timer().counter(), 0);

    irq.push(idle(&mut chip, &mut pins).get_irq());
    assert_eq!(chip.timer().counter(), 0xffff);
    assert_eq!(chip.interrupts().pending(), IRQ_TIMER);

    irq.extend((0..2).map(|_| idle(&mut chip, &mut pins).get_irq()));
    assert_eq!(irq, [false, false, false, false, true, true]);
}

#[test]
#[should_panic(expected = "before reset")]
#[cfg(debug_assertions)]
fn test_tick_before_reset() {
    let mut chip = M6530::default();
    chip.tick(0);
}
