use gbsound_core::apu::Apu;
use gbsound_core::hardware::Model;

fn tick(apu: &mut Apu, cycles: u32) {
    for _ in 0..cycles {
        apu.run_cycle();
    }
}

fn powered(model: Model) -> Apu {
    let mut apu = Apu::new(model);
    apu.write(0xFF26, 0x80);
    apu
}

/// Fill wave RAM with 0..16 and start the wave channel at its fastest rate,
/// so every cycle is a fetch cycle.
fn fast_wave(model: Model) -> Apu {
    let mut apu = powered(model);
    for i in 0..0x10u16 {
        apu.write(0xFF30 + i, i as u8);
    }
    apu.write(0xFF1A, 0x80);
    apu.write(0xFF1C, 0x20);
    apu.write(0xFF1D, 0xFF);
    apu.write(0xFF1E, 0x87);
    apu
}

#[test]
fn noise_shift_15_freezes_lfsr() {
    let mut apu = powered(Model::Dmg);
    apu.write(0xFF21, 0xF0);
    apu.write(0xFF22, 0xF0); // clock shift 15
    apu.write(0xFF23, 0x80);
    let lfsr = apu.ch4_lfsr();
    tick(&mut apu, 300_000);
    assert_eq!(apu.ch4_lfsr(), lfsr);
}

#[test]
fn narrow_noise_mirrors_feedback_into_bit_six() {
    let mut apu = powered(Model::Dmg);
    apu.write(0xFF21, 0xF0);
    apu.write(0xFF22, 0x08); // 7-bit mode, divisor 4
    apu.write(0xFF23, 0x80);
    tick(&mut apu, 4);
    assert_eq!(apu.ch4_lfsr(), 0x4040);
}

#[test]
fn sweep_negate_clear_disables() {
    let mut apu = powered(Model::Dmg);
    apu.write(0xFF10, 0x19); // subtract mode
    apu.write(0xFF12, 0xF0);
    apu.write(0xFF14, 0x82); // trigger
    assert_eq!(apu.read(0xFF26) & 0x01, 1);
    apu.write(0xFF10, 0x11); // clear negate
    assert_eq!(apu.read(0xFF26) & 0x01, 0);
}

#[test]
fn sweep_negate_clear_before_use_is_harmless() {
    let mut apu = powered(Model::Dmg);
    apu.write(0xFF10, 0x08); // subtract, shift 0: no calculation on trigger
    apu.write(0xFF12, 0xF0);
    apu.write(0xFF14, 0x82);
    apu.write(0xFF10, 0x00);
    assert_eq!(apu.read(0xFF26) & 0x01, 1);
}

#[test]
fn wave_retrigger_corrupts_ram() {
    let mut apu = fast_wave(Model::Dmg);
    tick(&mut apu, 18);
    assert_eq!(apu.ch3_position(), 18);
    apu.write(0xFF1E, 0x87);

    // Byte 9 was being read, so its aligned block 8..12 lands at the start.
    let ram = apu.wave_ram();
    assert_eq!(ram[..4], [8, 9, 10, 11]);
    assert_eq!(ram[4..], (4..16).collect::<Vec<u8>>()[..]);
}

#[test]
fn wave_retrigger_in_first_block_copies_one_byte() {
    let mut apu = fast_wave(Model::Dmg);
    tick(&mut apu, 5);
    apu.write(0xFF1E, 0x87);
    let ram = apu.wave_ram();
    assert_eq!(ram[0], 2);
    assert_eq!(ram[1..4], [1, 2, 3]);
}

#[test]
fn cgb_wave_retrigger_leaves_ram_alone() {
    let mut apu = fast_wave(Model::Cgb);
    tick(&mut apu, 18);
    apu.write(0xFF1E, 0x87);
    let expected: Vec<u8> = (0..16).collect();
    assert_eq!(apu.wave_ram()[..], expected[..]);
}

#[test]
fn dmg_wave_ram_open_on_fetch_cycle() {
    let mut apu = fast_wave(Model::Dmg);
    tick(&mut apu, 3);
    // Position 3 lives in byte 1; any address reaches it right after a fetch.
    assert_eq!(apu.read(0xFF3A), 1);
    apu.write(0xFF3A, 0xEE);
    assert_eq!(apu.wave_ram()[1], 0xEE);
}
