#![no_main]

use libfuzzer_sys::fuzz_target;
use rv32_core::{decode, disassemble, Bus, CoreConfig, Cpu, Register};

fuzz_target!(|data: &[u8]| {
    let words: Vec<u32> = data
        .chunks_exact(4)
        .take(64)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    for &word in &words {
        let _ = decode(word);
        let _ = disassemble(word);
    }

    let mut bus = Bus::default();
    if bus.load_words(0, &words).is_err() {
        return;
    }
    let config = CoreConfig {
        interrupt_threshold: 7,
        ..CoreConfig::default()
    };
    let mut cpu = Cpu::with_config(bus, config);
    let _ = cpu.run(256);
    assert_eq!(cpu.register(Register::ZERO), 0);
});
