use criterion::{criterion_group, criterion_main, Criterion};
use dotmatrix::test::{build_rom, build_test, TestOptions};

fn benchmark_cpu_clock(c: &mut Criterion) {
    let rom = build_rom(&[0x18, 0xfe]);
    let mut gb = build_test(TestOptions {
        ppu_enabled: Some(false),
        apu_enabled: Some(false),
        dma_enabled: Some(false),
        timer_enabled: Some(false),
        serial_enabled: Some(false),
        ..Default::default()
    });
    gb.load_rom(&rom, None).unwrap();

    c.bench_function("cpu_cycles", |b| {
        b.iter(|| {
            gb.clocks_cycles(1_000_000);
        })
    });
}

criterion_group!(benches, benchmark_cpu_clock);
criterion_main!(benches);
