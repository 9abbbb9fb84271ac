use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use host_n64::cartridge::N64_ROM_MAGIC;
use host_n64::controller::ControllerButtons;
use host_n64::frame_skip::FrameSkip;
use host_n64::{HeadlessHost, HostConfig};

fn bench_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x10000];
    rom[0..4].copy_from_slice(&N64_ROM_MAGIC);
    rom[0x20..0x25].copy_from_slice(b"BENCH");
    rom
}

fn loaded_host(skip_count: u32) -> HeadlessHost {
    let mut host = HeadlessHost::headless(HostConfig {
        skip_count,
        ..Default::default()
    });
    assert!(host.load_game(&bench_rom(), false, false, false));
    host
}

fn bench_step_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_step_frame");

    for skip_count in [0u32, 1, 4].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(skip_count),
            skip_count,
            |b, &skip| {
                let mut host = loaded_host(skip);
                b.iter(|| {
                    host.update_controls(0, 0x0110, 40, -40).ok();
                    host.step_frame();
                    black_box(host.stats().stepped);
                });
            },
        );
    }

    group.finish();
}

fn bench_frame_skip_decision(c: &mut Criterion) {
    c.bench_function("frame_skip_cycle", |b| {
        let mut skip = FrameSkip::new(2);
        b.iter(|| {
            let target = skip.begin_frame();
            black_box(skip.present());
            black_box(target);
        });
    });
}

fn bench_button_decode(c: &mut Criterion) {
    c.bench_function("button_decode", |b| {
        let mut mask = 0u16;
        b.iter(|| {
            mask = mask.wrapping_add(0x0101) & 0x3FFF;
            black_box(ControllerButtons::from_mask(black_box(mask)).to_pif_word());
        });
    });
}

criterion_group!(
    benches,
    bench_step_frame,
    bench_frame_skip_decision,
    bench_button_decode
);
criterion_main!(benches);
