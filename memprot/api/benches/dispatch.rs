//! Fault dispatch latency
//!
//! Run with: cargo bench -p esp-memprot --bench dispatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use esp_memprot::{Memprot, Region, RegionMask, RegionTable};
use memprot_ll::sim::{SimBank, SimPlatform};
use memprot_ll::PmsUnit;

fn configured() -> Memprot<PmsUnit<SimBank>, SimPlatform> {
    let mut memprot = Memprot::new(RegionTable::default(), SimPlatform::new(1), |bus, table| {
        PmsUnit::new(bus, SimBank::new(bus), table)
    });
    memprot
        .configure_protection(RegionMask::ALL, false, false)
        .unwrap();
    memprot
}

fn bench_identify_idle(c: &mut Criterion) {
    let memprot = configured();
    c.bench_function("identify_idle", |b| {
        b.iter(|| black_box(memprot.identify_faulting_bus()))
    });
}

fn bench_service_fault(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_fault");

    // first and last region in dispatch order bound the polling cost
    for region in [Region::Iram0Sram, Region::Peri2RtcSlow1] {
        let mut memprot = configured();
        let address = memprot.region_info(region).high & !3;
        group.bench_with_input(BenchmarkId::from_parameter(region), &address, |b, &address| {
            b.iter(|| {
                memprot
                    .unit_mut(region.bus())
                    .bank_mut()
                    .inject_violation(address, true, false);
                black_box(memprot.service_fault())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_identify_idle, bench_service_fault);
criterion_main!(benches);
