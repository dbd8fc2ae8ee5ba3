use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use project_finance::cli::{sample_file, sample_project};
use project_finance::storage::{load_project_from_path, save_project_to_path};
use tempfile::tempdir;

const PRICE: f64 = 5.0;

fn bench_assembly(c: &mut Criterion) {
    let project = sample_project().expect("sample project");

    c.bench_function("assemble_30_years", |b| {
        b.iter_batched(
            || project.clone(),
            |mut project| {
                project
                    .assemble_financials(black_box(PRICE))
                    .expect("assemble")
                    .len()
            },
            BatchSize::LargeInput,
        )
    });

    let mut assembled = project.clone();
    assembled.assemble_financials(PRICE).expect("assemble");

    c.bench_function("roll_up_annual_30_years", |b| {
        b.iter(|| assembled.roll_up_annual().expect("roll up").len())
    });

    c.bench_function("irr_30_years", |b| {
        b.iter(|| assembled.calc_irr().expect("irr"))
    });
}

fn bench_project_io(c: &mut Criterion) {
    let file = sample_file().expect("sample file");
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.json");

    c.bench_function("project_save", |b| {
        b.iter(|| save_project_to_path(&file, &path).expect("save project"))
    });

    save_project_to_path(&file, &path).expect("save project");
    c.bench_function("project_load_and_rebuild", |b| {
        b.iter(|| {
            load_project_from_path(&path)
                .expect("load project")
                .to_project()
                .expect("rebuild project")
        })
    });
}

criterion_group!(benches, bench_assembly, bench_project_io);
criterion_main!(benches);
