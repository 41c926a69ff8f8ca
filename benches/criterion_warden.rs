#![cfg(all(feature = "criterion-bench", feature = "memory-repo"))]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use rs_warden::{
    Ability, Action, AssignKey, Conn, Decision, MemoryRepo, ModelName, Options, Preload, Record,
    Resource, Subject, Target, Value, Warden, WardenBuilder,
};

#[derive(Debug, Clone)]
struct Invoice {
    id: u32,
    owner: u32,
    lines_loaded: bool,
}

impl Resource for Invoice {
    fn model_name(&self) -> &str {
        "Invoice"
    }
}

impl Record for Invoice {
    fn field(&self, name: &str) -> Option<String> {
        (name == "id").then(|| self.id.to_string())
    }
}

#[derive(Debug, Clone)]
struct User {
    id: u32,
}

struct Owners;

impl Ability<Invoice, User> for Owners {
    fn can(&self, subject: Subject<'_, User>, _action: &Action, target: Target<'_, Invoice>) -> bool {
        match (subject, target) {
            (Subject::Authenticated(user), Target::Instance(Some(invoice))) => {
                invoice.owner == user.id
            }
            (Subject::Authenticated(_), Target::Model(_)) => true,
            _ => false,
        }
    }
}

type BenchConn = Conn<Invoice, User>;

fn setup_warden(invoices: u32) -> Warden<MemoryRepo<Invoice>, Owners, BenchConn> {
    let repo = MemoryRepo::new().with_preloader(|mut invoice: Invoice, _preload: &Preload| {
        invoice.lines_loaded = true;
        invoice
    });
    for id in 0..invoices {
        repo.insert(Invoice {
            id,
            owner: id % 4,
            lines_loaded: false,
        });
    }
    WardenBuilder::new(repo, Owners).build()
}

fn request(action: &str, id: Option<u32>) -> BenchConn {
    let conn = Conn::new(Action::try_from(action).unwrap()).with_assign(
        AssignKey::try_from("current_user").unwrap(),
        Value::Subject(User { id: 1 }),
    );
    match id {
        Some(id) => conn.with_param("id", id.to_string()),
        None => conn,
    }
}

fn invoice_options() -> Options {
    Options::new(ModelName::try_from("Invoice").unwrap())
}

fn bench_show(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_and_authorize_show");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let warden = setup_warden(64);
    let options = invoice_options();

    let allowed = request("show", Some(1));
    group.bench_function("allow", |b| {
        b.iter(|| {
            let mut conn = allowed.clone();
            let decision = block_on(warden.load_and_authorize(&mut conn, &options)).unwrap();
            black_box(decision);
        });
    });

    let denied = request("show", Some(2));
    assert_eq!(
        block_on(warden.load_and_authorize(&mut denied.clone(), &options)).unwrap(),
        Decision::Deny
    );
    group.bench_function("deny", |b| {
        b.iter(|| {
            let mut conn = denied.clone();
            let decision = block_on(warden.load_and_authorize(&mut conn, &options)).unwrap();
            black_box(decision);
        });
    });

    let preloaded = invoice_options().preload(Preload::new(["lines"]));
    group.bench_function("allow_with_preload", |b| {
        b.iter(|| {
            let mut conn = allowed.clone();
            let decision = block_on(warden.load_and_authorize(&mut conn, &preloaded)).unwrap();
            black_box(decision);
        });
    });

    group.finish();
}

fn bench_index_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_and_authorize_index");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    for size in [1u32, 16, 128, 1024] {
        let warden = setup_warden(size);
        let options = invoice_options();
        let template = request("index", None);
        let id = BenchmarkId::from_parameter(size);
        group.bench_with_input(id, &size, |b, _| {
            b.iter(|| {
                let mut conn = template.clone();
                let decision = block_on(warden.load_and_authorize(&mut conn, &options)).unwrap();
                black_box(decision);
            });
        });
    }

    group.finish();
}

fn bench_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("action_filter");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let warden = setup_warden(64);
    let options = invoice_options().only(Action::try_from("edit").unwrap());
    let template = request("show", Some(1));
    group.bench_function("skipped", |b| {
        b.iter(|| {
            let mut conn = template.clone();
            let decision = block_on(warden.load_and_authorize(&mut conn, &options)).unwrap();
            assert_eq!(decision, Decision::Skipped);
            black_box(decision);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_show, bench_index_size, bench_filtered);
criterion_main!(benches);
