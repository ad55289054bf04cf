use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use waymark::router::match_path;
use waymark::{handler, CompiledPattern, RequestContext, Router, RouterBuilder};

fn zoo_router() -> Router {
    let mut builder = RouterBuilder::new();
    let ok = || handler(|call| {
        black_box(call.params().len());
        Ok(())
    });

    builder.before("GET|POST|PUT|PATCH|DELETE", "/.*", ok()).unwrap();
    builder.get("/", ok()).unwrap();
    builder
        .mount("/zoo", |zoo| {
            zoo.get("/animals", ok())?;
            zoo.post("/animals", ok())?;
            zoo.get("/animals/{id}", ok())?;
            zoo.put("/animals/{id}", ok())?;
            zoo.patch("/animals/{id}", ok())?;
            zoo.delete("/animals/{id}", ok())?;
            zoo.get("/animals/{id}/toys/{toy_id}", ok())?;
            zoo.get(
                "/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
                ok(),
            )?;
            zoo.options("/health", ok())?;
            Ok(())
        })
        .unwrap();
    builder
        .post("/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}", ok())
        .unwrap();
    builder
        .get("/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}", ok())
        .unwrap();
    builder
        .get(r"/blog(/\d{4}(/\d{2}(/\d{2}(/[a-z0-9_-]+)?)?)?)?", ok())
        .unwrap();
    builder.set_404(ok());
    builder.build()
}

fn bench_route_throughput(c: &mut Criterion) {
    let router = zoo_router();
    let requests: Vec<RequestContext> = [
        ("GET", "/zoo/animals/123"),
        ("GET", "/zoo/animals/123/toys/456"),
        ("GET", "/zoo/cats/animals/123/habitats/88/sections/5"),
        ("POST", "/inventory/1/feeds/2/items/3/batches/4"),
        ("GET", "/complex/1/2/3/4/5/6/7/8/9"),
        ("GET", "/blog/1983/12/26/bramus"),
        ("HEAD", "/zoo/animals"),
    ]
    .iter()
    .map(|(method, uri)| RequestContext::parse(method, *uri).unwrap())
    .collect();

    c.bench_function("route_match_and_dispatch", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(router.run(request).unwrap());
            }
        })
    });

    let misses: Vec<RequestContext> = [("GET", "/nowhere/at/all"), ("DELETE", "/zoo/animals")]
        .iter()
        .map(|(method, uri)| RequestContext::parse(method, *uri).unwrap())
        .collect();

    c.bench_function("not_found_fallback", |b| {
        b.iter(|| {
            for request in &misses {
                black_box(router.run(request).unwrap());
            }
        })
    });
}

fn bench_pattern_extraction(c: &mut Criterion) {
    let pattern =
        CompiledPattern::compile(r"/blog(/\d{4}(/\d{2}(/\d{2}(/[a-z0-9_-]+)?)?)?)?").unwrap();
    c.bench_function("nested_optional_extraction", |b| {
        b.iter(|| black_box(match_path(&pattern, black_box("/blog/1983/12/26/bramus"))))
    });
}

criterion_group!(benches, bench_route_throughput, bench_pattern_extraction);
criterion_main!(benches);
