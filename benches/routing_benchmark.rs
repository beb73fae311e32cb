use std::time::Duration;

use cgsr::contact::Contact;
use cgsr::contact_plan::ContactPlan;
use cgsr::pathfinding::dijkstra::earliest_arrival;
use cgsr::pathfinding::yen::k_shortest;
use cgsr::pathfinding::SearchConstraint;
use cgsr::types::NodeID;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Builds a layered relay topology: `width` satellites per layer, `layers`
/// layers deep, each node contacting every node in the next layer once per
/// `period`, repeated `repeats` times, feeding a single gateway at the end.
fn layered_contact_plan(layers: usize, width: usize, repeats: usize, period: f64) -> (Vec<Contact>, NodeID, NodeID) {
    let mut contacts = Vec::new();
    let source: NodeID = 0;
    let gateway: NodeID = (layers as NodeID) * (width as NodeID) + 1;

    let mut layer_start = 1u32;
    let mut prev_layer: Vec<NodeID> = vec![source];
    for layer in 0..layers {
        let this_layer: Vec<NodeID> = (0..width as u32).map(|i| layer_start + i).collect();
        for rep in 0..repeats {
            let start = rep as f64 * period;
            let end = start + period * 0.5;
            for &frm in &prev_layer {
                for &to in &this_layer {
                    contacts.push(Contact::new(frm, to, start, end, 1.0e6, 0.05, 0.99).unwrap());
                }
            }
        }
        prev_layer = this_layer;
        layer_start += width as u32;
        let _ = layer;
    }
    for rep in 0..repeats {
        let start = rep as f64 * period;
        let end = start + period * 0.5;
        for &frm in &prev_layer {
            contacts.push(Contact::new(frm, gateway, start, end, 1.0e6, 0.05, 0.99).unwrap());
        }
    }

    (contacts, source, gateway)
}

fn dijkstra_benchmark(c: &mut Criterion) {
    let (contacts, source, gateway) = layered_contact_plan(4, 6, 5, 100.0);
    let mut plan = ContactPlan::new(contacts);

    c.bench_function("earliest_arrival/4x6 relay mesh", |b| {
        b.iter(|| {
            earliest_arrival(
                black_box(&mut plan),
                black_box(source),
                black_box(0.0),
                |n| if n == gateway { Some(gateway) } else { None },
                black_box(gateway),
                SearchConstraint::new(),
            )
        })
    });
}

fn yen_benchmark(c: &mut Criterion) {
    let (contacts, source, gateway) = layered_contact_plan(4, 6, 5, 100.0);
    let mut plan = ContactPlan::new(contacts);

    c.bench_function("k_shortest/4x6 relay mesh, k=5", |b| {
        b.iter(|| {
            k_shortest(
                black_box(&mut plan),
                black_box(source),
                black_box(0.0),
                |n| if n == gateway { Some(gateway) } else { None },
                black_box(gateway),
                SearchConstraint::new(),
                5,
            )
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = dijkstra_benchmark, yen_benchmark
}
criterion_main!(benches);
