use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reachdsl::{Inventory, Options, RuleTable};

const RULES: &str = include_str!("../demos/rules.dsv");
const REWARDS: &str = include_str!("../demos/rewards.dsv");

/// Build a table of `n` locations chained one after another, each needing
/// the previous location and one unique item.
fn chained_table(n: usize) -> (RuleTable, Inventory) {
    let mut text = String::new();
    let mut inventory = Inventory::new();
    for i in 0..n {
        text.push_str(&format!("Key {i};Item;\n"));
        inventory.add(&format!("Key {i}"), 1);
    }
    text.push_str("Room 0;Location;Key 0;\n");
    for i in 1..n {
        text.push_str(&format!("Room {i};Location;#Room {} & Key {i};\n", i - 1));
    }
    text.push_str("#end\n");
    (RuleTable::from_dsl(&text, "").unwrap(), inventory)
}

fn late_game_inventory() -> Inventory {
    Inventory::new()
        .with("Wood", 100)
        .with("Gel", 10)
        .with("Torch", 20)
        .with("Copper Pickaxe", 1)
        .with("Copper Hammer", 1)
        .with("Copper Shortsword", 1)
        .with("Wood Armor", 1)
        .with("Hermes Boots", 1)
}

fn bench_can_reach(c: &mut Criterion) {
    let mut group = c.benchmark_group("can_reach");

    for &n in &[5, 20, 50] {
        let (table, inventory) = chained_table(n);
        let session = table.session(Options::new()).unwrap();
        let last = format!("Room {}", n - 1);
        group.bench_function(&format!("{n}_chained_locations"), |b| {
            b.iter(|| session.can_reach(black_box(&last), black_box(&inventory)));
        });
    }

    let table = RuleTable::from_dsl(RULES, REWARDS).unwrap();
    let session = table.session(Options::new().with_goal("moon_lord")).unwrap();
    let inventory = late_game_inventory();
    group.bench_function("demo_eye_of_cthulhu", |b| {
        b.iter(|| session.can_reach(black_box("Eye of Cthulhu"), black_box(&inventory)));
    });
    group.bench_function("demo_every_rule", |b| {
        b.iter(|| {
            for rule in table.rules() {
                let _ = session.can_reach(rule.name(), black_box(&inventory));
            }
        });
    });

    group.finish();
}

fn bench_mark_progression(c: &mut Criterion) {
    let mut group = c.benchmark_group("mark_progression");
    let table = RuleTable::from_dsl(RULES, REWARDS).unwrap();

    for goal in ["wall_of_flesh", "moon_lord"] {
        let session = table.session(Options::new().with_goal(goal)).unwrap();
        group.bench_function(goal, |b| {
            b.iter(|| black_box(&session).mark_progression());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_can_reach, bench_mark_progression);
criterion_main!(benches);
