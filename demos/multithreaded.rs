use std::sync::Arc;
use std::thread;

use reachdsl::{ClassPreference, Inventory, Options, RuleTable};

fn main() {
    let table = Arc::new(
        RuleTable::from_files("demos/rules.dsv", "demos/rewards.dsv")
            .expect("failed to load tables"),
    );

    let preferences = [
        ClassPreference::Disabled,
        ClassPreference::Melee,
        ClassPreference::Ranged,
        ClassPreference::Magic,
    ];

    let handles: Vec<_> = preferences
        .into_iter()
        .map(|preference| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                // Each thread binds its own configuration to the shared table.
                let session = table
                    .session(Options::new().with_class_preference(preference))
                    .expect("default goal is declared");
                let inventory = Inventory::new()
                    .with("Wood", 20)
                    .with("Torch", 1)
                    .with("Wooden Bow", 1)
                    .with("Wood Armor", 1)
                    .with("Hermes Boots", 1);
                let reachable = session
                    .can_reach("Eye of Cthulhu", &inventory)
                    .expect("rule is declared");
                println!("{preference:?}: Eye of Cthulhu reachable = {reachable}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
