use reachdsl::{Inventory, Options, RuleTable};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let table = RuleTable::from_files("demos/rules.dsv", "demos/rewards.dsv")
        .expect("failed to load tables");

    println!("{table}");

    let session = table
        .session(Options::new().with_goal("moon_lord"))
        .expect("goal is declared");

    let inventory = Inventory::new()
        .with("Wood", 20)
        .with("Gel", 1)
        .with("Torch", 1)
        .with("Copper Shortsword", 1);
    for location in ["Workbench", "Surface Chest", "Eye of Cthulhu", "Moon Lord"] {
        let reachable = session
            .can_reach(location, &inventory)
            .expect("location is declared");
        println!("{location}: {}", if reachable { "reachable" } else { "locked" });
    }

    let progression = session.mark_progression().expect("table is consistent");
    println!("{} progression items:", progression.len());
    for name in progression.iter() {
        println!("  {name}");
    }

    for label in table.labels() {
        let rewards = session.rewards(&label.name).expect("label is declared");
        println!("#{}: {}", label.name, rewards.join(", "));
    }
}
