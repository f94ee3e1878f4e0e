use reachdsl::{
    ClassPreference, DslError, EvalError, Inventory, Options, ParseError, RuleTable, WorldEvil,
};

fn demo_table() -> RuleTable {
    RuleTable::from_files("demos/rules.dsv", "demos/rewards.dsv").unwrap()
}

#[test]
fn dsl_parse_and_evaluate() {
    let rules = r"
// crafting chain
Wood;Item;
Gel;Item;
Torch;Item;Wood & Gel;
Workbench;Location;Wood(5);
Cave;Location;Torch & #Workbench;
#cave
";
    let table = RuleTable::from_dsl(rules, "").unwrap();
    let session = table.session(Options::new()).unwrap();

    let inventory = Inventory::new().with("Wood", 5).with("Torch", 1);
    assert!(session.can_reach("Workbench", &inventory).unwrap());
    assert!(session.can_reach("Cave", &inventory).unwrap());

    let short = Inventory::new().with("Wood", 4).with("Torch", 1);
    assert!(!session.can_reach("Cave", &short).unwrap());
}

#[test]
fn dsl_from_files() {
    let table = demo_table();
    assert_eq!(
        table.goals().iter().map(|g| g.name()).collect::<Vec<_>>(),
        vec![
            "wall_of_flesh",
            "mechanical_bosses",
            "moon_lord",
            "calamity_final_bosses"
        ]
    );
    assert_eq!(table.labels().len(), 2);
    assert_eq!(table.rewards().len(), 5);
    assert!(table.rule("Surface Chest 100").is_some());
    assert!(table.rule("Slime 1").is_some());
}

#[test]
fn dsl_display() {
    let table = RuleTable::from_dsl("A;;\nB;Location;A;\n#g", "#l\nX;Normal;").unwrap();
    assert_eq!(table.to_string(), "RuleTable(2 rules, 1 goals, 1 labels, 1 rewards)");
}

#[test]
fn goal_locations_from_flags() {
    let table = demo_table();
    let mech = table.goal("mechanical_bosses").unwrap();
    assert_eq!(mech.locations().len(), 3);
    assert!(mech.locations().contains("The Destroyer"));
    let wof = table.goal("wall_of_flesh").unwrap();
    assert!(wof.locations().contains("Wall of Flesh"));
}

#[test]
fn mechanical_goal_scope_ends_at_marker() {
    let table = demo_table();
    let session = table
        .session(Options::new().with_goal("mechanical_bosses"))
        .unwrap();
    let scope = session.scope();
    let plantera = table.index_of("Plantera").unwrap();
    let prime = table.index_of("Skeletron Prime").unwrap();
    assert!(scope.contains(&prime));
    assert!(!scope.contains(&plantera));
}

#[test]
fn calamity_goal_forces_calamity() {
    let table = demo_table();
    let session = table
        .session(Options::new().with_goal("calamity_final_bosses"))
        .unwrap();
    assert!(session.options().calamity);
    assert_eq!(
        session.rewards("ordered").unwrap(),
        vec![
            "Reward: Torch Pack",
            "Reward: Healing Potion",
            "Reward: Calamity Shard"
        ]
    );
}

#[test]
fn unknown_goal_fails_session() {
    let table = demo_table();
    let err = table.session(Options::new().with_goal("golem")).unwrap_err();
    assert_eq!(
        err,
        EvalError::UnknownGoal {
            goal: "golem".into()
        }
    );
}

#[test]
fn gear_follows_class_preference() {
    let table = demo_table();
    let bow_kit = Inventory::new()
        .with("Torch", 1)
        .with("Wooden Bow", 1)
        .with("Wood Armor", 1)
        .with("Hermes Boots", 1);

    let ranged = table
        .session(Options::new().with_class_preference(ClassPreference::Ranged))
        .unwrap();
    assert!(ranged.can_reach("Eye of Cthulhu", &bow_kit).unwrap());

    let melee = table
        .session(Options::new().with_class_preference(ClassPreference::Melee))
        .unwrap();
    assert!(!melee.can_reach("Eye of Cthulhu", &bow_kit).unwrap());
    assert!(melee
        .can_reach("Eye of Cthulhu", &bow_kit.clone().with("Copper Shortsword", 1))
        .unwrap());
}

#[test]
fn world_evil_disposes_other_biome() {
    let table = demo_table();
    let crimson = table
        .session(Options::new().with_world_evil(WorldEvil::Crimson))
        .unwrap();
    assert!(crimson.class("Demonite Ore").unwrap().disposed);
    assert!(!crimson.class("Crimtane Ore").unwrap().disposed);

    let either = table.session(Options::new()).unwrap();
    assert!(!either.class("Demonite Ore").unwrap().disposed);
}

#[test]
fn progression_for_demo_goal() {
    let table = demo_table();
    let session = table.session(Options::new()).unwrap();
    let progression = session.mark_progression().unwrap();
    // Goal and tool rules mark themselves.
    assert!(progression.contains("Wall of Flesh"));
    assert!(progression.contains("Copper Pickaxe"));
    // Location conditions.
    assert!(progression.contains("Wood"));
    assert!(progression.contains("Torch"));
    assert!(progression.contains("Evil Pickaxe"));
    // Items are not recursed into; Gel only feeds Torch.
    assert!(!progression.contains("Gel"));
    // Out of scope for the first goal.
    assert!(!progression.contains("Cobalt Ore"));
}

#[test]
fn parse_error_reports_position() {
    let err = RuleTable::from_dsl("Wood;Item;\nTorch;Item;Wood & Gel |;", "").unwrap_err();
    let DslError::Parse(err) = err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert!(matches!(
        err,
        ParseError::OperatorConflict {
            line: 2,
            found: '|',
            existing: '&',
            ..
        }
    ));
}

#[test]
fn reward_errors_name_the_table() {
    let err = RuleTable::from_dsl("", "#a\nTorch;;").unwrap_err();
    assert!(err.to_string().starts_with("in `rewards`"), "{err}");
}

#[test]
fn dependencies_listed_in_order() {
    let table = demo_table();
    assert_eq!(
        table.dependencies_of("Gold Pickaxe").unwrap(),
        vec!["Workbench", "Wood"]
    );
    assert!(table.dependencies_of("Nothing").is_none());
}
