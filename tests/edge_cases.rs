use std::collections::HashSet;

use reachdsl::parse::parse_rules;
use reachdsl::{
    function, group, item, location, Argument, CompileError, Flag, FlagValue, Flags, Inventory,
    Operator, Options, Rule, RuleTable, RuleTableBuilder,
};

fn rule(name: &str, flags: &[Flag], conditions: Vec<reachdsl::Condition>) -> Rule {
    let mut set = Flags::new();
    for &flag in flags {
        set.insert(flag, FlagValue::None);
    }
    Rule {
        name: name.to_owned(),
        flags: set,
        operator: (conditions.len() > 1).then_some(Operator::And),
        conditions,
        line: 0,
    }
}

#[test]
fn empty_tables() {
    let table = RuleTable::from_dsl("", "").unwrap();
    assert!(table.rules().is_empty());
    let session = table.session(Options::new()).unwrap();
    assert!(session.goal().is_none());
    assert_eq!(session.scope(), 0..0);
    assert!(session.goal_items().is_empty());
    assert!(session.is_complete(&Inventory::new()));
    assert!(session.mark_progression().unwrap().is_empty());
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let parsed = parse_rules("// header\n\n   \nWood;Item; // trailing\n// footer").unwrap();
    assert_eq!(parsed.rules.len(), 1);
    assert_eq!(parsed.rules[0].line, 4);
}

#[test]
fn escaped_names_survive() {
    let parsed = parse_rules("Rock \\& Roll;;\nFan;;Rock \\& Roll;").unwrap();
    assert_eq!(parsed.rules[0].name, "Rock & Roll");
    assert_eq!(parsed.rules[1].conditions, vec![item("Rock & Roll")]);
}

#[test]
fn deeply_chained_locations() {
    let mut builder = RuleTableBuilder::new().rule(rule("Key", &[Flag::Item], vec![]));
    builder = builder.rule(rule("Room 0", &[Flag::Location], vec![item("Key")]));
    for i in 1..26 {
        let prev = format!("Room {}", i - 1);
        builder = builder.rule(rule(&format!("Room {i}"), &[Flag::Location], vec![location(&prev)]));
    }
    let table = builder.goal("deep").compile().unwrap();
    let session = table.session(Options::new()).unwrap();

    assert!(session
        .can_reach("Room 25", &Inventory::new().with("Key", 1))
        .unwrap());
    assert!(!session.can_reach("Room 25", &Inventory::new()).unwrap());
    assert!(session.mark_progression().unwrap().contains("Key"));
}

#[test]
fn builder_rules_match_parsed_rules() {
    let built = RuleTableBuilder::new()
        .rule(rule("Wood", &[Flag::Item], vec![]))
        .rule(rule("Bench", &[Flag::Location], vec![item("Wood").times(3)]))
        .goal("g")
        .label("ordered")
        .reward("Torch", "Normal")
        .compile()
        .unwrap();
    let parsed = RuleTable::from_dsl("Wood;Item;\nBench;Location;Wood(3);\n#g", "#ordered\nTorch;Normal;")
        .unwrap();
    assert_eq!(built.rules().len(), parsed.rules().len());
    assert_eq!(built.rules()[1].tree(), parsed.rules()[1].tree());
    assert_eq!(built.labels(), parsed.labels());
    assert_eq!(built.rewards()[0].name, parsed.rewards()[0].name);
}

#[test]
fn builder_reports_compile_errors() {
    let err = RuleTableBuilder::new()
        .rule(rule("A", &[], vec![function("teleport", None)]))
        .compile()
        .unwrap_err();
    assert!(matches!(err, CompileError::UndefinedFunction { .. }));
}

#[test]
fn enemy_drop_copies_follow_limits() {
    let table = RuleTable::from_dsl("Slime;Common Enemy;\n#g", "").unwrap();
    let session = table
        .session(Options::new().with_enemy_common_drops(2))
        .unwrap();
    assert!(!session.class("Slime 1").unwrap().disposed);
    assert!(!session.class("Slime 2").unwrap().disposed);
    assert!(session.class("Slime 3").unwrap().disposed);
    assert!(session.class("Slime 1").unwrap().location);
    assert!(!session.class("Slime").unwrap().location);
}

#[test]
fn npcs_become_items_when_randomized() {
    let table = RuleTable::from_dsl("Guide;Guide;\nMerchant;Npc;\n#g", "").unwrap();
    let plain = table.session(Options::new()).unwrap();
    assert!(plain.class("Merchant").unwrap().is_event());

    let npcs = table
        .session(Options::new().with_randomize_npcs(true))
        .unwrap();
    let merchant = npcs.class("Merchant").unwrap();
    assert!(merchant.location && merchant.item);
    assert!(!npcs.class("Guide").unwrap().item);

    let guide = table
        .session(Options::new().with_randomize_npcs(true).with_randomize_guide(true))
        .unwrap();
    assert!(guide.class("Guide").unwrap().item);
}

#[test]
fn achievements_follow_their_toggles() {
    let table = RuleTable::from_dsl(
        "Timber;Achievement|Early;\nBenched;Achievement;\nFisher;Achievement|Fishing;\n#g",
        "",
    )
    .unwrap();
    let session = table.session(Options::new()).unwrap();
    assert!(!session.class("Timber").unwrap().disposed);
    assert!(!session.class("Benched").unwrap().disposed);
    assert!(session.class("Fisher").unwrap().disposed);

    let none = table
        .session(
            Options::new()
                .with_early_achievements(false)
                .with_normal_achievements(false),
        )
        .unwrap();
    assert!(none.class("Timber").unwrap().disposed);
    assert!(none.class("Benched").unwrap().disposed);
}

#[test]
fn item_class_filter_hides_other_classes() {
    let table = RuleTable::from_dsl("Bow;Item|Ranged;\nSword;Item|Melee;\nRope;Item;\n#g", "").unwrap();
    let session = table
        .session(Options::new().with_class_preference(reachdsl::ClassPreference::Melee))
        .unwrap();
    assert!(!session.class("Bow").unwrap().item);
    assert!(session.class("Sword").unwrap().item);
    assert!(session.class("Rope").unwrap().item);
}

#[test]
fn set_state_holds_single_copies() {
    let table = RuleTable::from_dsl("Gel;Item;\nA;;Gel;\nB;;Gel(2);", "").unwrap();
    let session = table.session(Options::new()).unwrap();
    let held: HashSet<String> = ["Gel".to_owned()].into_iter().collect();
    assert!(session.can_reach("A", &held).unwrap());
    assert!(!session.can_reach("B", &held).unwrap());
}

#[test]
fn ad_hoc_queries_compile_against_table() {
    let table = RuleTable::from_dsl("Wood;Item;\nGuide;Npc;", "").unwrap();
    let session = table.session(Options::new()).unwrap();
    let query = group(
        Some(Operator::Or),
        vec![item("Wood").times(5), function("npc", Some(Argument::Number(1)))],
    );
    let compiled = table.compile_condition(&query).unwrap();
    assert!(session
        .evaluate(&compiled, &Inventory::new().with("Guide", 1))
        .unwrap());
    assert!(!session.evaluate(&compiled, &Inventory::new()).unwrap());

    assert!(matches!(
        table.compile_condition(&location("Nowhere")),
        Err(CompileError::UndefinedLocation { .. })
    ));
}

#[test]
fn zero_quantity_is_rejected() {
    assert!(parse_rules("A;;Wood(0);").is_err());
}

#[test]
fn item_flag_renames_the_held_item() {
    let table = RuleTable::from_dsl("Shadow Orb;Item(Orb Reward);\nA;Location;Shadow Orb;\n#g", "").unwrap();
    let session = table.session(Options::new()).unwrap();
    assert!(session
        .can_reach("A", &Inventory::new().with("Orb Reward", 1))
        .unwrap());
    assert_eq!(table.rule("Shadow Orb").unwrap().default_item_name(), "Orb Reward");
    assert!(session.mark_progression().unwrap().contains("Orb Reward"));
}
