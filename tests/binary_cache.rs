#![cfg(feature = "binary-cache")]

use reachdsl::serial::source_digest;
use reachdsl::{DeserializeError, Inventory, Options, RuleTable};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const RULES: &str = "\
Wood;Item;
Torch;Item;Wood;
Surface Chest;Chest;Torch;
Copper Pickaxe;Item|Pickaxe(35);
Guide;Npc;
Sword;Item|Melee;
Melee Gear;Weapon Power(1)|Melee;Sword;
Armor;Armor Power(1);Wood(5);
Trinkets;Accessory Power(1);Torch;
Boss;Location|Item|Goal;@gear_power(1) & @pickaxe(35) & (@npc(1) | ~@calamity);
#boss
";

const REWARDS: &str = "#ordered\nPotion;Normal;\nShard;Calamity;";

fn demo_table() -> RuleTable {
    RuleTable::from_dsl(RULES, REWARDS).unwrap()
}

fn inventories() -> Vec<Inventory> {
    vec![
        Inventory::new(),
        Inventory::new().with("Wood", 5).with("Torch", 1),
        Inventory::new()
            .with("Wood", 5)
            .with("Torch", 1)
            .with("Sword", 1)
            .with("Copper Pickaxe", 1),
    ]
}

fn assert_same_answers(original: &RuleTable, restored: &RuleTable) {
    let before = original.session(Options::new()).unwrap();
    let after = restored.session(Options::new()).unwrap();
    for inventory in inventories() {
        for rule in original.rules() {
            assert_eq!(
                before.can_reach(rule.name(), &inventory).unwrap(),
                after.can_reach(rule.name(), &inventory).unwrap(),
                "{} disagrees",
                rule.name()
            );
        }
    }
    assert_eq!(
        before.mark_progression().unwrap(),
        after.mark_progression().unwrap()
    );
    assert_eq!(before.goal_items(), after.goal_items());
    assert_eq!(before.rewards("ordered").unwrap(), after.rewards("ordered").unwrap());
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn round_trip_preserves_answers() {
    let original = demo_table();
    let bytes = original.to_bytes(None).unwrap();
    let restored = RuleTable::from_bytes(&bytes).unwrap();

    assert_eq!(original.to_string(), restored.to_string());
    assert_eq!(original.rules().len(), restored.rules().len());
    assert_eq!(
        original.goal("boss").unwrap().locations(),
        restored.goal("boss").unwrap().locations()
    );
    assert_same_answers(&original, &restored);
}

#[test]
fn round_trip_with_source_digest() {
    let original = demo_table();
    let bytes = original.to_bytes(Some(RULES)).unwrap();
    assert_eq!(
        source_digest(&bytes).unwrap(),
        Some(*blake3::hash(RULES.as_bytes()).as_bytes())
    );
    let restored = RuleTable::from_bytes(&bytes).unwrap();
    assert_same_answers(&original, &restored);
}

#[test]
fn goal_reachable_after_restore() {
    let restored = RuleTable::from_bytes(&demo_table().to_bytes(None).unwrap()).unwrap();
    let session = restored.session(Options::new()).unwrap();
    let kit = &inventories()[2];
    assert!(session.can_reach("Boss", kit).unwrap());
    assert!(!session.can_reach("Boss", &inventories()[1]).unwrap());
}

// ---------------------------------------------------------------------------
// Corruption: byte flip -> ChecksumMismatch
// ---------------------------------------------------------------------------

#[test]
fn corruption_byte_flip() {
    let bytes = demo_table().to_bytes(None).unwrap();
    let mut corrupted = bytes.clone();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;

    let err = RuleTable::from_bytes(&corrupted).unwrap_err();
    assert!(
        matches!(err, DeserializeError::ChecksumMismatch),
        "expected ChecksumMismatch, got: {err}"
    );
}

// ---------------------------------------------------------------------------
// Corruption: truncation -> LengthMismatch
// ---------------------------------------------------------------------------

#[test]
fn corruption_truncation() {
    let bytes = demo_table().to_bytes(None).unwrap();
    let truncated = &bytes[..33];

    let err = RuleTable::from_bytes(truncated).unwrap_err();
    assert!(
        matches!(err, DeserializeError::LengthMismatch { .. }),
        "expected LengthMismatch, got: {err}"
    );
}

// ---------------------------------------------------------------------------
// Bad magic
// ---------------------------------------------------------------------------

#[test]
fn bad_magic() {
    let bytes = demo_table().to_bytes(None).unwrap();
    let mut bad = bytes.clone();
    bad[0..4].copy_from_slice(b"BAAD");

    let err = RuleTable::from_bytes(&bad).unwrap_err();
    assert!(
        matches!(err, DeserializeError::BadMagic),
        "expected BadMagic, got: {err}"
    );
}

// ---------------------------------------------------------------------------
// Version mismatch
// ---------------------------------------------------------------------------

#[test]
fn version_mismatch() {
    let bytes = demo_table().to_bytes(None).unwrap();
    let mut bad = bytes.clone();
    bad[4] = 99;
    bad[5] = 0;

    let err = RuleTable::from_bytes(&bad).unwrap_err();
    assert!(
        matches!(
            err,
            DeserializeError::IncompatibleVersion {
                blob: 99,
                supported: 1
            }
        ),
        "expected IncompatibleVersion, got: {err}"
    );
}

// ---------------------------------------------------------------------------
// File round-trip
// ---------------------------------------------------------------------------

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join("reachdsl_test_binary_cache");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("table.rdsl");

    let original = RuleTable::from_files("demos/rules.dsv", "demos/rewards.dsv").unwrap();
    original.to_binary_file(&path, None).unwrap();
    let restored = RuleTable::from_binary_file(&path).unwrap();

    assert_eq!(original.to_string(), restored.to_string());
    let session = restored.session(Options::new().with_goal("moon_lord")).unwrap();
    assert!(session
        .can_reach("Workbench", &Inventory::new().with("Wood", 1))
        .unwrap());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_file_is_io_error() {
    let err = RuleTable::from_binary_file("does/not/exist.rdsl").unwrap_err();
    assert!(matches!(err, DeserializeError::Io(_)));
}
