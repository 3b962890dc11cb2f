use lesson_plan_core::{
    get, leaf_paths, reconcile, set, FieldPath, LessonPlan, ReconcileOptions,
};
use serde_json::{json, Value};

fn edited_plan() -> LessonPlan {
    let mut plan = LessonPlan::default_plan().with_game_added().with_step_added();
    for (index, path) in leaf_paths(&plan).iter().enumerate() {
        plan = set(&plan, path, format!("value {index}"));
    }
    plan
}

#[test]
fn any_input_produces_a_complete_plan() {
    let inputs = [
        json!(null),
        json!({}),
        json!([]),
        json!("str"),
        json!({ "basic": [], "games": "x", "steps": null, "feedback": { "parent": 3 } }),
        json!({ "objectives": { "vocab": "core" }, "games": [[], 1, {}] }),
    ];

    for input in inputs {
        let plan = reconcile(&input, &ReconcileOptions::default());
        assert!(!plan.games.is_empty(), "games floor broken for {input}");
        assert!(!plan.steps.is_empty(), "steps floor broken for {input}");

        let scalar_leaves = 7 + 9 + 4 + 4 + 9;
        let expected = scalar_leaves + 4 * plan.games.len() + 6 * plan.steps.len();
        assert_eq!(leaf_paths(&plan).len(), expected, "shape broken for {input}");
    }
}

#[test]
fn empty_object_reconciles_to_default_plan() {
    assert_eq!(
        reconcile(&json!({}), &ReconcileOptions::default()),
        LessonPlan::default_plan()
    );
}

#[test]
fn valid_plan_json_reconciles_to_itself() {
    let plan = edited_plan();
    let encoded = serde_json::to_value(&plan).unwrap();

    let restored = reconcile(&encoded, &ReconcileOptions::default());

    assert_eq!(restored, plan);
    assert_eq!(serde_json::to_value(&restored).unwrap(), encoded);
}

#[test]
fn partial_game_list_is_taken_as_given() {
    let input = json!({ "games": [{ "name": "Simon Says" }] });
    let plan = reconcile(&input, &ReconcileOptions::default());

    assert_eq!(plan.games.len(), 1);
    assert_eq!(get(&plan, &FieldPath::parse("games.0.name")), "Simon Says");
    assert_eq!(get(&plan, &FieldPath::parse("games.0.rules")), "");
    assert_eq!(plan.steps, LessonPlan::default_plan().steps);
}

#[test]
fn empty_step_list_is_padded_to_import_minimum() {
    let options = ReconcileOptions {
        min_games: 1,
        min_steps: 5,
    };
    let plan = reconcile(&json!({ "steps": [] }), &options);

    assert_eq!(plan.steps.len(), 5);
    assert!(plan.steps.iter().all(|step| step.step.is_empty()));
}

#[test]
fn unknown_fields_are_dropped_from_output() {
    let input = json!({
        "basic": { "unit": "7", "teacher": "Ms. Li" },
        "extra": { "anything": true },
    });
    let plan = reconcile(&input, &ReconcileOptions::default());
    let output = serde_json::to_value(&plan).unwrap();

    assert_eq!(output["basic"]["unit"], Value::from("7"));
    assert!(output["basic"].get("teacher").is_none());
    assert!(output.get("extra").is_none());
}

#[test]
fn non_string_leaves_read_as_empty() {
    let input = json!({
        "materials": { "cards": 12, "realia": true, "rewards": "stickers" },
        "connection": { "homework": { "text": "read" } },
    });
    let plan = reconcile(&input, &ReconcileOptions::default());

    assert_eq!(plan.materials.cards, "");
    assert_eq!(plan.materials.realia, "");
    assert_eq!(plan.materials.rewards, "stickers");
    assert_eq!(plan.connection.homework, "");
}
