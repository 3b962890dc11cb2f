use lesson_plan_core::{
    get, leaf_paths, set, try_set, FieldPath, LessonPlan, PathError, PlanSection,
};
use std::sync::Arc;

fn sample_plan() -> LessonPlan {
    let plan = LessonPlan::default_plan().with_game_added();
    let plan = set(&plan, &FieldPath::parse("basic.unit"), "7");
    let plan = set(&plan, &FieldPath::parse("objectives.vocab.core"), "apple, banana");
    let plan = set(&plan, &FieldPath::parse("games.1.name"), "Simon Says");
    set(&plan, &FieldPath::parse("steps.3.design"), "Pair drill")
}

#[test]
fn writing_a_leaf_changes_only_that_leaf() {
    let plan = sample_plan();
    let paths = leaf_paths(&plan);

    for target in &paths {
        let next = set(&plan, target, "updated");
        assert_eq!(get(&next, target), "updated", "write missed {target}");
        for other in paths.iter().filter(|path| *path != target) {
            assert_eq!(get(&next, other), get(&plan, other), "{target} leaked into {other}");
        }
    }
}

#[test]
fn writing_the_current_value_yields_an_equal_plan() {
    let plan = sample_plan();
    for path in leaf_paths(&plan) {
        let current = get(&plan, &path).to_string();
        assert_eq!(set(&plan, &path, current), plan, "{path} changed on rewrite");
    }
}

#[test]
fn input_plan_is_never_modified() {
    let plan = sample_plan();
    let before = plan.clone();

    let _ = set(&plan, &FieldPath::parse("steps.3.design"), "Role play");
    let _ = set(&plan, &FieldPath::parse("feedback.parent.content"), "Great");

    assert_eq!(plan, before);
}

#[test]
fn untouched_sections_and_items_stay_shared() {
    let plan = sample_plan();
    let next = set(&plan, &FieldPath::item(PlanSection::Steps, 3, "design"), "Role play");

    assert!(Arc::ptr_eq(&plan.basic, &next.basic));
    assert!(Arc::ptr_eq(&plan.objectives, &next.objectives));
    assert!(Arc::ptr_eq(&plan.feedback, &next.feedback));
    assert!(next.games.shares_storage_with(&plan.games));
    assert!(!next.steps.shares_storage_with(&plan.steps));
    assert!(next.steps.shares_item_with(&plan.steps, 0));
    assert!(!next.steps.shares_item_with(&plan.steps, 3));
}

#[test]
fn nested_group_write_keeps_sibling_groups_shared() {
    let plan = sample_plan();
    let next = set(
        &plan,
        &FieldPath::group_field(PlanSection::Objectives, "patterns", "basic"),
        "I like ...",
    );

    assert_eq!(next.objectives.patterns.basic, "I like ...");
    assert!(Arc::ptr_eq(&plan.objectives.vocab, &next.objectives.vocab));
    assert!(Arc::ptr_eq(&plan.objectives.expansion, &next.objectives.expansion));
}

#[test]
fn unresolved_paths_read_empty_and_fail_to_write() {
    let plan = sample_plan();
    for dotted in ["basic.teacher", "steps.9.design", "games.name", "objectives.vocab", ""] {
        let path = FieldPath::parse(dotted);
        assert_eq!(get(&plan, &path), "");
        assert!(matches!(
            try_set(&plan, &path, "x"),
            Err(PathError::Unresolved { .. })
        ));
    }
}

#[test]
fn list_editing_round_trip_restores_plan() {
    let plan = sample_plan();

    let grown = plan.with_step_added();
    let restored = grown.with_step_removed(grown.steps.len() - 1);

    assert_eq!(restored, plan);
}

#[test]
fn removal_keeps_the_last_item() {
    let single = LessonPlan::default_plan();
    assert_eq!(single.games.len(), 1);

    let kept = single.with_game_removed(0);
    assert_eq!(kept.games.len(), 1);
    assert_eq!(kept, single);
}

#[test]
fn clearing_a_section_leaves_other_sections_shared() {
    let plan = sample_plan();
    let cleared = plan.with_section_cleared(PlanSection::Games);

    assert_eq!(cleared.games, LessonPlan::default_plan().games);
    assert!(Arc::ptr_eq(&plan.basic, &cleared.basic));
    assert!(cleared.steps.shares_storage_with(&plan.steps));
}
