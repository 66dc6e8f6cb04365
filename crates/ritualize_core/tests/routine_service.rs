use ritualize_core::db::open_db_in_memory;
use ritualize_core::{
    RoutineColor, RoutineDefaults, RoutineDraft, RoutineRepository, RoutineService,
    RoutineServiceError, SqliteRoutineRepository, TaskDraft, TaskType,
};

fn named_task(name: &str) -> TaskDraft {
    TaskDraft::new(name, TaskType::Task)
}

fn names(service: &RoutineService<SqliteRoutineRepository<'_>>, routine_id: &str) -> Vec<String> {
    service
        .sorted_tasks(routine_id)
        .unwrap()
        .into_iter()
        .map(|task| task.name)
        .collect()
}

#[test]
fn create_routine_trims_and_rejects_blank_names() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());

    let routine = service
        .create_routine(&RoutineDraft::named("  Morning  "))
        .unwrap();
    assert_eq!(routine.name, "Morning");
    assert!(!service.repository().has_pending_changes());

    let err = service
        .create_routine(&RoutineDraft::named("   "))
        .unwrap_err();
    assert!(matches!(err, RoutineServiceError::InvalidName));
    assert_eq!(service.list_routines().unwrap().len(), 1);
}

#[test]
fn new_routine_draft_uses_configured_defaults() {
    let conn = open_db_in_memory().unwrap();
    let defaults = RoutineDefaults {
        icon: "moon".to_string(),
        color: RoutineColor::Purple,
    };
    let service =
        RoutineService::with_defaults(SqliteRoutineRepository::try_new(&conn).unwrap(), defaults);

    let mut draft = service.new_routine_draft();
    assert!(draft.name.is_empty());
    assert_eq!(draft.icon, "moon");
    assert_eq!(draft.color, RoutineColor::Purple);

    draft.name = "Night".to_string();
    let saved = service.create_routine(&draft).unwrap();
    assert_eq!(service.routine(&saved.id).unwrap().color, RoutineColor::Purple);
}

#[test]
fn add_task_appends_and_validates() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();

    service.add_task(&routine.id, &named_task("Warm up")).unwrap();
    service.add_task(&routine.id, &named_task("Squat")).unwrap();
    assert_eq!(names(&service, &routine.id), vec!["Warm up", "Squat"]);

    assert!(matches!(
        service.add_task(&routine.id, &named_task("")),
        Err(RoutineServiceError::InvalidName)
    ));
    assert!(matches!(
        service.add_task("missing", &named_task("Row")),
        Err(RoutineServiceError::RoutineNotFound(id)) if id == "missing"
    ));
}

#[test]
fn toggles_flip_and_persist() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();
    let task = service.add_task(&routine.id, &named_task("Squat")).unwrap();

    assert!(service.toggle_favorite(&routine.id).unwrap());
    assert!(service.routine(&routine.id).unwrap().is_favorite);
    assert!(!service.toggle_favorite(&routine.id).unwrap());

    assert!(service.toggle_task_completed(&task.id).unwrap());
    assert!(service.is_all_tasks_completed(&routine.id).unwrap());
    assert!(!service.toggle_task_completed(&task.id).unwrap());

    assert!(matches!(
        service.toggle_task_completed("ghost"),
        Err(RoutineServiceError::TaskNotFound(_))
    ));
}

#[test]
fn uncheck_all_tasks_clears_every_completion() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();
    let first = service.add_task(&routine.id, &named_task("A")).unwrap();
    service.add_task(&routine.id, &named_task("B")).unwrap();
    let third = service.add_task(&routine.id, &named_task("C")).unwrap();

    service.set_task_completed(&first.id, true).unwrap();
    service.set_task_completed(&third.id, true).unwrap();

    assert_eq!(service.uncheck_all_tasks(&routine.id).unwrap(), 2);
    assert!(service
        .sorted_tasks(&routine.id)
        .unwrap()
        .iter()
        .all(|task| !task.is_completed));
}

#[test]
fn move_task_reorders_within_routine() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();
    for name in ["A", "B", "C", "D"] {
        service.add_task(&routine.id, &named_task(name)).unwrap();
    }

    service.move_task(&routine.id, 3, 1).unwrap();
    assert_eq!(names(&service, &routine.id), vec!["A", "D", "B", "C"]);

    service.move_task(&routine.id, 0, 4).unwrap();
    assert_eq!(names(&service, &routine.id), vec!["D", "B", "C", "A"]);

    service.move_task(&routine.id, 2, 2).unwrap();
    assert_eq!(names(&service, &routine.id), vec!["D", "B", "C", "A"]);
    assert!(!service.repository().has_pending_changes());
}

#[test]
fn move_task_with_tied_orders_rebases() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();
    for name in ["A", "B", "C"] {
        let draft = TaskDraft {
            order: Some(0),
            ..named_task(name)
        };
        service.add_task(&routine.id, &draft).unwrap();
    }

    service.move_task(&routine.id, 2, 0).unwrap();
    assert_eq!(names(&service, &routine.id), vec!["C", "A", "B"]);

    let orders = service
        .sorted_tasks(&routine.id)
        .unwrap()
        .into_iter()
        .map(|task| task.order)
        .collect::<Vec<_>>();
    assert!(orders.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
#[should_panic]
fn move_task_out_of_range_panics() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();
    service.add_task(&routine.id, &named_task("A")).unwrap();

    let _ = service.move_task(&routine.id, 1, 0);
}

#[test]
fn move_routine_reorders_list() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    for name in ["Morning", "Gym", "Night"] {
        service.create_routine(&RoutineDraft::named(name)).unwrap();
    }

    service.move_routine(2, 0).unwrap();

    let order = service
        .list_routines()
        .unwrap()
        .into_iter()
        .map(|routine| routine.name)
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["Night", "Morning", "Gym"]);
}

#[test]
fn sections_group_tasks_under_milestones() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Morning")).unwrap();
    service.add_task(&routine.id, &named_task("Water")).unwrap();
    service
        .add_task(&routine.id, &TaskDraft::new("Bathroom", TaskType::Milestone))
        .unwrap();
    service.add_task(&routine.id, &named_task("Brush teeth")).unwrap();

    let sections = service.sections(&routine.id).unwrap();
    let shape = sections
        .iter()
        .map(|section| {
            (
                section.name.as_str(),
                section
                    .tasks
                    .iter()
                    .map(|task| task.name.as_str())
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        shape,
        vec![
            ("Others", vec!["Water"]),
            ("Bathroom", vec!["Brush teeth"]),
        ]
    );
}

#[test]
fn completion_ignores_milestones_and_empty_routine_is_incomplete() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Morning")).unwrap();

    assert!(!service.is_all_tasks_completed(&routine.id).unwrap());

    service
        .add_task(&routine.id, &TaskDraft::new("Bathroom", TaskType::Milestone))
        .unwrap();
    let task = service.add_task(&routine.id, &named_task("Brush")).unwrap();
    assert!(!service.is_all_tasks_completed(&routine.id).unwrap());

    service.set_task_completed(&task.id, true).unwrap();
    assert!(service.is_all_tasks_completed(&routine.id).unwrap());
}

#[test]
fn batch_deletes_remove_everything_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let a = service.create_routine(&RoutineDraft::named("A")).unwrap();
    let b = service.create_routine(&RoutineDraft::named("B")).unwrap();
    let t1 = service.add_task(&a.id, &named_task("one")).unwrap();
    let t2 = service.add_task(&a.id, &named_task("two")).unwrap();

    let err = service
        .delete_routines([b.id.as_str(), "ghost"])
        .unwrap_err();
    assert!(matches!(err, RoutineServiceError::RoutineNotFound(_)));
    assert_eq!(service.list_routines().unwrap().len(), 2);

    assert_eq!(service.delete_tasks([&t1.id, &t2.id]).unwrap(), 2);
    assert!(service.sorted_tasks(&a.id).unwrap().is_empty());

    assert_eq!(service.delete_routines(vec![a.id, b.id]).unwrap(), 2);
    assert!(service.list_routines().unwrap().is_empty());
}

#[test]
fn update_routine_and_task_validate_names() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let mut routine = service.create_routine(&RoutineDraft::named("Gym")).unwrap();
    let mut task = service.add_task(&routine.id, &named_task("Squat")).unwrap();

    routine.name = " Leg day ".to_string();
    service.update_routine(&routine).unwrap();
    assert_eq!(service.routine(&routine.id).unwrap().name, "Leg day");

    task.name = String::new();
    assert!(matches!(
        service.update_task(&task),
        Err(RoutineServiceError::InvalidName)
    ));
    task.name = "Front squat".to_string();
    task.duration_minutes = Some(10);
    service.update_task(&task).unwrap();

    let stored = service.repository().get_task(&task.id).unwrap().unwrap();
    assert_eq!(stored.name, "Front squat");
    assert_eq!(stored.duration_minutes, Some(10));
}

#[test]
fn run_session_completes_actionable_tasks_in_order() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let routine = service.create_routine(&RoutineDraft::named("Morning")).unwrap();
    let water = service.add_task(&routine.id, &named_task("Water")).unwrap();
    service
        .add_task(&routine.id, &TaskDraft::new("Bathroom", TaskType::Milestone))
        .unwrap();
    let brush = service.add_task(&routine.id, &named_task("Brush")).unwrap();

    let mut run = service.start_run(&routine.id).unwrap();
    assert_eq!(run.steps().len(), 2);

    assert_eq!(service.complete_run_step(&mut run).unwrap(), Some(water.id));
    run.skip();
    assert!(run.is_finished());
    assert_eq!(service.complete_run_step(&mut run).unwrap(), None);

    run.previous();
    assert_eq!(
        service.complete_run_step(&mut run).unwrap(),
        Some(brush.id.clone())
    );
    assert_eq!(run.progress(), (2, 2));
    assert!(service.is_all_tasks_completed(&routine.id).unwrap());
}

#[test]
fn max_imported_order_still_appends_and_moves() {
    let conn = open_db_in_memory().unwrap();
    let service = RoutineService::new(SqliteRoutineRepository::try_new(&conn).unwrap());
    let text = format!(
        "{}\nr1,Morning,sun,blue,t1,A,{},task,false\n",
        ritualize_core::interchange::csv_codec::CSV_HEADER.join(","),
        i64::MAX
    );
    service.import_csv(&text).unwrap();
    assert_eq!(service.repository().get_task("t1").unwrap().unwrap().order, i64::MAX);

    let b = service.add_task("r1", &named_task("B")).unwrap();
    service.add_task("r1", &named_task("C")).unwrap();
    assert_eq!(b.order, i64::MAX);
    assert_eq!(names(&service, "r1"), vec!["A", "B", "C"]);
    assert!(!service.repository().has_pending_changes());

    service.move_task("r1", 2, 0).unwrap();
    assert_eq!(names(&service, "r1"), vec!["C", "A", "B"]);

    service.move_task("r1", 0, 3).unwrap();
    assert_eq!(names(&service, "r1"), vec!["A", "B", "C"]);
    assert!(!service.repository().has_pending_changes());
}
