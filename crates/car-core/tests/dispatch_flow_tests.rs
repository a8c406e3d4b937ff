//! End-to-end flows through the dispatcher and an in-memory server.
//!
//! Responses are delayed with tokio's paused clock so arrival order is
//! deterministic:
//! - the last selected default table wins whatever order keys arrive in
//! - loaded sessions chain their key and image fetches
//! - failures surface as notices and leave the session untouched

use car_core::{
    BackendError, CarConfig, CarError, Command, Dispatcher, NoticeLevel, Outcome, ReportBackend,
    SessionController, UploadKind, UploadPayload,
};
use car_test_utils::{
    ice_keys, properties, setup_controller, sst_images, sst_keys, InMemoryBackend, SESSION_STORED,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn start(backend: &Arc<InMemoryBackend>) -> (Dispatcher, SessionController) {
    let shared: Arc<dyn ReportBackend> = backend.clone();
    (
        Dispatcher::new(shared, &CarConfig::default()),
        setup_controller(),
    )
}

fn select_table(dispatcher: &mut Dispatcher, controller: &mut SessionController, path: &str) {
    dispatcher
        .dispatch(controller, Command::SelectDefaultTable(path.to_string()))
        .unwrap();
}

/// Two table selections whose responses arrive out of order.
#[tokio::test(start_paused = true)]
async fn last_selected_table_wins_when_first_arrives_late() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_table("sst.properties", sst_keys())
            .with_table("ice.properties", ice_keys())
            .with_delay("sst.properties", Duration::from_millis(500))
            .with_delay("ice.properties", Duration::from_millis(50)),
    );
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    select_table(&mut dispatcher, &mut controller, "ice.properties");
    let outcomes = dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(outcomes, vec![Outcome::Applied, Outcome::Ignored]);
    assert_eq!(controller.session().default_table_path(), "ice.properties");
    assert_eq!(controller.figure_key_options(), vec!["figures.extent"]);
    assert_eq!(controller.session().property("figures.extent"), Some("arctic.png"));
    assert_eq!(controller.session().property("figure.a"), None);
}

#[tokio::test(start_paused = true)]
async fn last_selected_table_wins_when_first_arrives_early() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_table("sst.properties", sst_keys())
            .with_table("ice.properties", ice_keys())
            .with_delay("sst.properties", Duration::from_millis(10))
            .with_delay("ice.properties", Duration::from_millis(400)),
    );
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    select_table(&mut dispatcher, &mut controller, "ice.properties");
    let outcomes = dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(outcomes, vec![Outcome::Ignored, Outcome::Applied]);
    assert_eq!(controller.catalog_table(), "ice.properties");
    assert!(controller.catalog().kind_of("figure.a").is_none());
}

#[tokio::test]
async fn table_change_seeds_text_defaults_only_for_figures() {
    let backend = Arc::new(InMemoryBackend::new().with_table("sst.properties", sst_keys()));
    let (mut dispatcher, mut controller) = start(&backend);

    controller.select_template("sst.docx");
    select_table(&mut dispatcher, &mut controller, "sst.properties");
    dispatcher.run_until_idle(&mut controller).await;

    let session = controller.session();
    assert_eq!(session.template_doc_path(), "sst.docx");
    assert_eq!(session.property("figure.a"), Some("X"));
    assert_eq!(session.scale("figure.a"), Some("1.5"));
    assert_eq!(session.property("paragraph.summary"), None);
    assert!(controller.needs_discard_confirmation());
    assert_eq!(
        controller.catalog().text_defaults().get("paragraph.summary.default").map(String::as_str),
        Some("No anomalies.")
    );
}

#[tokio::test]
async fn malformed_key_payload_is_reported() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_table("sst.properties", sst_keys())
            .with_raw_table("broken.properties", "<html>Internal Server Error</html>"),
    );
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    dispatcher.run_until_idle(&mut controller).await;
    let before = controller.session().clone();

    select_table(&mut dispatcher, &mut controller, "broken.properties");
    let outcomes = dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(outcomes, vec![Outcome::Failed]);
    assert_eq!(controller.session(), &before);
    assert_eq!(controller.catalog_table(), "sst.properties");

    let notices = controller.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].text.contains("malformed payload"));
}

#[tokio::test]
async fn raw_table_payload_keeps_server_order() {
    let backend = Arc::new(InMemoryBackend::new().with_raw_table(
        "ordered.properties",
        r#"{"figures.z": "", "figure.m": "", "figure.a": ""}"#,
    ));
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "ordered.properties");
    dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(controller.figure_key_options(), vec!["figures.z", "figure.m", "figure.a"]);
}

#[tokio::test]
async fn save_as_then_load_restores_session() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_table("sst.properties", sst_keys())
            .with_images("sst", sst_images()),
    );
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    dispatcher
        .dispatch(&mut controller, Command::SelectFiguresDirectory("sst".into()))
        .unwrap();
    dispatcher.run_until_idle(&mut controller).await;
    assert_eq!(controller.images().len(), 3);

    controller.select_figure_key("figures.b");
    controller.toggle_figure("anomaly.png", true);
    controller.toggle_figure("trend.png", true);
    controller.set_text("word.region", "North Atlantic");

    dispatcher
        .dispatch(&mut controller, Command::SaveAs("july".into()))
        .unwrap();
    dispatcher.run_until_idle(&mut controller).await;
    assert!(!controller.needs_discard_confirmation());
    assert_eq!(controller.toolbar().session_name, "july");

    let saved = backend.saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].get("figures.b").map(String::as_str), Some("anomaly.png;trend.png"));

    // a fresh editor picks the stored session back up
    let (mut dispatcher, mut reopened) = start(&backend);
    dispatcher
        .dispatch(&mut reopened, Command::LoadSession("july".into()))
        .unwrap();
    let outcomes = dispatcher.run_until_idle(&mut reopened).await;

    assert_eq!(outcomes, vec![Outcome::Applied; 3]);
    assert_eq!(reopened.session().properties(), &saved[0]);
    assert_eq!(reopened.catalog_table(), "sst.properties");
    assert_eq!(reopened.images().len(), 3);
    assert!(!reopened.needs_discard_confirmation());

    let view = reopened.select_figure_key("figures.b");
    assert!(view.is_checked("anomaly.png"));
    assert!(view.is_checked("trend.png"));
    assert!(!view.is_checked("climatology.png"));
}

#[tokio::test]
async fn failed_save_keeps_unsaved_changes() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_table("sst.properties", sst_keys())
            .with_failure("july", BackendError::transport("connection reset")),
    );
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    dispatcher.run_until_idle(&mut controller).await;
    dispatcher
        .dispatch(&mut controller, Command::SaveAs("july".into()))
        .unwrap();
    let outcomes = dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(outcomes, vec![Outcome::Failed]);
    assert!(controller.needs_discard_confirmation());
    assert!(backend.saved().await.is_empty());
    assert!(controller.notices().any(|n| n.text.contains("connection reset")));
}

#[tokio::test]
async fn save_needs_table_and_name() {
    let backend = Arc::new(InMemoryBackend::new().with_table("sst.properties", sst_keys()));
    let (mut dispatcher, mut controller) = start(&backend);

    let err = dispatcher.dispatch(&mut controller, Command::Save).unwrap_err();
    assert!(matches!(err, CarError::NoTableSelected));

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    dispatcher.run_until_idle(&mut controller).await;
    let err = dispatcher.dispatch(&mut controller, Command::Save).unwrap_err();
    assert!(matches!(err, CarError::MissingFilename));
    assert!(dispatcher.is_idle());
}

/// A table picked while a session load is in flight supersedes the load.
#[tokio::test(start_paused = true)]
async fn table_selection_during_load_wins() {
    let backend = Arc::new(
        InMemoryBackend::new()
            .with_table("sst.properties", sst_keys())
            .with_session("old", properties(&[("default_table_path", "ice.properties")]))
            .with_delay("old", Duration::from_secs(2)),
    );
    let (mut dispatcher, mut controller) = start(&backend);

    dispatcher
        .dispatch(&mut controller, Command::LoadSession("old".into()))
        .unwrap();
    select_table(&mut dispatcher, &mut controller, "sst.properties");
    let outcomes = dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(outcomes, vec![Outcome::Applied, Outcome::Ignored]);
    assert_eq!(controller.session().default_table_path(), "sst.properties");
}

#[tokio::test]
async fn unknown_session_is_reported() {
    let backend = Arc::new(InMemoryBackend::new());
    let (mut dispatcher, mut controller) = start(&backend);

    dispatcher
        .dispatch(&mut controller, Command::LoadSession("missing".into()))
        .unwrap();
    let outcomes = dispatcher.run_until_idle(&mut controller).await;

    assert_eq!(outcomes, vec![Outcome::Failed]);
    assert!(controller.session().is_empty());
    assert!(controller.notices().all(|n| n.is_error()));
}

#[tokio::test]
async fn render_and_upload_surface_messages() {
    let backend = Arc::new(InMemoryBackend::new());
    let (mut dispatcher, mut controller) = start(&backend);

    let err = dispatcher.dispatch(&mut controller, Command::Render).unwrap_err();
    assert!(matches!(err, CarError::NoTemplateSelected));

    controller.select_template("sst.docx");
    dispatcher.dispatch(&mut controller, Command::Render).unwrap();
    dispatcher
        .dispatch(
            &mut controller,
            Command::Upload(UploadKind::Template, UploadPayload::new("new.docx", vec![1, 2, 3])),
        )
        .unwrap();
    let err = dispatcher
        .dispatch(
            &mut controller,
            Command::Upload(UploadKind::DefaultTable, UploadPayload::new("new.docx", vec![])),
        )
        .unwrap_err();
    assert!(matches!(err, CarError::WrongFileType { .. }));

    let outcomes = dispatcher.run_until_idle(&mut controller).await;
    assert_eq!(outcomes, vec![Outcome::Applied, Outcome::Applied]);
    assert_eq!(backend.renders().await.len(), 1);
    assert_eq!(
        backend.uploads().await,
        vec![(UploadKind::Template, "new.docx".to_string())]
    );

    let notices = controller.drain_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| !n.is_error()));
}

#[tokio::test]
async fn stored_message_is_shown() {
    let backend = Arc::new(InMemoryBackend::new().with_table("sst.properties", sst_keys()));
    let (mut dispatcher, mut controller) = start(&backend);

    select_table(&mut dispatcher, &mut controller, "sst.properties");
    dispatcher.run_until_idle(&mut controller).await;
    dispatcher
        .dispatch(&mut controller, Command::SaveAs("july".into()))
        .unwrap();
    dispatcher.run_until_idle(&mut controller).await;

    let notices = controller.drain_notices();
    assert_eq!(notices.last().map(|n| n.text.as_str()), Some(SESSION_STORED));
}
