/// End-to-end behaviour of a mounted card preview: construction, the fold animation,
/// texture resolution and teardown.
///
/// Run with:   cargo test --test fold_preview
use foldcard::{
    CardConfiguration, CardFormat, CardPreview, InputEvent, NodeKind, PanelKind, PreviewSettings,
    TextureState,
};
use foldcard_test_scenes::{
    bifold_new_year, canonical_configurations, card_image_data_uri, check_poses,
    check_visible_from, closed_poses, open_poses,
};
use std::cell::Cell;
use std::rc::Rc;

const FRAME: f32 = 1.0 / 60.0;

fn mount(config: CardConfiguration) -> (CardPreview, Rc<Cell<u32>>) {
    let closes = Rc::new(Cell::new(0));
    let counter = closes.clone();
    let preview = CardPreview::mount(
        config,
        PreviewSettings::default().with_particle_count(50),
        move || counter.set(counter.get() + 1),
    )
    .expect("canonical configurations always build");
    (preview, closes)
}

fn run_frames(preview: &mut CardPreview, first: u32, count: u32) {
    for frame in first..first + count {
        assert!(preview.frame(frame as f32 * FRAME).is_some());
    }
}

fn assert_poses(failures: Vec<String>) {
    if !failures.is_empty() {
        panic!(
            "{} pose expectation(s) failed:\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}

#[test]
fn bifold_opens_within_sixty_frames() {
    let (mut preview, _) = mount(bifold_new_year());
    preview.frame(0.0);
    assert_poses(check_poses(preview.assembly(), &closed_poses(CardFormat::Bifold)));

    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 1, 60);

    let state = preview.fold_state();
    assert!(state.is_open);
    let residual = (state.target_angle - state.current_angle) / state.target_angle;
    assert!(residual < 0.01, "residual {residual} after 60 frames");

    run_frames(&mut preview, 61, 200);
    assert_poses(check_poses(preview.assembly(), &open_poses(CardFormat::Bifold)));
}

#[test]
fn quadfold_settles_into_its_open_pose() {
    let config = bifold_new_year();
    let config = CardConfiguration::new(config.image, config.theme, CardFormat::Quadfold);
    let (mut preview, _) = mount(config);
    preview.frame(0.0);
    assert_poses(check_poses(preview.assembly(), &closed_poses(CardFormat::Quadfold)));

    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 1, 300);
    assert_poses(check_poses(preview.assembly(), &open_poses(CardFormat::Quadfold)));

    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 301, 300);
    assert!(!preview.fold_state().is_open);
    assert_poses(check_poses(preview.assembly(), &closed_poses(CardFormat::Quadfold)));
}

#[test]
fn inside_pages_face_the_viewer_once_open() {
    for format in [CardFormat::Bifold, CardFormat::Quadfold] {
        let config = bifold_new_year();
        let (mut preview, _) = mount(CardConfiguration::new(config.image, config.theme, format));
        preview.frame(0.0);
        let eye = preview.camera().position;
        assert_poses(check_visible_from(
            preview.assembly(),
            eye,
            &[PanelKind::FrontCover],
            0.9,
        ));

        preview.handle_input(InputEvent::Toggle);
        run_frames(&mut preview, 1, 400);
        let eye = preview.camera().position;
        let failures = check_visible_from(
            preview.assembly(),
            eye,
            &[PanelKind::InsideLeft, PanelKind::InsideRight],
            0.5,
        );
        assert!(failures.is_empty(), "{format}: {}", failures.join("\n"));
    }
}

#[test]
fn every_theme_and_format_mounts_closed() {
    for (label, config) in canonical_configurations() {
        let format = config.format;
        let (mut preview, _) = mount(config);
        let snapshot = preview.frame(0.0).expect("fresh preview renders");
        assert!(!snapshot.draws.is_empty(), "{label}: nothing to draw");
        assert!(snapshot.card_image.is_some(), "{label}: image did not resolve");
        let expected_faces = if format.is_foldable() { 4 } else { 1 };
        assert_eq!(preview.assembly().face_count(), expected_faces, "{label}");
        assert_poses(check_poses(preview.assembly(), &closed_poses(format)));
    }
}

#[test]
fn remounting_yields_the_same_card() {
    let (first, _) = mount(bifold_new_year());
    let (second, _) = mount(bifold_new_year());
    assert_eq!(first.assembly().pose(), second.assembly().pose());
    assert_eq!(
        first.assembly().scene().meshes(),
        second.assembly().scene().meshes()
    );
    assert_eq!(
        first.particles().particles(),
        second.particles().particles()
    );
}

#[test]
fn single_card_ignores_toggle() {
    let config = bifold_new_year();
    let config = CardConfiguration::new(config.image, config.theme, CardFormat::Single);
    let (mut preview, _) = mount(config);
    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 0, 30);
    assert!(!preview.fold_state().is_open);
    assert_eq!(preview.fold_state().current_angle, 0.0);
    assert!(preview.assembly().hinges().is_empty());
}

#[test]
fn close_tears_the_session_down() {
    let (mut preview, closes) = mount(bifold_new_year());
    run_frames(&mut preview, 0, 5);

    assert!(!preview.handle_input(InputEvent::Close));
    assert_eq!(closes.get(), 1);
    assert!(preview.frame(1.0).is_none());

    preview.close();
    assert!(!preview.handle_input(InputEvent::Close));
    assert_eq!(closes.get(), 1);
}

#[test]
fn closing_before_the_image_resolves_cancels_the_load() {
    let (mut preview, closes) = mount(bifold_new_year());
    assert!(matches!(preview.texture_state(), Some(TextureState::Pending)));
    preview.close();
    assert!(matches!(
        preview.texture_state(),
        Some(TextureState::Cancelled)
    ));
    assert!(preview.card_image().is_none());
    assert_eq!(closes.get(), 1);
}

#[test]
fn broken_image_keeps_everything_else_animating() {
    let config = CardConfiguration::from_json(
        r#"{"image": "data:image/png;base64,not-really", "theme": "lunar", "format": "bifold"}"#,
    )
    .expect("identifiers are valid");
    let (mut preview, _) = mount(config);

    let snapshot = preview.frame(0.0).expect("preview is open");
    assert_eq!(snapshot.image_hidden, 1);
    assert!(snapshot
        .draws
        .iter()
        .all(|draw| draw.kind != NodeKind::Panel(PanelKind::FrontCover)));
    assert!(snapshot.draws.iter().any(|draw| draw.kind == NodeKind::Trim));

    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 1, 10);
    assert!(preview.fold_state().current_angle > 0.0);
}

#[test]
fn format_change_rebuilds_and_closes_the_card() {
    let (mut preview, _) = mount(bifold_new_year());
    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 0, 20);
    assert!(preview.fold_state().current_angle > 0.0);

    preview
        .set_format(CardFormat::Quadfold)
        .expect("quadfold builds");
    assert_eq!(preview.assembly().format(), CardFormat::Quadfold);
    assert!(!preview.assembly().motifs().is_empty());
    assert_eq!(preview.fold_state().current_angle, 0.0);

    let snapshot = preview.frame(1.0).expect("preview is open");
    assert!(snapshot.card_image.is_some());
    assert!(snapshot
        .draws
        .iter()
        .any(|draw| draw.kind == NodeKind::Motif));
}

#[test]
fn reselecting_the_current_format_keeps_the_fold() {
    let (mut preview, _) = mount(bifold_new_year());
    preview.handle_input(InputEvent::Toggle);
    run_frames(&mut preview, 0, 60);
    let before = preview.fold_state();
    let epoch = preview.assembly().scene().epoch();

    preview
        .set_format(CardFormat::Bifold)
        .expect("same format is accepted");
    assert_eq!(preview.fold_state(), before);
    assert_eq!(preview.assembly().scene().epoch(), epoch);

    let next = preview.frame(61.0 * FRAME).expect("preview is open").fold;
    assert!(next.is_open);
    assert!(next.current_angle >= before.current_angle);
}

#[test]
fn custom_message_reaches_the_greeting_page() {
    let config = CardConfiguration::new(
        foldcard::ImageSource::data_uri(card_image_data_uri(2, 2, [0, 0, 0, 255])),
        foldcard::Theme::NewYear,
        CardFormat::Bifold,
    )
    .with_custom_message("Meilleurs voeux");
    let (mut preview, _) = mount(config);
    let snapshot = preview.frame(0.0).expect("preview is open");
    assert!(snapshot
        .texts
        .iter()
        .any(|text| text.block.text().replace('\n', " ").contains("Meilleurs voeux")));
}
