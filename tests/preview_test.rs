use flow_preview::{
    ChainState, FallbackPolicy, FormatTag, LoadError, ModelPreview, PresentationConfig,
    PreviewConfig, View,
    config::{DEFAULT_FALLBACK_LABEL, DEFAULT_LOADING_LABEL, DEFAULT_PLACEHOLDER},
};

mod common;
use crate::common::test_utils::{FALLBACK, MemorySource, TRIANGLE_OBJ, triangle_glb};

fn shown(preview: &ModelPreview<MemorySource>) -> Option<String> {
    match preview.view() {
        View::Scene(presentation) => Some(presentation.scene().reference.as_str().to_string()),
        _ => None,
    }
}

fn preview(source: &MemorySource) -> ModelPreview<MemorySource> {
    ModelPreview::new(source.clone(), PreviewConfig::default()).unwrap()
}

#[tokio::test]
async fn should_show_primary_model() {
    let source = MemorySource::new()
        .with("/chair.glb", triangle_glb())
        .with(FALLBACK, triangle_glb());
    let mut preview = preview(&source);

    preview.load("/chair.glb").await;

    assert_eq!(shown(&preview).as_deref(), Some("/chair.glb"));
    assert_eq!(preview.state(), ChainState::Primary);
    assert!(preview.failures().is_empty());
    assert_eq!(source.fetch_count(FALLBACK), 0);
}

#[tokio::test]
async fn should_show_fallback_when_primary_is_missing() {
    let source = MemorySource::new().with(FALLBACK, triangle_glb());
    let mut preview = preview(&source);

    preview.load("/missing.glb").await;

    assert_eq!(shown(&preview).as_deref(), Some(FALLBACK));
    assert_eq!(preview.state(), ChainState::Fallback);
    assert_eq!(preview.failures().len(), 1);
    assert!(matches!(preview.failures()[0], LoadError::Network { .. }));
    assert!(preview.exhausted().is_none());
}

#[tokio::test]
async fn should_show_placeholder_when_everything_fails() {
    let source = MemorySource::new();
    let mut preview = preview(&source);

    preview.load("/missing.glb").await;

    assert!(matches!(
        preview.view(),
        View::Placeholder { message } if message == DEFAULT_PLACEHOLDER
    ));
    assert_eq!(preview.state(), ChainState::Exhausted);
    assert_eq!(preview.failures().len(), 2);
    assert_eq!(
        preview.exhausted(),
        Some(&LoadError::FallbackExhausted {
            requested: "/missing.glb".into(),
            fallback: Some(FALLBACK.into()),
        })
    );
    assert!(preview.exhausted().unwrap().is_terminal());
    assert_eq!(source.fetches(), vec!["/missing.glb", FALLBACK]);
}

#[tokio::test]
async fn should_show_placeholder_without_fallback_policy() {
    let source = MemorySource::new().with("/broken.glb", "not a model");
    let config = PreviewConfig::default().with_fallback(FallbackPolicy::none());
    let mut preview = ModelPreview::new(source.clone(), config).unwrap();

    preview.load("/broken.glb").await;

    assert!(matches!(preview.view(), View::Placeholder { .. }));
    assert_eq!(
        preview.failures(),
        &[LoadError::UnknownFormat {
            reference: "/broken.glb".into()
        }]
    );
    assert_eq!(source.fetches(), vec!["/broken.glb"]);
}

#[tokio::test]
async fn should_load_obj_behind_a_glb_name() {
    let source = MemorySource::new().with("/chair.glb", TRIANGLE_OBJ);
    let mut preview = preview(&source);

    preview.load("/chair.glb").await;

    match preview.view() {
        View::Scene(presentation) => assert_eq!(presentation.scene().format, FormatTag::Obj),
        other => panic!("expected a scene, got {:?}", other),
    }
    assert_eq!(source.fetch_count(FALLBACK), 0);
}

#[test]
fn should_show_labels_while_loading() {
    let source = MemorySource::new().with(FALLBACK, triangle_glb());
    let mut preview = preview(&source);
    assert!(matches!(preview.view(), View::Empty));

    let pending = preview.request("/missing.glb").unwrap();
    assert!(matches!(
        preview.view(),
        View::Loading { label } if label == DEFAULT_LOADING_LABEL
    ));

    let completion = futures::executor::block_on(pending.run());
    let fallback = preview.complete(completion).unwrap();
    assert_eq!(fallback.reference().as_str(), FALLBACK);
    assert!(matches!(
        preview.view(),
        View::Loading { label } if label == DEFAULT_FALLBACK_LABEL
    ));

    let completion = futures::executor::block_on(fallback.run());
    assert!(preview.complete(completion).is_none());
    assert_eq!(shown(&preview).as_deref(), Some(FALLBACK));
}

#[test]
fn should_ignore_superseded_result_arriving_last() {
    let source = MemorySource::new()
        .with("/a.glb", triangle_glb())
        .with("/b.glb", triangle_glb());
    let mut preview = preview(&source);

    let first = preview.request("/a.glb").unwrap();
    let second = preview.request("/b.glb").unwrap();
    assert!(second.generation() > first.generation());

    let second = futures::executor::block_on(second.run());
    let first = futures::executor::block_on(first.run());
    assert!(preview.complete(second).is_none());
    assert!(preview.complete(first).is_none());

    assert_eq!(shown(&preview).as_deref(), Some("/b.glb"));
}

#[test]
fn should_ignore_superseded_result_arriving_first() {
    let source = MemorySource::new()
        .with("/a.glb", triangle_glb())
        .with("/b.glb", triangle_glb());
    let mut preview = preview(&source);

    let first = preview.request("/a.glb").unwrap();
    let second = preview.request("/b.glb").unwrap();

    let first = futures::executor::block_on(first.run());
    assert!(preview.complete(first).is_none());
    // /a.glb was never displayed
    assert!(matches!(preview.view(), View::Loading { .. }));

    let second = futures::executor::block_on(second.run());
    preview.complete(second);
    assert_eq!(shown(&preview).as_deref(), Some("/b.glb"));
}

#[test]
fn should_not_advance_chain_for_superseded_failure() {
    let source = MemorySource::new()
        .with("/b.glb", triangle_glb())
        .with(FALLBACK, triangle_glb());
    let mut preview = preview(&source);

    let first = preview.request("/missing.glb").unwrap();
    let second = preview.request("/b.glb").unwrap();

    let first = futures::executor::block_on(first.run());
    assert!(!first.is_success());
    assert!(preview.complete(first).is_none());
    assert_eq!(preview.state(), ChainState::Primary);
    assert!(preview.failures().is_empty());

    let second = futures::executor::block_on(second.run());
    preview.complete(second);
    assert_eq!(shown(&preview).as_deref(), Some("/b.glb"));
    assert_eq!(source.fetch_count(FALLBACK), 0);
}

#[tokio::test]
async fn should_keep_previous_scene_while_next_one_loads() {
    let source = MemorySource::new()
        .with("/a.glb", triangle_glb())
        .with("/b.glb", triangle_glb());
    let mut preview = preview(&source);
    preview.load("/a.glb").await;

    let pending = preview.request("/b.glb").unwrap();
    assert_eq!(shown(&preview).as_deref(), Some("/a.glb"));

    let completion = pending.run().await;
    preview.complete(completion);
    assert_eq!(shown(&preview).as_deref(), Some("/b.glb"));
}

#[tokio::test]
async fn should_not_retry_exhausted_reference() {
    let source = MemorySource::new().with("/b.glb", triangle_glb());
    let mut preview = preview(&source);
    preview.load("/missing.glb").await;
    assert_eq!(preview.state(), ChainState::Exhausted);

    preview.load("/b.glb").await;
    assert_eq!(shown(&preview).as_deref(), Some("/b.glb"));

    let fetches = source.fetches().len();
    assert!(preview.request("/missing.glb").is_none());
    assert_eq!(source.fetches().len(), fetches);
    assert!(matches!(preview.view(), View::Placeholder { .. }));
    assert!(preview.exhausted().is_some());
}

#[tokio::test]
async fn should_ignore_request_for_current_reference() {
    let source = MemorySource::new().with("/a.glb", triangle_glb());
    let mut preview = preview(&source);
    preview.load("/a.glb").await;
    let generation = preview.generation();

    assert!(preview.request("/a.glb").is_none());
    assert_eq!(preview.generation(), generation);
    assert_eq!(source.fetch_count("/a.glb"), 1);
}

#[tokio::test]
async fn should_start_configured_asset() {
    let source = MemorySource::new().with("/hero.glb", triangle_glb());
    let mut preview = ModelPreview::new(source, PreviewConfig::new("/hero.glb")).unwrap();

    let pending = preview.start().unwrap();
    assert_eq!(pending.reference().as_str(), "/hero.glb");
    let completion = pending.run().await;
    assert!(completion.is_success());
    preview.complete(completion);

    assert_eq!(shown(&preview).as_deref(), Some("/hero.glb"));
}

#[test]
fn should_reject_degenerate_configuration() {
    let config = PreviewConfig::default().with_presentation(PresentationConfig {
        scale: 0.0,
        ..Default::default()
    });
    assert!(ModelPreview::new(MemorySource::new(), config).is_err());

    let config = PreviewConfig::default().with_presentation(PresentationConfig {
        position: [f32::NAN, 0.0, 0.0],
        ..Default::default()
    });
    assert!(ModelPreview::new(MemorySource::new(), config).is_err());
}

#[tokio::test]
async fn should_forget_failures_of_previous_requests() {
    let source = MemorySource::new()
        .with("/b.glb", triangle_glb())
        .with(FALLBACK, triangle_glb());
    let mut preview = preview(&source);

    preview.load("/missing.glb").await;
    assert_eq!(preview.failures().len(), 1);

    preview.load("/b.glb").await;
    assert!(preview.failures().is_empty());
    assert_eq!(shown(&preview).as_deref(), Some("/b.glb"));
}
