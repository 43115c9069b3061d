mod common;

use common::*;
use model_gallery::error::ViewerError;
use model_gallery::loader::MemoryFetcher;
use model_gallery::prelude::*;
use model_gallery::viewer::frame;
use std::cell::RefCell;
use std::rc::Rc;

type Gallery<S = ManualScheduler> = InstanceRegistry<MemoryFetcher, RecordingFactory, S>;

fn gallery() -> (Gallery, Rc<ManualScheduler>) {
    gallery_with(fixture_catalog(), fixture_fetcher(), RecordingFactory::new())
}

fn gallery_with(
    catalog: Catalog,
    fetcher: MemoryFetcher,
    factory: RecordingFactory,
) -> (Gallery, Rc<ManualScheduler>) {
    let scheduler = Rc::new(ManualScheduler::new());
    scheduler.set_time(0.0);
    let registry = InstanceRegistry::new(
        catalog,
        ViewerConfig::default(),
        fetcher,
        factory,
        scheduler.clone(),
    );
    (registry, scheduler)
}

fn factory(g: &Gallery) -> &RecordingFactory {
    g.factory()
}

#[test]
fn every_catalog_entry_gets_a_spinning_thumbnail() {
    let (mut g, scheduler) = gallery();

    assert_eq!(pollster::block_on(g.start()), 2);
    for index in 0..2 {
        let thumbnail = g.thumbnail(index).unwrap();
        assert_eq!(thumbnail.state(), ViewerState::Running);
        assert_eq!(thumbnail.instance().canvas(), format!("canvas{}", index));
        assert_eq!(thumbnail.instance().role(), ViewerRole::Thumbnail);
    }

    for _ in 0..3 {
        let _ = scheduler.run_frame();
    }
    assert_eq!(factory(&g).latest("canvas0").draws.get(), 3);
    assert_eq!(factory(&g).latest("canvas1").draws.get(), 3);
}

#[test]
fn failing_thumbnail_does_not_stop_the_others() {
    let catalog = Catalog::new(vec![
        CatalogEntry::new("models/box.obj", "Box"),
        CatalogEntry::new("models/missing.obj", "Missing"),
        CatalogEntry::new("models/triangle.obj", "Triangle"),
    ]);
    let (mut g, _) = gallery_with(catalog, fixture_fetcher(), RecordingFactory::new());

    assert_eq!(pollster::block_on(g.start()), 2);
    assert!(g.thumbnail(0).is_some());
    assert!(g.thumbnail(1).is_none());
    assert!(g.thumbnail(2).is_some());
}

#[test]
fn canvas_without_context_is_never_loaded() {
    let (mut g, _) = gallery_with(
        fixture_catalog(),
        fixture_fetcher(),
        RecordingFactory::new().without_canvas("canvas"),
    );

    let err = pollster::block_on(g.select(0)).unwrap_err();
    assert_eq!(
        err,
        ViewerError::GlContextUnavailable {
            canvas: "canvas".to_string()
        }
    );
    assert_eq!(g.fetcher().request_count(), 0);
    assert!(g.main().is_none());
    assert!(g.selected().is_empty());
}

#[test]
fn model_without_faces_cannot_be_selected() {
    let fetcher = fixture_fetcher().with("models/empty.obj", "# nothing but a comment\nv 0 0 0\n");
    let catalog = Catalog::new(vec![CatalogEntry::new("models/empty.obj", "Empty")]);
    let (mut g, _) = gallery_with(catalog, fetcher, RecordingFactory::new());

    let err = pollster::block_on(g.select(0)).unwrap_err();
    assert_eq!(
        err,
        ViewerError::DegenerateExtents {
            path: "models/empty.obj".to_string()
        }
    );
}

#[test]
fn unknown_indices_are_rejected() {
    let (mut g, _) = gallery();
    assert_eq!(pollster::block_on(g.select(9)), Err(ViewerError::UnknownModel(9)));
    assert_eq!(g.reactivate(0), Err(ViewerError::UnknownSelection(0)));
}

#[test]
fn selecting_resets_the_transform() {
    let (mut g, _) = gallery();
    let _ = pollster::block_on(g.start());

    assert_eq!(pollster::block_on(g.select(1)), Ok(0));
    g.apply_slider(SliderInput::PositionX(10.0));
    g.apply_slider(SliderInput::ScaleY(-2.0));
    g.apply_slider(SliderInput::Rotation(90.0));

    assert_eq!(pollster::block_on(g.select(0)), Ok(1));
    assert_eq!(g.active_transform().get(), TransformState::default());
    assert_eq!(g.main_model(), Some(0));

    let selected = g.selected();
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].display_name, "Triangle");
    assert_eq!(selected[0].transform.get().scale, Vec2::new(1.0, -2.0));
    assert_eq!(selected[1].display_name, "Box");
    assert!(selected[1].transform.ptr_eq(g.active_transform()));
}

#[test]
fn selecting_clears_the_thumbnail() {
    let (mut g, _) = gallery();
    let _ = pollster::block_on(g.start());
    let _ = pollster::block_on(g.select(1));

    assert_eq!(factory(&g).latest("canvas1").clears.get(), 1);
    assert_eq!(factory(&g).latest("canvas0").clears.get(), 0);
}

#[test]
fn previous_main_viewer_is_disposed() {
    let (mut g, scheduler) = gallery();
    let _ = pollster::block_on(g.select(0));
    let _ = scheduler.run_frame();

    let _ = pollster::block_on(g.select(1));
    let history = factory(&g).history("canvas");
    assert_eq!(history.len(), 2);

    let first = &history[0];
    assert_eq!(first.bound.get(), 2);
    assert_eq!(first.released.get(), 2);
    let draws = first.draws.get();

    for _ in 0..5 {
        let _ = scheduler.run_frame();
    }
    assert_eq!(first.draws.get(), draws);
    assert_eq!(history[1].draws.get(), 5);
}

// A host that already dequeued every callback: cancelling has no effect.
#[derive(Default)]
struct InFlightScheduler {
    queued: RefCell<Vec<FrameCallback>>,
    next: std::cell::Cell<u64>,
}

impl InFlightScheduler {
    fn run_frame(&self) {
        let batch = std::mem::take(&mut *self.queued.borrow_mut());
        for callback in batch {
            callback(0.0);
        }
    }
}

impl FrameScheduler for InFlightScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        self.queued.borrow_mut().push(callback);
        self.next.set(self.next.get() + 1);
        FrameRequestId(self.next.get())
    }

    fn cancel_frame(&self, _: FrameRequestId) {}

    fn now_ms(&self) -> f64 {
        0.0
    }
}

#[test]
fn disposed_viewer_ignores_a_frame_already_in_flight() {
    let scheduler = Rc::new(InFlightScheduler::default());
    let mut g: Gallery<InFlightScheduler> = InstanceRegistry::new(
        fixture_catalog(),
        ViewerConfig::default(),
        fixture_fetcher(),
        RecordingFactory::new(),
        scheduler.clone(),
    );

    let _ = pollster::block_on(g.select(0));
    scheduler.run_frame();
    let first = g.factory().latest("canvas");
    assert_eq!(first.draws.get(), 1);

    // The first viewer's next frame is queued and cannot be withdrawn.
    let _ = pollster::block_on(g.select(1));
    scheduler.run_frame();
    scheduler.run_frame();

    assert_eq!(first.draws.get(), 1);
    assert_eq!(g.factory().latest("canvas").draws.get(), 2);
}

#[test]
fn loading_a_model_twice_frames_it_identically() {
    let (mut g, _) = gallery();
    let _ = pollster::block_on(g.select(0));
    let first = *g.main().unwrap().instance().framing();
    let first_offset = g.main().unwrap().instance().centering_offset();

    let _ = pollster::block_on(g.select(0));
    let second = *g.main().unwrap().instance().framing();

    assert_eq!(first, second);
    assert_eq!(first_offset, Vec3::new(-2.0, 0.0, 0.0));
    assert_eq!(g.main().unwrap().instance().centering_offset(), first_offset);
}

#[test]
fn reactivation_restores_the_transform_without_reloading() {
    let (mut g, _) = gallery();
    let _ = pollster::block_on(g.select(0));
    g.apply_slider(SliderInput::ScaleX(3.0));
    let _ = pollster::block_on(g.select(1));

    let requests = g.fetcher().request_count();
    let main_draws = factory(&g).latest("canvas").draws.get();

    assert_eq!(g.reactivate(0), Ok(()));

    assert_eq!(g.fetcher().request_count(), requests);
    assert_eq!(factory(&g).history("canvas").len(), 2);
    assert_eq!(g.main_model(), Some(1));
    assert!(g.active_transform().ptr_eq(&g.selected()[0].transform));
    assert!(g
        .main()
        .unwrap()
        .instance()
        .transform()
        .ptr_eq(&g.selected()[0].transform));
    assert_eq!(g.active_transform().get().scale.x, 3.0);
    assert_eq!(factory(&g).latest("canvas").draws.get(), main_draws + 1);

    // Sliders now edit the re-activated record.
    g.apply_slider(SliderInput::ScaleY(0.5));
    assert_eq!(g.selected()[0].transform.get().scale, Vec2::new(3.0, 0.5));
    assert_eq!(g.selected()[1].transform.get(), TransformState::default());
}

#[test]
fn slider_input_redraws_the_main_viewport_immediately() {
    let (mut g, _) = gallery();
    let _ = pollster::block_on(g.select(0));
    let counters = factory(&g).latest("canvas");
    assert_eq!(counters.draws.get(), 0);

    g.apply_slider(SliderInput::ScaleX(2.0));
    assert_eq!(counters.draws.get(), 1);

    let offset = Vec3::new(-2.0, 0.0, 0.0);
    let expected = Mat4::from_translation(offset) * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
    for world in counters.last_worlds.borrow().iter() {
        assert_mat_close(*world, expected);
    }
    assert_eq!(counters.last_worlds.borrow().len(), 2);
}

#[test]
fn thumbnails_ignore_the_user_transform() {
    let (mut g, scheduler) = gallery();
    let _ = pollster::block_on(g.start());
    let _ = pollster::block_on(g.select(0));
    g.apply_slider(SliderInput::ScaleX(4.0));
    g.apply_slider(SliderInput::Rotation(45.0));

    let _ = scheduler.run_frame_at(1234.0);
    let expected = frame::world_matrix(frame::spin(1234.0, 1.0), Vec3::new(-2.0, 0.0, 0.0), Mat4::IDENTITY);
    for world in factory(&g).latest("canvas0").last_worlds.borrow().iter() {
        assert_mat_close(*world, expected);
    }
}

#[test]
fn every_frame_uses_the_framed_camera() {
    let (mut g, scheduler) = gallery();
    let _ = pollster::block_on(g.start());
    let _ = scheduler.run_frame();

    let thumbnail = g.thumbnail(0).unwrap();
    let framing = *thumbnail.instance().framing();
    let frame_uniforms = factory(&g).latest("canvas0").last_frame.get().unwrap();
    assert_eq!(Vec3::from(frame_uniforms.view_world_position), framing.position);
    assert_mat_close(
        Mat4::from_cols_array_2d(&frame_uniforms.view),
        frame::view_matrix(&framing),
    );
}

#[test]
fn removed_thumbnail_stops_drawing() {
    let (mut g, scheduler) = gallery();
    let _ = pollster::block_on(g.start());

    assert!(g.remove_thumbnail(1));
    assert!(!g.remove_thumbnail(1));
    let _ = scheduler.run_frame();

    assert_eq!(factory(&g).latest("canvas1").draws.get(), 0);
    assert_eq!(factory(&g).latest("canvas1").released.get(), 1);
    assert_eq!(factory(&g).latest("canvas0").draws.get(), 1);
}

#[test]
fn shutdown_disposes_every_viewer() {
    let (mut g, scheduler) = gallery();
    let _ = pollster::block_on(g.start());
    let _ = pollster::block_on(g.select(0));

    g.shutdown();
    assert_eq!(scheduler.pending_count(), 0);
    assert_eq!(scheduler.run_frame(), 0);
    assert!(g.main().is_none());
    assert!(g.thumbnail(0).is_none());
    assert_eq!(g.reactivate(0), Err(ViewerError::Disposed));

    for canvas in ["canvas", "canvas0", "canvas1"] {
        let counters = factory(&g).latest(canvas);
        assert_eq!(counters.bound.get(), counters.released.get());
    }
}
