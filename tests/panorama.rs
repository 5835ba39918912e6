use glam::Vec3;
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::{draw_list, DrawSource, Equirect, RecordingBackend};
use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
use xr_webgpu::xr::SessionOutcome;
use xr_webgpu::{SessionMode, Transform};

fn app(headset: &SimulatedHeadset) -> XrApp<SimSession> {
    let (scene, config) = scenes::panorama(None);
    XrApp::new(scene, config, headset.capabilities())
}

#[test]
fn flat_view_draws_the_backdrop_first() {
    let headset = SimulatedHeadset::default();
    let mut app = app(&headset);
    let mut backend = RecordingBackend::new(1280, 720);

    app.flat_frame(&mut backend, 0.0);
    assert!(backend.renders()[0].environment);

    let items = draw_list(&app.render.scene);
    assert!(matches!(items[0].source, DrawSource::Environment(_)));
    assert_eq!(items.len(), 2);
}

#[test]
fn backdrop_stays_centered_on_the_viewer_in_both_eyes() {
    let headset = SimulatedHeadset::default();
    let mut app = app(&headset);
    let mut backend = RecordingBackend::new(1280, 720);

    app.toggle();
    app.on_session_outcome(headset.request(SessionMode::Immersive), &mut backend);
    let pose = headset.pose(SessionMode::Immersive, Transform::from_position(Vec3::Y * headset.head_height));
    app.frame(&mut backend, 16.0, Some(&pose), &[]);

    let renders = backend.renders();
    assert_eq!(renders.len(), 2);
    assert!(renders.iter().all(|r| r.environment));
}

#[test]
fn passthrough_hides_the_backdrop_until_the_session_ends() {
    let headset = SimulatedHeadset::default();
    let mut app = app(&headset);
    let mut backend = RecordingBackend::new(1280, 720);

    app.toggle_ar();
    app.on_session_outcome(headset.request(SessionMode::ImmersiveAr), &mut backend);
    let pose = headset.pose(SessionMode::ImmersiveAr, headset.head_at(0.0));
    app.frame(&mut backend, 16.0, Some(&pose), &[]);
    assert!(backend.renders().iter().all(|r| !r.environment));

    app.on_session_outcome(SessionOutcome::Ended, &mut backend);
    backend.take_calls();
    app.flat_frame(&mut backend, 32.0);
    assert!(backend.renders()[0].environment);
}

#[test]
fn decoded_images_become_backdrops() {
    let mut png = Vec::new();
    let image = image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 200, 30, 255]));
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");

    let equirect = Equirect::decode(&png).expect("decode png");
    assert_eq!(equirect.dimensions(), (8, 4));
    assert_eq!(equirect.sample(Vec3::NEG_Z), [10.0 / 255.0, 200.0 / 255.0, 30.0 / 255.0, 1.0]);

    let (scene, _) = scenes::panorama(Some(equirect));
    assert!(scene.environment().is_some());
    assert!(Equirect::decode(b"not an image").is_err());
}
